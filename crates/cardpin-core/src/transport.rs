//! HTTP transport used by the resolver and fetcher
//!
//! The [`Transport`] trait is the seam between the install pipeline and the
//! network. [`HttpTransport`] is the production client; tests and offline runs
//! use [`crate::mock::MockTransport`].

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Identifying client header sent with every request
pub const USER_AGENT: &str = concat!("cardpin/", env!("CARGO_PKG_VERSION"));

/// Fixed timeout applied to each request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    pub fn not_found() -> Self {
        Self::new(404, Vec::new())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Blocking-style GET transport
///
/// Implementations return `Ok` for any HTTP status and `Err` only when no
/// response was received (connection failure, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Response>;
}

/// A bearer token only sent to URLs under a given prefix
#[derive(Debug, Clone)]
pub struct ScopedToken {
    prefix: String,
    token: String,
}

impl ScopedToken {
    pub fn new(prefix: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            token: token.into(),
        }
    }

    /// Authorization header value for a URL, if the token is in scope
    pub fn header_for(&self, url: &str) -> Option<String> {
        let prefix = self.prefix.trim_end_matches('/');
        let in_scope = url
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        in_scope.then(|| format!("Bearer {}", self.token))
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    token: Option<ScopedToken>,
}

impl HttpTransport {
    /// Create a transport with the fixed request timeout
    pub fn new(token: Option<ScopedToken>) -> Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT, token)
    }

    pub(crate) fn with_timeout(timeout: Duration, token: Option<ScopedToken>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, token })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Response> {
        let mut request = self.client.get(url);

        if let Some(auth) = self.token.as_ref().and_then(|t| t.header_for(url)) {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        tracing::debug!(url, status, bytes = body.len(), "GET");

        Ok(Response {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, InstallError};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_scoped_token() {
        let token = ScopedToken::new("https://api.github.com", "secret");

        assert_eq!(
            token.header_for("https://api.github.com/repos/a/b").as_deref(),
            Some("Bearer secret")
        );
        assert!(token.header_for("https://api.github.com.evil.test/x").is_none());
        assert!(token.header_for("https://github.com/a/b/archive.zip").is_none());
    }

    #[test]
    fn test_response_status() {
        assert!(Response::ok("x").is_success());
        assert!(Response::not_found().is_not_found());
        assert!(!Response::new(500, "").is_success());
    }

    #[tokio::test]
    async fn test_get_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/asset.js"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"console.log(1)".to_vec()))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(None).unwrap();
        let response = transport
            .get(&format!("{}/asset.js", server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"console.log(1)");
    }

    #[tokio::test]
    async fn test_get_returns_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(None).unwrap();
        let response = transport
            .get(&format!("{}/missing", server.uri()))
            .await
            .unwrap();

        assert!(response.is_not_found());
    }

    #[tokio::test]
    async fn test_token_sent_in_scope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let token = ScopedToken::new(server.uri(), "t0ken");
        let transport = HttpTransport::new(Some(token)).unwrap();
        let response = transport
            .get(&format!("{}/repos/a/b", server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_timeout_is_download_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let transport = HttpTransport::with_timeout(Duration::from_millis(200), None).unwrap();
        let err = transport
            .get(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::DownloadFailed { .. }));
        assert_eq!(err.kind(), ErrorKind::DownloadFailed);
    }
}
