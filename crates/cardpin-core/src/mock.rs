//! In-memory transport for testing
//!
//! Serves canned responses by exact URL and records every request, so tests
//! can drive the resolver and installer without a network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{InstallError, Result};
use crate::transport::{Response, Transport};

/// In-memory transport for testing
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Arc<RwLock<HashMap<String, Response>>>,
    requests: Arc<RwLock<Vec<String>>>,
    offline: bool,
}

impl MockTransport {
    /// Create an empty transport; unknown URLs answer 404
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport where every request fails as if the network were down
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Serve `response` for `url`
    pub fn route(&self, url: impl Into<String>, response: Response) -> &Self {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.into(), response);
        self
    }

    /// Serve a JSON document for `url`
    pub fn route_json(&self, url: impl Into<String>, value: &serde_json::Value) -> &Self {
        self.route(url, Response::ok(value.to_string()))
    }

    /// All requested URLs, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of times `url` was requested
    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<Response> {
        self.requests
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());

        if self.offline {
            return Err(InstallError::download(url, "connection failed: network unreachable"));
        }

        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        Ok(routes.get(url).cloned().unwrap_or_else(Response::not_found))
    }
}
