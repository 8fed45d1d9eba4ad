//! Byte retrieval over a [`Transport`]
//!
//! No retries happen here; a non-success status is a `DownloadFailed`.

use std::path::{Path, PathBuf};

use crate::error::{InstallError, Result};
use crate::transport::Transport;

/// Fetch a URL into memory
pub async fn fetch_bytes(transport: &dyn Transport, url: &str) -> Result<Vec<u8>> {
    let response = transport.get(url).await?;
    if !response.is_success() {
        return Err(InstallError::download(url, format!("HTTP {}", response.status)));
    }
    Ok(response.body)
}

/// Fetch a URL and write the body to `dest`, creating parent directories
pub async fn fetch_to(transport: &dyn Transport, url: &str, dest: &Path) -> Result<PathBuf> {
    let data = fetch_bytes(transport, url).await?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            InstallError::download(url, format!("cannot create {}: {}", parent.display(), e))
        })?;
    }
    std::fs::write(dest, &data).map_err(|e| {
        InstallError::download(url, format!("cannot write {}: {}", dest.display(), e))
    })?;

    tracing::debug!(url, dest = %dest.display(), bytes = data.len(), "fetched");
    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::transport::Response;

    #[tokio::test]
    async fn test_fetch_to_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new();
        mock.route("https://x.test/card.js", Response::ok("card"));

        let dest = dir.path().join("nested").join("card.js");
        let written = fetch_to(&mock, "https://x.test/card.js", &dest).await.unwrap();

        assert_eq!(written, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"card");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let mock = MockTransport::new();
        mock.route("https://x.test/broken", Response::new(502, "bad gateway"));

        let err = fetch_bytes(&mock, "https://x.test/broken").await.unwrap_err();
        match err {
            InstallError::DownloadFailed { url, message } => {
                assert_eq!(url, "https://x.test/broken");
                assert_eq!(message, "HTTP 502");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_missing_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockTransport::new();

        let dest = dir.path().join("card.js");
        assert!(fetch_to(&mock, "https://x.test/none", &dest).await.is_err());
        assert!(!dest.exists());
    }
}
