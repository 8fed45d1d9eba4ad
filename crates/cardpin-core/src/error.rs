//! Error types for installation and resource registration

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::transport::REQUEST_TIMEOUT;

/// Installation and patch errors
#[derive(Debug, Error)]
pub enum InstallError {
    // ============ Pipeline Errors ============
    #[error("No usable release asset or source archive for {repository}@{tag}")]
    ResolutionFailed { repository: String, tag: String },

    #[error("Download of {url} failed: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("No script found in archive: {message}")]
    ExtractionFailed { message: String },

    #[error("Failed to decompress {path}: {message}")]
    DecompressionFailed { path: String, message: String },

    // ============ Resource Store Errors ============
    #[error("Unsupported resource store format in {path}: {message}")]
    UnsupportedFormat { path: String, message: String },

    // ============ Configuration Errors ============
    #[error("Invalid name pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for installation operations
pub type Result<T> = std::result::Result<T, InstallError>;

/// Coarse classification of a failed installation, recorded per dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ResolutionFailed,
    DownloadFailed,
    ExtractionFailed,
    DecompressionFailed,
    UnsupportedFormat,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::ResolutionFailed => "resolution failed",
            ErrorKind::DownloadFailed => "download failed",
            ErrorKind::ExtractionFailed => "extraction failed",
            ErrorKind::DecompressionFailed => "decompression failed",
            ErrorKind::UnsupportedFormat => "unsupported format",
        };
        f.write_str(label)
    }
}

impl InstallError {
    /// Map this error onto the kind recorded in an installation result
    pub fn kind(&self) -> ErrorKind {
        match self {
            InstallError::ResolutionFailed { .. }
            | InstallError::InvalidPattern { .. }
            | InstallError::InvalidConfig { .. } => ErrorKind::ResolutionFailed,
            InstallError::DownloadFailed { .. } | InstallError::Io(_) => ErrorKind::DownloadFailed,
            InstallError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            InstallError::DecompressionFailed { .. } => ErrorKind::DecompressionFailed,
            InstallError::UnsupportedFormat { .. } | InstallError::Serialization(_) => {
                ErrorKind::UnsupportedFormat
            }
        }
    }

    pub(crate) fn download(url: &str, message: impl Into<String>) -> Self {
        InstallError::DownloadFailed {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for InstallError {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        let message = if e.is_timeout() {
            format!("timed out after {}s", REQUEST_TIMEOUT.as_secs())
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else if let Some(status) = e.status() {
            format!("HTTP {}", status.as_u16())
        } else {
            e.to_string()
        };
        InstallError::DownloadFailed { url, message }
    }
}

impl From<serde_json::Error> for InstallError {
    fn from(e: serde_json::Error) -> Self {
        InstallError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for InstallError {
    fn from(e: serde_yaml::Error) -> Self {
        InstallError::Serialization(e.to_string())
    }
}

impl From<zip::result::ZipError> for InstallError {
    fn from(e: zip::result::ZipError) -> Self {
        InstallError::ExtractionFailed {
            message: e.to_string(),
        }
    }
}

impl From<url::ParseError> for InstallError {
    fn from(e: url::ParseError) -> Self {
        InstallError::InvalidConfig {
            message: format!("invalid URL: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = InstallError::ResolutionFailed {
            repository: "kalkih/mini-graph-card".to_string(),
            tag: "v0.13.0".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::ResolutionFailed);
        assert!(err.to_string().contains("kalkih/mini-graph-card@v0.13.0"));

        let io = InstallError::from(std::io::Error::other("disk full"));
        assert_eq!(io.kind(), ErrorKind::DownloadFailed);

        let zip = InstallError::from(zip::result::ZipError::FileNotFound);
        assert_eq!(zip.kind(), ErrorKind::ExtractionFailed);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::DecompressionFailed.to_string(), "decompression failed");
    }
}
