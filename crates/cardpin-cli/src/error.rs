//! CLI error types with exit code handling

use cardpin_core::InstallError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// One or more catalog entries could not be installed
    #[error("{failed} of {total} dependencies failed to install")]
    #[diagnostic(
        code(cardpin::cli::dependencies),
        help("Install the listed cards manually, then run the installer again to register them")
    )]
    DependenciesFailed { failed: usize, total: usize },

    /// The resource store could not be patched
    #[error("Resource store not updated: {message}")]
    #[diagnostic(code(cardpin::cli::store))]
    Store {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid flags or settings
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(cardpin::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(cardpin::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(cardpin::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::DependenciesFailed { .. } => exit_codes::DEPENDENCY_FAILED,
            CliError::Store { .. } => exit_codes::ERROR,
            CliError::Config { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn dependencies_failed(failed: usize, total: usize) -> Self {
        Self::DependenciesFailed { failed, total }
    }

    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<InstallError> for CliError {
    fn from(err: InstallError) -> Self {
        match err {
            InstallError::InvalidConfig { message } => {
                CliError::config_with_help(message, "Endpoint bases must be absolute http(s) URLs")
            }
            InstallError::UnsupportedFormat { .. } => CliError::Store {
                message: err.to_string(),
                help: Some("Fix or remove the resource store file, then run again".to_string()),
            },
            InstallError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::Other {
                message: other.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::dependencies_failed(3, 12).exit_code(), 2);
        assert_eq!(CliError::config_with_help("bad", "fix it").exit_code(), 64);
        assert_eq!(CliError::from(std::io::Error::other("denied")).exit_code(), 5);
    }

    #[test]
    fn test_install_error_mapping() {
        let config = CliError::from(InstallError::InvalidConfig {
            message: "unsupported URL scheme".to_string(),
        });
        assert!(matches!(config, CliError::Config { .. }));

        let store = CliError::from(InstallError::UnsupportedFormat {
            path: "/config/.storage/lovelace_resources".to_string(),
            message: "expected a list".to_string(),
        });
        assert!(matches!(store, CliError::Store { .. }));
        assert!(store.to_string().contains("lovelace_resources"));
    }

    #[test]
    fn test_dependency_failure_message() {
        let err = CliError::dependencies_failed(12, 12);
        assert_eq!(err.to_string(), "12 of 12 dependencies failed to install");
    }
}
