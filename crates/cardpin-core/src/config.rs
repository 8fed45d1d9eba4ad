//! Installer configuration
//!
//! Paths are derived from the host configuration directory:
//!
//! - `<config>/www/community/<folder>/` - installed assets
//! - `<config>/.storage/lovelace_resources` - resource store
//! - `<config>/configuration.yaml` - consulted for the UI mode

use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{InstallError, Result};

/// Default host configuration directory
pub const DEFAULT_CONFIG_DIR: &str = "/config";

/// Public URL prefix under which community assets are served
pub const PUBLIC_URL_PREFIX: &str = "/hacsfiles";

/// Base URLs of the source-control host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// REST API base (release and repository metadata)
    pub api_base: String,
    /// Web base (source archive downloads)
    pub web_base: String,
}

impl Endpoints {
    pub fn new(api_base: &str, web_base: &str) -> Result<Self> {
        Ok(Self {
            api_base: normalize_base(api_base)?,
            web_base: normalize_base(web_base)?,
        })
    }

    /// Release metadata for a tag
    pub fn release_by_tag(&self, repository: &str, tag: &str) -> String {
        format!("{}/repos/{}/releases/tags/{}", self.api_base, repository, tag)
    }

    /// Repository metadata (default branch)
    pub fn repository(&self, repository: &str) -> String {
        format!("{}/repos/{}", self.api_base, repository)
    }

    /// Source archive of a tag
    pub fn tag_archive(&self, repository: &str, tag: &str) -> String {
        format!("{}/{}/archive/refs/tags/{}.zip", self.web_base, repository, tag)
    }

    /// Source archive of a branch
    pub fn branch_archive(&self, repository: &str, branch: &str) -> String {
        format!("{}/{}/archive/refs/heads/{}.zip", self.web_base, repository, branch)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            web_base: "https://github.com".to_string(),
        }
    }
}

fn normalize_base(base: &str) -> Result<String> {
    let parsed = Url::parse(base)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(InstallError::InvalidConfig {
            message: format!("unsupported URL scheme in {}", base),
        });
    }
    Ok(base.trim_end_matches('/').to_string())
}

/// How the host UI registers resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// Resources live in the mutable storage document
    Storage,
    /// Resources are declared in configuration files
    Yaml,
}

/// Resolved installer settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub community_dir: PathBuf,
    pub store_path: PathBuf,
    pub host_config_path: PathBuf,
    /// Force file-based UI mode regardless of the host configuration
    pub force_yaml_mode: bool,
    pub endpoints: Endpoints,
    pub github_token: Option<String>,
}

impl Settings {
    /// Derive all paths from a host configuration directory
    pub fn for_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            community_dir: config_dir.join("www").join("community"),
            store_path: config_dir.join(".storage").join("lovelace_resources"),
            host_config_path: config_dir.join("configuration.yaml"),
            config_dir,
            force_yaml_mode: false,
            endpoints: Endpoints::default(),
            github_token: None,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_yaml_mode(mut self, force: bool) -> Self {
        self.force_yaml_mode = force;
        self
    }

    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Effective UI mode
    pub fn ui_mode(&self) -> UiMode {
        if self.force_yaml_mode {
            return UiMode::Yaml;
        }
        detect_ui_mode(&self.host_config_path)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_config_dir(DEFAULT_CONFIG_DIR)
    }
}

/// Inspect the host configuration for `lovelace: { mode: yaml }`
///
/// A missing or unparseable file means storage mode.
pub fn detect_ui_mode(host_config: &Path) -> UiMode {
    let content = match std::fs::read_to_string(host_config) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(
                path = %host_config.display(),
                error = %e,
                "host configuration not readable"
            );
            return UiMode::Storage;
        }
    };

    let document: serde_yaml::Value = match serde_yaml::from_str(&content) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(
                path = %host_config.display(),
                error = %e,
                "failed to parse host configuration, assuming storage mode"
            );
            return UiMode::Storage;
        }
    };

    let lovelace = &document["lovelace"];
    let is_yaml = ["mode", "resource_mode"]
        .iter()
        .any(|key| lovelace[*key].as_str().is_some_and(|v| v.eq_ignore_ascii_case("yaml")));

    if is_yaml { UiMode::Yaml } else { UiMode::Storage }
}
