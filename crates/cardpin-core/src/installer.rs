//! Catalog installation
//!
//! Each dependency runs resolve -> fetch -> extract -> decompress on its own.
//! A failure is recorded against that dependency and the run moves on.

use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::archive::{ends_with_ignore_case, extract_script};
use crate::catalog::{Catalog, DependencySpec, is_valid_folder};
use crate::config::{PUBLIC_URL_PREFIX, Settings};
use crate::decompress::decompress_in_place;
use crate::error::{ErrorKind, InstallError, Result};
use crate::fetcher::fetch_to;
use crate::resolver::{ReleaseResolver, Resolution};
use crate::transport::Transport;

/// A script installed under the community asset root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledAsset {
    pub folder: String,
    pub file_name: String,
    /// Always `/hacsfiles/<folder>/<file_name>`
    pub public_url: String,
}

impl InstalledAsset {
    pub fn new(folder: &str, file_name: &str) -> Self {
        Self {
            folder: folder.to_string(),
            file_name: file_name.to_string(),
            public_url: public_url(folder, file_name),
        }
    }
}

/// Public URL of an installed asset
pub fn public_url(folder: &str, file_name: &str) -> String {
    format!("{}/{}/{}", PUBLIC_URL_PREFIX, folder, file_name)
}

/// What happened to one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Installed(InstalledAsset),
    Failed { kind: ErrorKind, message: String },
}

/// Per-dependency result of a run
#[derive(Debug, Clone)]
pub struct InstallationResult {
    pub dependency: DependencySpec,
    pub outcome: Outcome,
}

impl InstallationResult {
    pub fn success(&self) -> bool {
        matches!(self.outcome, Outcome::Installed(_))
    }

    pub fn public_url(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Installed(asset) => Some(&asset.public_url),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            Outcome::Installed(_) => None,
            Outcome::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Aggregate of a whole run, in catalog order
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub results: Vec<InstallationResult>,
}

impl InstallReport {
    /// Public URLs of succeeded dependencies, in catalog order
    pub fn installed_urls(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|r| r.public_url().map(String::from))
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &InstallationResult> {
        self.results.iter().filter(|r| !r.success())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Drives the install pipeline over a catalog
pub struct Installer<'a> {
    transport: &'a dyn Transport,
    settings: &'a Settings,
}

impl<'a> Installer<'a> {
    pub fn new(transport: &'a dyn Transport, settings: &'a Settings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Install every catalog entry, one at a time
    pub async fn install_all(&self, catalog: &Catalog) -> InstallReport {
        let mut report = InstallReport::default();

        for dependency in catalog.iter() {
            let outcome = match self.install(dependency).await {
                Ok(asset) => {
                    tracing::info!(
                        repository = %dependency.repository,
                        url = %asset.public_url,
                        "installed"
                    );
                    Outcome::Installed(asset)
                }
                Err(e) => {
                    tracing::warn!(
                        repository = %dependency.repository,
                        tag = %dependency.tag_label(),
                        folder = %dependency.install_folder,
                        error = %e,
                        "dependency install failed"
                    );
                    Outcome::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    }
                }
            };

            report.results.push(InstallationResult {
                dependency: dependency.clone(),
                outcome,
            });
        }

        report
    }

    /// Install a single dependency
    pub async fn install(&self, dependency: &DependencySpec) -> Result<InstalledAsset> {
        if !is_valid_folder(&dependency.install_folder) {
            return Err(InstallError::InvalidConfig {
                message: format!("unsafe install folder '{}'", dependency.install_folder),
            });
        }
        let pattern = dependency.pattern()?;
        let resolver = ReleaseResolver::new(self.transport, &self.settings.endpoints);
        let resolution = resolver.resolve(dependency, &pattern).await?;

        let folder = self.settings.community_dir.join(&dependency.install_folder);
        std::fs::create_dir_all(&folder)?;

        let artifact = match resolution {
            Resolution::ReleaseAsset { asset, .. } => {
                let file_name = safe_file_name(&asset.name, &asset.download_url)?;
                let dest = folder.join(file_name);
                let path = fetch_to(self.transport, &asset.download_url, &dest).await?;
                if ends_with_ignore_case(file_name, ".zip") {
                    unpack_zip_asset(&path, &folder, &pattern)?
                } else {
                    path
                }
            }
            Resolution::SourceArchive { url, script, .. } => {
                let file_name = safe_file_name(&script.file_name, &url)?;
                let path = folder.join(file_name);
                std::fs::write(&path, &script.data)?;
                path
            }
        };

        let installed = decompress_in_place(&artifact)?;
        let file_name = installed
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| InstallError::ExtractionFailed {
                message: format!("installed path has no file name: {}", installed.display()),
            })?;

        Ok(InstalledAsset::new(&dependency.install_folder, file_name))
    }
}

/// Replace a downloaded zip with the script it contains
fn unpack_zip_asset(zip_path: &Path, folder: &Path, pattern: &Regex) -> Result<PathBuf> {
    let data = std::fs::read(zip_path)?;
    let extracted = extract_script(&data, pattern);
    std::fs::remove_file(zip_path)?;

    let script = extracted?;
    let path = folder.join(safe_file_name(&script.file_name, &zip_path.display().to_string())?);
    std::fs::write(&path, &script.data)?;
    Ok(path)
}

fn safe_file_name<'n>(name: &'n str, source: &str) -> Result<&'n str> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if unsafe_name {
        return Err(InstallError::download(source, format!("refusing unsafe file name '{}'", name)));
    }
    Ok(name)
}
