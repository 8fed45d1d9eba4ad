//! Release resolution
//!
//! For a pinned tag the resolver tries, in order:
//!
//! 1. The release for each tag variant (`v1.0` -> `v1.0`, `V1.0`, `1.0`),
//!    picking an asset by the preference chain in [`select_asset`]
//! 2. The tag source archive for each variant, handed straight to the
//!    extractor
//!
//! Default-branch entries skip releases entirely and extract from the branch
//! archive.

use regex::Regex;
use serde::Deserialize;

use crate::archive::{ExtractedScript, ends_with_ignore_case, extract_script};
use crate::catalog::{DependencySpec, Strategy};
use crate::config::Endpoints;
use crate::error::{InstallError, Result};
use crate::fetcher::fetch_bytes;
use crate::transport::Transport;

/// Branch used when repository metadata cannot be read
pub const FALLBACK_BRANCH: &str = "main";

/// A downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    default_branch: Option<String>,
}

/// Where a dependency's script comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A release asset, still to be downloaded
    ReleaseAsset { tag: String, asset: ReleaseAsset },
    /// A script already extracted from a source archive
    SourceArchive {
        reference: String,
        url: String,
        script: ExtractedScript,
    },
}

impl Resolution {
    /// The URL the artifact was (or will be) fetched from
    pub fn url(&self) -> &str {
        match self {
            Resolution::ReleaseAsset { asset, .. } => &asset.download_url,
            Resolution::SourceArchive { url, .. } => url,
        }
    }
}

/// Tag spellings to try, in order, without duplicates
///
/// `v0.13.0` -> `v0.13.0`, `V0.13.0`, `0.13.0`;
/// `V2.4.11` -> `V2.4.11`, `v2.4.11`, `2.4.11`;
/// `10.0.0` -> `10.0.0`, `v10.0.0`, `V10.0.0`.
pub fn tag_variants(tag: &str) -> Vec<String> {
    let candidates = if let Some(rest) = tag.strip_prefix('v') {
        vec![tag.to_string(), format!("V{}", rest), rest.to_string()]
    } else if let Some(rest) = tag.strip_prefix('V') {
        vec![tag.to_string(), format!("v{}", rest), rest.to_string()]
    } else {
        vec![tag.to_string(), format!("v{}", tag), format!("V{}", tag)]
    };

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// Choose a release asset
///
/// Preference: name matches the pattern, then any `.js`, any `.js.gz`, any
/// `.zip`, and finally the first listed asset.
pub fn select_asset<'a>(assets: &'a [ReleaseAsset], pattern: &Regex) -> Option<&'a ReleaseAsset> {
    let by_pattern = |a: &ReleaseAsset| pattern.is_match(&a.name);
    let by_js = |a: &ReleaseAsset| ends_with_ignore_case(&a.name, ".js");
    let by_js_gz = |a: &ReleaseAsset| ends_with_ignore_case(&a.name, ".js.gz");
    let by_zip = |a: &ReleaseAsset| ends_with_ignore_case(&a.name, ".zip");

    let rules: [&dyn Fn(&ReleaseAsset) -> bool; 4] = [&by_pattern, &by_js, &by_js_gz, &by_zip];

    rules
        .iter()
        .find_map(|rule| assets.iter().find(|a| rule(*a)))
        .or_else(|| assets.first())
}

/// Resolves catalog entries against the source-control host
pub struct ReleaseResolver<'a> {
    transport: &'a dyn Transport,
    endpoints: &'a Endpoints,
}

impl<'a> ReleaseResolver<'a> {
    pub fn new(transport: &'a dyn Transport, endpoints: &'a Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Resolve a catalog entry with its compiled pattern
    pub async fn resolve(&self, spec: &DependencySpec, pattern: &Regex) -> Result<Resolution> {
        match &spec.strategy {
            Strategy::TaggedRelease { tag } => {
                self.resolve_tag(&spec.repository, tag, pattern).await
            }
            Strategy::DefaultBranchArchive => {
                self.resolve_default_branch(&spec.repository, pattern).await
            }
        }
    }

    /// Resolve a pinned tag: releases first, then tag source archives
    pub async fn resolve_tag(
        &self,
        repository: &str,
        tag: &str,
        pattern: &Regex,
    ) -> Result<Resolution> {
        let variants = tag_variants(tag);

        for variant in &variants {
            if let Some(asset) = self.release_asset(repository, variant, pattern).await {
                tracing::debug!(
                    repository,
                    tag = %variant,
                    asset = %asset.name,
                    "selected release asset"
                );
                return Ok(Resolution::ReleaseAsset {
                    tag: variant.clone(),
                    asset,
                });
            }
        }

        for variant in &variants {
            let url = self.endpoints.tag_archive(repository, variant);
            if let Some(script) = self.archive_script(&url, pattern).await {
                tracing::debug!(
                    repository,
                    tag = %variant,
                    entry = %script.entry_path,
                    "selected script from tag archive"
                );
                return Ok(Resolution::SourceArchive {
                    reference: variant.clone(),
                    url,
                    script,
                });
            }
        }

        Err(InstallError::ResolutionFailed {
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Resolve from the default branch's source archive
    pub async fn resolve_default_branch(
        &self,
        repository: &str,
        pattern: &Regex,
    ) -> Result<Resolution> {
        let branch = self.default_branch(repository).await;
        let url = self.endpoints.branch_archive(repository, &branch);

        let archive = fetch_bytes(self.transport, &url).await?;
        let script = extract_script(&archive, pattern)?;

        tracing::debug!(
            repository,
            branch = %branch,
            entry = %script.entry_path,
            "selected script from branch archive"
        );
        Ok(Resolution::SourceArchive {
            reference: branch,
            url,
            script,
        })
    }

    /// Default branch name, failing open to [`FALLBACK_BRANCH`]
    pub async fn default_branch(&self, repository: &str) -> String {
        let url = self.endpoints.repository(repository);
        let info = match fetch_bytes(self.transport, &url).await {
            Ok(body) => serde_json::from_slice::<RepositoryInfo>(&body).ok(),
            Err(e) => {
                tracing::debug!(repository, error = %e, "repository metadata unavailable");
                None
            }
        };

        info.and_then(|i| i.default_branch)
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| FALLBACK_BRANCH.to_string())
    }

    async fn release_asset(
        &self,
        repository: &str,
        tag: &str,
        pattern: &Regex,
    ) -> Option<ReleaseAsset> {
        let url = self.endpoints.release_by_tag(repository, tag);

        let response = match self.transport.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(repository, tag, error = %e, "release lookup failed");
                return None;
            }
        };

        if response.is_not_found() {
            tracing::debug!(repository, tag, "no release for tag");
            return None;
        }
        if !response.is_success() {
            tracing::warn!(
                repository,
                tag,
                status = response.status,
                "release lookup returned an error status"
            );
            return None;
        }

        let release: Release = match serde_json::from_slice(&response.body) {
            Ok(release) => release,
            Err(e) => {
                tracing::warn!(repository, tag, error = %e, "unreadable release metadata");
                return None;
            }
        };

        select_asset(&release.assets, pattern).cloned()
    }

    async fn archive_script(&self, url: &str, pattern: &Regex) -> Option<ExtractedScript> {
        let archive = match fetch_bytes(self.transport, url).await {
            Ok(archive) => archive,
            Err(e) => {
                tracing::debug!(url, error = %e, "source archive unavailable");
                return None;
            }
        };

        match extract_script(&archive, pattern) {
            Ok(script) => Some(script),
            Err(e) => {
                tracing::debug!(url, error = %e, "no script in source archive");
                None
            }
        }
    }
}
