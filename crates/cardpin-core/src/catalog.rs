//! The pinned dependency catalog
//!
//! A catalog is the fixed, ordered list of frontend cards to install. The
//! built-in catalog can be replaced by a JSON file containing a list of
//! `{name?, repository, tag?, folder?, pattern?}` objects.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{InstallError, Result};

/// How a dependency's artifact is located
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// A release (or tag source archive) for a pinned tag
    TaggedRelease { tag: String },
    /// The source archive of the repository's default branch
    DefaultBranchArchive,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::TaggedRelease { tag } => write!(f, "tag {}", tag),
            Strategy::DefaultBranchArchive => f.write_str("default branch"),
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySpec {
    /// Human-readable name
    pub name: String,
    /// `owner/repo` on the source-control host
    pub repository: String,
    /// Folder under the community asset root
    pub install_folder: String,
    /// Regex matched (search semantics) against candidate file names
    pub name_pattern: String,
    pub strategy: Strategy,
}

impl DependencySpec {
    pub fn tagged(
        name: &str,
        repository: &str,
        tag: &str,
        install_folder: &str,
        name_pattern: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            repository: repository.to_string(),
            install_folder: install_folder.to_string(),
            name_pattern: name_pattern.to_string(),
            strategy: Strategy::TaggedRelease {
                tag: tag.to_string(),
            },
        }
    }

    pub fn default_branch(
        name: &str,
        repository: &str,
        install_folder: &str,
        name_pattern: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            repository: repository.to_string(),
            install_folder: install_folder.to_string(),
            name_pattern: name_pattern.to_string(),
            strategy: Strategy::DefaultBranchArchive,
        }
    }

    /// The pinned tag, or `None` for default-branch entries
    pub fn tag(&self) -> Option<&str> {
        match &self.strategy {
            Strategy::TaggedRelease { tag } => Some(tag),
            Strategy::DefaultBranchArchive => None,
        }
    }

    /// Tag label for diagnostics
    pub fn tag_label(&self) -> &str {
        self.tag().unwrap_or("default-branch")
    }

    /// Compile the name pattern
    pub fn pattern(&self) -> Result<Regex> {
        Regex::new(&self.name_pattern).map_err(|e| InstallError::InvalidPattern {
            pattern: self.name_pattern.clone(),
            message: e.to_string(),
        })
    }
}

/// Default pattern for a folder: `<folder>.*\.js(\.gz)?$`
pub fn default_pattern(folder: &str) -> String {
    format!(r"{}.*\.js(\.gz)?$", regex::escape(folder))
}

/// Whether `folder` names a single directory directly under the asset root
pub fn is_valid_folder(folder: &str) -> bool {
    !folder.trim().is_empty()
        && folder != "."
        && folder != ".."
        && !folder.contains(['/', '\\'])
        && !Path::new(folder).is_absolute()
}

/// An ordered list of dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<DependencySpec>,
}

impl Catalog {
    pub fn new(entries: Vec<DependencySpec>) -> Self {
        Self { entries }
    }

    /// The built-in catalog
    pub fn builtin() -> Self {
        const JS: &str = r".*\.js(\.gz)?$";
        let p = |stem: &str| format!("{}{}", stem, JS);

        Self::new(vec![
            DependencySpec::tagged(
                "Mini Graph Card",
                "kalkih/mini-graph-card",
                "v0.13.0",
                "mini-graph-card",
                &p("mini-graph-card"),
            ),
            DependencySpec::tagged(
                "Energy Period Selector Plus",
                "flixlix/energy-period-selector-plus",
                "v0.2.3",
                "energy-period-selector-plus",
                &p("energy-period-selector-plus"),
            ),
            DependencySpec::tagged(
                "Energy Flow Card Plus",
                "flixlix/energy-flow-card-plus",
                "v0.1.2.1",
                "energy-flow-card-plus",
                &p("energy-flow-card-plus"),
            ),
            DependencySpec::tagged(
                "Energy Entity Row",
                "zeronounours/lovelace-energy-entity-row",
                "v1.2.0",
                "lovelace-energy-entity-row",
                &p("energy-entity-row"),
            ),
            DependencySpec::tagged(
                "Power Flow Card Plus",
                "flixlix/power-flow-card-plus",
                "v0.2.6",
                "power-flow-card-plus",
                &p("power-flow-card-plus"),
            ),
            DependencySpec::tagged(
                "Horizon Card",
                "rejuvenate/lovelace-horizon-card",
                "v1.3.0",
                "lovelace-horizon-card",
                &p("lovelace-horizon-card"),
            ),
            DependencySpec::tagged(
                "ApexCharts Card",
                "RomRider/apexcharts-card",
                "v2.1.2",
                "apexcharts-card",
                &p("apexcharts-card"),
            ),
            DependencySpec::tagged(
                "Weather Chart Card",
                "mlamberts78/weather-chart-card",
                "V2.4.11",
                "weather-chart-card",
                &p("weather-chart-card"),
            ),
            DependencySpec::tagged(
                "History Explorer Card",
                "alexarch21/history-explorer-card",
                "v1.0.54",
                "history-explorer-card",
                &p("history-explorer-card"),
            ),
            DependencySpec::tagged(
                "Meteoalarm Card",
                "MrBartusek/MeteoalarmCard",
                "v2.7.2",
                "MeteoalarmCard",
                &p("meteoalarm-card"),
            ),
            DependencySpec::tagged(
                "Atomic Calendar Revive",
                "totaldebug/atomic-calendar-revive",
                "10.0.0",
                "atomic-calendar-revive",
                &p("atomic-calendar-revive"),
            ),
            DependencySpec::default_branch(
                "Card Mod",
                "thomasloven/lovelace-card-mod",
                "lovelace-card-mod",
                &p("card-mod"),
            ),
        ])
    }

    /// Load a catalog file, falling back to the built-in catalog when the
    /// file is missing, unreadable, or yields no entries
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "catalog file not found, using built-in catalog"
            );
            return Self::builtin();
        }

        match Self::load_from(path) {
            Ok(catalog) if !catalog.is_empty() => catalog,
            Ok(_) => {
                tracing::warn!(
                    path = %path.display(),
                    "catalog file has no usable entries, using built-in catalog"
                );
                Self::builtin()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read catalog file, using built-in catalog"
                );
                Self::builtin()
            }
        }
    }

    /// Load a catalog file
    ///
    /// Entries without a `repository` are skipped; a document that is not a
    /// list yields an empty catalog.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let document: serde_json::Value = serde_json::from_str(content)?;
        let Some(items) = document.as_array() else {
            return Ok(Self::new(Vec::new()));
        };

        let entries = items
            .iter()
            .filter_map(|item| serde_json::from_value::<CatalogFileEntry>(item.clone()).ok())
            .filter_map(CatalogFileEntry::into_spec)
            .collect();

        Ok(Self::new(entries))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencySpec> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[DependencySpec] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Entry format accepted in catalog files
#[derive(Debug, Deserialize)]
struct CatalogFileEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
}

impl CatalogFileEntry {
    fn into_spec(self) -> Option<DependencySpec> {
        let repository = self.repository.filter(|r| !r.trim().is_empty())?;
        let folder = self.folder.unwrap_or_else(|| {
            repository
                .rsplit('/')
                .next()
                .unwrap_or(&repository)
                .to_string()
        });
        if !is_valid_folder(&folder) {
            tracing::warn!(
                repository = %repository,
                folder = %folder,
                "skipping catalog entry with unsafe install folder"
            );
            return None;
        }
        let pattern = self.pattern.unwrap_or_else(|| default_pattern(&folder));
        let name = self.name.unwrap_or_else(|| repository.clone());

        let strategy = match self.tag {
            Some(tag) if !tag.trim().is_empty() => Strategy::TaggedRelease { tag },
            _ => Strategy::DefaultBranchArchive,
        };

        Some(DependencySpec {
            name,
            repository,
            install_folder: folder,
            name_pattern: pattern,
            strategy,
        })
    }
}
