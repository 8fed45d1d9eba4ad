//! Resource store patching
//!
//! The resource store is a JSON document registering frontend modules. Three
//! layouts are accepted and written back unchanged in shape:
//!
//! - `{"data": {"items": [...]}}` (what the host writes)
//! - `{"data": [...]}`
//! - `{"items": [...]}`
//!
//! Every patch first repairs entries whose `url` holds several newline-joined
//! URLs, then appends missing URLs. Unchanged stores are never rewritten.

use serde_json::{Value, json};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::UiMode;
use crate::error::{InstallError, Result};

/// Storage key of the resource registry
pub const STORE_KEY: &str = "lovelace_resources";

/// Resource type recorded for installed scripts
pub const MODULE_TYPE: &str = "module";

/// Where the entry list lives in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreShape {
    /// `{"data": {"items": [...]}}`
    DataItems,
    /// `{"data": [...]}`
    DataList,
    /// `{"items": [...]}`
    Items,
}

impl StoreShape {
    fn detect(document: &Value) -> Option<Self> {
        let data = document.get("data");
        if data.and_then(|d| d.get("items")).is_some_and(Value::is_array) {
            Some(StoreShape::DataItems)
        } else if data.is_some_and(Value::is_array) {
            Some(StoreShape::DataList)
        } else if document.get("items").is_some_and(Value::is_array) {
            Some(StoreShape::Items)
        } else {
            None
        }
    }

    fn list_mut(self, document: &mut Value) -> Option<&mut Vec<Value>> {
        match self {
            StoreShape::DataItems => document.get_mut("data")?.get_mut("items")?.as_array_mut(),
            StoreShape::DataList => document.get_mut("data")?.as_array_mut(),
            StoreShape::Items => document.get_mut("items")?.as_array_mut(),
        }
    }
}

/// A loaded resource store with its entries lifted into a flat list
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceStore {
    document: Value,
    shape: StoreShape,
    items: Vec<Value>,
}

impl ResourceStore {
    /// A minimal empty store in the host's own layout
    pub fn empty() -> Self {
        Self {
            document: json!({
                "version": 1,
                "minor_version": 1,
                "key": STORE_KEY,
                "data": { "items": [] }
            }),
            shape: StoreShape::DataItems,
            items: Vec::new(),
        }
    }

    /// Parse a store document; `None` when the layout is not recognised
    pub fn from_document(mut document: Value) -> Option<Self> {
        let shape = StoreShape::detect(&document)?;
        let items = std::mem::take(shape.list_mut(&mut document)?);
        Some(Self {
            document,
            shape,
            items,
        })
    }

    pub fn shape(&self) -> StoreShape {
        self.shape
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// URLs of all entries that have one
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(entry_url)
    }

    /// Re-serialize into the shape it was loaded from
    pub fn into_document(self) -> Value {
        let Self {
            mut document,
            shape,
            items,
        } = self;
        if let Some(list) = shape.list_mut(&mut document) {
            *list = items;
        }
        document
    }

    /// Remove entries holding several joined URLs and later duplicates of
    /// an earlier URL; returns the removed count and the split URLs, in order
    pub fn repair(&mut self) -> (usize, Vec<String>) {
        let mut repaired = 0;
        let mut queued = Vec::new();
        let mut seen = HashSet::new();

        self.items.retain(|entry| {
            let Some(url) = entry_url(entry) else {
                return true;
            };

            if let Some(urls) = split_joined_urls(url) {
                tracing::info!(count = urls.len(), "repairing entry with joined URLs");
                repaired += 1;
                queued.extend(urls);
                return false;
            }

            if !seen.insert(url.to_string()) {
                tracing::info!(url, "removing duplicate resource entry");
                repaired += 1;
                return false;
            }

            true
        });

        (repaired, queued)
    }

    /// Repair, then append every URL not already present
    pub fn apply(&mut self, new_urls: &[String]) -> PatchStats {
        let (repaired, queued) = self.repair();
        let mut ids = IdAllocator::for_items(&self.items);
        let mut known: HashSet<String> = self.urls().map(String::from).collect();

        let mut added = 0;
        for url in queued.iter().chain(new_urls) {
            if !known.insert(url.clone()) {
                continue;
            }
            self.items.push(json!({
                "id": ids.next_id(),
                "type": MODULE_TYPE,
                "url": url,
            }));
            added += 1;
        }

        PatchStats { repaired, added }
    }
}

fn entry_url(entry: &Value) -> Option<&str> {
    entry.get("url").and_then(Value::as_str)
}

/// Split a URL field joined by literal or escaped line separators
///
/// Returns `None` when the field holds no separator.
pub fn split_joined_urls(url: &str) -> Option<Vec<String>> {
    let normalized = url
        .replace("\\r\\n", "\n")
        .replace("\\n", "\n")
        .replace("\\r", "\n")
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    if !normalized.contains('\n') {
        return None;
    }

    Some(
        normalized
            .split('\n')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect(),
    )
}

/// Identifier scheme for new entries, fixed once per patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdAllocator {
    /// Integer ids continuing after the highest existing one
    Sequential { next: i64 },
    /// Random 32-character hex ids
    Opaque,
}

impl IdAllocator {
    /// Sequential when any entry has an integer id; opaque otherwise,
    /// including for an empty store
    pub fn for_items(items: &[Value]) -> Self {
        items
            .iter()
            .filter_map(|entry| entry.get("id").and_then(Value::as_i64))
            .max()
            .map(|max| IdAllocator::Sequential {
                next: max.saturating_add(1),
            })
            .unwrap_or(IdAllocator::Opaque)
    }

    pub fn next_id(&mut self) -> Value {
        match self {
            IdAllocator::Sequential { next } => {
                let id = *next;
                *next = next.saturating_add(1);
                Value::from(id)
            }
            IdAllocator::Opaque => Value::from(hex::encode(rand::random::<[u8; 16]>())),
        }
    }
}

/// Counts from one patch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub repaired: usize,
    pub added: usize,
}

impl PatchStats {
    pub fn is_noop(&self) -> bool {
        self.repaired == 0 && self.added == 0
    }
}

/// Terminal state of a patch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// No store and the host registers resources in configuration files
    NotApplicable,
    /// Nothing to repair or add; the file was not touched
    Unchanged,
    /// The store was written
    Patched {
        repaired: usize,
        added: usize,
        created: bool,
        backup: Option<PathBuf>,
    },
}

/// Patch the store at `path` with freshly installed URLs
pub fn patch_store(path: &Path, ui_mode: UiMode, urls: &[String]) -> Result<PatchOutcome> {
    let existed = path.exists();

    let mut store = if existed {
        load_store(path)?
    } else if ui_mode == UiMode::Yaml {
        tracing::info!(
            path = %path.display(),
            "no resource store in file-based UI mode, skipping patch"
        );
        return Ok(PatchOutcome::NotApplicable);
    } else {
        ResourceStore::empty()
    };

    let stats = store.apply(urls);
    if stats.is_noop() {
        tracing::debug!(path = %path.display(), "resource store already up to date");
        return Ok(PatchOutcome::Unchanged);
    }

    let backup = if existed { Some(write_backup(path)?) } else { None };
    write_atomic(path, &store.into_document())?;

    tracing::info!(
        path = %path.display(),
        repaired = stats.repaired,
        added = stats.added,
        "resource store updated"
    );

    Ok(PatchOutcome::Patched {
        repaired: stats.repaired,
        added: stats.added,
        created: !existed,
        backup,
    })
}

/// Load and recognise a store file
pub fn load_store(path: &Path) -> Result<ResourceStore> {
    let unsupported = |message: String| InstallError::UnsupportedFormat {
        path: path.display().to_string(),
        message,
    };

    let content = std::fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content).map_err(|e| unsupported(e.to_string()))?;

    ResourceStore::from_document(document).ok_or_else(|| {
        unsupported("expected a list under data.items, data, or items".to_string())
    })
}

/// Copy the current file to `<name>.bak.<unix timestamp>` beside it
fn write_backup(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| STORE_KEY.to_string());
    let stamp = chrono::Utc::now().timestamp();

    let mut backup = path.with_file_name(format!("{}.bak.{}", file_name, stamp));
    let mut attempt = 1;
    while backup.exists() {
        attempt += 1;
        backup = path.with_file_name(format!("{}.bak.{}-{}", file_name, stamp, attempt));
    }

    std::fs::copy(path, &backup)?;
    Ok(backup)
}

/// Write through a temp file in the same directory, then rename over `path`
fn write_atomic(path: &Path, document: &Value) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(document, &mut serializer)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(&buf)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| InstallError::Io(e.error))?;
    Ok(())
}
