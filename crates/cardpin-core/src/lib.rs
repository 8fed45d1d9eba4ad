//! Cardpin Core - Pinned frontend card installation for Home Assistant
//!
//! This crate holds everything between a catalog of pinned card releases and
//! a registered, servable script:
//! - `Catalog`: the list of dependencies and how to fetch each one
//! - `ReleaseResolver`: release asset lookup with tag variants and archive fallback
//! - `Installer`: the sequential resolve, fetch, extract, decompress pipeline
//! - `patch_store`: idempotent registration in the resource store
//! - `Transport`: the HTTP seam, with `HttpTransport` and `MockTransport`

pub mod archive;
pub mod catalog;
pub mod config;
pub mod decompress;
pub mod error;
pub mod fetcher;
pub mod installer;
pub mod mock;
pub mod resolver;
pub mod store;
pub mod transport;

pub use catalog::{Catalog, DependencySpec, Strategy};
pub use config::{Endpoints, Settings, UiMode};
pub use error::{ErrorKind, InstallError, Result};
pub use installer::{InstallReport, InstallationResult, InstalledAsset, Installer, Outcome};
pub use mock::MockTransport;
pub use resolver::{ReleaseResolver, Resolution};
pub use store::{PatchOutcome, ResourceStore, StoreShape, patch_store};
pub use transport::{HttpTransport, Response, ScopedToken, Transport};
