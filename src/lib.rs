//! gogdl core library
//!
//! Asset discovery and resumable transfer for titles owned on the GOG
//! catalog: paginated search, manifest resolution, folder naming and
//! byte-range resumable downloads.
//!
//! # Architecture
//!
//! - [`http`] - Client construction with the fixed browser headers
//! - [`auth`] - Credential records, cookie jar and the [`Session`] context
//! - [`config`] - File configuration, platform/language tables, validation
//! - [`catalog`] - Paginated, rate-limited title search and metadata fetch
//! - [`manifest`] - Title metadata and asset resolution
//! - [`naming`] - Folder name templates and path sanitizing
//! - [`transfer`] - Resumable transfer engine and progress tracking

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod http;
pub mod manifest;
pub mod naming;
pub mod transfer;

// Re-export commonly used types
pub use auth::{CookieError, CookieRecord, Session, SessionError, read_cookie_file};
pub use catalog::{CatalogError, Title, enumerate, fetch_metadata};
pub use config::{Language, Platform, Settings, ValidationError};
pub use manifest::{Asset, AssetKind, SchemaError, TitleMetadata, resolve_assets};
pub use naming::folder_name;
pub use transfer::{
    NoopObserver, ProgressObserver, ProgressTracker, TransferEngine, TransferError,
    TransferOutcome,
};
