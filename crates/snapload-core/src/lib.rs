#![forbid(unsafe_code)]
//! snapload-core: the data model shared by every snapload crate.
//!
//! Pure data and validation only. No database drivers, no filesystem access;
//! those live in `snapload-io` and `snapload-exec`.

pub mod config;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod query;
pub mod table;
pub mod types;
pub mod watermark;

/// Version string recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
