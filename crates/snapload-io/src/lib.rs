#![forbid(unsafe_code)]
//! snapload-io: everything that touches the local filesystem.
//!
//! - `storage`: durable write-fsync-rename file writes.
//! - `watermark`: the watermark store (file-backed and in-memory).
//! - `writers`: CSV / NDJSON encoders for row sets.
//! - `sink`: per-table snapshot sinks built on the writers.

pub mod error;
pub mod sink;
pub mod storage;
pub mod watermark;
pub mod writers;

pub use error::{Error, Result};
pub use sink::{FileSink, MemorySink, SinkFormat, SinkWriter};
pub use storage::FsStorage;
pub use watermark::{FileWatermarkStore, MemoryWatermarkStore, WatermarkRecord, WatermarkStore};
