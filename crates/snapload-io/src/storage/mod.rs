//! Storage adapters.
//!
//! - `fs`: local filesystem with durable (write-fsync-rename) writes.

mod fs;
pub use fs::FsStorage;
