//! Per-table snapshot sinks.
//!
//! A sink receives the complete row set of one extraction and replaces
//! whatever the previous run left at that location. Incremental tables get a
//! snapshot of the delta, not an append.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use snapload_core::config::resolve_sink;
use snapload_core::types::RowSet;

use crate::error::{Error, Result};
use crate::storage::FsStorage;
use crate::writers::{encode_csv, encode_jsonl};

pub trait SinkWriter {
    /// Replace the contents of `sink` with `rows`. Returns rows written.
    fn write_table(&self, sink: &str, rows: &RowSet) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    Csv,
    Jsonl,
}

impl SinkFormat {
    /// `.jsonl` / `.ndjson` select NDJSON; everything else is CSV.
    pub fn for_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jsonl") | Some("ndjson") => SinkFormat::Jsonl,
            _ => SinkFormat::Csv,
        }
    }

    pub fn encode(self, rows: &RowSet) -> Result<Vec<u8>> {
        match self {
            SinkFormat::Csv => encode_csv(rows),
            SinkFormat::Jsonl => encode_jsonl(rows),
        }
    }
}

/// Writes snapshots to local files, atomically.
#[derive(Debug, Clone, Default)]
pub struct FileSink {
    output_dir: Option<String>,
    storage: FsStorage,
}

impl FileSink {
    pub fn new(output_dir: Option<String>) -> Self {
        Self {
            output_dir,
            storage: FsStorage::new(),
        }
    }

    /// Where `sink` ends up on disk.
    pub fn resolve(&self, sink: &str) -> PathBuf {
        PathBuf::from(resolve_sink(self.output_dir.as_deref(), sink))
    }
}

impl SinkWriter for FileSink {
    fn write_table(&self, sink: &str, rows: &RowSet) -> Result<u64> {
        let path = self.resolve(sink);
        let format = SinkFormat::for_path(&path);
        let bytes = format.encode(rows).map_err(|e| Error::Sink {
            sink: sink.to_string(),
            reason: e.to_string(),
        })?;
        self.storage
            .write_atomic(&path, &bytes)
            .map_err(|e| Error::Sink {
                sink: sink.to_string(),
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), ?format, rows = rows.num_rows(), "sink written");
        Ok(rows.num_rows() as u64)
    }
}

/// Captures snapshots in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: Arc<Mutex<BTreeMap<String, RowSet>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `sink` fail.
    pub fn fail_on(&self, sink: impl Into<String>) {
        self.failing.lock().unwrap().push(sink.into());
    }

    pub fn get(&self, sink: &str) -> Option<RowSet> {
        self.tables.lock().unwrap().get(sink).cloned()
    }

    pub fn sinks(&self) -> Vec<String> {
        self.tables.lock().unwrap().keys().cloned().collect()
    }
}

impl SinkWriter for MemorySink {
    fn write_table(&self, sink: &str, rows: &RowSet) -> Result<u64> {
        if self.failing.lock().unwrap().iter().any(|s| s == sink) {
            return Err(Error::Sink {
                sink: sink.to_string(),
                reason: "injected write failure".to_string(),
            });
        }
        self.tables
            .lock()
            .unwrap()
            .insert(sink.to_string(), rows.clone());
        Ok(rows.num_rows() as u64)
    }
}
