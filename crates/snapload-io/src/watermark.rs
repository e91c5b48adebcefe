//! Watermark persistence.
//!
//! On-disk shape, shared with other tooling that reads the file directly:
//!
//! ```json
//! {
//!     "last_run_timestamp": "2024-01-01 00:00:00"
//! }
//! ```
//!
//! `load` never fails. Absent or unusable records degrade to the epoch
//! sentinel, which means "extract everything", never to an error.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use snapload_core::watermark::Watermark;

use crate::error::Result;
use crate::storage::FsStorage;

pub trait WatermarkStore {
    /// Last committed watermark, or the epoch sentinel.
    fn load(&self) -> Watermark;

    /// Persist `ts`; durable once this returns `Ok`.
    fn save(&self, ts: &Watermark) -> Result<()>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkRecord {
    pub last_run_timestamp: String,
}

impl WatermarkRecord {
    pub fn new(ts: &Watermark) -> Self {
        Self {
            last_run_timestamp: ts.as_str().to_string(),
        }
    }

    /// Pretty JSON with 4-space indentation.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
        self.serialize(&mut ser)?;
        Ok(out)
    }

    /// Decode and validate a stored record. The error string says why the
    /// record is unusable; callers log it and fall back to the epoch.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Watermark, String> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| format!("not valid JSON: {e}"))?;
        let raw = value
            .get("last_run_timestamp")
            .ok_or_else(|| "missing 'last_run_timestamp'".to_string())?;
        let s = raw
            .as_str()
            .ok_or_else(|| format!("'last_run_timestamp' is not a string: {raw}"))?;
        Watermark::parse(s).map_err(|e| e.to_string())
    }
}

fn load_or_epoch(bytes: Option<&[u8]>, location: &str) -> Watermark {
    match bytes {
        None => {
            info!(store = %location, "no watermark record; starting from epoch");
            Watermark::epoch()
        }
        Some(b) => match WatermarkRecord::decode(b) {
            Ok(w) => w,
            Err(reason) => {
                warn!(store = %location, %reason, "watermark record unusable; falling back to epoch");
                Watermark::epoch()
            }
        },
    }
}

/// File-backed store (default `last_run.json`).
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    path: PathBuf,
    storage: FsStorage,
}

impl FileWatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            storage: FsStorage::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the record so the next `load` returns the epoch.
    pub fn reset(&self) -> Result<()> {
        self.storage.delete(&self.path)
    }
}

impl WatermarkStore for FileWatermarkStore {
    fn load(&self) -> Watermark {
        let location = self.describe();
        match self.storage.read_optional(&self.path) {
            Ok(bytes) => load_or_epoch(bytes.as_deref(), &location),
            Err(e) => {
                warn!(store = %location, error = %e, "watermark record unreadable; falling back to epoch");
                Watermark::epoch()
            }
        }
    }

    fn save(&self, ts: &Watermark) -> Result<()> {
        let bytes = WatermarkRecord::new(ts).encode()?;
        self.storage.write_atomic(&self.path, &bytes)?;
        info!(store = %self.describe(), watermark = %ts, "updated last run timestamp");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store for tests. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryWatermarkStore {
    data: Arc<Mutex<Option<Vec<u8>>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watermark(ts: &Watermark) -> Self {
        let store = Self::new();
        store.set_raw(WatermarkRecord::new(ts).encode().unwrap_or_default());
        store
    }

    /// Seed arbitrary bytes, e.g. a corrupt record.
    pub fn set_raw(&self, bytes: Vec<u8>) {
        *self.data.lock().unwrap() = Some(bytes);
    }

    pub fn raw(&self) -> Option<Vec<u8>> {
        self.data.lock().unwrap().clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl WatermarkStore for MemoryWatermarkStore {
    fn load(&self) -> Watermark {
        let data = self.data.lock().unwrap();
        load_or_epoch(data.as_deref(), "memory")
    }

    fn save(&self, ts: &Watermark) -> Result<()> {
        let bytes = WatermarkRecord::new(ts).encode()?;
        *self.data.lock().unwrap() = Some(bytes);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
