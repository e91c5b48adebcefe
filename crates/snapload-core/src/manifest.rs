//! Per-run audit record.
//!
//! The orchestrator emits a manifest for every run, successful or not, so an
//! operator can see which tables were written and whether the watermark moved.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;
use crate::watermark::Watermark;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    Failure,
}

/// What happened to one table in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub table_name: String,
    pub row_count: u64,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    pub fn success(table_name: impl Into<String>, row_count: u64) -> Self {
        Self {
            table_name: table_name.into(),
            row_count,
            outcome: Outcome::Success,
            error: None,
        }
    }

    pub fn failure(table_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            row_count: 0,
            outcome: Outcome::Failure,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: RunId,

    /// Stable hash of the configured table list.
    pub config_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Watermark the run planned against.
    pub previous_watermark: Watermark,

    /// Run start timestamp; becomes the next watermark on success.
    pub run_start: Watermark,

    /// Set only when the run committed.
    pub committed_watermark: Option<Watermark>,

    pub tables: Vec<RunResult>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(
        id: RunId,
        config_hash: Hash256,
        previous_watermark: Watermark,
        run_start: Watermark,
        started_ms: u64,
    ) -> Self {
        Self {
            id,
            config_hash,
            engine_version: crate::VERSION.to_string(),
            previous_watermark,
            run_start,
            committed_watermark: None,
            tables: Vec::new(),
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(
        mut self,
        finished_ms: u64,
        tables: Vec<RunResult>,
        committed_watermark: Option<Watermark>,
    ) -> Self {
        self.finished_ms = finished_ms;
        self.tables = tables;
        self.committed_watermark = committed_watermark;
        self
    }

    pub fn committed(&self) -> bool {
        self.committed_watermark.is_some()
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.row_count).sum()
    }
}
