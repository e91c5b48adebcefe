use thiserror::Error;

use snapload_core::watermark::Watermark;
use snapload_planner::PlanError;

use crate::orchestrator::RunReport;

/// Result type local to snapload-exec.
pub type Result<T> = std::result::Result<T, ExecError>;

/// Failures reported by a `QuerySource` or `Connector`.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open '{target}': {reason}")]
    Open { target: String, reason: String },

    #[error("query rejected: {0}")]
    Query(String),

    #[error("malformed result: {0}")]
    Malformed(String),

    #[error("source already closed")]
    Closed,
}

impl From<rusqlite::Error> for SourceError {
    fn from(e: rusqlite::Error) -> Self {
        SourceError::Query(e.to_string())
    }
}

/// One table's query could not be run or its result was unusable.
#[derive(Debug, Error)]
#[error("extraction of '{table}' failed: {cause}")]
pub struct ExtractionError {
    pub table: String,
    pub cause: String,
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("config error: {0}")]
    Config(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("extraction of '{table}' failed: {cause}")]
    Extraction { table: String, cause: String },

    #[error("writing sink for '{table}' failed: {cause}")]
    Sink { table: String, cause: String },

    #[error("watermark changed during the run (expected '{expected}', found '{found}'); not committing")]
    WatermarkConflict { expected: Watermark, found: Watermark },

    #[error("could not persist watermark: {0}")]
    Persist(String),
}

impl ExecError {
    /// Name of the table the failure belongs to, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            ExecError::Extraction { table, .. } | ExecError::Sink { table, .. } => Some(table),
            _ => None,
        }
    }
}

impl From<PlanError> for ExecError {
    fn from(e: PlanError) -> Self {
        ExecError::Config(e.to_string())
    }
}

impl From<ExtractionError> for ExecError {
    fn from(e: ExtractionError) -> Self {
        ExecError::Extraction {
            table: e.table,
            cause: e.cause,
        }
    }
}

/// A run that did not commit. The report still lists what happened per table.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: ExecError,
    pub report: RunReport,
}
