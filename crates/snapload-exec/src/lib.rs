#![forbid(unsafe_code)]
//! snapload-exec: query sources, the extraction executor, and the run
//! orchestrator that ties planner, sources, sinks and the watermark store
//! together.
//!
//! Runs are single-threaded and strictly sequential per table. The source is
//! opened once per run and always closed, success or not.

pub mod clock;
pub mod error;
pub mod executor;
pub mod failpoints;
pub mod metrics;
pub mod orchestrator;
pub mod source;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ExecError, ExtractionError, Result, RunFailure, SourceError};
pub use executor::{execute, execute_query};
pub use orchestrator::{Orchestrator, RunReport, RunState};
pub use source::{
    connector_for_uri, Connector, MemoryConnector, MemorySource, QuerySource, SqliteConnector,
    SqliteSource,
};
