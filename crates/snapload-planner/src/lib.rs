#![forbid(unsafe_code)]
//! snapload-planner: config file → validated table list → per-table
//! `QueryDescriptor` → parameterized `SqlQuery`.
//!
//! Design:
//! - `dsl` reads the YAML/JSON pipeline file into `TableSpec`s plus
//!   run-level overrides.
//! - `validate` rejects inconsistent table specs up front, so a bad config
//!   never gets as far as opening the source.
//! - `plan` is the load planner proper: pure, watermark in, descriptor out.
//! - `render` turns a descriptor into SQL text with named placeholders.
//!
//! NOTE: No IO beyond reading the config file; no database access here.

pub mod dsl;
pub mod error;
pub mod plan;
pub mod render;
pub mod validate;

pub use dsl::{parse_json_pipeline, parse_pipeline_file, parse_yaml_pipeline, ParsedPipeline, PipelineConfig};
pub use error::{PlanError, Result};
pub use plan::{next_watermark_candidate, plan, plan_all, PlannedTable};
pub use render::{quote_identifier, render};
pub use validate::{is_valid_identifier, normalize_sink, validate_table, validate_tables};
