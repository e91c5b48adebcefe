//! Pipeline document → table list plus run-level overrides.
//!
//! Example:
//! ```yaml
//! source:
//!   uri: "sqlite:///var/data/shop.db"
//! watermark:
//!   path: "state/last_run.json"
//! output_dir: "out"
//! tables:
//!   - table_name: orders
//!     load_type: incremental
//!     incremental_col: updated_at
//!     output_file: orders.csv
//!   - table_name: countries
//!     load_type: full
//!     output_file: countries.csv
//! ```
//!
//! The same document shape is accepted as JSON. Unknown top-level keys (such
//! as a legacy `database` block) are ignored.

use serde::{Deserialize, Serialize};

use snapload_core::table::TableSpec;

use crate::error::{PlanError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub source: Option<SourceSection>,
    #[serde(default)]
    pub watermark: Option<WatermarkSection>,
    #[serde(default)]
    pub output_dir: Option<String>,
    pub tables: Vec<TableSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkSection {
    pub path: String,
}

/// Run-level settings a pipeline file may override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_uri: Option<String>,
    pub watermark_path: Option<String>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub tables: Vec<TableSpec>,
    pub config: PipelineConfig,
}

impl From<Pipeline> for ParsedPipeline {
    fn from(doc: Pipeline) -> Self {
        ParsedPipeline {
            tables: doc.tables,
            config: PipelineConfig {
                source_uri: doc.source.map(|s| s.uri),
                watermark_path: doc.watermark.map(|w| w.path),
                output_dir: doc.output_dir,
            },
        }
    }
}

/// Parse a YAML pipeline document. Only syntax is checked here; run
/// `validate_tables` for the per-table rules.
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<ParsedPipeline> {
    if yaml_src.trim().is_empty() {
        return Err(PlanError::Parse("empty pipeline document".into()));
    }
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;
    Ok(doc.into())
}

/// Parse a JSON pipeline document (the classic `config.json` layout).
pub fn parse_json_pipeline(json_src: &str) -> Result<ParsedPipeline> {
    let doc: Pipeline = serde_json::from_str(json_src)?;
    Ok(doc.into())
}
