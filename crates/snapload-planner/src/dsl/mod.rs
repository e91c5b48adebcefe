//! Pipeline config files.

pub mod yaml;

use std::fs;
use std::path::Path;

pub use yaml::{
    parse_json_pipeline, parse_yaml_pipeline, ParsedPipeline, Pipeline, PipelineConfig,
};

use crate::error::{PlanError, Result};

/// Read a pipeline file; `.json` is parsed as JSON, anything else as YAML.
pub fn parse_pipeline_file(path: &Path) -> Result<ParsedPipeline> {
    let src = fs::read_to_string(path).map_err(|source| PlanError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        parse_json_pipeline(&src)
    } else {
        parse_yaml_pipeline(&src)
    }
}
