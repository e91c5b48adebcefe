//! Table spec checks run before any extraction starts.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use snapload_core::table::{LoadType, TableSpec};

use crate::error::{PlanError, Result};

/// `[A-Za-z_][A-Za-z0-9_$]*`, optionally dot-qualified (`schema.table`).
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_valid_part)
}

fn is_valid_part(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

pub fn validate_table(spec: &TableSpec) -> Result<()> {
    let name = spec.name.as_str();
    if name.trim().is_empty() {
        return Err(PlanError::Config("table with empty name".into()));
    }
    if !is_valid_identifier(name) {
        return Err(PlanError::table(name, "table name is not a plain SQL identifier"));
    }
    if spec.sink.trim().is_empty() {
        return Err(PlanError::table(name, "output_file is empty"));
    }

    match (spec.load_type, spec.watermark_column()) {
        (LoadType::Incremental, None) => Err(PlanError::table(
            name,
            "incremental load requires a non-empty incremental_col",
        )),
        (LoadType::Incremental, Some(col)) if !is_valid_identifier(col) => Err(PlanError::table(
            name,
            format!("incremental_col '{col}' is not a plain SQL identifier"),
        )),
        (LoadType::Full, Some(col)) => Err(PlanError::table(
            name,
            format!("full load must not set incremental_col (got '{col}')"),
        )),
        _ => Ok(()),
    }
}

/// Lexical form of a sink path: `.` segments and repeated separators dropped.
/// `..` is kept, so `a/../b` and `b` still count as different sinks.
pub fn normalize_sink(sink: &str) -> PathBuf {
    Path::new(sink.trim())
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Validate every table, then cross-table rules (no shared sinks).
pub fn validate_tables(specs: &[TableSpec]) -> Result<()> {
    let mut sinks: HashMap<PathBuf, &str> = HashMap::new();
    for spec in specs {
        validate_table(spec)?;
        let sink = spec.sink.trim();
        if let Some(other) = sinks.insert(normalize_sink(sink), spec.name.as_str()) {
            return Err(PlanError::table(
                &spec.name,
                format!("output_file '{sink}' is already used by table '{other}'"),
            ));
        }
    }
    Ok(())
}
