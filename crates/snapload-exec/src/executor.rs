//! Extraction executor: run one planned query against the source.
//!
//! No retries. A rejected query or a malformed result is an
//! `ExtractionError` carrying the table name.

use snapload_core::query::{QueryDescriptor, SqlQuery};
use snapload_core::types::RowSet;
use snapload_planner::render;

use crate::error::ExtractionError;
use crate::source::QuerySource;

/// Render `descriptor` and run it.
pub fn execute(
    descriptor: &QueryDescriptor,
    source: &mut dyn QuerySource,
) -> Result<RowSet, ExtractionError> {
    let query = render(descriptor).map_err(|e| ExtractionError {
        table: descriptor.table_name.clone(),
        cause: e.to_string(),
    })?;
    execute_query(&descriptor.table_name, &query, source)
}

/// Run an already rendered query for `table`.
pub fn execute_query(
    table: &str,
    query: &SqlQuery,
    source: &mut dyn QuerySource,
) -> Result<RowSet, ExtractionError> {
    let rows = source.query(query).map_err(|e| ExtractionError {
        table: table.to_string(),
        cause: e.to_string(),
    })?;
    rows.validate().map_err(|e| ExtractionError {
        table: table.to_string(),
        cause: e.to_string(),
    })?;
    Ok(rows)
}
