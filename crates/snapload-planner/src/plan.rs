//! The load planner: table spec + current watermark → query descriptor.
//!
//! Everything here is a pure function of its inputs. The watermark is only
//! read; moving it forward is the orchestrator's job, and only after a fully
//! successful run.

use serde::Serialize;

use snapload_core::query::{QueryDescriptor, SqlQuery};
use snapload_core::table::{LoadType, TableSpec};
use snapload_core::watermark::Watermark;

use crate::error::{PlanError, Result};
use crate::render::render;
use crate::validate::validate_tables;

/// Plan one table.
///
/// - `Full`: no predicate, every row qualifies.
/// - `Incremental`: `incremental_col > current` (strict).
pub fn plan(table: &TableSpec, current: &Watermark) -> Result<QueryDescriptor> {
    match table.load_type {
        LoadType::Full => Ok(QueryDescriptor::full(table.name.clone())),
        LoadType::Incremental => {
            let column = table.watermark_column().ok_or_else(|| {
                PlanError::table(
                    &table.name,
                    "incremental load requires a non-empty incremental_col",
                )
            })?;
            Ok(QueryDescriptor::bounded(
                table.name.clone(),
                column,
                current.clone(),
            ))
        }
    }
}

/// The watermark a successful run will commit: its own start time.
pub fn next_watermark_candidate(run_start: &Watermark) -> Watermark {
    run_start.clone()
}

/// One table's complete plan: spec, descriptor, and rendered query.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedTable {
    pub spec: TableSpec,
    pub descriptor: QueryDescriptor,
    pub query: SqlQuery,
}

/// Validate the whole batch, then plan every table in configured order.
/// Nothing is planned if any table is misconfigured.
pub fn plan_all(tables: &[TableSpec], current: &Watermark) -> Result<Vec<PlannedTable>> {
    validate_tables(tables)?;
    tables
        .iter()
        .map(|spec| {
            let descriptor = plan(spec, current)?;
            let query = render(&descriptor)?;
            Ok(PlannedTable {
                spec: spec.clone(),
                descriptor,
                query,
            })
        })
        .collect()
}
