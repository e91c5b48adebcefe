//! In-memory source for tests.
//!
//! Understands exactly the two query shapes the renderer emits:
//! `SELECT * FROM "t"` and `SELECT * FROM "t" WHERE "c" > :watermark`.
//! Clones of a `MemoryConnector` share tables, failure switches and counters.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use snapload_core::query::{SqlQuery, WATERMARK_PARAM};
use snapload_core::types::{RowSet, Scalar};

use crate::error::SourceError;
use crate::source::{Connector, QuerySource};

#[derive(Debug, Default)]
struct Shared {
    tables: Mutex<BTreeMap<String, RowSet>>,
    failing_tables: Mutex<BTreeSet<String>>,
    refuse_connect: AtomicBool,
    opens: AtomicUsize,
    closes: AtomicUsize,
    queries: Mutex<Vec<SqlQuery>>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<Shared>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`put_table`](Self::put_table). A ragged row set is
    /// still stored, and every query against it fails as malformed.
    pub fn with_table(self, name: impl Into<String>, rows: RowSet) -> Self {
        self.shared.tables.lock().unwrap().insert(name.into(), rows);
        self
    }

    /// Insert or replace a table; rows must match the column count.
    pub fn put_table(&self, name: impl Into<String>, rows: RowSet) -> Result<(), SourceError> {
        rows.validate()
            .map_err(|e| SourceError::Malformed(e.to_string()))?;
        self.shared.tables.lock().unwrap().insert(name.into(), rows);
        Ok(())
    }

    /// Append one row to an existing table.
    pub fn push_row(&self, table: &str, row: Vec<Scalar>) -> Result<(), SourceError> {
        let mut tables = self.shared.tables.lock().unwrap();
        let set = tables
            .get_mut(table)
            .ok_or_else(|| SourceError::Query(format!("no such table: {table}")))?;
        set.push_row(row)
            .map_err(|e| SourceError::Malformed(e.to_string()))
    }

    /// Queries against `table` fail until cleared.
    pub fn fail_table(&self, table: impl Into<String>) {
        self.shared.failing_tables.lock().unwrap().insert(table.into());
    }

    pub fn clear_failures(&self) {
        self.shared.failing_tables.lock().unwrap().clear();
        self.shared.refuse_connect.store(false, Ordering::SeqCst);
    }

    /// `connect` fails until cleared.
    pub fn refuse_connections(&self) {
        self.shared.refuse_connect.store(true, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    /// Connections opened and not yet closed.
    pub fn live_connections(&self) -> usize {
        self.open_count().saturating_sub(self.close_count())
    }

    /// Every query executed so far, in order.
    pub fn executed(&self) -> Vec<SqlQuery> {
        self.shared.queries.lock().unwrap().clone()
    }
}

impl Connector for MemoryConnector {
    fn connect(&self) -> Result<Box<dyn QuerySource>, SourceError> {
        if self.shared.refuse_connect.load(Ordering::SeqCst) {
            return Err(SourceError::Open {
                target: self.describe(),
                reason: "connection refused".into(),
            });
        }
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySource {
            shared: Arc::clone(&self.shared),
            open: true,
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

pub struct MemorySource {
    shared: Arc<Shared>,
    open: bool,
}

impl QuerySource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn query(&mut self, query: &SqlQuery) -> Result<RowSet, SourceError> {
        if !self.open {
            return Err(SourceError::Closed);
        }
        self.shared.queries.lock().unwrap().push(query.clone());

        let (table, column) = parse_select(&query.text)?;
        if self.shared.failing_tables.lock().unwrap().contains(&table) {
            return Err(SourceError::Query(format!("injected failure on {table}")));
        }
        let tables = self.shared.tables.lock().unwrap();
        let set = tables
            .get(&table)
            .ok_or_else(|| SourceError::Query(format!("no such table: {table}")))?;
        set.validate()
            .map_err(|e| SourceError::Malformed(format!("{table}: {e}")))?;

        let Some(column) = column else {
            return Ok(set.clone());
        };
        let idx = set
            .column_index(&column)
            .ok_or_else(|| SourceError::Query(format!("no such column: {column}")))?;
        let bound = query.param(WATERMARK_PARAM).ok_or_else(|| {
            SourceError::Query(format!("missing parameter :{WATERMARK_PARAM}"))
        })?;

        let mut out = RowSet::new(set.columns.clone());
        for row in &set.rows {
            if greater_than(&row[idx], bound) {
                out.rows.push(row.clone());
            }
        }
        Ok(out)
    }

    fn close(&mut self) -> Result<(), SourceError> {
        if self.open {
            self.open = false;
            self.shared.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// `value > bound`; a numeric bound given as text compares numerically.
fn greater_than(value: &Scalar, bound: &Scalar) -> bool {
    use std::cmp::Ordering::Greater;
    match (value, bound) {
        (Scalar::I64(_) | Scalar::F64(_), Scalar::Str(s)) => match s.parse::<f64>() {
            Ok(n) => value.sql_cmp(&Scalar::F64(n)) == Some(Greater),
            Err(_) => false,
        },
        _ => value.sql_cmp(bound) == Some(Greater),
    }
}

/// Returns (table, optional predicate column), identifiers unquoted.
fn parse_select(text: &str) -> Result<(String, Option<String>), SourceError> {
    let unsupported = || SourceError::Query(format!("unsupported query: {text}"));
    let rest = text.trim().strip_prefix("SELECT * FROM ").ok_or_else(unsupported)?;
    match rest.split_once(" WHERE ") {
        None => Ok((unquote(rest), None)),
        Some((table, cond)) => {
            let column = cond
                .strip_suffix(&format!(" > :{WATERMARK_PARAM}"))
                .ok_or_else(unsupported)?;
            Ok((unquote(table), Some(unquote(column))))
        }
    }
}

fn unquote(ident: &str) -> String {
    ident
        .trim()
        .split('.')
        .map(|p| p.trim_matches('"'))
        .collect::<Vec<_>>()
        .join(".")
}
