//! SQLite source.
//!
//! Opens the database read-only; a missing file is a connection error rather
//! than a silently created empty database.

use std::path::{Path, PathBuf};

use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OpenFlags, ToSql};
use tracing::debug;

use snapload_core::query::SqlQuery;
use snapload_core::types::{RowSet, Scalar};

use crate::error::SourceError;
use crate::source::{Connector, QuerySource};

#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connector for SqliteConnector {
    fn connect(&self) -> Result<Box<dyn QuerySource>, SourceError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| SourceError::Open {
            target: self.describe(),
            reason: e.to_string(),
        })?;
        debug!(path = %self.path.display(), "sqlite source opened");
        Ok(Box::new(SqliteSource {
            name: self.describe(),
            conn: Some(conn),
        }))
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

pub struct SqliteSource {
    name: String,
    conn: Option<Connection>,
}

impl SqliteSource {
    /// Wrap an already open connection (tests, in-memory databases).
    pub fn from_connection(name: impl Into<String>, conn: Connection) -> Self {
        Self {
            name: name.into(),
            conn: Some(conn),
        }
    }
}

impl QuerySource for SqliteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&mut self, query: &SqlQuery) -> Result<RowSet, SourceError> {
        let conn = self.conn.as_ref().ok_or(SourceError::Closed)?;
        let mut stmt = conn.prepare(&query.text)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let bound: Vec<(String, Value)> = query
            .params
            .iter()
            .map(|(name, v)| (format!(":{name}"), to_sql_value(v)))
            .collect();
        let params: Vec<(&str, &dyn ToSql)> = bound
            .iter()
            .map(|(name, v)| (name.as_str(), v as &dyn ToSql))
            .collect();

        let mut out = RowSet::new(columns);
        let mut rows = stmt.query(params.as_slice())?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_value_ref(row.get_ref(i)?));
            }
            out.push_row(values)
                .map_err(|e| SourceError::Malformed(e.to_string()))?;
        }
        Ok(out)
    }

    fn close(&mut self) -> Result<(), SourceError> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| SourceError::Query(e.to_string())),
            None => Ok(()),
        }
    }
}

fn to_sql_value(v: &Scalar) -> Value {
    match v {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Integer(i64::from(*b)),
        Scalar::I64(i) => Value::Integer(*i),
        Scalar::F64(f) => Value::Real(*f),
        Scalar::Str(s) => Value::Text(s.clone()),
        Scalar::Bin(b) => Value::Blob(b.clone()),
    }
}

/// SQLite storage classes → `Scalar`.
fn from_value_ref(v: ValueRef<'_>) -> Scalar {
    match v {
        ValueRef::Null => Scalar::Null,
        ValueRef::Integer(i) => Scalar::I64(i),
        ValueRef::Real(f) => Scalar::F64(f),
        ValueRef::Text(t) => Scalar::Str(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Scalar::Bin(b.to_vec()),
    }
}
