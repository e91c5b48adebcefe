//! Lightweight row values passed from sources to sinks.
//!
//! Row-major on purpose: sources produce rows one at a time and sinks write
//! them one at a time, so there is nothing to gain from a columnar layout.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Text form used by flat-file sinks. Nulls render as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::I64(i) => i.to_string(),
            Scalar::F64(f) => f.to_string(),
            Scalar::Str(s) => s.clone(),
            Scalar::Bin(b) => b.iter().map(|x| format!("{:02x}", x)).collect(),
        }
    }

    /// SQL-style comparison: `None` when either side is null or the types
    /// cannot be compared. Numbers compare numerically across I64/F64.
    pub fn sql_cmp(&self, other: &Scalar) -> Option<Ordering> {
        use Scalar::*;
        match (self, other) {
            (Null, _) | (_, Null) => None,
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (I64(a), I64(b)) => Some(a.cmp(b)),
            (I64(a), F64(b)) => (*a as f64).partial_cmp(b),
            (F64(a), I64(b)) => a.partial_cmp(&(*b as f64)),
            (F64(a), F64(b)) => a.partial_cmp(b),
            (Str(a), Str(b)) => Some(a.cmp(b)),
            (Bin(a), Bin(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("NULL"),
            Scalar::Str(s) => write!(f, "'{}'", s),
            other => f.write_str(&other.to_text()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::I64(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::F64(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// Result of one extraction: column names plus rows in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Result<Self> {
        let set = Self { columns, rows };
        set.validate()?;
        Ok(set)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, rejecting it if its width does not match the header.
    pub fn push_row(&mut self, row: Vec<Scalar>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::RowSet(format!(
                "row has {} values but there are {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Check that every row is as wide as the header.
    pub fn validate(&self) -> Result<()> {
        let width = self.columns.len();
        if let Some((idx, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != width)
        {
            return Err(Error::RowSet(format!(
                "row {} has {} values but there are {} columns",
                idx,
                row.len(),
                width
            )));
        }
        Ok(())
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Scalar>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }
}
