//! Planned extraction queries.
//!
//! A `QueryDescriptor` says *what* to extract; a `SqlQuery` is its rendered,
//! parameterized form. Values never appear in `SqlQuery::text`; they travel
//! in `params` and are bound by the source at execution time.

use serde::{Deserialize, Serialize};

use crate::types::Scalar;
use crate::watermark::Watermark;

/// `column > lower_bound_exclusive`. Strict on purpose: the boundary row was
/// already extracted by the run that produced the watermark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub lower_bound_exclusive: Watermark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub table_name: String,
    pub predicate: Option<Predicate>,
}

impl QueryDescriptor {
    pub fn full(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            predicate: None,
        }
    }

    pub fn bounded(
        table_name: impl Into<String>,
        column: impl Into<String>,
        lower_bound_exclusive: Watermark,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            predicate: Some(Predicate {
                column: column.into(),
                lower_bound_exclusive,
            }),
        }
    }

    pub fn is_full(&self) -> bool {
        self.predicate.is_none()
    }

    /// The bound this descriptor reads from, if any.
    pub fn lower_bound(&self) -> Option<&Watermark> {
        self.predicate.as_ref().map(|p| &p.lower_bound_exclusive)
    }
}

/// Name of the placeholder carrying the watermark lower bound.
pub const WATERMARK_PARAM: &str = "watermark";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlQuery {
    pub text: String,
    /// Named parameters, without the leading `:`.
    pub params: Vec<(String, Scalar)>,
}

impl SqlQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: Scalar) -> Self {
        self.params.push((name.into(), value));
        self
    }

    pub fn param(&self, name: &str) -> Option<&Scalar> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_helpers() {
        let full = QueryDescriptor::full("countries");
        assert!(full.is_full());
        assert!(full.lower_bound().is_none());

        let w = Watermark::parse("2024-01-01 00:00:00").unwrap();
        let inc = QueryDescriptor::bounded("orders", "updated_at", w.clone());
        assert!(!inc.is_full());
        assert_eq!(inc.lower_bound(), Some(&w));
    }

    #[test]
    fn query_params() {
        let q = SqlQuery::new("SELECT 1").bind(WATERMARK_PARAM, Scalar::from("x"));
        assert_eq!(q.param("watermark"), Some(&Scalar::from("x")));
        assert_eq!(q.param("other"), None);
    }
}
