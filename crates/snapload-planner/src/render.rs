//! Descriptor → SQL with named placeholders.
//!
//! Identifiers cannot be bound as parameters, so they are validated and
//! double-quoted instead. The watermark is always bound as `:watermark`.

use snapload_core::query::{QueryDescriptor, SqlQuery, WATERMARK_PARAM};
use snapload_core::types::Scalar;

use crate::error::{PlanError, Result};
use crate::validate::is_valid_identifier;

/// Quote a (possibly dot-qualified) identifier: `main.orders` → `"main"."orders"`.
pub fn quote_identifier(name: &str) -> Result<String> {
    if !is_valid_identifier(name) {
        return Err(PlanError::Config(format!(
            "'{name}' is not a plain SQL identifier"
        )));
    }
    Ok(name
        .split('.')
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join("."))
}

pub fn render(descriptor: &QueryDescriptor) -> Result<SqlQuery> {
    let table = quote_identifier(&descriptor.table_name)?;
    match &descriptor.predicate {
        None => Ok(SqlQuery::new(format!("SELECT * FROM {table}"))),
        Some(p) => {
            let column = quote_identifier(&p.column)?;
            Ok(SqlQuery::new(format!(
                "SELECT * FROM {table} WHERE {column} > :{WATERMARK_PARAM}"
            ))
            .bind(
                WATERMARK_PARAM,
                Scalar::Str(p.lower_bound_exclusive.as_str().to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapload_core::watermark::Watermark;

    #[test]
    fn full_query_has_no_params() {
        let q = render(&QueryDescriptor::full("countries")).unwrap();
        assert_eq!(q.text, "SELECT * FROM \"countries\"");
        assert!(q.params.is_empty());
    }

    #[test]
    fn incremental_query_is_strict_and_bound() {
        let w = Watermark::parse("2024-01-01 00:00:00").unwrap();
        let q = render(&QueryDescriptor::bounded("orders", "updated_at", w)).unwrap();
        assert_eq!(
            q.text,
            "SELECT * FROM \"orders\" WHERE \"updated_at\" > :watermark"
        );
        assert!(!q.text.contains(">="));
        assert!(!q.text.contains("2024"));
        assert_eq!(
            q.param("watermark"),
            Some(&Scalar::Str("2024-01-01 00:00:00".into()))
        );
    }

    #[test]
    fn qualified_names_are_quoted_per_part() {
        assert_eq!(quote_identifier("main.orders").unwrap(), "\"main\".\"orders\"");
        assert!(quote_identifier("orders\"; --").is_err());
    }
}
