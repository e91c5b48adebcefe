//! Query sources.
//!
//! - `sqlite`: file-backed SQLite through rusqlite.
//! - `memory`: in-process tables for tests, with failure injection.
//!
//! A `Connector` opens one `QuerySource` per run; the orchestrator closes it.

pub mod memory;
pub mod sqlite;

use std::path::PathBuf;

use url::Url;

use snapload_core::config::source_scheme;
use snapload_core::query::SqlQuery;
use snapload_core::types::RowSet;

use crate::error::{ExecError, SourceError};

pub use memory::{MemoryConnector, MemorySource};
pub use sqlite::{SqliteConnector, SqliteSource};

pub trait QuerySource {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Run a rendered query, binding its named parameters.
    fn query(&mut self, query: &SqlQuery) -> Result<RowSet, SourceError>;

    /// Release the underlying connection. Later queries fail.
    fn close(&mut self) -> Result<(), SourceError>;
}

pub trait Connector {
    fn connect(&self) -> Result<Box<dyn QuerySource>, SourceError>;

    fn describe(&self) -> String;
}

/// Pick a connector for a source URI.
///
/// `sqlite://<path>`, `file://<abs path>` and bare paths open SQLite files.
pub fn connector_for_uri(uri: &str) -> Result<Box<dyn Connector>, ExecError> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(ExecError::Config("source uri is empty".into()));
    }
    let scheme = source_scheme(uri).map(|s| s.to_ascii_lowercase());
    match scheme.as_deref() {
        None => Ok(Box::new(SqliteConnector::new(uri))),
        Some("sqlite") => {
            let path = &uri["sqlite://".len()..];
            if path.is_empty() {
                return Err(ExecError::Config(format!("no database path in '{uri}'")));
            }
            Ok(Box::new(SqliteConnector::new(path)))
        }
        Some("file") => {
            let path = file_url_path(uri)?;
            Ok(Box::new(SqliteConnector::new(path)))
        }
        Some(other) => Err(ExecError::Config(format!(
            "unsupported source scheme '{other}' in '{uri}'"
        ))),
    }
}

fn file_url_path(uri: &str) -> Result<PathBuf, ExecError> {
    let url = Url::parse(uri).map_err(|e| ExecError::Config(format!("bad source uri '{uri}': {e}")))?;
    url.to_file_path()
        .map_err(|_| ExecError::Config(format!("'{uri}' does not name a local file")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_dispatch() {
        assert_eq!(
            connector_for_uri("sqlite:///var/data/shop.db").unwrap().describe(),
            "sqlite:/var/data/shop.db"
        );
        assert_eq!(
            connector_for_uri("shop.db").unwrap().describe(),
            "sqlite:shop.db"
        );
        assert_eq!(
            connector_for_uri("SQLITE://rel/shop.db").unwrap().describe(),
            "sqlite:rel/shop.db"
        );
        #[cfg(unix)]
        assert_eq!(
            connector_for_uri("file:///tmp/shop.db").unwrap().describe(),
            "sqlite:/tmp/shop.db"
        );
    }

    #[test]
    fn unsupported_schemes_are_config_errors() {
        for uri in ["postgres://db/shop", "memory://shop", "", "sqlite://"] {
            match connector_for_uri(uri) {
                Err(ExecError::Config(_)) => {}
                Err(e) => panic!("{uri}: unexpected error {e}"),
                Ok(_) => panic!("{uri}: expected a config error"),
            }
        }
    }
}
