//! Per-table extraction settings.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadType {
    /// Re-extract the whole table on every run.
    Full,
    /// Extract only rows whose watermark column is newer than the last run.
    Incremental,
}

impl LoadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured table. Field names on disk follow the classic
/// `table_name` / `load_type` / `incremental_col` / `output_file` layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableSpec {
    #[serde(rename = "table_name", alias = "name")]
    pub name: String,

    pub load_type: LoadType,

    #[serde(
        rename = "incremental_col",
        alias = "incremental_column",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub incremental_column: Option<String>,

    #[serde(rename = "output_file", alias = "sink")]
    pub sink: String,
}

impl TableSpec {
    pub fn full(name: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            load_type: LoadType::Full,
            incremental_column: None,
            sink: sink.into(),
        }
    }

    pub fn incremental(
        name: impl Into<String>,
        column: impl Into<String>,
        sink: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            load_type: LoadType::Incremental,
            incremental_column: Some(column.into()),
            sink: sink.into(),
        }
    }

    pub fn is_incremental(&self) -> bool {
        self.load_type == LoadType::Incremental
    }

    /// Watermark column, if set and non-blank.
    pub fn watermark_column(&self) -> Option<&str> {
        self.incremental_column
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
