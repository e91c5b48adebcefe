use thiserror::Error;

/// Result type local to snapload-planner.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Everything here is a configuration problem: detected before extraction,
/// never mid-run.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("config error in table '{table}': {reason}")]
    Table { table: String, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config read error for '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PlanError {
    pub(crate) fn table(table: &str, reason: impl Into<String>) -> Self {
        PlanError::Table {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_yaml::Error> for PlanError {
    fn from(e: serde_yaml::Error) -> Self {
        PlanError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(e: serde_json::Error) -> Self {
        PlanError::Parse(e.to_string())
    }
}
