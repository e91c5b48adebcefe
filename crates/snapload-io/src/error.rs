use thiserror::Error;

/// Result type local to snapload-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sink '{sink}': {reason}")]
    Sink { sink: String, reason: String },
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}
