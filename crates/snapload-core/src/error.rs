use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid watermark '{value}': expected format YYYY-MM-DD HH:MM:SS")]
    Watermark { value: String },

    #[error("Malformed row set: {0}")]
    RowSet(String),

    #[error("Hashing error: {0}")]
    Hash(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
