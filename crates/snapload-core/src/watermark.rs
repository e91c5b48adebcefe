//! The extraction watermark: a fixed-format, lexically sortable timestamp.
//!
//! The string form is the source of truth. A `Watermark` only exists if its
//! string parses with [`WATERMARK_FORMAT`], and it is never reformatted, so a
//! persisted value round-trips byte for byte.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// chrono format of every watermark (`YYYY-MM-DD HH:MM:SS`).
pub const WATERMARK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Value used when nothing was ever committed, or the stored one is unusable.
pub const EPOCH_WATERMARK: &str = "2000-01-01 00:00:00";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Watermark(String);

impl Watermark {
    /// Validate and wrap a timestamp string.
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        // chrono tolerates padding and sign variations; only the canonical
        // rendering keeps lexical order equal to chronological order.
        let canonical = NaiveDateTime::parse_from_str(&s, WATERMARK_FORMAT)
            .ok()
            .map(|dt| dt.format(WATERMARK_FORMAT).to_string());
        if canonical.as_deref() != Some(s.as_str()) {
            return Err(Error::Watermark { value: s });
        }
        Ok(Self(s))
    }

    pub fn epoch() -> Self {
        Self(EPOCH_WATERMARK.to_string())
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self(dt.format(WATERMARK_FORMAT).to_string())
    }

    pub fn is_epoch(&self) -> bool {
        self.0 == EPOCH_WATERMARK
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.0, WATERMARK_FORMAT).ok()
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::epoch()
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Watermark {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Watermark> for String {
    fn from(w: Watermark) -> Self {
        w.0
    }
}

impl std::str::FromStr for Watermark {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
