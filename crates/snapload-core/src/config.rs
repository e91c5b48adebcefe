//! Run configuration that downstream crates can serialize/deserialize.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default location of the watermark record, relative to the working dir.
pub const DEFAULT_WATERMARK_PATH: &str = "last_run.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Source location, e.g. `sqlite:///var/data/shop.db` or a bare path.
    pub source_uri: String,

    /// Where the watermark record lives.
    pub watermark_path: String,

    /// Optional directory prepended to relative sink paths.
    pub output_dir: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source_uri: "sqlite://snapload.db".to_string(),
            watermark_path: DEFAULT_WATERMARK_PATH.to_string(),
            output_dir: None,
        }
    }
}

impl RunConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SNAPLOAD_SOURCE_URI`: source location
    /// - `SNAPLOAD_WATERMARK_PATH`: watermark record path
    /// - `SNAPLOAD_OUTPUT_DIR`: base directory for relative sinks
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SNAPLOAD_SOURCE_URI") {
            if !s.trim().is_empty() {
                cfg.source_uri = s;
            }
        }

        if let Ok(s) = std::env::var("SNAPLOAD_WATERMARK_PATH") {
            if !s.trim().is_empty() {
                cfg.watermark_path = s;
            }
        }

        if let Ok(s) = std::env::var("SNAPLOAD_OUTPUT_DIR") {
            if !s.trim().is_empty() {
                cfg.output_dir = Some(s);
            }
        }

        cfg
    }

    /// Scheme of the source URI (`sqlite`, `file`, `memory`, ...), if any.
    pub fn source_scheme(&self) -> Option<&str> {
        source_scheme(&self.source_uri)
    }

    /// Final path of a sink: relative sinks land under `output_dir`.
    pub fn resolve_sink(&self, sink: &str) -> String {
        resolve_sink(self.output_dir.as_deref(), sink)
    }
}

pub fn resolve_sink(output_dir: Option<&str>, sink: &str) -> String {
    match output_dir {
        Some(dir) if Path::new(sink).is_relative() => {
            Path::new(dir).join(sink).to_string_lossy().into_owned()
        }
        _ => sink.to_string(),
    }
}

pub fn source_scheme(uri: &str) -> Option<&str> {
    let (scheme, _) = uri.split_once("://")?;
    let scheme = scheme.trim();
    if scheme.is_empty() {
        None
    } else {
        Some(scheme)
    }
}
