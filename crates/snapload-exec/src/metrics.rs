//! Metric hooks.
//!
//! Metrics are plain `trace!` events under a `snapload` span; a subscriber
//! in the binary decides where they go.

use std::time::Instant;

pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::trace_span!("snapload", event);
    let _enter = span.enter();
    for (k, v) in key_values {
        tracing::trace!(%event, key = %k, value = %v, "metric");
    }
}

/// Times one table from extraction start to sink write.
pub struct TableTimer {
    table: String,
    started: Instant,
}

impl TableTimer {
    pub fn start(table: &str) -> Self {
        Self {
            table: table.to_string(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Emit the `table_loaded` metric.
    pub fn finish(self, rows: u64) {
        let elapsed = self.elapsed_ms();
        emit_span(
            "table_loaded",
            &[
                ("table", self.table),
                ("rows", rows.to_string()),
                ("elapsed_ms", elapsed.to_string()),
            ],
        );
    }
}
