//! Run orchestrator.
//!
//! One run: capture the start time, load the watermark, plan every table,
//! open the source once, extract and write each table in order, and only
//! then move the watermark to the captured start time. Any failure leaves the
//! watermark where it was.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use snapload_core::hash::hash_serde;
use snapload_core::manifest::{RunId, RunManifest, RunResult};
use snapload_core::table::TableSpec;
use snapload_core::watermark::Watermark;
use snapload_io::{SinkWriter, WatermarkStore};
use snapload_planner::{next_watermark_candidate, plan_all, PlannedTable};

use crate::clock::{unix_millis, Clock, SystemClock};
use crate::error::{ExecError, RunFailure};
use crate::executor::execute_query;
use crate::metrics::{emit_span, TableTimer};
use crate::source::{Connector, QuerySource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "table", rename_all = "snake_case")]
pub enum RunState {
    Start,
    LoadingConfig,
    Planning(String),
    Extracting(String),
    Writing(String),
    CommittingWatermark,
    Done,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: Watermark,
    pub previous_watermark: Watermark,
    pub committed_watermark: Option<Watermark>,
    pub results: Vec<RunResult>,
    pub states: Vec<RunState>,
    pub manifest: RunManifest,
}

impl RunReport {
    pub fn committed(&self) -> bool {
        self.committed_watermark.is_some()
    }

    pub fn total_rows(&self) -> u64 {
        self.results.iter().map(|r| r.row_count).sum()
    }
}

/// Closes the source on every exit path.
struct SourceGuard {
    source: Option<Box<dyn QuerySource>>,
}

impl SourceGuard {
    fn new(source: Box<dyn QuerySource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    fn get(&mut self) -> Result<&mut dyn QuerySource, ExecError> {
        match self.source.as_mut() {
            Some(s) => Ok(s.as_mut()),
            None => Err(ExecError::Connection("source already closed".into())),
        }
    }

    fn close(&mut self) {
        if let Some(mut source) = self.source.take() {
            match source.close() {
                Ok(()) => debug!(source = source.name(), "source closed"),
                Err(e) => warn!(source = source.name(), error = %e, "closing source failed"),
            }
        }
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.close();
    }
}

/// Per-run bookkeeping shared by the success and failure paths.
struct RunLog {
    run_id: RunId,
    started_at: Watermark,
    previous_watermark: Watermark,
    results: Vec<RunResult>,
    states: Vec<RunState>,
    manifest: RunManifest,
}

impl RunLog {
    fn enter(&mut self, state: RunState) {
        debug!(run = %self.run_id, ?state, "run state");
        self.states.push(state);
    }

    fn finish(mut self, committed: Option<Watermark>) -> RunReport {
        self.enter(if committed.is_some() {
            RunState::Done
        } else {
            RunState::Failed
        });
        let manifest = self
            .manifest
            .finish(unix_millis(), self.results.clone(), committed.clone());
        RunReport {
            run_id: self.run_id,
            started_at: self.started_at,
            previous_watermark: self.previous_watermark,
            committed_watermark: committed,
            results: self.results,
            states: self.states,
            manifest,
        }
    }

    fn fail(self, error: ExecError) -> RunFailure {
        error!(run = %self.run_id, error = %error, "run failed; watermark not advanced");
        RunFailure {
            error,
            report: self.finish(None),
        }
    }
}

pub struct Orchestrator {
    tables: Vec<TableSpec>,
    clock: Box<dyn Clock>,
}

impl Orchestrator {
    pub fn new(tables: Vec<TableSpec>) -> Self {
        Self {
            tables,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Execute one run. `Err` means the watermark was not advanced.
    ///
    /// Before committing, the stored watermark is re-read and the run fails
    /// with [`ExecError::WatermarkConflict`] if another run moved it. That
    /// check is best-effort, not a lock: concurrent runs need an external mutex.
    pub fn run(
        &self,
        store: &dyn WatermarkStore,
        connector: &dyn Connector,
        sink: &dyn SinkWriter,
    ) -> Result<RunReport, RunFailure> {
        let run_id = RunId::new();
        let started_at = self.clock.now();
        let started_ms = unix_millis();
        info!(run = %run_id, start = %started_at, tables = self.tables.len(), "run started");

        let previous = store.load();
        let config_hash = hash_serde(&self.tables).unwrap_or_else(|e| {
            warn!(error = %e, "could not hash table list");
            snapload_core::hash::hash_bytes(&[])
        });
        let mut log = RunLog {
            run_id,
            started_at: started_at.clone(),
            previous_watermark: previous.clone(),
            results: Vec::with_capacity(self.tables.len()),
            states: vec![RunState::Start],
            manifest: RunManifest::new(
                run_id,
                config_hash,
                previous.clone(),
                started_at.clone(),
                started_ms,
            ),
        };
        info!(store = %store.describe(), watermark = %previous, "loaded watermark");

        log.enter(RunState::LoadingConfig);
        let planned = match plan_all(&self.tables, &previous) {
            Ok(p) => p,
            Err(e) => return Err(log.fail(e.into())),
        };

        let mut guard = match connector.connect() {
            Ok(source) => SourceGuard::new(source),
            Err(e) => return Err(log.fail(ExecError::Connection(e.to_string()))),
        };
        info!(source = %connector.describe(), "source connected");

        for table in &planned {
            if let Err(e) = self.load_table(table, &mut guard, sink, &mut log) {
                log.results.push(RunResult::failure(&table.spec.name, e.to_string()));
                return Err(log.fail(e));
            }
        }
        guard.close();

        log.enter(RunState::CommittingWatermark);
        crate::fail_point!("before_commit");
        // Best-effort: load and save are not atomic, so two runs passing this
        // check together both commit. Exclusion between runs is external.
        let found = store.load();
        if found != previous {
            return Err(log.fail(ExecError::WatermarkConflict {
                expected: previous,
                found,
            }));
        }
        let next = next_watermark_candidate(&started_at);
        if let Err(e) = store.save(&next) {
            return Err(log.fail(ExecError::Persist(e.to_string())));
        }
        info!(
            run = %run_id,
            previous = %previous,
            committed = %next,
            rows = log.results.iter().map(|r| r.row_count).sum::<u64>(),
            "run committed"
        );
        emit_span(
            "run_committed",
            &[("run", run_id.to_string()), ("watermark", next.to_string())],
        );
        Ok(log.finish(Some(next)))
    }

    fn load_table(
        &self,
        table: &PlannedTable,
        guard: &mut SourceGuard,
        sink: &dyn SinkWriter,
        log: &mut RunLog,
    ) -> Result<(), ExecError> {
        let name = table.spec.name.as_str();
        log.enter(RunState::Planning(name.to_string()));
        match table.descriptor.lower_bound() {
            Some(bound) => info!(table = name, load = "incremental", after = %bound, "extracting"),
            None => info!(table = name, load = "full", "extracting"),
        }

        log.enter(RunState::Extracting(name.to_string()));
        let timer = TableTimer::start(name);
        let rows = execute_query(name, &table.query, guard.get()?)?;

        log.enter(RunState::Writing(name.to_string()));
        let written = sink
            .write_table(&table.spec.sink, &rows)
            .map_err(|e| ExecError::Sink {
                table: name.to_string(),
                cause: e.to_string(),
            })?;
        timer.finish(written);
        info!(table = name, rows = written, sink = %table.spec.sink, "table loaded");
        log.results.push(RunResult::success(name, written));
        crate::fail_point!("after_table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::source::MemoryConnector;
    use snapload_core::types::{RowSet, Scalar};
    use snapload_io::{MemorySink, MemoryWatermarkStore};

    fn wm(s: &str) -> Watermark {
        Watermark::parse(s).unwrap()
    }

    fn orders() -> RowSet {
        RowSet::with_rows(
            vec!["id".into(), "updated_at".into()],
            vec![
                vec![Scalar::I64(1), Scalar::from("2023-12-01 00:00:00")],
                vec![Scalar::I64(2), Scalar::from("2024-01-02 00:00:00")],
            ],
        )
        .unwrap()
    }

    fn tables() -> Vec<TableSpec> {
        vec![
            TableSpec::incremental("orders", "updated_at", "orders.csv"),
            TableSpec::full("countries", "countries.csv"),
        ]
    }

    fn connector() -> MemoryConnector {
        MemoryConnector::new()
            .with_table("orders", orders())
            .with_table("countries", RowSet::new(vec!["code".into()]))
    }

    fn orchestrator(now: &str) -> Orchestrator {
        Orchestrator::new(tables()).with_clock(FixedClock::new(wm(now)))
    }

    #[test]
    fn successful_run_commits_start_time() {
        let store = MemoryWatermarkStore::with_watermark(&wm("2024-01-01 00:00:00"));
        let conn = connector();
        let sink = MemorySink::new();

        let report = orchestrator("2024-02-01 12:00:00")
            .run(&store, &conn, &sink)
            .unwrap();

        assert_eq!(store.load().as_str(), "2024-02-01 12:00:00");
        assert_eq!(report.committed_watermark, Some(wm("2024-02-01 12:00:00")));
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].row_count, 1);
        assert_eq!(report.results[1].row_count, 0);
        assert_eq!(sink.get("countries.csv").unwrap().num_rows(), 0);
        assert_eq!(conn.live_connections(), 0);
        assert_eq!(
            report.states,
            vec![
                RunState::Start,
                RunState::LoadingConfig,
                RunState::Planning("orders".into()),
                RunState::Extracting("orders".into()),
                RunState::Writing("orders".into()),
                RunState::Planning("countries".into()),
                RunState::Extracting("countries".into()),
                RunState::Writing("countries".into()),
                RunState::CommittingWatermark,
                RunState::Done,
            ]
        );
        assert!(report.manifest.committed_watermark.is_some());
    }

    #[test]
    fn table_failure_keeps_watermark_and_closes_source() {
        let store = MemoryWatermarkStore::with_watermark(&wm("2024-01-01 00:00:00"));
        let conn = connector();
        conn.fail_table("countries");
        let sink = MemorySink::new();

        let failure = orchestrator("2024-02-01 12:00:00")
            .run(&store, &conn, &sink)
            .unwrap_err();

        assert!(matches!(failure.error, ExecError::Extraction { ref table, .. } if table == "countries"));
        assert_eq!(store.load().as_str(), "2024-01-01 00:00:00");
        assert_eq!(store.save_count(), 0);
        assert!(sink.get("orders.csv").is_some());
        assert_eq!(conn.live_connections(), 0);
        assert_eq!(failure.report.states.last(), Some(&RunState::Failed));
        assert!(failure.report.results[0].is_success());
        assert!(!failure.report.results[1].is_success());
    }

    #[test]
    fn sink_failure_is_fatal() {
        let store = MemoryWatermarkStore::new();
        let conn = connector();
        let sink = MemorySink::new();
        sink.fail_on("orders.csv");

        let failure = orchestrator("2024-02-01 12:00:00")
            .run(&store, &conn, &sink)
            .unwrap_err();
        assert!(matches!(failure.error, ExecError::Sink { .. }));
        assert_eq!(failure.error.table(), Some("orders"));
        assert!(store.raw().is_none());
    }

    #[test]
    fn config_error_never_opens_the_source() {
        let store = MemoryWatermarkStore::new();
        let conn = connector();
        let mut bad = TableSpec::incremental("orders", "updated_at", "orders.csv");
        bad.incremental_column = None;

        let failure = Orchestrator::new(vec![bad])
            .run(&store, &conn, &MemorySink::new())
            .unwrap_err();
        assert!(matches!(failure.error, ExecError::Config(_)));
        assert_eq!(conn.open_count(), 0);
        assert!(failure.report.results.is_empty());
    }

    #[test]
    fn unreachable_source_is_a_connection_error() {
        let store = MemoryWatermarkStore::new();
        let conn = connector();
        conn.refuse_connections();
        let failure = orchestrator("2024-02-01 12:00:00")
            .run(&store, &conn, &MemorySink::new())
            .unwrap_err();
        assert!(matches!(failure.error, ExecError::Connection(_)));
        assert!(store.load().is_epoch());
    }

    #[test]
    fn empty_table_list_still_commits() {
        let store = MemoryWatermarkStore::new();
        let report = Orchestrator::new(Vec::new())
            .with_clock(FixedClock::new(wm("2024-03-01 00:00:00")))
            .run(&store, &MemoryConnector::new(), &MemorySink::new())
            .unwrap();
        assert!(report.committed());
        assert_eq!(store.load().as_str(), "2024-03-01 00:00:00");
    }
}
