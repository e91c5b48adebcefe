//! Crashes injected mid-run must never move the watermark.

use std::panic::{catch_unwind, AssertUnwindSafe};

use snapload_core::table::TableSpec;
use snapload_core::types::{RowSet, Scalar};
use snapload_core::watermark::Watermark;
use snapload_exec::failpoints::arm;
use snapload_exec::{FixedClock, MemoryConnector, Orchestrator};
use snapload_io::{MemorySink, MemoryWatermarkStore, WatermarkStore};

fn wm(s: &str) -> Watermark {
    Watermark::parse(s).unwrap()
}

fn connector() -> MemoryConnector {
    let orders = RowSet::with_rows(
        vec!["id".into(), "updated_at".into()],
        vec![
            vec![Scalar::I64(1), Scalar::from("2024-01-10 00:00:00")],
            vec![Scalar::I64(2), Scalar::from("2024-01-20 00:00:00")],
        ],
    )
    .unwrap();
    let countries = RowSet::with_rows(vec!["code".into()], vec![vec![Scalar::from("NZ")]]).unwrap();
    MemoryConnector::new()
        .with_table("orders", orders)
        .with_table("countries", countries)
}

fn orchestrator() -> Orchestrator {
    Orchestrator::new(vec![
        TableSpec::incremental("orders", "updated_at", "orders.csv"),
        TableSpec::full("countries", "countries.csv"),
    ])
    .with_clock(FixedClock::new(wm("2024-02-01 00:00:00")))
}

#[test]
fn test_crash_before_commit_keeps_watermark() {
    let store = MemoryWatermarkStore::with_watermark(&wm("2024-01-01 00:00:00"));
    let connector = connector();
    let sink = MemorySink::new();

    let _point = arm("before_commit");
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        orchestrator().run(&store, &connector, &sink)
    }));

    assert!(outcome.is_err(), "run should have crashed");
    assert_eq!(store.load().as_str(), "2024-01-01 00:00:00");
    assert_eq!(store.save_count(), 0);
    // Every table was written before the crash.
    assert_eq!(sink.get("orders.csv").unwrap().num_rows(), 2);
    assert_eq!(sink.get("countries.csv").unwrap().num_rows(), 1);
    assert_eq!(connector.live_connections(), 0);
}

#[test]
fn test_crash_after_table_closes_source_and_keeps_watermark() {
    let store = MemoryWatermarkStore::with_watermark(&wm("2024-01-01 00:00:00"));
    let connector = connector();
    let sink = MemorySink::new();

    {
        let _point = arm("after_table");
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            orchestrator().run(&store, &connector, &sink)
        }));
        assert!(outcome.is_err(), "run should have crashed");
    }

    assert_eq!(store.load().as_str(), "2024-01-01 00:00:00");
    assert!(sink.get("orders.csv").is_some());
    assert!(sink.get("countries.csv").is_none());
    assert_eq!(connector.open_count(), 1);
    assert_eq!(connector.live_connections(), 0);

    // Disarmed, the retry starts from the same watermark and commits.
    let report = orchestrator().run(&store, &connector, &sink).unwrap();
    assert_eq!(report.previous_watermark.as_str(), "2024-01-01 00:00:00");
    assert_eq!(store.load().as_str(), "2024-02-01 00:00:00");
}
