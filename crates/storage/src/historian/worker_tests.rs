// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mediator_adapters::SqliteHistorianBackend;
use mediator_core::quality::Quality;
use mediator_core::refs::ObjectRef;
use mediator_core::timestamp::Timestamp;
use mediator_core::vtq::VariableValue;
use mediator_core::work_item::{Bounding, QualityFilter};
use mediator_core::VariableRef;

fn var() -> VariableRef {
    VariableRef::new(ObjectRef::new("modA", "obj1"), "temp")
}

fn row(t: i64) -> Vttq {
    Vttq {
        value: VariableValue::Double(t as f64),
        timestamp: Timestamp::from_millis(t),
        transaction_timestamp: Timestamp::from_millis(t),
        quality: Quality::Good,
    }
}

fn worker() -> HistorianWorker<SqliteHistorianBackend> {
    HistorianWorker::new(SqliteHistorianBackend::open_in_memory().unwrap())
}

#[test]
fn append_then_read_raw_through_one_batch() {
    let mut w = worker();
    let results = w.process_batch(vec![
        WorkItem::Append {
            variable: var(),
            rows: vec![row(1), row(2)],
        },
        WorkItem::ReadRaw {
            variable: var(),
            start: Timestamp::EMPTY,
            end: Timestamp::MAX,
            max_values: 10,
            bounding: Bounding::TakeLastN,
            quality_filter: QualityFilter::ExcludeNone,
        },
    ]);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], WorkResult::Ack);
    match &results[1] {
        WorkResult::Rows(rows) => assert_eq!(rows.len(), 2),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn read_prioritization_moves_a_read_ahead_of_trailing_appends() {
    let mut w = worker();
    w.process_batch(vec![WorkItem::Append {
        variable: var(),
        rows: vec![row(1)],
    }]);
    let results = w.process_batch(vec![
        WorkItem::Append {
            variable: var(),
            rows: vec![row(2)],
        },
        WorkItem::GetLatest { variable: var() },
    ]);
    // The read was promoted and executed before the second append landed.
    match &results[0] {
        WorkResult::Latest(Some(v)) => assert_eq!(v.timestamp, Timestamp::from_millis(1)),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn terminate_then_further_submissions_fail() {
    let mut w = worker();
    let results = w.process_batch(vec![WorkItem::Terminate]);
    assert_eq!(results, vec![WorkResult::Terminated]);
    assert!(w.is_terminated());
    let results = w.process_batch(vec![WorkItem::GetLatest { variable: var() }]);
    assert!(matches!(results[0], WorkResult::Error(_)));
}

#[test]
fn start_acks_without_touching_the_backend() {
    let mut w = worker();
    let results = w.process_batch(vec![WorkItem::Start]);
    assert_eq!(results, vec![WorkResult::Started]);
}

#[test]
fn count_matches_number_of_appended_rows() {
    let mut w = worker();
    w.process_batch(vec![WorkItem::Append {
        variable: var(),
        rows: vec![row(1), row(2), row(3)],
    }]);
    let results = w.process_batch(vec![WorkItem::Count {
        variable: var(),
        start: Timestamp::EMPTY,
        end: Timestamp::MAX,
    }]);
    assert_eq!(results[0], WorkResult::Count(3));
}

#[test]
fn per_item_coalesces_many_appends_into_one_execution_but_acks_every_index() {
    let mut w = worker();
    let items: Vec<WorkItem> = (1..=100)
        .map(|t| WorkItem::Append {
            variable: var(),
            rows: vec![row(t)],
        })
        .collect();
    let results = w.process_batch_per_item(items);
    assert_eq!(results.len(), 100);
    assert!(results.iter().all(|r| *r == WorkResult::Ack));

    let counted = w.process_batch_per_item(vec![WorkItem::Count {
        variable: var(),
        start: Timestamp::EMPTY,
        end: Timestamp::MAX,
    }]);
    // One execution, one transaction: all 100 rows landed in a single append.
    assert_eq!(counted[0], WorkResult::Count(100));
}

#[test]
fn per_item_preserves_submission_order_across_read_prioritization() {
    let mut w = worker();
    w.process_batch(vec![WorkItem::Append {
        variable: var(),
        rows: vec![row(1)],
    }]);
    let results = w.process_batch_per_item(vec![
        WorkItem::Append {
            variable: var(),
            rows: vec![row(2)],
        },
        WorkItem::GetLatest { variable: var() },
    ]);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], WorkResult::Ack);
    match &results[1] {
        // The read was promoted and executed first, ahead of the append
        // submitted before it, but still lands at its own submitted index.
        WorkResult::Latest(Some(v)) => assert_eq!(v.timestamp, Timestamp::from_millis(1)),
        other => panic!("unexpected: {other:?}"),
    }
}
