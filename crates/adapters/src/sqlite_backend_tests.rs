// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mediator_core::refs::ObjectRef;
use mediator_core::vtq::VariableValue;
use mediator_core::Quality;

fn var() -> VariableRef {
    VariableRef::new(ObjectRef::new("modA", "obj1"), "temp")
}

fn row(t: i64, v: f64) -> Vttq {
    Vttq {
        value: VariableValue::Double(v),
        timestamp: Timestamp::from_millis(t),
        transaction_timestamp: Timestamp::from_millis(t),
        quality: Quality::Good,
    }
}

#[test]
fn ensure_channel_is_idempotent() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let a = db.ensure_channel(&var()).unwrap();
    let b = db.ensure_channel(&var()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn append_then_read_raw_round_trips_in_order() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let ch = db.ensure_channel(&var()).unwrap();
    db.append(ch.clone(), &[row(20, 2.0), row(10, 1.0)]).unwrap();
    let rows = db
        .read_raw(ch, Timestamp::EMPTY, Timestamp::MAX, QualityFilter::ExcludeNone)
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].timestamp, Timestamp::from_millis(10));
    assert_eq!(rows[1].timestamp, Timestamp::from_millis(20));
}

#[test]
fn unknown_channel_is_rejected() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let bogus = mediator_core::refs::ChannelId::new("nope");
    assert!(db
        .read_raw(bogus, Timestamp::EMPTY, Timestamp::MAX, QualityFilter::ExcludeNone)
        .is_err());
}

#[test]
fn modify_insert_fails_on_duplicate_timestamp() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let ch = db.ensure_channel(&var()).unwrap();
    db.modify(ch.clone(), ModifyMode::Insert, &[row(10, 1.0)])
        .unwrap();
    let err = db
        .modify(ch, ModifyMode::Insert, &[row(10, 2.0)])
        .unwrap_err();
    assert!(matches!(err, MediatorError::Conflict(_)));
}

#[test]
fn modify_update_fails_on_missing_timestamp() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let ch = db.ensure_channel(&var()).unwrap();
    let err = db
        .modify(ch, ModifyMode::Update, &[row(10, 1.0)])
        .unwrap_err();
    assert!(matches!(err, MediatorError::Conflict(_)));
}

#[test]
fn modify_upsert_replaces_existing_row() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let ch = db.ensure_channel(&var()).unwrap();
    db.modify(ch.clone(), ModifyMode::Upsert, &[row(10, 1.0)])
        .unwrap();
    db.modify(ch.clone(), ModifyMode::Upsert, &[row(10, 9.0)])
        .unwrap();
    let rows = db
        .read_raw(ch, Timestamp::EMPTY, Timestamp::MAX, QualityFilter::ExcludeNone)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, VariableValue::Double(9.0));
}

#[test]
fn modify_replace_all_clears_then_inserts() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let ch = db.ensure_channel(&var()).unwrap();
    db.append(ch.clone(), &[row(1, 1.0), row(2, 2.0)]).unwrap();
    db.modify(ch.clone(), ModifyMode::ReplaceAll, &[row(5, 5.0)])
        .unwrap();
    let rows = db
        .read_raw(ch, Timestamp::EMPTY, Timestamp::MAX, QualityFilter::ExcludeNone)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, Timestamp::from_millis(5));
}

#[test]
fn get_latest_returns_newest_row() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let ch = db.ensure_channel(&var()).unwrap();
    db.append(ch.clone(), &[row(1, 1.0), row(2, 2.0)]).unwrap();
    let latest = db.get_latest(ch).unwrap().unwrap();
    assert_eq!(latest.timestamp, Timestamp::from_millis(2));
}

#[test]
fn delete_interval_removes_only_matching_rows() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let ch = db.ensure_channel(&var()).unwrap();
    db.append(ch.clone(), &[row(1, 1.0), row(2, 2.0), row(3, 3.0)])
        .unwrap();
    db.delete_interval(ch.clone(), Timestamp::from_millis(1), Timestamp::from_millis(2))
        .unwrap();
    let rows = db
        .read_raw(ch, Timestamp::EMPTY, Timestamp::MAX, QualityFilter::ExcludeNone)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, Timestamp::from_millis(3));
}

#[test]
fn count_matches_read_raw_length() {
    let mut db = SqliteHistorianBackend::open_in_memory().unwrap();
    let ch = db.ensure_channel(&var()).unwrap();
    db.append(ch.clone(), &[row(1, 1.0), row(2, 2.0)]).unwrap();
    let count = db
        .count(ch.clone(), Timestamp::EMPTY, Timestamp::MAX, QualityFilter::ExcludeNone)
        .unwrap();
    let read = db
        .read_raw(ch, Timestamp::EMPTY, Timestamp::MAX, QualityFilter::ExcludeNone)
        .unwrap();
    assert_eq!(count, read.len());
}
