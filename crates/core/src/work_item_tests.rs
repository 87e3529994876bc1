// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::quality::Quality;
use crate::refs::ObjectRef;

fn var() -> VariableRef {
    VariableRef::new(ObjectRef::new("modA", "obj1"), "temp")
}

#[test]
fn append_is_append_and_not_a_read() {
    let item = WorkItem::Append {
        variable: var(),
        rows: vec![],
    };
    assert!(item.is_append());
    assert!(!item.is_read());
}

#[test]
fn read_raw_is_a_read() {
    let item = WorkItem::ReadRaw {
        variable: var(),
        start: Timestamp::EMPTY,
        end: Timestamp::MAX,
        max_values: 10,
        bounding: Bounding::TakeLastN,
        quality_filter: QualityFilter::ExcludeNone,
    };
    assert!(item.is_read());
    assert!(!item.is_append());
}

#[test]
fn start_and_terminate_have_no_variable() {
    assert_eq!(WorkItem::Start.variable(), None);
    assert_eq!(WorkItem::Terminate.variable(), None);
}

#[test]
fn quality_filter_accepts() {
    assert!(QualityFilter::ExcludeNone.accepts(Quality::Bad));
    assert!(!QualityFilter::ExcludeBad.accepts(Quality::Bad));
    assert!(QualityFilter::ExcludeBad.accepts(Quality::Uncertain));
    assert!(!QualityFilter::ExcludeNonGood.accepts(Quality::Uncertain));
    assert!(QualityFilter::ExcludeNonGood.accepts(Quality::Good));
}

#[test]
fn bounding_take_first_n() {
    let rows = vec![1, 2, 3, 4, 5];
    assert_eq!(apply_bounding(rows, 2, Bounding::TakeFirstN), vec![1, 2]);
}

#[test]
fn bounding_take_last_n() {
    let rows = vec![1, 2, 3, 4, 5];
    assert_eq!(apply_bounding(rows, 2, Bounding::TakeLastN), vec![4, 5]);
}

#[test]
fn bounding_compress_to_n_keeps_ends_and_downsamples() {
    let rows: Vec<i32> = (0..10).collect();
    let out = apply_bounding(rows, 5, Bounding::CompressToN);
    assert_eq!(out.len(), 5);
    assert_eq!(out[0], 0);
}

#[test]
fn bounding_is_noop_when_already_within_max() {
    let rows = vec![1, 2, 3];
    assert_eq!(apply_bounding(rows.clone(), 10, Bounding::TakeFirstN), rows);
}

#[test]
fn bounding_with_zero_max_values_is_always_empty() {
    let rows = vec![1, 2, 3];
    assert_eq!(
        apply_bounding(rows.clone(), 0, Bounding::TakeFirstN),
        Vec::<i32>::new()
    );
    assert_eq!(
        apply_bounding(rows.clone(), 0, Bounding::TakeLastN),
        Vec::<i32>::new()
    );
    assert_eq!(apply_bounding(rows, 0, Bounding::CompressToN), Vec::<i32>::new());
}
