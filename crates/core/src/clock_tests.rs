// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_monotonically() {
    let clock = FakeClock::new(1_000);
    assert_eq!(clock.now_ms(), 1_000);
    clock.advance(500);
    assert_eq!(clock.now_ms(), 1_500);
    clock.set(42);
    assert_eq!(clock.now_ms(), 42);
}

#[test]
fn system_clock_is_positive_and_increasing() {
    let clock = SystemClock;
    let t1 = clock.now_ms();
    let t2 = clock.now_ms();
    assert!(t1 > 0);
    assert!(t2 >= t1);
}

#[test]
fn now_wraps_now_ms_in_timestamp() {
    let clock = FakeClock::new(12_345);
    assert_eq!(clock.now(), Timestamp::from_millis(12_345));
}
