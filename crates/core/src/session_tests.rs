// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::quality::Quality;
use crate::timestamp::Timestamp;
use crate::vtq::{VariableValue, Vtq};

fn user() -> Principal {
    Principal::User {
        user: "alice".into(),
        roles: vec!["operator".into()],
    }
}

fn value_event(var: VariableRef, v: f64) -> Event {
    Event::VariableValueChanged {
        variable: var,
        value: Vtq::new(VariableValue::Double(v), Timestamp::from_millis(1), Quality::Good),
    }
}

#[test]
fn session_starts_with_no_subscriptions() {
    let s = Session::new(SessionId::new("s1"), user(), 0);
    let var = VariableRef::new(ObjectRef::new("modA", "obj1"), "temp");
    assert!(!s.wants(&value_event(var, 1.0)));
}

#[test]
fn explicit_variable_subscription_matches() {
    let mut s = Session::new(SessionId::new("s1"), user(), 0);
    let var = VariableRef::new(ObjectRef::new("modA", "obj1"), "temp");
    s.value_changes.variables.insert(var.clone());
    assert!(s.wants(&value_event(var, 1.0)));
}

#[test]
fn tree_root_subscription_matches_any_variable_on_object() {
    let mut s = Session::new(SessionId::new("s1"), user(), 0);
    let obj = ObjectRef::new("modA", "obj1");
    s.value_changes.tree_roots.insert(obj.clone());
    let var = VariableRef::new(obj, "temp");
    assert!(s.wants(&value_event(var, 1.0)));
}

#[test]
fn coalescing_keeps_only_newest_value_per_variable() {
    let mut s = Session::new(SessionId::new("s1"), user(), 0);
    let var = VariableRef::new(ObjectRef::new("modA", "obj1"), "temp");
    s.enqueue(value_event(var.clone(), 1.0));
    s.enqueue(value_event(var.clone(), 2.0));
    assert_eq!(s.outbound.len(), 1);
    match &s.outbound[0] {
        Event::VariableValueChanged { value, .. } => {
            assert_eq!(value.value, VariableValue::Double(2.0));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn non_coalescing_subscription_queues_every_event() {
    let mut s = Session::new(SessionId::new("s1"), user(), 0);
    s.value_changes.options.coalesce = false;
    let var = VariableRef::new(ObjectRef::new("modA", "obj1"), "temp");
    s.enqueue(value_event(var.clone(), 1.0));
    s.enqueue(value_event(var, 2.0));
    assert_eq!(s.outbound.len(), 2);
}

#[test]
fn alarm_subscription_filters_by_minimum_severity() {
    let mut s = Session::new(SessionId::new("s1"), user(), 0);
    s.alarm_min_severity = Some(Severity::Alarm);
    let info = Event::AlarmOrEvent {
        module_id: crate::module_state::ModuleId::new("modA"),
        severity: Severity::Info,
        message: "hi".into(),
    };
    let critical = Event::AlarmOrEvent {
        module_id: crate::module_state::ModuleId::new("modA"),
        severity: Severity::Critical,
        message: "boom".into(),
    };
    assert!(!s.wants(&info));
    assert!(s.wants(&critical));
}

#[test]
fn abandonment_is_based_on_last_ack() {
    let mut s = Session::new(SessionId::new("s1"), user(), 0);
    assert!(!s.is_abandoned(30_000, 60_000));
    assert!(s.is_abandoned(90_001, 60_000));
    s.record_ack(90_000);
    assert!(!s.is_abandoned(90_001, 60_000));
}
