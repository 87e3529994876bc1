// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mediator_core::SequentialIdGen;

fn creds() -> Credentials {
    let mut users = HashMap::new();
    users.insert(
        "alice".to_string(),
        UserCredential {
            password: "hunter2".into(),
            roles: vec!["operator".into()],
        },
    );
    Credentials {
        users,
        module_passwords: HashMap::new(),
    }
}

fn handler() -> RequestHandler<SequentialIdGen> {
    RequestHandler::with_id_gen(creds(), 60_000, SequentialIdGen::new("sess"))
}

fn login_and_auth(h: &mut RequestHandler<SequentialIdGen>, password: &str) -> Result<SessionId, MediatorError> {
    let challenge = h.login(LoginRequest::User { user: "alice".into() }, 0);
    let response = challenge_hash(password, &challenge.challenge, &challenge.session_id);
    h.authenticate(&challenge.session_id, &response, 0)
}

#[test]
fn correct_password_completes_the_handshake() {
    let mut h = handler();
    let session_id = login_and_auth(&mut h, "hunter2").unwrap();
    assert_eq!(h.session_ids(), vec![session_id]);
}

#[test]
fn wrong_password_fails_auth() {
    let mut h = handler();
    let err = login_and_auth(&mut h, "wrong").unwrap_err();
    assert_eq!(err.kind(), "auth");
    assert!(h.session_ids().is_empty());
}

#[test]
fn unknown_user_fails_auth() {
    let mut h = handler();
    let challenge = h.login(LoginRequest::User { user: "bob".into() }, 0);
    let response = challenge_hash("whatever", &challenge.challenge, &challenge.session_id);
    let err = h.authenticate(&challenge.session_id, &response, 0).unwrap_err();
    assert_eq!(err.kind(), "auth");
}

#[test]
fn dispatch_is_gated_while_starting() {
    let h = handler();
    assert!(h.check_dispatchable("Login").is_ok());
    assert!(h.check_dispatchable("ReadVariables").is_err());
}

#[test]
fn dispatch_opens_up_once_started() {
    let mut h = handler();
    h.mark_started();
    assert!(h.check_dispatchable("ReadVariables").is_ok());
}

#[test]
fn fan_out_respects_subscription_and_coalesces() {
    use mediator_core::{ObjectRef, Vtq, VariableValue, Quality, Timestamp};
    let mut h = handler();
    let session_id = login_and_auth(&mut h, "hunter2").unwrap();
    let var = VariableRef::new(ObjectRef::new("modA", "obj1"), "temp");
    h.enable_variable_value_changed_events(
        &session_id,
        [var.clone()].into_iter().collect(),
        HashSet::new(),
        SubscriptionOptions { coalesce: true },
    )
    .unwrap();

    h.fan_out(Event::VariableValueChanged {
        variable: var.clone(),
        value: Vtq {
            value: VariableValue::Double(1.0),
            timestamp: Timestamp::from_millis(1),
            quality: Quality::Good,
        },
    });
    h.fan_out(Event::VariableValueChanged {
        variable: var.clone(),
        value: Vtq {
            value: VariableValue::Double(2.0),
            timestamp: Timestamp::from_millis(2),
            quality: Quality::Good,
        },
    });

    let ev = h.dequeue_outbound(&session_id).unwrap();
    match ev {
        Event::VariableValueChanged { value, .. } => assert_eq!(value.timestamp, Timestamp::from_millis(2)),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(h.dequeue_outbound(&session_id).is_none());
}

#[test]
fn abandoned_sessions_are_swept_and_their_id_rejected_afterward() {
    let mut h = handler();
    let session_id = login_and_auth(&mut h, "hunter2").unwrap();
    let removed = h.sweep_abandoned(61_000);
    assert_eq!(removed, vec![session_id.clone()]);
    assert!(h.session_mut(&session_id).is_err());
}

#[test]
fn logout_removes_the_session() {
    let mut h = handler();
    let session_id = login_and_auth(&mut h, "hunter2").unwrap();
    h.logout(&session_id);
    assert!(h.session_ids().is_empty());
}
