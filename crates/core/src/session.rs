// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated client sessions and their subscription state.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::event::{Event, Severity};
use crate::refs::{ObjectRef, VariableRef};

crate::define_id! {
    /// Identifies a session created by a successful login.
    pub struct SessionId;
}

/// Who authenticated this session: an interactive user, or a module
/// connecting over loopback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    User { user: String, roles: Vec<String> },
    Module { module_id: String },
}

/// Options controlling how value-change events are delivered to a
/// subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionOptions {
    /// Keep only the newest value per variable per fan-out pass rather than
    /// queuing every intermediate change.
    pub coalesce: bool,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self { coalesce: true }
    }
}

/// A session's subscription to variable value-change events, either an
/// explicit list of variables or an object-tree root (matches the object and
/// everything configured beneath it).
#[derive(Debug, Clone, Default)]
pub struct ValueChangeSubscription {
    pub variables: HashSet<VariableRef>,
    pub tree_roots: HashSet<ObjectRef>,
    pub options: SubscriptionOptions,
}

impl ValueChangeSubscription {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.tree_roots.is_empty()
    }

    pub fn matches(&self, var: &VariableRef) -> bool {
        self.variables.contains(var) || self.tree_roots.contains(&var.object)
    }
}

/// An authenticated client context: its identity, subscription state, and
/// outbound event queue feeding the per-session WebSocket writer.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub principal: Principal,
    pub value_changes: ValueChangeSubscription,
    pub history_changes: bool,
    pub config_changes: HashSet<ObjectRef>,
    pub alarm_min_severity: Option<Severity>,
    pub outbound: VecDeque<Event>,
    pub created_ms: i64,
    pub last_ack_ms: i64,
}

impl Session {
    pub fn new(id: SessionId, principal: Principal, now_ms: i64) -> Self {
        Self {
            id,
            principal,
            value_changes: ValueChangeSubscription::default(),
            history_changes: false,
            config_changes: HashSet::new(),
            alarm_min_severity: None,
            outbound: VecDeque::new(),
            created_ms: now_ms,
            last_ack_ms: now_ms,
        }
    }

    /// Whether `event` matches any of this session's active subscriptions.
    pub fn wants(&self, event: &Event) -> bool {
        match event {
            Event::VariableValueChanged { variable, .. } => self.value_changes.matches(variable),
            Event::VariableHistoryChanged { .. } => self.history_changes,
            Event::ConfigChanged { module_id } => self
                .config_changes
                .iter()
                .any(|o| &o.module_id == module_id),
            Event::AlarmOrEvent { severity, .. } => self
                .alarm_min_severity
                .is_some_and(|min| *severity >= min),
        }
    }

    /// Enqueue `event`, coalescing with a previously queued value-change for
    /// the same variable when the subscription asks for it.
    pub fn enqueue(&mut self, event: Event) {
        if self.value_changes.options.coalesce {
            if let Some(var) = event.variable() {
                if let Some(slot) = self
                    .outbound
                    .iter_mut()
                    .find(|queued| queued.variable() == Some(var))
                {
                    *slot = event;
                    return;
                }
            }
        }
        self.outbound.push_back(event);
    }

    pub fn record_ack(&mut self, now_ms: i64) {
        self.last_ack_ms = now_ms;
    }

    /// A session is abandoned once `idle_timeout_ms` has elapsed since its
    /// last acknowledged frame.
    pub fn is_abandoned(&self, now_ms: i64, idle_timeout_ms: i64) -> bool {
        now_ms.saturating_sub(self.last_ack_ms) > idle_timeout_ms
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
