// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events flowing from modules and the supervisor to subscribed sessions.
//!
//! Serializes with `{"event": "..."}` tagging to match the WebSocket frame
//! format in the external interface (`OnVariableValueChanged`, etc).

use serde::{Deserialize, Serialize};

use crate::module_state::ModuleId;
use crate::refs::VariableRef;
use crate::timestamp::Timestamp;
use crate::vtq::Vtq;

/// Severity of a supervisor-generated or module-reported alarm/event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Alarm,
    Critical,
}

/// Events the request handler fans out to subscribed sessions, and the
/// supervisor-internal events that drive the alarm/event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Event {
    #[serde(rename = "OnVariableValueChanged")]
    VariableValueChanged {
        variable: VariableRef,
        value: Vtq,
    },

    #[serde(rename = "OnVariableHistoryChanged")]
    VariableHistoryChanged {
        variable: VariableRef,
        min_timestamp: Timestamp,
        max_timestamp: Timestamp,
    },

    #[serde(rename = "OnConfigChanged")]
    ConfigChanged { module_id: ModuleId },

    #[serde(rename = "OnAlarmOrEvent")]
    AlarmOrEvent {
        module_id: ModuleId,
        severity: Severity,
        message: String,
    },
}

impl Event {
    /// The `VariableRef` this event concerns, if any — used for per-session,
    /// per-variable coalescing.
    pub fn variable(&self) -> Option<&VariableRef> {
        match self {
            Event::VariableValueChanged { variable, .. } => Some(variable),
            Event::VariableHistoryChanged { variable, .. } => Some(variable),
            _ => None,
        }
    }
}

/// Supervisor system events reported on the alarm/event stream at `Info` (or
/// higher) severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SystemEvent {
    SysStartup,
    InitFailed { module_id: ModuleId, error: String },
    ModuleRestart { module_id: ModuleId },
    ModuleRestartError { module_id: ModuleId, error: String },
    ModuleRunError { module_id: ModuleId, error: String },
    ShutdownTimeout { module_id: ModuleId },
}

impl SystemEvent {
    pub fn severity(&self) -> Severity {
        match self {
            SystemEvent::SysStartup => Severity::Info,
            SystemEvent::ModuleRestart { .. } => Severity::Warning,
            SystemEvent::InitFailed { .. }
            | SystemEvent::ModuleRestartError { .. }
            | SystemEvent::ModuleRunError { .. }
            | SystemEvent::ShutdownTimeout { .. } => Severity::Alarm,
        }
    }

    pub fn module_id(&self) -> Option<&ModuleId> {
        match self {
            SystemEvent::SysStartup => None,
            SystemEvent::InitFailed { module_id, .. }
            | SystemEvent::ModuleRestart { module_id }
            | SystemEvent::ModuleRestartError { module_id, .. }
            | SystemEvent::ModuleRunError { module_id, .. }
            | SystemEvent::ShutdownTimeout { module_id } => Some(module_id),
        }
    }

    pub fn message(&self) -> String {
        match self {
            SystemEvent::SysStartup => "system startup complete".to_string(),
            SystemEvent::InitFailed { error, .. } => format!("module init failed: {error}"),
            SystemEvent::ModuleRestart { module_id } => format!("restarting module {module_id}"),
            SystemEvent::ModuleRestartError { error, .. } => {
                format!("module restart failed: {error}")
            }
            SystemEvent::ModuleRunError { error, .. } => format!("module run loop failed: {error}"),
            SystemEvent::ShutdownTimeout { module_id } => {
                format!("module {module_id} did not shut down within the watchdog deadline")
            }
        }
    }

    /// Convert to the fan-out [`Event`] delivered to alarm/event subscribers.
    pub fn into_event(self) -> Event {
        let severity = self.severity();
        let module_id = self.module_id().cloned().unwrap_or_else(|| ModuleId::new(""));
        let message = self.message();
        Event::AlarmOrEvent {
            module_id,
            severity,
            message,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
