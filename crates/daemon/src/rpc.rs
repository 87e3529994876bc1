// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RPC surface: request/response envelopes and the dispatcher that
//! turns one request into calls against a [`Mediator`].
//!
//! Every request and response type derives both `serde`'s JSON support and
//! is plain enough for `bincode` to round-trip byte-for-byte, so the same
//! types serve the JSON and binary codecs the transport negotiates between.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use mediator_core::{
    Bounding, Clock, MediatorError, ModifyMode, ModuleId, ObjectRef, QualityFilter, Severity,
    SubscriptionOptions, Timestamp, VariableRef, Vtq, Vttq,
};

use crate::process::Mediator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleStatus {
    pub id: ModuleId,
    pub state: Option<String>,
}

/// One recognised RPC method and its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "PascalCase")]
pub enum RpcRequest {
    Login {
        user: Option<String>,
        module_id: Option<String>,
    },
    Authenticate {
        session_id: String,
        response: String,
    },
    Logout {
        session_id: String,
    },
    GetModules,
    ReadVariables {
        variables: Vec<VariableRef>,
    },
    WriteVariables {
        writes: Vec<(VariableRef, Vtq)>,
    },
    HistorianReadRaw {
        variable: VariableRef,
        start: Timestamp,
        end: Timestamp,
        max_values: usize,
        bounding: Bounding,
        quality_filter: QualityFilter,
    },
    HistorianCount {
        variable: VariableRef,
        start: Timestamp,
        end: Timestamp,
    },
    HistorianDeleteInterval {
        variable: VariableRef,
        start: Timestamp,
        end: Timestamp,
    },
    HistorianModify {
        variable: VariableRef,
        mode: ModifyMode,
        rows: Vec<Vttq>,
    },
    HistorianGetLatestTimestampDb {
        variable: VariableRef,
    },
    EnableVariableValueChangedEvents {
        session_id: String,
        variables: Vec<VariableRef>,
        tree_roots: Vec<ObjectRef>,
        coalesce: bool,
    },
    EnableVariableHistoryChangedEvents {
        session_id: String,
    },
    EnableConfigChangedEvents {
        session_id: String,
        objects: Vec<ObjectRef>,
    },
    EnableAlarmsAndEvents {
        session_id: String,
        min_severity: Severity,
    },
    DisableAlarmsAndEvents {
        session_id: String,
    },
    DisableChangeEvents {
        session_id: String,
    },
}

/// The payload of a successful response. What varies per method; the HTTP
/// status and JSON `error` envelope on failure are uniform and handled by
/// the transport layer, not encoded here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcOk {
    LoginChallenge { session_id: String, challenge: String },
    SessionId { session_id: String },
    Modules { modules: Vec<ModuleStatus> },
    Variables { values: Vec<Option<Vtq>> },
    HistorianRows { rows: Vec<Vttq> },
    HistorianCount { count: u64 },
    HistorianLatest { latest: Option<Vttq> },
    Ack,
}

/// The method name gating a request against [`RequestHandler::check_dispatchable`]
/// while the process is still starting up.
fn method_name(req: &RpcRequest) -> &'static str {
    match req {
        RpcRequest::Login { .. } => "Login",
        RpcRequest::Authenticate { .. } => "Authenticate",
        RpcRequest::Logout { .. } => "Logout",
        RpcRequest::GetModules => "GetModules",
        RpcRequest::ReadVariables { .. } => "ReadVariables",
        RpcRequest::WriteVariables { .. } => "WriteVariables",
        RpcRequest::HistorianReadRaw { .. } => "HistorianReadRaw",
        RpcRequest::HistorianCount { .. } => "HistorianCount",
        RpcRequest::HistorianDeleteInterval { .. } => "HistorianDeleteInterval",
        RpcRequest::HistorianModify { .. } => "HistorianModify",
        RpcRequest::HistorianGetLatestTimestampDb { .. } => "HistorianGetLatestTimestampDb",
        RpcRequest::EnableVariableValueChangedEvents { .. } => "EnableVariableValueChangedEvents",
        RpcRequest::EnableVariableHistoryChangedEvents { .. } => "EnableVariableHistoryChangedEvents",
        RpcRequest::EnableConfigChangedEvents { .. } => "EnableConfigChangedEvents",
        RpcRequest::EnableAlarmsAndEvents { .. } => "EnableAlarmsAndEvents",
        RpcRequest::DisableAlarmsAndEvents { .. } => "DisableAlarmsAndEvents",
        RpcRequest::DisableChangeEvents { .. } => "DisableChangeEvents",
    }
}

/// Runs `req` against `mediator`, using `now_ms` for anything session- or
/// time-relative (login challenges, acks).
pub async fn dispatch<C: Clock + Clone>(
    mediator: &Mediator<C>,
    req: RpcRequest,
    now_ms: i64,
) -> Result<RpcOk, MediatorError> {
    mediator.handler.lock().check_dispatchable(method_name(&req))?;
    match req {
        RpcRequest::Login { user, module_id } => {
            let login_req = match (user, module_id) {
                (Some(user), _) => mediator_engine::LoginRequest::User { user },
                (None, Some(module_id)) => {
                    mediator_engine::LoginRequest::Module { module_id: ModuleId::new(module_id) }
                }
                (None, None) => {
                    return Err(MediatorError::Request(
                        "Login requires either `user` or `module_id`".into(),
                    ))
                }
            };
            let challenge = mediator.handler.lock().login(login_req, now_ms);
            Ok(RpcOk::LoginChallenge {
                session_id: challenge.session_id.as_str().to_string(),
                challenge: challenge.challenge,
            })
        }
        RpcRequest::Authenticate { session_id, response } => {
            let session_id = mediator_core::SessionId::new(session_id);
            let session_id = mediator
                .handler
                .lock()
                .authenticate(&session_id, &response, now_ms)?;
            Ok(RpcOk::SessionId {
                session_id: session_id.as_str().to_string(),
            })
        }
        RpcRequest::Logout { session_id } => {
            mediator
                .handler
                .lock()
                .logout(&mediator_core::SessionId::new(session_id));
            Ok(RpcOk::Ack)
        }
        RpcRequest::GetModules => {
            let modules = mediator
                .supervisor
                .module_ids()
                .into_iter()
                .map(|id| {
                    let state = mediator.supervisor.module_state(&id).map(|s| format!("{s:?}"));
                    ModuleStatus { id, state }
                })
                .collect();
            Ok(RpcOk::Modules { modules })
        }
        RpcRequest::ReadVariables { variables } => {
            let mut values = Vec::with_capacity(variables.len());
            let stores = mediator.var_stores.lock();
            for var in &variables {
                let value = stores
                    .get(var.module_id())
                    .and_then(|store| store.get(var).ok())
                    .cloned();
                values.push(value);
            }
            Ok(RpcOk::Variables { values })
        }
        RpcRequest::WriteVariables { writes } => {
            let events = writes
                .into_iter()
                .map(|(variable, value)| mediator_core::Event::VariableValueChanged { variable, value })
                .collect();
            mediator.handle_events(events).await;
            Ok(RpcOk::Ack)
        }
        RpcRequest::HistorianReadRaw {
            variable,
            start,
            end,
            max_values,
            bounding,
            quality_filter,
        } => {
            let rows = mediator
                .historian
                .read_raw(variable, start, end, max_values, bounding, quality_filter)
                .await?;
            Ok(RpcOk::HistorianRows { rows })
        }
        RpcRequest::HistorianCount { variable, start, end } => {
            let count = mediator.historian.count(variable, start, end).await?;
            Ok(RpcOk::HistorianCount { count: count as u64 })
        }
        RpcRequest::HistorianDeleteInterval { variable, start, end } => {
            mediator.historian.delete_interval(variable, start, end).await?;
            Ok(RpcOk::Ack)
        }
        RpcRequest::HistorianModify { variable, mode, rows } => {
            mediator.historian.modify(variable, mode, rows).await?;
            Ok(RpcOk::Ack)
        }
        RpcRequest::HistorianGetLatestTimestampDb { variable } => {
            let latest = mediator.historian.get_latest(variable).await?;
            Ok(RpcOk::HistorianLatest { latest })
        }
        RpcRequest::EnableVariableValueChangedEvents {
            session_id,
            variables,
            tree_roots,
            coalesce,
        } => {
            mediator.handler.lock().enable_variable_value_changed_events(
                &mediator_core::SessionId::new(session_id),
                variables.into_iter().collect::<HashSet<_>>(),
                tree_roots.into_iter().collect::<HashSet<_>>(),
                SubscriptionOptions { coalesce },
            )?;
            Ok(RpcOk::Ack)
        }
        RpcRequest::EnableVariableHistoryChangedEvents { session_id } => {
            mediator
                .handler
                .lock()
                .enable_variable_history_changed_events(&mediator_core::SessionId::new(session_id))?;
            Ok(RpcOk::Ack)
        }
        RpcRequest::EnableConfigChangedEvents { session_id, objects } => {
            mediator.handler.lock().enable_config_changed_events(
                &mediator_core::SessionId::new(session_id),
                objects.into_iter().collect::<HashSet<_>>(),
            )?;
            Ok(RpcOk::Ack)
        }
        RpcRequest::EnableAlarmsAndEvents { session_id, min_severity } => {
            mediator
                .handler
                .lock()
                .enable_alarms_and_events(&mediator_core::SessionId::new(session_id), min_severity)?;
            Ok(RpcOk::Ack)
        }
        RpcRequest::DisableAlarmsAndEvents { session_id } => {
            mediator
                .handler
                .lock()
                .disable_alarms_and_events(&mediator_core::SessionId::new(session_id))?;
            Ok(RpcOk::Ack)
        }
        RpcRequest::DisableChangeEvents { session_id } => {
            mediator
                .handler
                .lock()
                .disable_change_events(&mediator_core::SessionId::new(session_id))?;
            Ok(RpcOk::Ack)
        }
    }
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
