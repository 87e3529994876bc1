// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Module configuration, lifecycle state machine, and the supervisor's
//! per-module bookkeeping record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

crate::define_id! {
    /// Identifies a configured module instance.
    pub struct ModuleId;
}

/// `Created -> InitComplete | InitError -> Running -> ShutdownStarted -> ShutdownCompleted`
///
/// Transitions are monotonic except for the Running -> (fail) -> Created loop
/// performed by the restart path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Created,
    InitComplete,
    InitError,
    Running,
    ShutdownStarted,
    ShutdownCompleted,
}

impl LifecycleState {
    /// Whether `self -> next` is a legal transition outside of the restart
    /// loop (which resets `Running` back to `Created` explicitly via
    /// [`LifecycleState::restart`]).
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Created, InitComplete)
                | (Created, InitError)
                | (InitComplete, Running)
                | (Running, ShutdownStarted)
                | (ShutdownStarted, ShutdownCompleted)
        )
    }

    /// The restart path's Running -> Created loop.
    pub fn restart(self) -> LifecycleState {
        LifecycleState::Created
    }
}

/// A module declaration as loaded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub id: ModuleId,
    pub name: String,
    pub impl_assembly: String,
    pub impl_class: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub concurrent_init: bool,
    #[serde(default)]
    pub config: HashMap<String, String>,
    pub variables_file_name: PathBuf,
}

fn default_true() -> bool {
    true
}

/// Supervisor-side bookkeeping for one module: its config, lifecycle state,
/// last error, and the restart-in-progress guard.
#[derive(Debug, Clone)]
pub struct ModuleState {
    pub config: ModuleConfig,
    pub state: LifecycleState,
    pub last_error: Option<String>,
    pub is_restarting: bool,
    pub restart_count: u32,
}

impl ModuleState {
    pub fn new(config: ModuleConfig) -> Self {
        Self {
            config,
            state: LifecycleState::Created,
            last_error: None,
            is_restarting: false,
            restart_count: 0,
        }
    }

    /// Apply a transition, returning `false` (and leaving state untouched)
    /// if the transition isn't legal from the current state.
    pub fn transition_to(&mut self, next: LifecycleState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.state = LifecycleState::InitError;
    }

    /// `min(10s, (retry+1) * 1s)` exponential-style restart backoff.
    pub fn next_backoff_ms(&self) -> i64 {
        let retry = self.restart_count as i64;
        std::cmp::min(10_000, (retry + 1) * 1_000)
    }
}
