// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The mediator process: wires the supervisor, the historian manager, the
//! request handler and the per-module variable stores into one running
//! unit, and runs the event-routing loop that connects them.
//!
//! A module posts an `Event` onto the supervisor's channel (via its
//! `ModuleContext`); the historian manager posts its own `VariableHistoryChanged`
//! events onto the same channel once an append lands. [`Mediator::run_event_loop`]
//! drains that channel and, for every event: applies value changes to the
//! owning module's [`VariableStore`], forwards historized values to the
//! historian, and fans the event out to every subscribed session.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use mediator_adapters::ModuleFactory;
use mediator_core::{
    Clock, Event, MediatorError, ModuleConfig, ModuleId, SessionId, SystemClock, Timestamp,
    VariableRef, Vttq,
};
use mediator_engine::{Credentials, HistorianManager, RequestHandler, Supervisor};
use mediator_storage::{FsVariablesFileWriter, VariableStore};

/// Everything the transport layer needs a handle to in order to serve a
/// request: the live session table, the variable stores, the historian
/// manager, and the supervisor.
pub struct Mediator<C: Clock = SystemClock> {
    pub supervisor: Arc<Supervisor>,
    pub historian: Arc<HistorianManager<C>>,
    pub handler: Arc<Mutex<RequestHandler>>,
    pub var_stores: Arc<Mutex<HashMap<ModuleId, VariableStore<FsVariablesFileWriter>>>>,
    /// Signalled every time fan-out may have queued a new outbound event, so
    /// the per-session WebSocket writer tasks know to check their queue
    /// rather than poll it.
    pub session_wake: Arc<Notify>,
    clock: C,
    start_complete_file: Option<PathBuf>,
}

impl Mediator<SystemClock> {
    pub fn new(
        credentials: Credentials,
        idle_timeout_ms: i64,
        timestamp_check_warning_ms: i64,
        start_complete_file: Option<PathBuf>,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        Self::with_clock(
            credentials,
            idle_timeout_ms,
            timestamp_check_warning_ms,
            start_complete_file,
            SystemClock,
        )
    }
}

impl<C: Clock + Clone> Mediator<C> {
    pub fn with_clock(
        credentials: Credentials,
        idle_timeout_ms: i64,
        timestamp_check_warning_ms: i64,
        start_complete_file: Option<PathBuf>,
        clock: C,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let supervisor = Arc::new(Supervisor::new(tx.clone()));
        let historian = Arc::new(HistorianManager::new(
            clock.clone(),
            timestamp_check_warning_ms,
            tx,
        ));
        let handler = Arc::new(Mutex::new(RequestHandler::new(credentials, idle_timeout_ms)));

        let mediator = Self {
            supervisor,
            historian,
            handler,
            var_stores: Arc::new(Mutex::new(HashMap::new())),
            session_wake: Arc::new(Notify::new()),
            clock,
            start_complete_file,
        };
        (mediator, rx)
    }

    /// Loads (or creates) one [`VariableStore`] per configured module, then
    /// brings every module to `Running`. On success, marks the request
    /// handler open for dispatch and writes the start-complete file.
    pub async fn start(
        &self,
        modules: Vec<ModuleConfig>,
        registry: &HashMap<String, Arc<dyn ModuleFactory>>,
    ) -> Result<(), MediatorError> {
        {
            let mut stores = self.var_stores.lock();
            for cfg in &modules {
                let store = VariableStore::load(FsVariablesFileWriter, cfg.variables_file_name.clone())
                    .map_err(|e| MediatorError::internal_with_source("failed to load variables file", e))?;
                stores.insert(cfg.id.clone(), store);
            }
        }

        self.supervisor.start(modules, registry).await?;
        self.handler.lock().mark_started();
        self.write_start_complete_file();
        Ok(())
    }

    /// Drains `events_rx` until the channel closes, batching up whatever
    /// else is already queued with the event that woke this iteration and
    /// routing the whole batch through [`Mediator::handle_events`]. Batching
    /// here (rather than one `handle_event` call per item) is what lets
    /// historized value changes that land in the same tick actually reach
    /// the historian manager's `append_many` together instead of each one
    /// serializing its own submit-then-await round trip before the next is
    /// even sent.
    pub async fn run_event_loop(&self, mut events_rx: mpsc::UnboundedReceiver<Event>) {
        while let Some(event) = events_rx.recv().await {
            let mut batch = vec![event];
            while let Ok(event) = events_rx.try_recv() {
                batch.push(event);
            }
            self.handle_events(batch).await;
        }
    }

    /// Applies one event. A thin wrapper over [`Mediator::handle_events`]
    /// for the transport layer's single-write call sites.
    pub async fn handle_event(&self, event: Event) {
        self.handle_events(vec![event]).await;
    }

    /// Applies a batch of events: updates each owning module's variable
    /// store and collects the historized ones into a single
    /// `HistorianManager::append_many` call, then fans every event out to
    /// every subscribed session. Used both by [`Mediator::run_event_loop`]
    /// (module-originated events) and directly by the transport layer for
    /// RPC-originated writes, so both paths share one code path.
    pub async fn handle_events(&self, events: Vec<Event>) {
        let mut writes: Vec<(VariableRef, Vec<Vttq>)> = Vec::new();

        for event in &events {
            let Event::VariableValueChanged { variable, value } = event else {
                continue;
            };
            let historize = {
                let mut stores = self.var_stores.lock();
                match stores.get_mut(variable.module_id()) {
                    Some(store) => {
                        store.update(vec![(variable.clone(), value.clone())], false);
                        store.is_historized(variable)
                    }
                    None => {
                        tracing::warn!(module_id = %variable.module_id(), "value change for unconfigured module");
                        false
                    }
                }
            };
            if historize {
                let vttq = Vttq {
                    value: value.value.clone(),
                    timestamp: value.timestamp,
                    transaction_timestamp: Timestamp::from_millis(self.clock.now_ms()),
                    quality: value.quality,
                };
                writes.push((variable.clone(), vec![vttq]));
            }
        }

        if !writes.is_empty() {
            for result in self.historian.append_many(writes).await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "historian append failed for value change");
                }
            }
        }

        {
            let mut handler = self.handler.lock();
            for event in events {
                handler.fan_out(event);
            }
        }
        self.session_wake.notify_waiters();
    }

    /// Purges abandoned sessions (call at ~1 Hz).
    pub fn sweep_abandoned_sessions(&self, now_ms: i64) -> Vec<SessionId> {
        self.handler.lock().sweep_abandoned(now_ms)
    }

    pub fn clock_now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Orderly shutdown: stop every module, flush variable stores, and
    /// remove the start-complete file.
    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
        let stores = self.var_stores.lock();
        for (module_id, store) in stores.iter() {
            if let Err(e) = store.flush() {
                tracing::warn!(%module_id, error = %e, "failed to flush variables file during shutdown");
            }
        }
        drop(stores);
        self.remove_start_complete_file();
    }

    fn write_start_complete_file(&self) {
        let Some(path) = &self.start_complete_file else {
            return;
        };
        let now = self.clock.now();
        if let Err(e) = fs::write(path, now.to_iso8601()) {
            tracing::warn!(error = %e, path = %path.display(), "failed to write start-complete file");
        }
    }

    fn remove_start_complete_file(&self) {
        let Some(path) = &self.start_complete_file else {
            return;
        };
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, path = %path.display(), "failed to remove start-complete file");
            }
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
