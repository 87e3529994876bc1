// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The module supervisor: lifecycle state machine, init ordering, run loop
//! and restart-with-backoff for every configured module.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};

use mediator_adapters::{BoxedModule, ModuleContext, ModuleFactory, ShutdownSignal};
use mediator_core::{
    Event, LifecycleState, MediatorError, ModuleConfig, ModuleId, ModuleState, SystemEvent,
};

/// Supervisor-side handle for one configured module: its bookkeeping record
/// plus the join handle of its dedicated lifecycle task.
struct ModuleHandle {
    state: Arc<Mutex<ModuleState>>,
    shutdown_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

/// Owns every configured module's lifecycle. All mutation of the module
/// table happens through `&self` methods backed by `parking_lot::Mutex`,
/// mirroring the single supervisor execution context the spec requires —
/// module callbacks are re-posted as [`Event`]s rather than touching this
/// table directly.
pub struct Supervisor {
    modules: Mutex<HashMap<ModuleId, ModuleHandle>>,
    event_tx: mpsc::UnboundedSender<Event>,
}

/// How long the supervisor waits for a module's run task to observe the
/// shutdown signal before proceeding anyway.
const SHUTDOWN_WATCHDOG: StdDuration = StdDuration::from_secs(10);
/// Delay before scheduling a restart after a module's run loop returns.
const RESTART_DELAY: StdDuration = StdDuration::from_secs(1);

impl Supervisor {
    /// `event_tx` receives every `Notify_*` callback re-posted from modules
    /// plus every supervisor-generated `SystemEvent`, converted via
    /// `SystemEvent::into_event`.
    pub fn new(event_tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            modules: Mutex::new(HashMap::new()),
            event_tx,
        }
    }

    /// Boot every enabled module in `configs`: modules with
    /// `concurrent_init = false` are initialised sequentially in
    /// configuration order, the remainder in parallel afterwards. Any init
    /// failure emits `InitFailed`, shuts down every module already started,
    /// and returns the triggering error.
    pub async fn start(
        &self,
        configs: Vec<ModuleConfig>,
        factories: &HashMap<String, Arc<dyn ModuleFactory>>,
    ) -> Result<(), MediatorError> {
        let (sequential, concurrent): (Vec<_>, Vec<_>) = configs
            .into_iter()
            .filter(|c| c.enabled)
            .partition(|c| !c.concurrent_init);

        for cfg in sequential {
            if let Err(e) = self.spawn_module(cfg, factories).await {
                self.shutdown().await;
                return Err(e);
            }
        }

        let mut pending = Vec::with_capacity(concurrent.len());
        for cfg in concurrent {
            pending.push(self.spawn_module(cfg, factories));
        }
        for fut in pending {
            if let Err(e) = fut.await {
                self.shutdown().await;
                return Err(e);
            }
        }

        self.event_tx.send(SystemEvent::SysStartup.into_event()).ok();
        tracing::info!("all modules initialised, startup complete");
        Ok(())
    }

    /// Starts one module's lifecycle task and returns a future resolving
    /// once its first `init` call completes (or fails).
    fn spawn_module(
        &self,
        cfg: ModuleConfig,
        factories: &HashMap<String, Arc<dyn ModuleFactory>>,
    ) -> impl std::future::Future<Output = Result<(), MediatorError>> {
        let id = cfg.id.clone();
        let factory = factories.get(&cfg.impl_class).cloned();
        let state = Arc::new(Mutex::new(ModuleState::new(cfg)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (init_tx, init_rx) = oneshot::channel();
        let event_tx = self.event_tx.clone();

        let task = match factory {
            Some(factory) => {
                let module = factory.create();
                tokio::spawn(module_lifecycle(
                    id.clone(),
                    module,
                    factory,
                    event_tx,
                    state.clone(),
                    shutdown_rx,
                    Some(init_tx),
                ))
            }
            None => {
                let _ = init_tx.send(Err(MediatorError::Request(format!(
                    "no factory registered for impl_class '{}'",
                    state.lock().config.impl_class
                ))));
                tokio::spawn(async {})
            }
        };

        self.modules.lock().insert(
            id,
            ModuleHandle {
                state,
                shutdown_tx,
                task,
            },
        );

        async move {
            init_rx
                .await
                .unwrap_or_else(|_| Err(MediatorError::internal("module task dropped during init")))
        }
    }

    /// Current lifecycle state of a module, if known.
    pub fn module_state(&self, id: &ModuleId) -> Option<LifecycleState> {
        self.modules.lock().get(id).map(|h| h.state.lock().state)
    }

    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.modules.lock().keys().cloned().collect()
    }

    /// Fans shutdown out to every module in parallel, waiting up to
    /// `SHUTDOWN_WATCHDOG` per module before proceeding regardless.
    pub async fn shutdown(&self) {
        let handles: Vec<(ModuleId, watch::Sender<bool>, tokio::task::JoinHandle<()>)> = {
            let mut modules = self.modules.lock();
            modules
                .drain()
                .map(|(id, h)| (id, h.shutdown_tx, h.task))
                .collect()
        };

        let mut waiters = Vec::with_capacity(handles.len());
        for (id, shutdown_tx, task) in handles {
            let _ = shutdown_tx.send(true);
            let event_tx = self.event_tx.clone();
            waiters.push(tokio::spawn(async move {
                if tokio::time::timeout(SHUTDOWN_WATCHDOG, task).await.is_err() {
                    tracing::warn!(module_id = %id, "shutdown watchdog expired");
                    let _ = event_tx.send(SystemEvent::ShutdownTimeout { module_id: id }.into_event());
                }
            }));
        }
        for w in waiters {
            let _ = w.await;
        }
    }
}

/// The body of one module's dedicated task: init, then run, then — unless
/// the supervisor asked for an orderly shutdown — recreate the instance and
/// loop, implementing the restart path in place rather than through a
/// separate restart message.
#[allow(clippy::too_many_arguments)]
async fn module_lifecycle(
    id: ModuleId,
    mut module: BoxedModule,
    factory: Arc<dyn ModuleFactory>,
    event_tx: mpsc::UnboundedSender<Event>,
    state: Arc<Mutex<ModuleState>>,
    mut shutdown_rx: watch::Receiver<bool>,
    mut init_result: Option<oneshot::Sender<Result<(), MediatorError>>>,
) {
    loop {
        let ctx = ModuleContext::new(id.clone(), event_tx.clone());
        match module.init(ctx).await {
            Ok(()) => {
                state.lock().transition_to(LifecycleState::InitComplete);
            }
            Err(e) => {
                state.lock().fail(e.to_string());
                module.init_abort().await;
                if let Some(tx) = init_result.take() {
                    let _ = tx.send(Err(e));
                    return;
                }
                let _ = event_tx.send(
                    SystemEvent::ModuleRestartError {
                        module_id: id.clone(),
                        error: e.to_string(),
                    }
                    .into_event(),
                );
                let backoff = state.lock().next_backoff_ms();
                tokio::time::sleep(StdDuration::from_millis(backoff.max(0) as u64)).await;
                module = factory.create();
                continue;
            }
        }

        if let Some(tx) = init_result.take() {
            let _ = tx.send(Ok(()));
        }
        {
            let mut guard = state.lock();
            guard.transition_to(LifecycleState::Running);
            guard.is_restarting = false;
        }
        tracing::info!(module_id = %id, "module running");

        let signal = ShutdownSignal::new(shutdown_rx.clone());
        let run_result = module.run(signal).await;

        if *shutdown_rx.borrow() {
            state.lock().transition_to(LifecycleState::ShutdownStarted);
            module.shutdown().await;
            state.lock().transition_to(LifecycleState::ShutdownCompleted);
            tracing::info!(module_id = %id, "module shut down cleanly");
            return;
        }

        state.lock().is_restarting = true;

        let message = match run_result {
            Ok(()) => "run loop returned".to_string(),
            Err(e) => e.to_string(),
        };
        let _ = event_tx.send(
            SystemEvent::ModuleRunError {
                module_id: id.clone(),
                error: message,
            }
            .into_event(),
        );
        tokio::time::sleep(RESTART_DELAY).await;
        shutdown_with_watchdog(&id, &mut module).await;
        {
            let mut guard = state.lock();
            guard.restart_count += 1;
            guard.state = LifecycleState::Created;
        }
        let _ = event_tx.send(SystemEvent::ModuleRestart { module_id: id.clone() }.into_event());

        if *shutdown_rx.borrow() {
            let mut guard = state.lock();
            guard.state = LifecycleState::ShutdownCompleted;
            guard.is_restarting = false;
            return;
        }
        module = factory.create();
    }
}

/// Shuts the crashed instance down before it's discarded, matching the
/// restart procedure's "shut down the current instance (10s watchdog;
/// proceed on timeout)" first step. A module that crashed out of its `run`
/// loop never observed the shutdown signal, so this calls `shutdown`
/// directly rather than going through `ShutdownSignal`.
async fn shutdown_with_watchdog(id: &ModuleId, module: &mut BoxedModule) {
    if tokio::time::timeout(SHUTDOWN_WATCHDOG, module.shutdown()).await.is_err() {
        tracing::warn!(module_id = %id, "restart shutdown watchdog expired, proceeding anyway");
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
