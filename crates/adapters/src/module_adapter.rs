// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pluggable module/driver boundary the supervisor loads instances
//! through.

use async_trait::async_trait;
use mediator_core::{Event, MediatorError, ModuleId};
use tokio::sync::{mpsc, watch};

/// The predicate a running module polls to learn whether the supervisor has
/// asked it to stop. Cheap to clone; backed by a `tokio::sync::watch`.
#[derive(Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self(rx)
    }

    pub fn should_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the supervisor flips the signal.
    pub async fn wait(&mut self) {
        let _ = self.0.changed().await;
    }
}

/// Handle a module uses to post callbacks back onto the supervisor's
/// execution context. Callbacks may originate on any thread; the channel is
/// the re-posting mechanism.
#[derive(Clone)]
pub struct ModuleContext {
    pub module_id: ModuleId,
    events: mpsc::UnboundedSender<Event>,
}

impl ModuleContext {
    pub fn new(module_id: ModuleId, events: mpsc::UnboundedSender<Event>) -> Self {
        Self { module_id, events }
    }

    /// Post an event to the supervisor. Silently dropped if the supervisor
    /// has already shut down and closed its receiver.
    pub fn notify(&self, event: Event) {
        let _ = self.events.send(event);
    }
}

/// A loaded module instance: the supervisor's view of a data-acquisition
/// driver, calculation engine, alarm engine, or dashboard backend.
#[async_trait]
pub trait ModuleAdapter: Send {
    /// One-time initialization. Returning `Err` is reported as an
    /// `InitFailed` system event and aborts startup (or schedules a retry,
    /// during a restart).
    async fn init(&mut self, ctx: ModuleContext) -> Result<(), MediatorError>;

    /// The module's run loop, invoked once on the supervisor's execution
    /// context. Must return once `should_shutdown` observes `true`.
    async fn run(&mut self, should_shutdown: ShutdownSignal) -> Result<(), MediatorError>;

    /// Called when `init` fails or is cancelled mid-flight.
    async fn init_abort(&mut self);

    /// Called after `run` returns, during an orderly shutdown.
    async fn shutdown(&mut self);
}

pub type BoxedModule = Box<dyn ModuleAdapter>;

/// Creates a fresh module instance. The supervisor calls this once at
/// startup and again on every restart, since restart "recreates the module
/// instance" rather than reusing one that may hold broken state.
pub trait ModuleFactory: Send + Sync {
    fn create(&self) -> BoxedModule;
}

#[cfg(test)]
#[path = "module_adapter_tests.rs"]
mod tests;
