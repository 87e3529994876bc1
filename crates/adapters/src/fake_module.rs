// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scriptable `ModuleAdapter` for supervisor tests.

use async_trait::async_trait;
use mediator_core::MediatorError;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::module_adapter::{ModuleAdapter, ModuleContext, ModuleFactory, ShutdownSignal};

#[derive(Debug, Clone, Default)]
pub struct FakeModuleScript {
    pub fail_init: bool,
    pub fail_run: bool,
    /// If set, `run` returns immediately instead of waiting on the shutdown
    /// signal, simulating a module whose run loop exits on its own.
    pub run_returns_immediately: bool,
}

/// Records what the supervisor called, for assertions.
#[derive(Debug, Clone, Default)]
pub struct FakeModuleCalls {
    pub init_count: u32,
    pub init_abort_count: u32,
    pub run_count: u32,
    pub shutdown_count: u32,
}

pub struct FakeModule {
    script: FakeModuleScript,
    calls: Arc<Mutex<FakeModuleCalls>>,
}

impl FakeModule {
    pub fn new(script: FakeModuleScript, calls: Arc<Mutex<FakeModuleCalls>>) -> Self {
        Self { script, calls }
    }
}

#[async_trait]
impl ModuleAdapter for FakeModule {
    async fn init(&mut self, _ctx: ModuleContext) -> Result<(), MediatorError> {
        self.calls.lock().init_count += 1;
        if self.script.fail_init {
            return Err(MediatorError::internal("fake module init failure"));
        }
        Ok(())
    }

    async fn run(&mut self, mut should_shutdown: ShutdownSignal) -> Result<(), MediatorError> {
        self.calls.lock().run_count += 1;
        if self.script.run_returns_immediately {
            return if self.script.fail_run {
                Err(MediatorError::internal("fake module run failure"))
            } else {
                Ok(())
            };
        }
        while !should_shutdown.should_shutdown() {
            should_shutdown.wait().await;
        }
        if self.script.fail_run {
            Err(MediatorError::internal("fake module run failure"))
        } else {
            Ok(())
        }
    }

    async fn init_abort(&mut self) {
        self.calls.lock().init_abort_count += 1;
    }

    async fn shutdown(&mut self) {
        self.calls.lock().shutdown_count += 1;
    }
}

/// Builds a fresh [`FakeModule`] per call, matching `ModuleFactory`'s
/// contract that restart recreates the instance.
pub struct FakeModuleFactory {
    pub script: FakeModuleScript,
    pub calls: Arc<Mutex<FakeModuleCalls>>,
}

impl FakeModuleFactory {
    pub fn new(script: FakeModuleScript) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(FakeModuleCalls::default())),
        }
    }
}

impl ModuleFactory for FakeModuleFactory {
    fn create(&self) -> crate::module_adapter::BoxedModule {
        Box::new(FakeModule::new(self.script.clone(), self.calls.clone()))
    }
}

#[cfg(test)]
#[path = "fake_module_tests.rs"]
mod tests;
