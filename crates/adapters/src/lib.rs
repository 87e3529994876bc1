// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Pluggable boundaries: the module/driver adapter trait and the historian
//! backend trait, plus the reference SQLite implementation of the latter.

mod historian_backend;
mod module_adapter;
mod sqlite_backend;

pub use historian_backend::HistorianBackend;
pub use module_adapter::{BoxedModule, ModuleAdapter, ModuleContext, ModuleFactory, ShutdownSignal};
pub use sqlite_backend::SqliteHistorianBackend;

#[cfg(any(test, feature = "test-support"))]
mod fake_historian_backend;
#[cfg(any(test, feature = "test-support"))]
mod fake_module;
#[cfg(any(test, feature = "test-support"))]
pub use fake_historian_backend::{FakeHistorianBackend, FakeHistorianBackendCalls};
#[cfg(any(test, feature = "test-support"))]
pub use fake_module::{FakeModule, FakeModuleCalls, FakeModuleFactory, FakeModuleScript};
