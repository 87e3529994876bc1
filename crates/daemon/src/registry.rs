// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The module factory registry: a compile-time map from a configured
//! module's `ImplClass` to the [`ModuleFactory`] that builds instances of
//! it.
//!
//! The upstream driver loaded its modules by reflecting over an assembly
//! named in configuration. That has no equivalent once module instances are
//! ordinary Rust values: instead, whatever binary embeds this crate links in
//! the adapter crates it needs and registers their factories here under the
//! same `ImplClass` identifiers a deployed configuration already names.
//! `mediatord`'s `main` registers none by default — an empty registry is a
//! valid, if inert, configuration for tests and for a control-plane-only
//! deployment.

use std::collections::HashMap;
use std::sync::Arc;

use mediator_adapters::ModuleFactory;

/// A `ImplClass -> ModuleFactory` table, built once at startup and handed to
/// [`crate::process::Mediator::start`].
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    factories: HashMap<String, Arc<dyn ModuleFactory>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `impl_class`, overwriting any previous
    /// registration for the same key.
    pub fn register(&mut self, impl_class: impl Into<String>, factory: Arc<dyn ModuleFactory>) {
        self.factories.insert(impl_class.into(), factory);
    }

    pub fn into_map(self) -> HashMap<String, Arc<dyn ModuleFactory>> {
        self.factories
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
