// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mediator_adapters::{FakeModuleFactory, FakeModuleScript};

#[test]
fn registering_under_the_same_class_overwrites() {
    let mut registry = ModuleRegistry::new();
    registry.register(
        "calc-engine",
        Arc::new(FakeModuleFactory::new(FakeModuleScript::default())),
    );
    registry.register(
        "calc-engine",
        Arc::new(FakeModuleFactory::new(FakeModuleScript::default())),
    );
    assert_eq!(registry.into_map().len(), 1);
}

#[test]
fn an_empty_registry_is_valid() {
    assert!(ModuleRegistry::new().into_map().is_empty());
}
