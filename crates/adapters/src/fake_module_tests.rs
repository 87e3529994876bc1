// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use mediator_core::Event;
use tokio::sync::{mpsc, watch};

fn ctx() -> ModuleContext {
    let (tx, _rx) = mpsc::unbounded_channel::<Event>();
    ModuleContext::new(mediator_core::ModuleId::new("modA"), tx)
}

#[tokio::test]
async fn successful_init_and_immediate_run() {
    let factory = FakeModuleFactory::new(FakeModuleScript {
        run_returns_immediately: true,
        ..Default::default()
    });
    let mut module = factory.create();
    assert!(module.init(ctx()).await.is_ok());
    let (_tx, rx) = watch::channel(false);
    assert!(module.run(ShutdownSignal::new(rx)).await.is_ok());
    assert_eq!(factory.calls.lock().init_count, 1);
    assert_eq!(factory.calls.lock().run_count, 1);
}

#[tokio::test]
async fn failing_init_is_reported() {
    let factory = FakeModuleFactory::new(FakeModuleScript {
        fail_init: true,
        ..Default::default()
    });
    let mut module = factory.create();
    assert!(module.init(ctx()).await.is_err());
}

#[tokio::test]
async fn run_exits_once_shutdown_signalled() {
    let factory = FakeModuleFactory::new(FakeModuleScript::default());
    let mut module = factory.create();
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    assert!(module.run(ShutdownSignal::new(rx)).await.is_ok());
}

#[tokio::test]
async fn factory_recreates_a_fresh_instance_each_call() {
    let factory = FakeModuleFactory::new(FakeModuleScript::default());
    let mut a = factory.create();
    a.init(ctx()).await.unwrap();
    let mut b = factory.create();
    b.init(ctx()).await.unwrap();
    assert_eq!(factory.calls.lock().init_count, 2);
}
