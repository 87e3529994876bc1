// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mediator daemon library: configuration, process wiring, the module
//! factory registry, and the HTTP/WebSocket transport on top of
//! `mediator-engine`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod process;
pub mod registry;
pub mod rpc;
pub mod transport;

pub use config::{ConfigError, CredentialsConfig, Location, MediatorConfig};
pub use process::Mediator;
pub use registry::ModuleRegistry;
pub use rpc::{RpcOk, RpcRequest};
pub use transport::{router, serve};
