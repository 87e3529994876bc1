// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Module supervisor, historian manager, and request handler: the engine
//! that turns a set of configured modules into a running mediator process.

pub mod historian_manager;
pub mod request_handler;
pub mod supervisor;

pub use historian_manager::HistorianManager;
pub use request_handler::{
    Credentials, LoginChallenge, LoginRequest, RequestHandler, UserCredential,
};
pub use supervisor::Supervisor;
