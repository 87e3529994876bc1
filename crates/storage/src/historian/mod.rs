// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Historian worker: queue discipline plus the execution loop over a
//! `HistorianBackend`.

mod queue;
mod worker;

pub use queue::prioritize_and_compress;
pub use worker::{HistorianWorker, WorkResult};
