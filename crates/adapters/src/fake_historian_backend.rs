// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A counting wrapper around `SqliteHistorianBackend`, for tests asserting
//! how many append executions a batch of submissions actually produced.

use std::sync::Arc;

use parking_lot::Mutex;

use mediator_core::refs::ChannelId;
use mediator_core::work_item::{ModifyMode, QualityFilter};
use mediator_core::{MediatorError, Timestamp, VariableRef, Vttq};

use crate::historian_backend::HistorianBackend;
use crate::sqlite_backend::SqliteHistorianBackend;

#[derive(Debug, Clone, Default)]
pub struct FakeHistorianBackendCalls {
    pub append_count: u32,
    pub rows_appended: usize,
}

/// Delegates to an in-memory `SqliteHistorianBackend` for real behavior,
/// recording how many `append` calls actually reached the backend.
pub struct FakeHistorianBackend {
    inner: SqliteHistorianBackend,
    calls: Arc<Mutex<FakeHistorianBackendCalls>>,
}

impl FakeHistorianBackend {
    pub fn new(calls: Arc<Mutex<FakeHistorianBackendCalls>>) -> Self {
        Self {
            inner: SqliteHistorianBackend::open_in_memory()
                .expect("in-memory sqlite backend for tests"),
            calls,
        }
    }
}

impl HistorianBackend for FakeHistorianBackend {
    fn ensure_channel(&mut self, variable: &VariableRef) -> Result<ChannelId, MediatorError> {
        self.inner.ensure_channel(variable)
    }

    fn append(&mut self, channel: ChannelId, rows: &[Vttq]) -> Result<(), MediatorError> {
        {
            let mut calls = self.calls.lock();
            calls.append_count += 1;
            calls.rows_appended += rows.len();
        }
        self.inner.append(channel, rows)
    }

    fn read_raw(
        &mut self,
        channel: ChannelId,
        start: Timestamp,
        end: Timestamp,
        quality_filter: QualityFilter,
    ) -> Result<Vec<Vttq>, MediatorError> {
        self.inner.read_raw(channel, start, end, quality_filter)
    }

    fn count(
        &mut self,
        channel: ChannelId,
        start: Timestamp,
        end: Timestamp,
        quality_filter: QualityFilter,
    ) -> Result<usize, MediatorError> {
        self.inner.count(channel, start, end, quality_filter)
    }

    fn delete_interval(
        &mut self,
        channel: ChannelId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<(), MediatorError> {
        self.inner.delete_interval(channel, start, end)
    }

    fn get_latest(&mut self, channel: ChannelId) -> Result<Option<Vttq>, MediatorError> {
        self.inner.get_latest(channel)
    }

    fn modify(
        &mut self,
        channel: ChannelId,
        mode: ModifyMode,
        rows: &[Vttq],
    ) -> Result<(), MediatorError> {
        self.inner.modify(channel, mode, rows)
    }

    fn delete_channel(&mut self, channel: ChannelId) -> Result<(), MediatorError> {
        self.inner.delete_channel(channel)
    }
}
