// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The swap point between the historian worker's queue discipline and a
//! concrete time-series database dialect.

use mediator_core::refs::ChannelId;
use mediator_core::work_item::{ModifyMode, QualityFilter};
use mediator_core::{MediatorError, Timestamp, VariableRef, Vttq};

/// A single DB-backed time-series database. Every method is synchronous and
/// is only ever called from the historian worker's owning task, matching the
/// "historian workers own their DB connection" ownership rule.
pub trait HistorianBackend: Send {
    /// Looks up or creates the channel for `variable`. Creating the channel
    /// and its data table happens atomically with the index row.
    fn ensure_channel(&mut self, variable: &VariableRef) -> Result<ChannelId, MediatorError>;

    /// Appends `rows` to `channel` inside a single transaction.
    fn append(&mut self, channel: ChannelId, rows: &[Vttq]) -> Result<(), MediatorError>;

    /// Returns rows in `[start, end]` ascending by timestamp, already
    /// filtered by `quality_filter`. Bounding/downsampling to `max_values`
    /// is applied by the caller via `mediator_core::work_item::apply_bounding`.
    fn read_raw(
        &mut self,
        channel: ChannelId,
        start: Timestamp,
        end: Timestamp,
        quality_filter: QualityFilter,
    ) -> Result<Vec<Vttq>, MediatorError>;

    fn count(
        &mut self,
        channel: ChannelId,
        start: Timestamp,
        end: Timestamp,
        quality_filter: QualityFilter,
    ) -> Result<usize, MediatorError>;

    fn delete_interval(
        &mut self,
        channel: ChannelId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<(), MediatorError>;

    fn get_latest(&mut self, channel: ChannelId) -> Result<Option<Vttq>, MediatorError>;

    /// Applies `mode`'s row-level conflict policy. Fails (and rolls back)
    /// entirely rather than applying a partial batch.
    fn modify(
        &mut self,
        channel: ChannelId,
        mode: ModifyMode,
        rows: &[Vttq],
    ) -> Result<(), MediatorError>;

    fn delete_channel(&mut self, channel: ChannelId) -> Result<(), MediatorError>;
}
