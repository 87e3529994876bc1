// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routes variable-history traffic to the correct historian worker and
//! translates its results into the engine-facing `Result` shape.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use mediator_adapters::HistorianBackend;
use mediator_core::{
    Bounding, Clock, Event, MediatorError, ModuleId, QualityFilter, Severity, Timestamp,
    VariableRef, Vttq,
};
use mediator_storage::{HistorianWorker, WorkResult};

/// A dedicated single-consumer task per historian database. `post` is
/// non-blocking from the caller's perspective: it returns a future resolving
/// to the item's result once the worker's task actually executes it.
struct HistorianHandle {
    tx: mpsc::UnboundedSender<(mediator_core::WorkItem, oneshot::Sender<WorkResult>)>,
}

impl HistorianHandle {
    fn spawn<B: HistorianBackend + 'static>(backend: B, read_prioritization: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(historian_task(backend, read_prioritization, rx));
        Self { tx }
    }

    /// Sends `item` into the worker's inbox without waiting for its reply.
    /// Submitting a whole batch via `submit` before awaiting any of the
    /// returned receivers is what lets the worker's drain loop actually see
    /// more than one item at a time: every send here happens before this
    /// task's next `.await`, so none of them can be scheduled away from the
    /// consumer task mid-batch the way a submit-then-await-each-reply loop
    /// would.
    fn submit(&self, item: mediator_core::WorkItem) -> oneshot::Receiver<WorkResult> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self.tx.send((item, reply_tx));
        reply_rx
    }

    async fn post(&self, item: mediator_core::WorkItem) -> WorkResult {
        self.submit(item)
            .await
            .unwrap_or_else(|_| WorkResult::Error("historian worker terminated".into()))
    }
}

async fn historian_task<B: HistorianBackend + 'static>(
    backend: B,
    read_prioritization: bool,
    mut rx: mpsc::UnboundedReceiver<(mediator_core::WorkItem, oneshot::Sender<WorkResult>)>,
) {
    let mut worker = HistorianWorker::new(backend).with_read_prioritization(read_prioritization);
    while let Some((item, reply)) = rx.recv().await {
        let mut batch = vec![item];
        let mut replies = vec![reply];
        // Drain whatever else is already queued so PrioritizeAndCompress has
        // a real batch to work with instead of one item at a time.
        while let Ok((item, reply)) = rx.try_recv() {
            batch.push(item);
            replies.push(reply);
        }
        let results = worker.process_batch_per_item(batch);
        for (reply, result) in replies.into_iter().zip(results) {
            let _ = reply.send(result);
        }
    }
}

/// Fans variable-value batches out to the historian worker that owns the
/// DB for the variable's module, and exposes the uniform historian API the
/// request handler calls.
pub struct HistorianManager<C: Clock> {
    workers: HashMap<ModuleId, Arc<HistorianHandle>>,
    clock: C,
    timestamp_check_warning_ms: i64,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl<C: Clock> HistorianManager<C> {
    pub fn new(clock: C, timestamp_check_warning_ms: i64, event_tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            workers: HashMap::new(),
            clock,
            timestamp_check_warning_ms,
            event_tx,
        }
    }

    /// Registers the historian worker backing `module_id`'s variables.
    pub fn register_worker<B: HistorianBackend + 'static>(
        &mut self,
        module_id: ModuleId,
        backend: B,
        read_prioritization: bool,
    ) {
        self.workers.insert(
            module_id,
            Arc::new(HistorianHandle::spawn(backend, read_prioritization)),
        );
    }

    fn handle_for(&self, variable: &VariableRef) -> Result<Arc<HistorianHandle>, MediatorError> {
        self.workers
            .get(variable.module_id())
            .cloned()
            .ok_or_else(|| {
                MediatorError::Request(format!(
                    "no historian worker configured for module '{}'",
                    variable.module_id()
                ))
            })
    }

    /// Appends `rows`, warning (but still appending) when a row's timestamp
    /// diverges from wall-clock by more than the configured threshold.
    /// Emits `VariableHistoryChanged` after a successful append.
    pub async fn append(
        &self,
        variable: VariableRef,
        rows: Vec<Vttq>,
    ) -> Result<(), MediatorError> {
        self.append_many(vec![(variable, rows)])
            .await
            .into_iter()
            .next()
            .unwrap_or(Ok(()))
    }

    /// Appends many `(variable, rows)` batches, submitting every one of
    /// them to its historian worker before awaiting any reply. This is
    /// what lets appends arriving in the same event-loop tick or the same
    /// `WriteVariables` request actually coalesce into one execution per
    /// variable downstream, instead of each caller serializing a full
    /// submit-then-await round trip before the next append is even sent.
    pub async fn append_many(
        &self,
        writes: Vec<(VariableRef, Vec<Vttq>)>,
    ) -> Vec<Result<(), MediatorError>> {
        enum Pending {
            Submitted {
                variable: VariableRef,
                min_ts: Timestamp,
                max_ts: Timestamp,
                receiver: oneshot::Receiver<WorkResult>,
            },
            Empty,
            Failed(MediatorError),
        }

        let now = self.clock.now_ms();
        let mut pending = Vec::with_capacity(writes.len());
        for (variable, rows) in writes {
            for row in &rows {
                let drift = (row.timestamp.as_millis() - now).abs();
                if drift > self.timestamp_check_warning_ms {
                    let _ = self.event_tx.send(Event::AlarmOrEvent {
                        module_id: variable.module_id().clone(),
                        severity: Severity::Warning,
                        message: format!(
                            "historian append for {variable} has timestamp drift of {drift}ms from wall clock"
                        ),
                    });
                }
            }
            let (min_ts, max_ts) = match (
                rows.iter().map(|r| r.timestamp).min(),
                rows.iter().map(|r| r.timestamp).max(),
            ) {
                (Some(min), Some(max)) => (min, max),
                _ => {
                    pending.push(Pending::Empty);
                    continue;
                }
            };
            match self.handle_for(&variable) {
                Ok(handle) => {
                    let receiver = handle.submit(mediator_core::WorkItem::Append {
                        variable: variable.clone(),
                        rows,
                    });
                    pending.push(Pending::Submitted {
                        variable,
                        min_ts,
                        max_ts,
                        receiver,
                    });
                }
                Err(e) => pending.push(Pending::Failed(e)),
            }
        }

        let mut results = Vec::with_capacity(pending.len());
        for item in pending {
            results.push(match item {
                Pending::Empty => Ok(()),
                Pending::Failed(e) => Err(e),
                Pending::Submitted {
                    variable,
                    min_ts,
                    max_ts,
                    receiver,
                } => {
                    let result = receiver
                        .await
                        .unwrap_or_else(|_| WorkResult::Error("historian worker terminated".into()));
                    match result {
                        WorkResult::Ack => {
                            let _ = self.event_tx.send(Event::VariableHistoryChanged {
                                variable,
                                min_timestamp: min_ts,
                                max_timestamp: max_ts,
                            });
                            Ok(())
                        }
                        WorkResult::Error(e) => Err(MediatorError::internal(e)),
                        other => Err(MediatorError::internal(format!(
                            "unexpected historian result: {other:?}"
                        ))),
                    }
                }
            });
        }
        results
    }

    pub async fn read_raw(
        &self,
        variable: VariableRef,
        start: Timestamp,
        end: Timestamp,
        max_values: usize,
        bounding: Bounding,
        quality_filter: QualityFilter,
    ) -> Result<Vec<Vttq>, MediatorError> {
        let handle = self.handle_for(&variable)?;
        match handle
            .post(mediator_core::WorkItem::ReadRaw {
                variable,
                start,
                end,
                max_values,
                bounding,
                quality_filter,
            })
            .await
        {
            WorkResult::Rows(rows) => Ok(rows),
            WorkResult::Error(e) => Err(MediatorError::internal(e)),
            other => Err(MediatorError::internal(format!("unexpected historian result: {other:?}"))),
        }
    }

    pub async fn count(
        &self,
        variable: VariableRef,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<usize, MediatorError> {
        let handle = self.handle_for(&variable)?;
        match handle
            .post(mediator_core::WorkItem::Count { variable, start, end })
            .await
        {
            WorkResult::Count(n) => Ok(n),
            WorkResult::Error(e) => Err(MediatorError::internal(e)),
            other => Err(MediatorError::internal(format!("unexpected historian result: {other:?}"))),
        }
    }

    pub async fn get_latest(&self, variable: VariableRef) -> Result<Option<Vttq>, MediatorError> {
        let handle = self.handle_for(&variable)?;
        match handle.post(mediator_core::WorkItem::GetLatest { variable }).await {
            WorkResult::Latest(v) => Ok(v),
            WorkResult::Error(e) => Err(MediatorError::internal(e)),
            other => Err(MediatorError::internal(format!("unexpected historian result: {other:?}"))),
        }
    }

    pub async fn delete_interval(
        &self,
        variable: VariableRef,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<(), MediatorError> {
        let handle = self.handle_for(&variable)?;
        match handle
            .post(mediator_core::WorkItem::DeleteInterval { variable, start, end })
            .await
        {
            WorkResult::Ack => Ok(()),
            WorkResult::Error(e) => Err(MediatorError::internal(e)),
            other => Err(MediatorError::internal(format!("unexpected historian result: {other:?}"))),
        }
    }

    pub async fn modify(
        &self,
        variable: VariableRef,
        mode: mediator_core::ModifyMode,
        rows: Vec<Vttq>,
    ) -> Result<(), MediatorError> {
        let handle = self.handle_for(&variable)?;
        match handle
            .post(mediator_core::WorkItem::Modify { variable, mode, rows })
            .await
        {
            WorkResult::Ack => Ok(()),
            WorkResult::Error(e) => Err(MediatorError::Conflict(e)),
            other => Err(MediatorError::internal(format!("unexpected historian result: {other:?}"))),
        }
    }
}

#[cfg(test)]
#[path = "historian_manager_tests.rs"]
mod tests;
