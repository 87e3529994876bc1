// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The historian worker: serialises all access to one time-series database.

use std::collections::{HashMap, VecDeque};

use mediator_adapters::HistorianBackend;
use mediator_core::refs::VariableRef;
use mediator_core::work_item::{apply_bounding, WorkItem};
use mediator_core::Vttq;

use super::queue::prioritize_and_compress;

/// The outcome of executing one `WorkItem`.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkResult {
    Rows(Vec<Vttq>),
    Count(usize),
    Latest(Option<Vttq>),
    Ack,
    Started,
    Terminated,
    Error(String),
}

/// Owns a `HistorianBackend` and drains work items against it, applying
/// `PrioritizeAndCompress` to each batch before execution. Never panics on a
/// per-item failure: errors surface as `WorkResult::Error` for that item
/// alone. Once `Terminate` is processed, every further submission fails with
/// a "terminated" error rather than touching the (closed) backend.
pub struct HistorianWorker<B: HistorianBackend> {
    backend: Option<B>,
    read_prioritization: bool,
}

impl<B: HistorianBackend> HistorianWorker<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Some(backend),
            read_prioritization: true,
        }
    }

    pub fn with_read_prioritization(mut self, enabled: bool) -> Self {
        self.read_prioritization = enabled;
        self
    }

    pub fn is_terminated(&self) -> bool {
        self.backend.is_none()
    }

    /// Drains `items` in one pass: applies the queue discipline, then
    /// executes sequentially, returning one `WorkResult` per input item in
    /// the order they were actually executed (post-reordering).
    pub fn process_batch(&mut self, items: Vec<WorkItem>) -> Vec<WorkResult> {
        if self.backend.is_none() {
            return items
                .into_iter()
                .map(|_| WorkResult::Error("historian worker terminated".into()))
                .collect();
        }

        let mut queue: VecDeque<WorkItem> = items.into();
        prioritize_and_compress(&mut queue, self.read_prioritization);

        let mut results = Vec::with_capacity(queue.len());
        while let Some(item) = queue.pop_front() {
            results.push(self.execute(item));
            if self.backend.is_none() {
                break;
            }
        }
        results
    }

    /// Same discipline as [`HistorianWorker::process_batch`], but the
    /// returned vector always has exactly `items.len()` entries in
    /// submission order. `process_batch` returns results in *execution*
    /// order, which silently desyncs from the caller's submission order
    /// the moment `PrioritizeAndCompress` reorders a read ahead of pending
    /// appends, or merges several leading appends for the same variable
    /// into one execution. Callers that owe each original submitter its
    /// own reply (rather than just inspecting a batch's contents, as
    /// `process_batch`'s own tests do) need this form: every index that
    /// contributed to a merged append receives that execution's shared
    /// result.
    pub fn process_batch_per_item(&mut self, items: Vec<WorkItem>) -> Vec<WorkResult> {
        let len = items.len();
        if self.backend.is_none() {
            return vec![WorkResult::Error("historian worker terminated".into()); len];
        }

        let mut queue: VecDeque<(WorkItem, Vec<usize>)> = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (item, vec![i]))
            .collect();
        prioritize_and_compress_tracked(&mut queue, self.read_prioritization);

        let mut results: Vec<Option<WorkResult>> = vec![None; len];
        while let Some((item, indices)) = queue.pop_front() {
            let result = self.execute(item);
            for i in indices {
                results[i] = Some(result.clone());
            }
            if self.backend.is_none() {
                break;
            }
        }
        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| WorkResult::Error("historian worker terminated".into())))
            .collect()
    }

    fn execute(&mut self, item: WorkItem) -> WorkResult {
        let backend = match &mut self.backend {
            Some(b) => b,
            None => return WorkResult::Error("historian worker terminated".into()),
        };

        match item {
            WorkItem::Start => WorkResult::Started,
            WorkItem::Terminate => {
                self.backend = None;
                WorkResult::Terminated
            }
            WorkItem::Append { variable, rows } => {
                let channel = match backend.ensure_channel(&variable) {
                    Ok(c) => c,
                    Err(e) => return WorkResult::Error(e.to_string()),
                };
                match backend.append(channel, &rows) {
                    Ok(()) => WorkResult::Ack,
                    Err(e) => WorkResult::Error(e.to_string()),
                }
            }
            WorkItem::ReadRaw {
                variable,
                start,
                end,
                max_values,
                bounding,
                quality_filter,
            } => {
                let channel = match backend.ensure_channel(&variable) {
                    Ok(c) => c,
                    Err(e) => return WorkResult::Error(e.to_string()),
                };
                match backend.read_raw(channel, start, end, quality_filter) {
                    Ok(rows) => WorkResult::Rows(apply_bounding(rows, max_values, bounding)),
                    Err(e) => WorkResult::Error(e.to_string()),
                }
            }
            WorkItem::Count {
                variable,
                start,
                end,
            } => {
                let channel = match backend.ensure_channel(&variable) {
                    Ok(c) => c,
                    Err(e) => return WorkResult::Error(e.to_string()),
                };
                match backend.count(
                    channel,
                    start,
                    end,
                    mediator_core::work_item::QualityFilter::ExcludeNone,
                ) {
                    Ok(n) => WorkResult::Count(n),
                    Err(e) => WorkResult::Error(e.to_string()),
                }
            }
            WorkItem::DeleteInterval {
                variable,
                start,
                end,
            } => {
                let channel = match backend.ensure_channel(&variable) {
                    Ok(c) => c,
                    Err(e) => return WorkResult::Error(e.to_string()),
                };
                match backend.delete_interval(channel, start, end) {
                    Ok(()) => WorkResult::Ack,
                    Err(e) => WorkResult::Error(e.to_string()),
                }
            }
            WorkItem::GetLatest { variable } => {
                let channel = match backend.ensure_channel(&variable) {
                    Ok(c) => c,
                    Err(e) => return WorkResult::Error(e.to_string()),
                };
                match backend.get_latest(channel) {
                    Ok(v) => WorkResult::Latest(v),
                    Err(e) => WorkResult::Error(e.to_string()),
                }
            }
            WorkItem::Modify {
                variable,
                mode,
                rows,
            } => {
                let channel = match backend.ensure_channel(&variable) {
                    Ok(c) => c,
                    Err(e) => return WorkResult::Error(e.to_string()),
                };
                match backend.modify(channel, mode, &rows) {
                    Ok(()) => WorkResult::Ack,
                    Err(e) => WorkResult::Error(e.to_string()),
                }
            }
            WorkItem::Delete { variable } => {
                let channel = match backend.ensure_channel(&variable) {
                    Ok(c) => c,
                    Err(e) => return WorkResult::Error(e.to_string()),
                };
                match backend.delete_channel(channel) {
                    Ok(()) => WorkResult::Ack,
                    Err(e) => WorkResult::Error(e.to_string()),
                }
            }
        }
    }
}

/// Mirrors `queue::prioritize_and_compress`, carrying each item's
/// contributing original-batch indices alongside it through reordering and
/// coalescing.
fn prioritize_and_compress_tracked(
    queue: &mut VecDeque<(WorkItem, Vec<usize>)>,
    read_prioritization: bool,
) {
    if read_prioritization {
        promote_first_read_tracked(queue);
    }
    coalesce_leading_appends_tracked(queue);
}

fn promote_first_read_tracked(queue: &mut VecDeque<(WorkItem, Vec<usize>)>) {
    match queue.front() {
        Some((item, _)) if item.is_read() => return,
        None => return,
        _ => {}
    }
    if let Some(pos) = queue.iter().position(|(item, _)| item.is_read()) {
        if let Some(entry) = queue.remove(pos) {
            queue.push_front(entry);
        }
    }
}

fn coalesce_leading_appends_tracked(queue: &mut VecDeque<(WorkItem, Vec<usize>)>) {
    if !matches!(queue.front(), Some((item, _)) if item.is_append()) {
        return;
    }

    let mut order: Vec<VariableRef> = Vec::new();
    let mut merged: HashMap<VariableRef, (Vec<Vttq>, Vec<usize>)> = HashMap::new();
    let mut consumed = 0usize;

    for (item, indices) in queue.iter() {
        if !item.is_append() {
            break;
        }
        if let WorkItem::Append { variable, rows } = item {
            if !merged.contains_key(variable) {
                order.push(variable.clone());
            }
            let entry = merged.entry(variable.clone()).or_default();
            entry.0.extend(rows.iter().cloned());
            entry.1.extend(indices.iter().copied());
        }
        consumed += 1;
    }

    if consumed <= 1 {
        return;
    }

    for _ in 0..consumed {
        queue.pop_front();
    }

    for variable in order.into_iter().rev() {
        let (rows, indices) = merged.remove(&variable).unwrap_or_default();
        queue.push_front((WorkItem::Append { variable, rows }, indices));
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
