// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PrioritizeAndCompress`: the historian worker's queue discipline.
//!
//! Deliberately coarse: it never reorders two writes, never demotes a read
//! past a write, and bounds tail latency of reads in write-heavy workloads.

use std::collections::VecDeque;
use std::collections::HashMap;

use mediator_core::refs::VariableRef;
use mediator_core::work_item::WorkItem;

/// Applies the policy in place to `queue`.
///
/// 1. If `read_prioritization` is set and the head isn't a read, move the
///    first read in the queue to the head.
/// 2. If the head is now an `Append`, coalesce the longest run of leading
///    `Append`s into one `Append` per distinct variable, preserving row
///    order within each variable.
pub fn prioritize_and_compress(queue: &mut VecDeque<WorkItem>, read_prioritization: bool) {
    if read_prioritization {
        promote_first_read(queue);
    }
    coalesce_leading_appends(queue);
}

fn promote_first_read(queue: &mut VecDeque<WorkItem>) {
    match queue.front() {
        Some(item) if item.is_read() => return,
        None => return,
        _ => {}
    }
    if let Some(pos) = queue.iter().position(|item| item.is_read()) {
        if let Some(read) = queue.remove(pos) {
            queue.push_front(read);
        }
    }
}

fn coalesce_leading_appends(queue: &mut VecDeque<WorkItem>) {
    if !matches!(queue.front(), Some(item) if item.is_append()) {
        return;
    }

    let mut order: Vec<VariableRef> = Vec::new();
    let mut merged: HashMap<VariableRef, Vec<mediator_core::Vttq>> = HashMap::new();
    let mut consumed = 0usize;

    for item in queue.iter() {
        if !item.is_append() {
            break;
        }
        if let WorkItem::Append { variable, rows } = item {
            if !merged.contains_key(variable) {
                order.push(variable.clone());
            }
            merged.entry(variable.clone()).or_default().extend(rows.iter().cloned());
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
        let rows = merged.remove(&variable).unwrap_or_default();
        queue.push_front(WorkItem::Append { variable, rows });
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
