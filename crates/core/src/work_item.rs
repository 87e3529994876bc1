// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work items posted to a historian worker's inbound queue.

use serde::{Deserialize, Serialize};

use crate::refs::VariableRef;
use crate::timestamp::Timestamp;
use crate::vtq::Vttq;

/// `Modify`'s row-level conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyMode {
    /// Fails if any timestamp already exists.
    Insert,
    /// Fails if any timestamp is missing.
    Update,
    /// Inserts or replaces row-by-row by timestamp key.
    Upsert,
    /// Removes all existing rows for the variable, then inserts.
    ReplaceAll,
    /// Removes rows whose timestamp matches the supplied set.
    Delete,
}

/// How `ReadRaw` trims a result set down to `max_values`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bounding {
    TakeFirstN,
    TakeLastN,
    /// Uniformly downsamples to at most `max_values` retained samples
    /// without interpolation.
    CompressToN,
}

/// `ReadRaw`'s quality-based row filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFilter {
    ExcludeNone,
    ExcludeBad,
    ExcludeNonGood,
}

impl QualityFilter {
    pub fn accepts(self, quality: crate::quality::Quality) -> bool {
        match self {
            QualityFilter::ExcludeNone => true,
            QualityFilter::ExcludeBad => quality.is_not_bad(),
            QualityFilter::ExcludeNonGood => quality.is_good(),
        }
    }
}

/// One unit of work posted to a historian worker's inbound queue.
///
/// `Append` is the only variant eligible for `PrioritizeAndCompress`
/// coalescing; every other variant is treated as an opaque read or write for
/// queue-ordering purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkItem {
    Append {
        variable: VariableRef,
        rows: Vec<Vttq>,
    },
    ReadRaw {
        variable: VariableRef,
        start: Timestamp,
        end: Timestamp,
        max_values: usize,
        bounding: Bounding,
        quality_filter: QualityFilter,
    },
    Count {
        variable: VariableRef,
        start: Timestamp,
        end: Timestamp,
    },
    DeleteInterval {
        variable: VariableRef,
        start: Timestamp,
        end: Timestamp,
    },
    GetLatest {
        variable: VariableRef,
    },
    Modify {
        variable: VariableRef,
        mode: ModifyMode,
        rows: Vec<Vttq>,
    },
    Delete {
        variable: VariableRef,
    },
    Start,
    Terminate,
}

impl WorkItem {
    /// Whether this item is an `Append`, the only variant the prioritiser
    /// coalesces.
    pub fn is_append(&self) -> bool {
        matches!(self, WorkItem::Append { .. })
    }

    /// Whether this item is a read for the purposes of read-prioritisation:
    /// it neither mutates the DB nor changes channel membership.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            WorkItem::ReadRaw { .. } | WorkItem::Count { .. } | WorkItem::GetLatest { .. }
        )
    }

    /// The variable this item concerns, if it targets exactly one.
    pub fn variable(&self) -> Option<&VariableRef> {
        match self {
            WorkItem::Append { variable, .. }
            | WorkItem::ReadRaw { variable, .. }
            | WorkItem::Count { variable, .. }
            | WorkItem::DeleteInterval { variable, .. }
            | WorkItem::GetLatest { variable }
            | WorkItem::Modify { variable, .. }
            | WorkItem::Delete { variable } => Some(variable),
            WorkItem::Start | WorkItem::Terminate => None,
        }
    }
}

/// Downsample `rows` to at most `max_values` entries per `bounding`'s policy.
/// `rows` must already be sorted ascending by timestamp.
pub fn apply_bounding<T>(rows: Vec<T>, max_values: usize, bounding: Bounding) -> Vec<T> {
    if max_values == 0 {
        return Vec::new();
    }
    if rows.len() <= max_values {
        return rows;
    }
    match bounding {
        Bounding::TakeFirstN => {
            let mut rows = rows;
            rows.truncate(max_values);
            rows
        }
        Bounding::TakeLastN => {
            let skip = rows.len() - max_values;
            rows.into_iter().skip(skip).collect()
        }
        Bounding::CompressToN => {
            let stride = rows.len() as f64 / max_values as f64;
            let mut out = Vec::with_capacity(max_values);
            let mut rows: Vec<Option<T>> = rows.into_iter().map(Some).collect();
            for i in 0..max_values {
                let idx = ((i as f64) * stride).floor() as usize;
                let idx = idx.min(rows.len() - 1);
                if let Some(row) = rows[idx].take() {
                    out.push(row);
                }
            }
            out
        }
    }
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
