// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value-time-quality tuples: the unit of currency for both live values and
//! historian rows.

use serde::{Deserialize, Serialize};

use crate::quality::Quality;
use crate::timestamp::Timestamp;

/// A tagged scalar or array value. Mirrors the data types a `Variable` can
/// declare; `DataType` and `VariableValue` are kept in lockstep by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum VariableValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    BoolArray(Vec<bool>),
    IntArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl VariableValue {
    /// Whether the two values are of the same variant, regardless of the
    /// wrapped payload. Used to validate `Update`/`Insert` writes against a
    /// variable's declared data type.
    pub fn same_shape(&self, other: &VariableValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Value + timestamp + quality, as returned for a live variable read or
/// carried on a `Notify_VariableValuesChanged` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vtq {
    pub value: VariableValue,
    pub timestamp: Timestamp,
    pub quality: Quality,
}

impl Vtq {
    pub fn new(value: VariableValue, timestamp: Timestamp, quality: Quality) -> Self {
        Self {
            value,
            timestamp,
            quality,
        }
    }

    pub fn good(value: VariableValue, timestamp: Timestamp) -> Self {
        Self::new(value, timestamp, Quality::Good)
    }
}

/// A historian row: `Vtq` plus the transaction/ingest timestamp assigned by
/// the historian worker at append time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vttq {
    pub value: VariableValue,
    pub timestamp: Timestamp,
    pub transaction_timestamp: Timestamp,
    pub quality: Quality,
}

impl Vttq {
    pub fn new(vtq: Vtq, transaction_timestamp: Timestamp) -> Self {
        Self {
            value: vtq.value,
            timestamp: vtq.timestamp,
            transaction_timestamp,
            quality: vtq.quality,
        }
    }

    pub fn as_vtq(&self) -> Vtq {
        Vtq {
            value: self.value.clone(),
            timestamp: self.timestamp,
            quality: self.quality,
        }
    }
}

#[cfg(test)]
#[path = "vtq_tests.rs"]
mod tests;
