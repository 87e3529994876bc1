// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Timestamp` and `Duration`: monotonic milliseconds-since-epoch with the
//! sentinel values historian range queries use to express "unbounded".

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Milliseconds since the Unix epoch.
///
/// `Timestamp::EMPTY` (`0`) and `Timestamp::MAX` (`i64::MAX`) are sentinels
/// used by historian range reads to mean "no lower bound" / "no upper bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EMPTY: Timestamp = Timestamp(0);
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    pub fn from_millis(ms: i64) -> Self {
        Timestamp(ms)
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    /// True if `self` falls within `[start, end]` inclusive, treating the
    /// sentinels as unbounded on either side.
    pub fn in_range(self, start: Timestamp, end: Timestamp) -> bool {
        let lo = if start.is_empty() { Timestamp(i64::MIN) } else { start };
        self >= lo && self <= end
    }

    /// Render as an ISO-8601 UTC timestamp for diagnostics and logging.
    /// `Timestamp::MAX` sits far outside chrono's representable range, so it
    /// renders as the epoch rather than panicking.
    pub fn to_iso8601(self) -> String {
        self.to_datetime()
            .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}

/// A span of milliseconds, used for arithmetic against [`Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Duration(i64);

impl Duration {
    pub fn from_millis(ms: i64) -> Self {
        Duration(ms)
    }

    pub fn from_secs(secs: i64) -> Self {
        Duration(secs * 1000)
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs.0))
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;
    fn sub(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_sub(rhs.0))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;
    fn sub(self, rhs: Timestamp) -> Duration {
        Duration(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(test)]
#[path = "timestamp_tests.rs"]
mod tests;
