// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value quality, as carried alongside every `VTQ`/`VTTQ` observation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Good,
    Uncertain,
    Bad,
}

impl Quality {
    pub fn is_good(self) -> bool {
        self == Quality::Good
    }

    pub fn is_not_bad(self) -> bool {
        self != Quality::Bad
    }

    pub fn is_bad(self) -> bool {
        self == Quality::Bad
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_based_comparisons() {
        assert!(Quality::Good.is_good());
        assert!(Quality::Good.is_not_bad());
        assert!(!Quality::Bad.is_good());
        assert!(!Quality::Bad.is_not_bad());
        assert!(Quality::Uncertain.is_not_bad());
        assert!(!Quality::Uncertain.is_good());
    }

    #[test]
    fn default_is_good() {
        assert_eq!(Quality::default(), Quality::Good);
    }
}
