//! # Scan Ranges
//!
//! Two range shapes feed the statistics lookups and the physical scans:
//!
//! - `IntColumnRange`: an inclusive `i64` interval over the integer row
//!   handle (or an integer primary-key column). A full table scan reads
//!   `[i64::MIN, i64::MAX]`.
//! - `IndexRange`: an interval over composite index keys, with per-end
//!   exclusivity flags. A full index scan reads `[NULL, MaxValue]`.
//!
//! Both are produced outside this crate (by the predicate range builders) and
//! consumed here only for row-count estimation, so they carry no behavior
//! beyond a few shape queries.

use crate::datum::Datum;
use crate::error::StatsError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Inclusive range over an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntColumnRange {
    pub low: i64,
    pub high: i64,
}

impl IntColumnRange {
    /// The whole-column range.
    pub const fn full() -> Self {
        Self {
            low: i64::MIN,
            high: i64::MAX,
        }
    }

    pub fn is_full(&self) -> bool {
        self.low == i64::MIN && self.high == i64::MAX
    }

    /// A range pinning exactly one value.
    pub fn is_point(&self) -> bool {
        self.low == self.high
    }
}

/// Range over composite index keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub low: Vec<Datum>,
    pub high: Vec<Datum>,
    pub low_exclude: bool,
    pub high_exclude: bool,
}

impl IndexRange {
    /// The whole-index range.
    pub fn full() -> Self {
        Self {
            low: vec![Datum::Null],
            high: vec![Datum::MaxValue],
            low_exclude: false,
            high_exclude: false,
        }
    }

    /// A point range pinning every listed component.
    pub fn point(values: Vec<Datum>) -> Self {
        Self {
            low: values.clone(),
            high: values,
            low_exclude: false,
            high_exclude: false,
        }
    }

    pub fn is_full(&self) -> bool {
        !self.low_exclude
            && !self.high_exclude
            && self.low.iter().all(Datum::is_null)
            && self.high.iter().all(|d| matches!(d, Datum::MaxValue))
    }

    /// Number of leading components pinned to a single value.
    pub fn pinned_prefix_len(&self) -> Result<usize, StatsError> {
        let mut pinned = 0;
        for (lo, hi) in self.low.iter().zip(&self.high) {
            if lo.compare(hi)? != Ordering::Equal {
                break;
            }
            pinned += 1;
        }
        Ok(pinned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_ranges() {
        assert!(IntColumnRange::full().is_full());
        assert!(IndexRange::full().is_full());
        assert!(!IndexRange::point(vec![Datum::Int64(1)]).is_full());
    }

    #[test]
    fn pinned_prefix() {
        let r = IndexRange {
            low: vec![Datum::Int64(1), Datum::Int64(5)],
            high: vec![Datum::Int64(1), Datum::MaxValue],
            low_exclude: false,
            high_exclude: false,
        };
        assert_eq!(r.pinned_prefix_len().unwrap(), 1);
        assert_eq!(IndexRange::point(vec![Datum::Int64(1)]).pinned_prefix_len().unwrap(), 1);
    }
}
