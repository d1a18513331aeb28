//! # Per-Table Statistics
//!
//! `StatisticsTable` is the planner-facing view of one table's collected
//! statistics: the total row count plus a histogram per analyzed column and
//! per analyzed index. A planning call treats the snapshot as immutable; a
//! fresh ANALYZE swaps in a whole new table.
//!
//! ## Row-Count Queries
//!
//! The planner asks two questions, one per scan shape:
//!
//! - `row_count_by_int_column_ranges`: how many rows fall into a set of
//!   integer ranges over the row handle (or an integer PK column).
//! - `row_count_by_index_ranges`: how many index entries fall into a set of
//!   composite ranges. Range endpoints are encoded through the key codec so
//!   that they compare against the index histogram's stored keys; an
//!   exclusive bound is nudged past the endpoint by appending a zero byte.
//!
//! ## Pseudo Estimation
//!
//! A column or index that has never been analyzed has no histogram. That is
//! not an error: estimates fall back to fixed rates, the same way the
//! cost model falls back to default selectivities when nothing better is
//! known. A point predicate keeps `1/1000` of the table, an open range
//! `1/3`, and every extra equality component of an index prefix divides by
//! the equal rate again.

use crate::codec;
use crate::datum::Datum;
use crate::error::StatsError;
use crate::histogram::Histogram;
use crate::ranges::{IndexRange, IntColumnRange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rows kept by an open range when no histogram is available: one third.
pub const PSEUDO_LESS_RATE: i64 = 3;
/// Rows kept by an equality predicate when no histogram is available.
pub const PSEUDO_EQUAL_RATE: i64 = 1000;

/// Immutable statistics snapshot for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsTable {
    /// Total row count of the table.
    pub count: i64,
    /// Column histograms keyed by column id.
    pub columns: HashMap<i64, Histogram>,
    /// Index histograms keyed by index id.
    pub indices: HashMap<i64, Histogram>,
}

impl StatisticsTable {
    /// A snapshot with a row count but no histograms; every query answers
    /// with pseudo estimates.
    pub fn pseudo(count: i64) -> Self {
        Self {
            count,
            columns: HashMap::new(),
            indices: HashMap::new(),
        }
    }

    pub fn with_column_histogram(mut self, hist: Histogram) -> Self {
        self.columns.insert(hist.id, hist);
        self
    }

    pub fn with_index_histogram(mut self, hist: Histogram) -> Self {
        self.indices.insert(hist.id, hist);
        self
    }

    /// Estimated rows matched by `ranges` over the integer column `col_id`.
    pub fn row_count_by_int_column_ranges(
        &self,
        col_id: i64,
        ranges: &[IntColumnRange],
    ) -> Result<f64, StatsError> {
        let hist = self.columns.get(&col_id).filter(|h| !h.is_empty());
        let mut total = 0.0;
        for range in ranges {
            let count = if range.is_full() {
                self.count as f64
            } else if let Some(hist) = hist {
                if range.is_point() {
                    hist.equal_row_count(&Datum::Int64(range.low))?
                } else {
                    let below_high = if range.high == i64::MAX {
                        hist.total_count() as f64
                    } else {
                        hist.less_row_count(&Datum::Int64(range.high + 1))?
                    };
                    (below_high - hist.less_row_count(&Datum::Int64(range.low))?).max(0.0)
                }
            } else if range.is_point() {
                (self.count / PSEUDO_EQUAL_RATE) as f64
            } else {
                (self.count / PSEUDO_LESS_RATE) as f64
            };
            total += count;
        }
        Ok(total.min(self.count as f64))
    }

    /// Estimated index entries matched by `ranges` over index `index_id`.
    /// `eq_prefix_len` is the number of leading range components pinned by
    /// equality (or IN) predicates; it only matters for pseudo estimation.
    pub fn row_count_by_index_ranges(
        &self,
        index_id: i64,
        ranges: &[IndexRange],
        eq_prefix_len: usize,
    ) -> Result<f64, StatsError> {
        let hist = self.indices.get(&index_id).filter(|h| !h.is_empty());
        let mut total = 0.0;
        for range in ranges {
            let count = match hist {
                Some(hist) => {
                    let mut low = codec::encode_key(&range.low)?;
                    if range.low_exclude {
                        low.push(0);
                    }
                    let mut high = codec::encode_key(&range.high)?;
                    if !range.high_exclude {
                        high.push(0);
                    }
                    hist.between_row_count(&Datum::Bytes(low), &Datum::Bytes(high))?
                }
                None => self.pseudo_index_range_count(range, eq_prefix_len)?,
            };
            total += count;
        }
        Ok(total.min(self.count as f64))
    }

    fn pseudo_index_range_count(
        &self,
        range: &IndexRange,
        eq_prefix_len: usize,
    ) -> Result<f64, StatsError> {
        if range.is_full() {
            return Ok(self.count as f64);
        }
        let pinned = range.pinned_prefix_len()?.min(eq_prefix_len);
        let mut count = self.count as f64;
        for _ in 0..pinned {
            count /= PSEUDO_EQUAL_RATE as f64;
        }
        let has_open_tail = range.low.len().max(range.high.len()) > pinned
            || range.low_exclude
            || range.high_exclude;
        if has_open_tail {
            count /= PSEUDO_LESS_RATE as f64;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{HistogramBuilder, Row};

    fn analyzed_table() -> StatisticsTable {
        // Column 1 / index 5 both summarize the values 1..=100.
        let builder = HistogramBuilder::new(16);
        let column_rows: Vec<_> = (1..=100)
            .map(|v| Ok(Row::new(vec![Datum::Int64(v)])))
            .collect();
        let (_, column_hist) = builder.build_index(1, column_rows, false).unwrap();
        let index_rows: Vec<_> = (1..=100)
            .map(|v| Ok(Row::new(vec![Datum::Int64(v)])))
            .collect();
        let (_, index_hist) = builder.build_index(5, index_rows, true).unwrap();
        StatisticsTable {
            count: 100,
            columns: HashMap::from([(1, column_hist)]),
            indices: HashMap::from([(5, index_hist)]),
        }
    }

    #[test]
    fn full_int_range_costs_the_whole_table() {
        let table = analyzed_table();
        let count = table
            .row_count_by_int_column_ranges(1, &[IntColumnRange::full()])
            .unwrap();
        assert_eq!(count, 100.0);
    }

    #[test]
    fn bounded_int_range_tracks_the_histogram() {
        let table = analyzed_table();
        let count = table
            .row_count_by_int_column_ranges(1, &[IntColumnRange { low: 10, high: 29 }])
            .unwrap();
        // 20 real rows; equi-depth interpolation stays close.
        assert!((10.0..=30.0).contains(&count), "estimate {count} drifted");
    }

    #[test]
    fn point_int_range_uses_equal_count() {
        let table = analyzed_table();
        let count = table
            .row_count_by_int_column_ranges(1, &[IntColumnRange { low: 42, high: 42 }])
            .unwrap();
        assert!(count >= 1.0);
    }

    #[test]
    fn missing_column_histogram_falls_back_to_pseudo() {
        let table = StatisticsTable::pseudo(3000);
        let open = table
            .row_count_by_int_column_ranges(9, &[IntColumnRange { low: 0, high: 50 }])
            .unwrap();
        assert_eq!(open, 1000.0);
        let point = table
            .row_count_by_int_column_ranges(9, &[IntColumnRange { low: 7, high: 7 }])
            .unwrap();
        assert_eq!(point, 3.0);
    }

    #[test]
    fn index_range_estimates_through_encoded_keys() {
        let table = analyzed_table();
        let range = IndexRange {
            low: vec![Datum::Int64(1)],
            high: vec![Datum::Int64(50)],
            low_exclude: false,
            high_exclude: false,
        };
        let count = table.row_count_by_index_ranges(5, &[range], 0).unwrap();
        assert!((40.0..=60.0).contains(&count), "estimate {count} drifted");
    }

    #[test]
    fn pseudo_index_estimate_narrows_per_pinned_column() {
        let table = StatisticsTable::pseudo(2_000_000);
        let range = IndexRange {
            low: vec![Datum::Int64(1), Datum::Int64(0)],
            high: vec![Datum::Int64(1), Datum::MaxValue],
            low_exclude: false,
            high_exclude: false,
        };
        let count = table.row_count_by_index_ranges(5, &[range], 1).unwrap();
        // One pinned column then an open tail: count / 1000 / 3.
        assert!((count - 2_000_000.0 / 1000.0 / 3.0).abs() < 1e-6);

        let full = table
            .row_count_by_index_ranges(5, &[IndexRange::full()], 0)
            .unwrap();
        assert_eq!(full, 2_000_000.0);
    }

    #[test]
    fn estimates_are_capped_by_the_table_count() {
        let table = analyzed_table();
        let ranges = [IntColumnRange::full(), IntColumnRange::full()];
        let count = table.row_count_by_int_column_ranges(1, &ranges).unwrap();
        assert_eq!(count, 100.0);
    }
}
