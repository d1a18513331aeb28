//! # Equi-Depth Histograms
//!
//! A histogram summarizes the value distribution of one column or one index.
//! Buckets are equi-depth: boundaries adapt so that each bucket holds roughly
//! the same number of rows, which keeps range estimates accurate in the dense
//! parts of the domain where it matters.
//!
//! ## Bucket Layout
//!
//! `Bucket.count` is **cumulative**: it is the number of rows up to and
//! including this bucket, not the bucket's own size. `Bucket.value` is the
//! upper boundary, and `Bucket.repeats` counts how many rows carry exactly
//! that boundary value. Three invariants hold at all times:
//!
//! - boundary values are non-decreasing across buckets;
//! - cumulative counts are non-decreasing;
//! - a distinct value never straddles two buckets (the builder keeps growing
//!   a bucket past its nominal depth rather than splitting a value).
//!
//! ## Pairwise Merge
//!
//! When the builder runs out of buckets it fuses adjacent pairs. Because
//! counts are cumulative, the second bucket of each pair already carries the
//! pair's total, so the merge simply keeps the odd-indexed buckets (plus a
//! trailing unpaired one) and the bucket count halves.
//!
//! ## Estimation Queries
//!
//! The planner asks three questions: how many rows equal `v`, how many are
//! less than `v`, and how many fall in `[a, b)`. A value that is a bucket
//! boundary answers exactly from `repeats`; a value inside a bucket is
//! interpolated at half the bucket's depth; an equality probe for a value
//! that is not a boundary falls back to `total / NDV`.

use crate::datum::Datum;
use crate::error::StatsError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One equi-depth bucket. `count` is cumulative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub count: i64,
    pub value: Datum,
    pub repeats: i64,
}

impl Bucket {
    /// The builder's seed bucket: empty, bounded by NULL so that the first
    /// real value always sorts at or above the boundary.
    pub(crate) fn seed() -> Self {
        Self {
            count: 0,
            value: Datum::Null,
            repeats: 0,
        }
    }
}

/// Equi-depth histogram for one column or one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    /// Column id or index id this histogram describes.
    pub id: i64,
    /// Number of distinct values observed.
    pub ndv: i64,
    pub buckets: Vec<Bucket>,
}

impl Histogram {
    /// An empty histogram carrying only the id.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ndv: 0,
            buckets: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total rows summarized, i.e. the last cumulative count.
    pub fn total_count(&self) -> i64 {
        self.buckets.last().map_or(0, |b| b.count)
    }

    /// Fuse adjacent bucket pairs in `buckets[..=bucket_idx]`. Cumulative
    /// counts make the odd bucket of each pair already carry the pair's
    /// total, so fusing keeps the odd buckets wholesale; an even `bucket_idx`
    /// leaves one unpaired bucket, which is kept as-is.
    pub(crate) fn merge_buckets(&mut self, bucket_idx: usize) {
        let mut kept = 0;
        let mut i = 0;
        while i + 1 <= bucket_idx {
            self.buckets.swap(kept, i + 1);
            kept += 1;
            i += 2;
        }
        if bucket_idx % 2 == 0 {
            self.buckets.swap(kept, bucket_idx);
            kept += 1;
        }
        self.buckets.truncate(kept);
        tracing::trace!(id = self.id, buckets = kept, "merged histogram buckets");
    }

    /// Index of the first bucket whose boundary is `>= value`, plus whether
    /// the boundary matches exactly. Returns `buckets.len()` when every
    /// boundary is below `value`.
    fn lower_bound(&self, value: &Datum) -> Result<(usize, bool), StatsError> {
        let mut lo = 0;
        let mut hi = self.buckets.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            match self.buckets[mid].value.compare(value)? {
                Ordering::Less => lo = mid + 1,
                _ => hi = mid,
            }
        }
        if lo < self.buckets.len() {
            let exact = self.buckets[lo].value.compare(value)? == Ordering::Equal;
            Ok((lo, exact))
        } else {
            Ok((lo, false))
        }
    }

    /// Estimated number of rows equal to `value`.
    pub fn equal_row_count(&self, value: &Datum) -> Result<f64, StatsError> {
        let (idx, exact) = self.lower_bound(value)?;
        if idx == self.buckets.len() {
            return Ok(0.0);
        }
        if exact {
            return Ok(self.buckets[idx].repeats as f64);
        }
        Ok(self.total_count() as f64 / self.ndv.max(1) as f64)
    }

    /// Estimated number of rows strictly less than `value`.
    pub fn less_row_count(&self, value: &Datum) -> Result<f64, StatsError> {
        let (idx, exact) = self.lower_bound(value)?;
        if idx == self.buckets.len() {
            return Ok(self.total_count() as f64);
        }
        let bucket = &self.buckets[idx];
        let prev_count = if idx > 0 { self.buckets[idx - 1].count } else { 0 } as f64;
        // Everything before this bucket's boundary value, assuming the
        // boundary's own repeats sit at the very end of the bucket.
        let below_boundary = (bucket.count - bucket.repeats) as f64;
        if exact {
            return Ok(below_boundary);
        }
        // The value falls somewhere inside the bucket: interpolate at half
        // the bucket's depth.
        Ok((prev_count + below_boundary) / 2.0)
    }

    /// Estimated number of rows strictly greater than `value`.
    pub fn greater_row_count(&self, value: &Datum) -> Result<f64, StatsError> {
        let less = self.less_row_count(value)?;
        let equal = self.equal_row_count(value)?;
        Ok((self.total_count() as f64 - less - equal).max(0.0))
    }

    /// Estimated number of rows in `[low, high)`.
    pub fn between_row_count(&self, low: &Datum, high: &Datum) -> Result<f64, StatsError> {
        let count = self.less_row_count(high)? - self.less_row_count(low)?;
        Ok(count.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten rows: 1 1 1 3 3 5 7 7 7 9, bucketed in pairs of boundaries.
    fn sample() -> Histogram {
        Histogram {
            id: 1,
            ndv: 5,
            buckets: vec![
                Bucket { count: 3, value: Datum::Int64(1), repeats: 3 },
                Bucket { count: 6, value: Datum::Int64(5), repeats: 1 },
                Bucket { count: 10, value: Datum::Int64(9), repeats: 1 },
            ],
        }
    }

    #[test]
    fn equal_count_at_boundary_uses_repeats() {
        let h = sample();
        assert_eq!(h.equal_row_count(&Datum::Int64(1)).unwrap(), 3.0);
        assert_eq!(h.equal_row_count(&Datum::Int64(9)).unwrap(), 1.0);
    }

    #[test]
    fn equal_count_off_boundary_uses_ndv() {
        let h = sample();
        assert_eq!(h.equal_row_count(&Datum::Int64(4)).unwrap(), 2.0);
        assert_eq!(h.equal_row_count(&Datum::Int64(100)).unwrap(), 0.0);
    }

    #[test]
    fn less_count_walks_cumulative_counts() {
        let h = sample();
        assert_eq!(h.less_row_count(&Datum::Int64(1)).unwrap(), 0.0);
        assert_eq!(h.less_row_count(&Datum::Int64(5)).unwrap(), 5.0);
        assert_eq!(h.less_row_count(&Datum::Int64(100)).unwrap(), 10.0);
        // Inside the middle bucket: halfway between 3 and 5.
        assert_eq!(h.less_row_count(&Datum::Int64(4)).unwrap(), 4.0);
    }

    #[test]
    fn between_is_difference_of_less() {
        let h = sample();
        assert_eq!(
            h.between_row_count(&Datum::Int64(1), &Datum::Int64(5)).unwrap(),
            5.0
        );
        assert_eq!(
            h.between_row_count(&Datum::Int64(5), &Datum::Int64(1)).unwrap(),
            0.0
        );
    }

    #[test]
    fn merge_keeps_odd_buckets_and_trailing_even() {
        let mut h = Histogram {
            id: 1,
            ndv: 5,
            buckets: (1..=5)
                .map(|i| Bucket { count: i * 2, value: Datum::Int64(i), repeats: 1 })
                .collect(),
        };
        h.merge_buckets(4);
        let counts: Vec<i64> = h.buckets.iter().map(|b| b.count).collect();
        let values: Vec<&Datum> = h.buckets.iter().map(|b| &b.value).collect();
        assert_eq!(counts, vec![4, 8, 10]);
        assert_eq!(values, vec![&Datum::Int64(2), &Datum::Int64(4), &Datum::Int64(5)]);
    }
}
