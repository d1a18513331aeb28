//! # Histogram Builder
//!
//! ANALYZE-side construction of equi-depth histograms. Two construction
//! paths, one conversion:
//!
//! - **Indexes and primary keys** (`build_index`): the rows arrive in
//!   ascending key order straight from a storage scan, so the histogram is
//!   built exactly in a single streaming pass. Depth is adaptive: buckets
//!   start one row deep, and every time the bucket cap is reached adjacent
//!   buckets are pairwise fused and the nominal depth doubles.
//! - **Non-indexed columns** (`build_column`): only a sample is available.
//!   The sample is sorted and every sampled row stands in for
//!   `count / |samples|` real rows, so counts and repeats are scaled by that
//!   factor. The result is approximate by construction.
//! - **`index_to_column_histogram`**: a single-column index histogram stores
//!   encoded keys; decoding each boundary yields a column histogram for the
//!   same data without re-scanning the table.
//!
//! The builder owns its record cursor for the duration of a build and runs
//! single-threaded; it is never invoked during query planning.

use crate::codec;
use crate::datum::Datum;
use crate::error::StatsError;
use crate::histogram::{Bucket, Histogram};
use std::cmp::Ordering;

/// One row from the ANALYZE scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub data: Vec<Datum>,
}

impl Row {
    pub fn new(data: Vec<Datum>) -> Self {
        Self { data }
    }
}

/// Histogram construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct HistogramBuilder {
    /// Upper bound on the number of buckets a histogram may hold.
    pub num_buckets: usize,
}

impl HistogramBuilder {
    pub fn new(num_buckets: usize) -> Self {
        Self { num_buckets }
    }

    /// Build a histogram for an index or primary key from a stream of rows in
    /// ascending key order. Returns the total row count alongside the
    /// histogram.
    ///
    /// When `is_index` is false the row's first datum is the histogram value
    /// (the primary-key case); otherwise the whole row is encoded into one
    /// composite key so that multi-column indexes compare as single values.
    pub fn build_index<I>(
        &self,
        id: i64,
        records: I,
        is_index: bool,
    ) -> Result<(i64, Histogram), StatsError>
    where
        I: IntoIterator<Item = Result<Row, StatsError>>,
    {
        let mut hist = Histogram {
            id,
            ndv: 0,
            buckets: vec![Bucket::seed()],
        };
        let mut values_per_bucket: i64 = 1;
        let mut last_number: i64 = 0;
        let mut bucket_idx: usize = 0;
        let mut count: i64 = 0;

        for record in records {
            let row = record?;
            let data = if is_index {
                Datum::Bytes(codec::encode_key(&row.data)?)
            } else {
                row.data.into_iter().next().ok_or(StatsError::EmptyRow)?
            };
            let cmp = hist.buckets[bucket_idx].value.compare(&data)?;
            count += 1;
            if cmp == Ordering::Equal {
                // A distinct value never straddles two buckets, so the bucket
                // absorbs the repeat even past its nominal depth.
                let bucket = &mut hist.buckets[bucket_idx];
                bucket.count += 1;
                bucket.repeats += 1;
            } else if hist.buckets[bucket_idx].count + 1 - last_number <= values_per_bucket {
                // The current bucket still has room: advance its boundary.
                let bucket = &mut hist.buckets[bucket_idx];
                bucket.count += 1;
                bucket.value = data;
                bucket.repeats = 1;
                hist.ndv += 1;
            } else {
                if bucket_idx + 1 == self.num_buckets {
                    // Out of buckets: fuse pairs, double the depth, and
                    // restate the running counters against the fused layout.
                    hist.merge_buckets(bucket_idx);
                    values_per_bucket *= 2;
                    bucket_idx /= 2;
                    last_number = if bucket_idx == 0 {
                        0
                    } else {
                        hist.buckets[bucket_idx - 1].count
                    };
                }
                // The merge may have made room in the current bucket.
                if hist.buckets[bucket_idx].count + 1 - last_number <= values_per_bucket {
                    let bucket = &mut hist.buckets[bucket_idx];
                    bucket.count += 1;
                    bucket.value = data;
                    bucket.repeats = 1;
                } else {
                    last_number = hist.buckets[bucket_idx].count;
                    bucket_idx += 1;
                    hist.buckets.push(Bucket {
                        count: last_number + 1,
                        value: data,
                        repeats: 1,
                    });
                }
                hist.ndv += 1;
            }
        }

        if count == 0 {
            hist = Histogram::new(id);
        }
        tracing::debug!(id, count, ndv = hist.ndv, buckets = hist.buckets.len(), "built index histogram");
        Ok((count, hist))
    }

    /// Build a histogram for a non-indexed column from a sample.
    ///
    /// `ndv` and `count` are the column's true distinct-value and row counts
    /// (known from the scan that produced the sample). Each sampled value
    /// stands in for `count / |samples|` rows; a boundary seen a second time
    /// switches from the per-distinct estimate to the scaled repeat count.
    pub fn build_column(
        &self,
        id: i64,
        ndv: i64,
        count: i64,
        mut samples: Vec<Datum>,
    ) -> Result<Histogram, StatsError> {
        if count == 0 {
            return Ok(Histogram::new(id));
        }
        let mut cmp_err: Option<StatsError> = None;
        samples.sort_by(|a, b| {
            a.compare(b).unwrap_or_else(|e| {
                cmp_err.get_or_insert(e);
                Ordering::Equal
            })
        });
        if let Some(err) = cmp_err {
            return Err(err);
        }
        if samples.is_empty() {
            return Ok(Histogram { id, ndv, buckets: Vec::new() });
        }

        let mut hist = Histogram {
            id,
            ndv,
            buckets: vec![Bucket::seed()],
        };
        let values_per_bucket = count as f64 / self.num_buckets as f64 + 1.0;
        let sample_factor = count as f64 / samples.len() as f64;
        let ndv_factor = (count as f64 / ndv.max(1) as f64).min(sample_factor);
        let mut bucket_idx = 0;
        let mut last_count: i64 = 0;

        for (i, sample) in samples.into_iter().enumerate() {
            let cmp = hist.buckets[bucket_idx].value.compare(&sample)?;
            let total_count = (i as f64 + 1.0) * sample_factor;
            if cmp == Ordering::Equal {
                // Same rule as the streaming path: repeats stay in one
                // bucket. The first repeat sighting replaces the
                // per-distinct guess with two samples' worth of rows.
                let bucket = &mut hist.buckets[bucket_idx];
                bucket.count = total_count as i64;
                if bucket.repeats as f64 == ndv_factor {
                    bucket.repeats = (2.0 * sample_factor) as i64;
                } else {
                    bucket.repeats += sample_factor as i64;
                }
            } else if total_count - last_count as f64 <= values_per_bucket {
                let bucket = &mut hist.buckets[bucket_idx];
                bucket.count = total_count as i64;
                bucket.value = sample;
                bucket.repeats = ndv_factor as i64;
            } else {
                last_count = hist.buckets[bucket_idx].count;
                bucket_idx += 1;
                hist.buckets.push(Bucket {
                    count: total_count as i64,
                    value: sample,
                    repeats: ndv_factor as i64,
                });
            }
        }
        Ok(hist)
    }
}

/// Convert a single-column index histogram into a column histogram by
/// decoding each bucket boundary's composite key. An empty boundary key is
/// the end-of-data sentinel; buckets from there on are dropped. Counts,
/// repeats, and the distinct-value count carry over unchanged.
pub fn index_to_column_histogram(
    index_hist: &Histogram,
    id: i64,
) -> Result<Histogram, StatsError> {
    let mut hist = Histogram {
        id,
        ndv: index_hist.ndv,
        buckets: Vec::with_capacity(index_hist.buckets.len()),
    };
    for bucket in &index_hist.buckets {
        let bytes = match &bucket.value {
            Datum::Bytes(bytes) => bytes,
            other => {
                return Err(StatsError::Codec(format!(
                    "index boundary is {}, expected an encoded key",
                    other.kind_name()
                )))
            }
        };
        if bytes.is_empty() {
            break;
        }
        let (value, _) = codec::decode_first(bytes)?;
        hist.buckets.push(Bucket {
            count: bucket.count,
            value,
            repeats: bucket.repeats,
        });
    }
    Ok(hist)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_rows(values: &[i64]) -> Vec<Result<Row, StatsError>> {
        values
            .iter()
            .map(|&v| Ok(Row::new(vec![Datum::Int64(v)])))
            .collect()
    }

    #[test]
    fn streaming_build_merges_down_to_the_bucket_cap() {
        let builder = HistogramBuilder::new(4);
        let (count, hist) = builder
            .build_index(7, int_rows(&[1, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]), false)
            .unwrap();

        assert_eq!(count, 11);
        assert_eq!(hist.id, 7);
        assert_eq!(hist.ndv, 10);
        assert!(hist.buckets.len() <= 4);
        assert_eq!(hist.total_count(), 11);
        // Boundaries stay sorted and cumulative counts never decrease.
        for pair in hist.buckets.windows(2) {
            assert_eq!(pair[0].value.compare(&pair[1].value).unwrap(), Ordering::Less);
            assert!(pair[0].count <= pair[1].count);
        }
        // Two rounds of pairwise merging land on exactly these buckets.
        let snapshot: Vec<(i64, Datum, i64)> = hist
            .buckets
            .iter()
            .map(|b| (b.count, b.value.clone(), b.repeats))
            .collect();
        assert_eq!(
            snapshot,
            vec![
                (5, Datum::Int64(4), 1),
                (9, Datum::Int64(8), 1),
                (11, Datum::Int64(10), 1),
            ]
        );
    }

    #[test]
    fn duplicated_boundary_accumulates_repeats() {
        // A cap wide enough that no merge fuses the duplicate's bucket away.
        let builder = HistogramBuilder::new(16);
        let (count, hist) = builder
            .build_index(1, int_rows(&[1, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]), false)
            .unwrap();

        assert_eq!(count, 11);
        assert_eq!(hist.ndv, 10);
        let one = hist
            .buckets
            .iter()
            .find(|b| b.value == Datum::Int64(1))
            .expect("value 1 keeps its own bucket");
        assert_eq!(one.repeats, 2);
    }

    #[test]
    fn empty_stream_yields_empty_histogram() {
        let builder = HistogramBuilder::new(8);
        let (count, hist) = builder.build_index(3, int_rows(&[]), false).unwrap();
        assert_eq!(count, 0);
        assert_eq!(hist.id, 3);
        assert!(hist.is_empty());
    }

    #[test]
    fn cursor_errors_propagate() {
        let builder = HistogramBuilder::new(8);
        let records = vec![
            Ok(Row::new(vec![Datum::Int64(1)])),
            Err(StatsError::Record("region unavailable".into())),
        ];
        assert!(builder.build_index(1, records, false).is_err());
    }

    #[test]
    fn composite_rows_encode_to_one_key_each() {
        let builder = HistogramBuilder::new(8);
        let records = vec![
            Ok(Row::new(vec![Datum::Int64(1), Datum::Utf8("a".into())])),
            Ok(Row::new(vec![Datum::Int64(1), Datum::Utf8("b".into())])),
            Ok(Row::new(vec![Datum::Int64(2), Datum::Utf8("a".into())])),
        ];
        let (count, hist) = builder.build_index(9, records, true).unwrap();
        assert_eq!(count, 3);
        assert_eq!(hist.ndv, 3);
        for bucket in &hist.buckets {
            assert!(matches!(bucket.value, Datum::Bytes(_)));
        }
    }

    #[test]
    fn sampled_build_scales_counts_and_repeats() {
        // 8 real rows represented by 4 samples; value 1 is sampled 3 times.
        let builder = HistogramBuilder::new(4);
        let samples = vec![
            Datum::Int64(2),
            Datum::Int64(1),
            Datum::Int64(1),
            Datum::Int64(1),
        ];
        let hist = builder.build_column(5, 2, 8, samples).unwrap();

        let snapshot: Vec<(i64, Datum, i64)> = hist
            .buckets
            .iter()
            .map(|b| (b.count, b.value.clone(), b.repeats))
            .collect();
        // sample_factor = 2, ndv_factor = 2, values_per_bucket = 3: the
        // second sighting of 1 bumps repeats to 2 * sample_factor, the third
        // adds one more sample's worth, and 2 opens a fresh bucket.
        assert_eq!(
            snapshot,
            vec![(6, Datum::Int64(1), 6), (8, Datum::Int64(2), 2)]
        );
        assert_eq!(hist.total_count(), 8);
    }

    #[test]
    fn sampled_build_with_zero_count_is_empty() {
        let builder = HistogramBuilder::new(4);
        let hist = builder.build_column(5, 0, 0, vec![]).unwrap();
        assert_eq!(hist.id, 5);
        assert!(hist.is_empty());
    }

    #[test]
    fn index_histogram_decodes_into_column_histogram() {
        let builder = HistogramBuilder::new(8);
        let records: Vec<_> = [10i64, 20, 20, 30]
            .iter()
            .map(|&v| Ok(Row::new(vec![Datum::Int64(v)])))
            .collect();
        let (_, index_hist) = builder.build_index(2, records, true).unwrap();

        let column_hist = index_to_column_histogram(&index_hist, 11).unwrap();
        assert_eq!(column_hist.id, 11);
        assert_eq!(column_hist.ndv, index_hist.ndv);
        assert_eq!(column_hist.buckets.len(), index_hist.buckets.len());
        for (col, idx) in column_hist.buckets.iter().zip(&index_hist.buckets) {
            assert!(matches!(col.value, Datum::Int64(_)));
            assert_eq!(col.count, idx.count);
            assert_eq!(col.repeats, idx.repeats);
        }
    }

    #[test]
    fn decoding_stops_at_the_empty_sentinel() {
        let index_hist = Histogram {
            id: 2,
            ndv: 1,
            buckets: vec![
                Bucket {
                    count: 4,
                    value: Datum::Bytes(codec::encode_key(&[Datum::Int64(1)]).unwrap()),
                    repeats: 4,
                },
                Bucket { count: 4, value: Datum::Bytes(vec![]), repeats: 0 },
            ],
        };
        let column_hist = index_to_column_histogram(&index_hist, 1).unwrap();
        assert_eq!(column_hist.buckets.len(), 1);
    }
}
