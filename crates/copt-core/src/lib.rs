//! # copt-core: Values, Key Codec, and Table Statistics
//!
//! This crate is the foundation of the copt planner. It owns the runtime value
//! domain and everything the planner needs to turn predicates into row-count
//! estimates: scan ranges, equi-depth histograms, the ANALYZE-time histogram
//! builder, and the per-table statistics view.
//!
//! ## Module Overview
//!
//! - **`datum`**: The `Datum` value enum with a fallible total ordering
//!   (NULL-first, with a `MaxValue` sentinel for open range bounds).
//! - **`codec`**: Memcomparable key encoding. Composite index keys compare
//!   byte-wise in the same order as the datum vectors they encode, which is
//!   what lets a single histogram cover a multi-column index.
//! - **`ranges`**: Integer column ranges (for row-handle scans) and composite
//!   index ranges (for index scans).
//! - **`histogram`**: Equi-depth buckets with cumulative counts, the pairwise
//!   bucket merge used during construction, and the row-count estimation
//!   queries (`equal`/`less`/`between`).
//! - **`builder`**: The ANALYZE-side histogram builder: exact streaming
//!   construction for indexes and primary keys, approximate sample-based
//!   construction for non-indexed columns, and the conversion of a
//!   single-column index histogram into a column histogram.
//! - **`table`**: `StatisticsTable`, the immutable per-table snapshot the
//!   planner consults, including the pseudo estimates used when a histogram
//!   has not been collected.
//! - **`error`**: The statistics error type.

pub mod builder;
pub mod codec;
pub mod datum;
pub mod error;
pub mod histogram;
pub mod ranges;
pub mod table;

pub use datum::Datum;
pub use error::StatsError;
pub use histogram::{Bucket, Histogram};
pub use table::StatisticsTable;
