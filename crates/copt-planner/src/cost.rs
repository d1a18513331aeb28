//! # Cost Factors
//!
//! All strategies cost plans with the same handful of per-row factors, so
//! relative comparisons stay meaningful across alternatives. The absolute
//! numbers are unitless; only the ratios matter.
//!
//! - Reading a row backwards is five times as expensive as forwards, which
//!   is what makes the planner prefer an ascending scan plus an explicit
//!   sort once row counts get large enough.
//! - Shipping a row out of the coprocessor costs `NETWORK_FACTOR`; a double
//!   read pays it twice, once for the index rows and once for the looked-up
//!   table rows.
//! - Sorting is the only superlinear charge: `n log n` comparisons plus a
//!   linear memory charge for the sort buffer.

/// Cost per row of a forward scan.
pub const SCAN_FACTOR: f64 = 2.0;
/// Cost per row of a reverse scan.
pub const DESC_SCAN_FACTOR: f64 = 5.0 * SCAN_FACTOR;
/// Cost per row shipped from the coprocessor to the SQL layer.
pub const NETWORK_FACTOR: f64 = 1.5;
/// Cost per row of evaluating expressions over a row.
pub const CPU_FACTOR: f64 = 0.9;
/// Cost per row of buffering a row in memory.
pub const MEMORY_FACTOR: f64 = 5.0;
/// Fraction of rows assumed to survive a filtering operator.
pub const SELECTION_FACTOR: f64 = 0.8;

/// Cost of sorting `cnt` rows: `n log n` comparisons plus buffer memory.
pub fn sort_cost(cnt: f64) -> f64 {
    let comparisons = if cnt > 1.0 { cnt * cnt.log2() } else { cnt };
    comparisons * CPU_FACTOR + cnt * MEMORY_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descending_scans_cost_more() {
        assert!(DESC_SCAN_FACTOR > SCAN_FACTOR);
    }

    #[test]
    fn sort_cost_is_monotone() {
        assert!(sort_cost(0.0) <= sort_cost(1.0));
        assert!(sort_cost(10.0) < sort_cost(1000.0));
    }
}
