//! # The Datum Value Domain
//!
//! A `Datum` is a single runtime value: a bucket boundary in a histogram, a
//! literal in a predicate, or one component of an index range. The planner
//! and the statistics subsystem share this type, so it has to satisfy two
//! masters at once:
//!
//! - **Total ordering** for histogram construction and range estimation.
//!   NULL sorts before every non-null value (so an all-null prefix lands in
//!   the first bucket), and the `MaxValue` sentinel sorts after everything
//!   (so `[x, MaxValue]` expresses an unbounded upper range).
//! - **Eq/Hash** for memo keys and deduplication. `f64` values are wrapped
//!   in `OrderedFloat` so they can participate.
//!
//! Comparison is fallible: ordering integers against byte strings has no
//! meaning, and silently picking one would corrupt every estimate downstream.
//! Numeric kinds cross-compare (an `Int64` column predicate may carry a
//! `Float64` literal), and `Utf8`/`Bytes` cross-compare byte-wise under
//! binary collation.

use crate::error::StatsError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single runtime value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Datum {
    /// SQL NULL. Sorts before every non-null value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float, wrapped in `OrderedFloat` for Eq/Hash support.
    Float64(OrderedFloat<f64>),
    /// Raw bytes; also the carrier for encoded composite index keys.
    Bytes(Vec<u8>),
    /// UTF-8 string, compared under binary collation.
    Utf8(String),
    /// Upper sentinel for open range bounds. Sorts after everything.
    MaxValue,
}

impl Datum {
    /// Kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Int64(_) => "int64",
            Datum::Float64(_) => "float64",
            Datum::Bytes(_) => "bytes",
            Datum::Utf8(_) => "utf8",
            Datum::MaxValue => "max-value",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Total-order comparison. NULL first, `MaxValue` last, numerics
    /// cross-compare, strings and bytes cross-compare byte-wise. Any other
    /// kind pairing is an error rather than an arbitrary order.
    pub fn compare(&self, other: &Datum) -> Result<Ordering, StatsError> {
        use Datum::*;
        let ord = match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (MaxValue, MaxValue) => Ordering::Equal,
            (MaxValue, _) => Ordering::Greater,
            (_, MaxValue) => Ordering::Less,
            (Int64(a), Int64(b)) => a.cmp(b),
            (Float64(a), Float64(b)) => a.cmp(b),
            (Int64(a), Float64(b)) => OrderedFloat(*a as f64).cmp(b),
            (Float64(a), Int64(b)) => a.cmp(&OrderedFloat(*b as f64)),
            (Bytes(a), Bytes(b)) => a.as_slice().cmp(b.as_slice()),
            (Utf8(a), Utf8(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Bytes(a), Utf8(b)) => a.as_slice().cmp(b.as_bytes()),
            (Utf8(a), Bytes(b)) => a.as_bytes().cmp(b.as_slice()),
            (a, b) => {
                return Err(StatsError::IncomparableTypes {
                    left: a.kind_name(),
                    right: b.kind_name(),
                })
            }
        };
        Ok(ord)
    }
}

/// Equality follows `compare`: comparable kinds are equal when they order
/// equal, incomparable kinds are simply unequal.
impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare(other), Ok(Ordering::Equal))
    }
}

impl Eq for Datum {}

impl Hash for Datum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Datum::Null | Datum::MaxValue => {}
            Datum::Int64(v) => v.hash(state),
            Datum::Float64(v) => v.hash(state),
            Datum::Bytes(v) => v.hash(state),
            Datum::Utf8(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Int64(v) => write!(f, "{v}"),
            Datum::Float64(v) => write!(f, "{v}"),
            Datum::Bytes(v) => write!(f, "0x{}", hex(v)),
            Datum::Utf8(v) => write!(f, "{v:?}"),
            Datum::MaxValue => write!(f, "+inf"),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_first_and_max_value_last() {
        let values = [
            Datum::Null,
            Datum::Int64(i64::MIN),
            Datum::Int64(0),
            Datum::Int64(42),
            Datum::MaxValue,
        ];
        for pair in values.windows(2) {
            assert_eq!(pair[0].compare(&pair[1]).unwrap(), Ordering::Less);
        }
    }

    #[test]
    fn numeric_kinds_cross_compare() {
        let i = Datum::Int64(3);
        let f = Datum::Float64(OrderedFloat(3.5));
        assert_eq!(i.compare(&f).unwrap(), Ordering::Less);
        assert_eq!(f.compare(&i).unwrap(), Ordering::Greater);
        assert_eq!(
            Datum::Int64(4).compare(&Datum::Float64(OrderedFloat(4.0))).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn incompatible_kinds_refuse_to_compare() {
        let err = Datum::Int64(1).compare(&Datum::Utf8("a".into())).unwrap_err();
        assert!(matches!(err, StatsError::IncomparableTypes { .. }));
    }

    #[test]
    fn strings_and_bytes_share_an_order() {
        let s = Datum::Utf8("abc".into());
        let b = Datum::Bytes(b"abd".to_vec());
        assert_eq!(s.compare(&b).unwrap(), Ordering::Less);
        assert_eq!(s, Datum::Bytes(b"abc".to_vec()));
    }
}
