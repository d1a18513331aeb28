//! Statistics error type.
//!
//! Everything in this crate that can fail fails for one of three reasons: a
//! comparison between values of incompatible kinds, a malformed encoded key,
//! or a failure surfaced by the record cursor feeding the histogram builder.
//! All three are surfaced unchanged to the caller; none is ever swallowed
//! into a default estimate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    /// Two datums of kinds that have no defined ordering were compared.
    #[error("cannot compare {left} with {right}")]
    IncomparableTypes {
        left: &'static str,
        right: &'static str,
    },

    /// An encoded key could not be produced or parsed.
    #[error("key codec: {0}")]
    Codec(String),

    /// The record cursor feeding `build_index` reported a failure.
    #[error("record stream: {0}")]
    Record(String),

    /// A record carried no columns at all.
    #[error("record yielded no columns")]
    EmptyRow,
}
