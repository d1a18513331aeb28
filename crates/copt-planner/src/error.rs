//! Planning error type.
//!
//! Two failure families reach a caller: statistics errors (a histogram lookup
//! or range construction failed) and internal errors (a malformed logical
//! node or a violated task invariant). Both propagate unchanged; the planner
//! never substitutes a fallback plan on error, and the memo is not populated
//! for a failed computation, so a retry recomputes from scratch.
//!
//! Refusing to push a required property down to a child is *not* an error.
//! It is a negative analysis result that simply removes one branch from a
//! two-branch cost comparison.

use copt_core::StatsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    /// A statistics lookup or range build failed.
    #[error("statistics: {0}")]
    Stats(#[from] StatsError),

    /// A malformed logical node or violated invariant.
    #[error("internal: {0}")]
    Internal(String),
}
