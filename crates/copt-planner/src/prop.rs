//! # Required Physical Properties
//!
//! A `RequiredProp` is an ordering demand on a subplan's output: a sequence
//! of columns and a single direction bit applied to all of them. The empty
//! property demands nothing and is satisfied by every plan.
//!
//! Together with a logical node, a property identifies one planning
//! subproblem: the memo maps `(node, prop)` to the best task found for it,
//! which is what bounds the search to one computation per pair. Equality is
//! structural over the column identities and the direction; column names do
//! not participate, so a renamed column still hits the same memo entry.

use crate::expr::ColumnRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordering demand: columns plus one direction for all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequiredProp {
    pub cols: Vec<ColumnRef>,
    pub desc: bool,
}

impl RequiredProp {
    /// The empty property: no ordering demanded.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ordered(cols: Vec<ColumnRef>, desc: bool) -> Self {
        Self { cols, desc }
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }
}

impl fmt::Display for RequiredProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "any");
        }
        let dir = if self.desc { "desc" } else { "asc" };
        let cols: Vec<String> = self.cols.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}] {}", cols.join(", "), dir)
    }
}
