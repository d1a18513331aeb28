//! # Task Profiles
//!
//! A task is a costed candidate subplan. Two variants model the two-tier
//! execution split:
//!
//! - A **cop task** runs inside the storage-layer coprocessor. It may hold
//!   an index plan, a table plan, or both (the double-read case: index scan
//!   first, then a per-handle row lookup). While unfinished, further
//!   operators can still be pushed into it, attaching to the index side
//!   until `index_plan_finished` flips and to the table side after.
//! - A **root task** runs in the SQL layer and holds a single finished plan.
//!
//! **Finishing** a cop task converts it to a root task and is one-way: the
//! rows have to cross the network, so the transition charges
//! `cnt * NETWORK_FACTOR` for the index side and the same again for the
//! row-lookup side of a double read. Cost never decreases as operators
//! attach, and comparing two tasks' costs is only fair when both are on the
//! same side of the finishing line -- which is exactly why the selection
//! strategy finishes a cop task early when its parent cannot push anything
//! further down.

use crate::cost::NETWORK_FACTOR;
use crate::error::PlanError;
use crate::physical::PhysicalPlan;
use serde::{Deserialize, Serialize};

/// Work colocated with storage; can still absorb pushed-down operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopTask {
    pub index_plan: Option<PhysicalPlan>,
    pub table_plan: Option<PhysicalPlan>,
    /// Estimated output row count.
    pub cnt: f64,
    /// Cumulative cost.
    pub cst: f64,
    /// Once true, subsequent operators attach to the table side only.
    pub index_plan_finished: bool,
}

impl CopTask {
    /// An index scan followed by per-handle row lookups.
    pub fn is_double_read(&self) -> bool {
        self.index_plan.is_some() && self.table_plan.is_some()
    }

    /// Close the index side: its rows now have to be shipped to whatever
    /// consumes them, so the network charge lands here. Idempotent.
    pub fn finish_index_plan(&mut self) {
        if self.index_plan_finished {
            return;
        }
        self.index_plan_finished = true;
        self.cst += self.cnt * NETWORK_FACTOR;
    }

    /// Convert into a root task. Closing the index side and shipping the
    /// table side each charge the network once, so a double read pays twice.
    /// The finished plan is the table plan consuming the index plan's
    /// handles, or whichever single plan the task holds.
    pub fn finish(mut self) -> Result<RootTask, PlanError> {
        self.finish_index_plan();
        if self.table_plan.is_some() {
            self.cst += self.cnt * NETWORK_FACTOR;
        }
        let plan = match (self.index_plan, self.table_plan) {
            (Some(index), Some(table)) => table.with_child(index),
            (Some(index), None) => index,
            (None, Some(table)) => table,
            (None, None) => {
                return Err(PlanError::Internal(
                    "cop task holds neither an index plan nor a table plan".into(),
                ))
            }
        };
        Ok(RootTask {
            plan,
            cnt: self.cnt,
            cst: self.cst,
        })
    }
}

/// Work in the SQL layer; a finished plan that cannot go back to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootTask {
    pub plan: PhysicalPlan,
    pub cnt: f64,
    pub cst: f64,
}

/// A costed candidate subplan, in either execution tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Task {
    Cop(CopTask),
    Root(RootTask),
}

impl Task {
    pub fn cost(&self) -> f64 {
        match self {
            Task::Cop(t) => t.cst,
            Task::Root(t) => t.cst,
        }
    }

    pub fn row_count(&self) -> f64 {
        match self {
            Task::Cop(t) => t.cnt,
            Task::Root(t) => t.cnt,
        }
    }

    pub fn is_cop(&self) -> bool {
        matches!(self, Task::Cop(_))
    }

    /// Finish if still a cop task; a root task passes through unchanged.
    pub fn into_root(self) -> Result<RootTask, PlanError> {
        match self {
            Task::Cop(cop) => cop.finish(),
            Task::Root(root) => Ok(root),
        }
    }
}
