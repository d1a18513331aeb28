//! # copt-planner: Cost-Based Physical Planning
//!
//! This crate turns a logical query plan into the cheapest physical plan that
//! satisfies a caller-supplied ordering requirement. The search is top-down,
//! memoized, and property-directed: every logical operator is asked for its
//! best task under a required property, and answers by comparing an *enforce*
//! branch (plan the child freely, add an explicit sort) against a *push*
//! branch (ask the child to produce the order natively).
//!
//! ## Module Overview
//!
//! - **`expr`**: Column references with stable identities, the three-kind
//!   scalar expression tree, schemas, sort items, and aggregate expressions.
//! - **`meta`**: Table, column, and index metadata plus index-hint resolution
//!   and the covering-index test.
//! - **`context`**: The session-scoped seams: storage client capability
//!   probing, memory-database detection, and the physical-plan id allocator.
//! - **`range_builder`**: The narrow interface to predicate detachment and
//!   range construction, with a basic in-crate implementation.
//! - **`prop`**: `RequiredProp`, the ordering demand that keys the memo.
//! - **`plan`**: The logical plan arena (nodes addressed by index, with
//!   parent back-links set in a single post-bind pass).
//! - **`physical`**: The physical operator tree the planner materializes.
//! - **`task`**: Task profiles -- coprocessor tasks that can still absorb
//!   pushed-down operators, root tasks that cannot -- and the one-way
//!   finishing transition between them.
//! - **`cost`**: The per-row cost factors shared by every strategy.
//! - **`planner`**: The memoized search itself, including scan selection.
//! - **`error`**: The planning error type.

pub mod context;
pub mod cost;
pub mod error;
pub mod expr;
pub mod meta;
pub mod physical;
pub mod plan;
pub mod planner;
pub mod prop;
pub mod range_builder;
pub mod task;

pub use error::PlanError;
pub use planner::Planner;
pub use prop::RequiredProp;
pub use task::{CopTask, RootTask, Task};
