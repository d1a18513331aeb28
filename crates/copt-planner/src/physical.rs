//! # Physical Plans
//!
//! The planner's output: an owned operator tree annotated with schemas and
//! monotonically allocated node ids. Unlike the logical arena, physical
//! plans are plain trees -- they are built bottom-up as tasks are assembled,
//! cloned into the memo, and handed to the caller whole.
//!
//! The scan operators carry everything the executor needs to drive storage:
//! ranges, the access conditions that produced them, the filter conditions
//! still to be evaluated, and the ordering flags (`keep_order`, `desc`,
//! `out_of_order`) that record what the planner promised about row order.

use crate::expr::{AggExpr, ByItem, Expr, Schema};
use crate::meta::{ColumnInfo, IndexColumn};
use copt_core::ranges::{IndexRange, IntColumnRange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Full or ranged scan over a table's row handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableScan {
    pub table_id: i64,
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    pub ranges: Vec<IntColumnRange>,
    pub access_conditions: Vec<Expr>,
    pub filter_conditions: Vec<Expr>,
    /// True when the scan itself delivers handle order and no sort is needed.
    pub keep_order: bool,
    pub desc: bool,
}

/// Ranged scan over one index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexScan {
    pub table_id: i64,
    pub table_name: String,
    pub index_id: i64,
    pub index_name: String,
    pub index_columns: Vec<IndexColumn>,
    pub columns: Vec<ColumnInfo>,
    pub ranges: Vec<IndexRange>,
    pub access_conditions: Vec<Expr>,
    pub filter_conditions: Vec<Expr>,
    /// Leading access conditions that are plain equalities.
    pub access_equal_count: usize,
    /// Leading access conditions that are equalities or IN lists.
    pub access_in_and_eq_count: usize,
    /// True when the scan's output order is not relied upon.
    pub out_of_order: bool,
    pub desc: bool,
}

/// Scan over an in-memory schema table, executed entirely in the SQL layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemTableScan {
    pub db_name: String,
    pub table_id: i64,
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    pub ranges: Vec<IntColumnRange>,
}

/// Physical operator variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PhysicalKind {
    TableScan(TableScan),
    IndexScan(IndexScan),
    MemTableScan(MemTableScan),
    Sort { by_items: Vec<ByItem> },
    Limit { offset: u64, count: u64 },
    Selection { conditions: Vec<Expr> },
    Projection { exprs: Vec<Expr> },
    Aggregation { group_by: Vec<Expr>, agg_funcs: Vec<AggExpr> },
}

impl PhysicalKind {
    pub fn op_name(&self) -> &'static str {
        match self {
            PhysicalKind::TableScan(_) => "TableScan",
            PhysicalKind::IndexScan(_) => "IndexScan",
            PhysicalKind::MemTableScan(_) => "MemTableScan",
            PhysicalKind::Sort { .. } => "Sort",
            PhysicalKind::Limit { .. } => "Limit",
            PhysicalKind::Selection { .. } => "Selection",
            PhysicalKind::Projection { .. } => "Projection",
            PhysicalKind::Aggregation { .. } => "Aggregation",
        }
    }
}

/// One node of a physical plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalPlan {
    pub id: u32,
    pub schema: Schema,
    pub children: Vec<PhysicalPlan>,
    pub kind: PhysicalKind,
}

impl PhysicalPlan {
    pub fn new(id: u32, schema: Schema, kind: PhysicalKind) -> Self {
        Self {
            id,
            schema,
            children: Vec::new(),
            kind,
        }
    }

    pub fn with_child(mut self, child: PhysicalPlan) -> Self {
        self.children.push(child);
        self
    }

    /// Pre-order iteration over the tree.
    pub fn iter(&self) -> PlanIter<'_> {
        PlanIter { stack: vec![self] }
    }

    /// Indented one-line-per-node rendering, for logs and test assertions.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        use std::fmt::Write;
        let _ = writeln!(out, "{:indent$}{}", "", self, indent = depth * 2);
        for child in &self.children {
            child.describe_into(out, depth + 1);
        }
    }
}

impl fmt::Display for PhysicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.op_name(), self.id)?;
        match &self.kind {
            PhysicalKind::TableScan(ts) => {
                write!(f, "({})", ts.table_name)?;
                if ts.keep_order {
                    write!(f, " keep-order")?;
                }
                if ts.desc {
                    write!(f, " desc")?;
                }
            }
            PhysicalKind::IndexScan(is) => {
                write!(f, "({}.{})", is.table_name, is.index_name)?;
                if is.out_of_order {
                    write!(f, " out-of-order")?;
                }
                if is.desc {
                    write!(f, " desc")?;
                }
            }
            PhysicalKind::MemTableScan(ms) => write!(f, "({}.{})", ms.db_name, ms.table_name)?,
            PhysicalKind::Limit { offset, count } => write!(f, " offset={offset} count={count}")?,
            _ => {}
        }
        Ok(())
    }
}

/// Pre-order plan iterator.
pub struct PlanIter<'a> {
    stack: Vec<&'a PhysicalPlan>,
}

impl<'a> Iterator for PlanIter<'a> {
    type Item = &'a PhysicalPlan;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ColumnRef;

    fn leaf(id: u32) -> PhysicalPlan {
        PhysicalPlan::new(
            id,
            Schema::new(vec![ColumnRef::new(1, 0, "a")]),
            PhysicalKind::Limit { offset: 0, count: 1 },
        )
    }

    #[test]
    fn iteration_is_preorder() {
        let plan = leaf(3).with_child(leaf(1).with_child(leaf(2)));
        let ids: Vec<u32> = plan.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn describe_renders_one_line_per_node() {
        let plan = leaf(2).with_child(leaf(1));
        let text = plan.describe();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("Limit_2"));
    }
}
