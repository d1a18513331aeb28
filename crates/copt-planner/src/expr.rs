//! # Expressions and Schemas
//!
//! The planner never evaluates expressions; it only needs to classify them.
//! Three kinds cover everything the push-down analyses distinguish:
//!
//! - a **column reference**, which ordering requirements can be rewritten
//!   through;
//! - a **constant**, on which ordering is vacuous;
//! - a **scalar function**, which blocks ordering push-down (the function may
//!   not be monotone) and may or may not be evaluable inside storage.
//!
//! ## Column Identity
//!
//! A `ColumnRef` is identified by `(from_id, position)` -- the id of the plan
//! block that produced it and its position in that block's output. Equality
//! and hashing use only the identity, never the name, so renaming a column
//! through a projection does not break memo keys or schema lookups. The name
//! is carried for index-order matching, which works by column name against
//! index metadata.

use copt_core::Datum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reference to a column by stable identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Id of the plan block that produced this column.
    pub from_id: u32,
    /// Position within that block's output schema.
    pub position: usize,
    /// Column name, used only for matching against index metadata.
    pub name: String,
}

impl ColumnRef {
    pub fn new(from_id: u32, position: usize, name: impl Into<String>) -> Self {
        Self {
            from_id,
            position,
            name: name.into(),
        }
    }
}

/// Identity comparison: `(from_id, position)` only.
impl PartialEq for ColumnRef {
    fn eq(&self, other: &Self) -> bool {
        self.from_id == other.from_id && self.position == other.position
    }
}

impl Eq for ColumnRef {}

impl Hash for ColumnRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from_id.hash(state);
        self.position.hash(state);
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}.{}", self.name, self.from_id, self.position)
    }
}

/// Builtin scalar functions the expression layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarFuncKind {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    Plus,
    Minus,
    Mul,
    Div,
    And,
    Or,
    Not,
    IsNull,
    Like,
    Case,
    Cast,
    Rand,
}

impl ScalarFuncKind {
    /// Whether the storage-layer coprocessor can evaluate this function.
    /// Comparisons, arithmetic, and boolean logic are supported; pattern
    /// matching, CASE, CAST, and nondeterministic functions are not.
    pub fn storage_supported(&self) -> bool {
        !matches!(
            self,
            ScalarFuncKind::Like | ScalarFuncKind::Case | ScalarFuncKind::Cast | ScalarFuncKind::Rand
        )
    }

    /// Whether this is a comparison producing a range over one column.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            ScalarFuncKind::Eq
                | ScalarFuncKind::NotEq
                | ScalarFuncKind::Lt
                | ScalarFuncKind::LtEq
                | ScalarFuncKind::Gt
                | ScalarFuncKind::GtEq
        )
    }
}

/// A scalar expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Column(ColumnRef),
    Constant(Datum),
    ScalarFunc {
        kind: ScalarFuncKind,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn col(from_id: u32, position: usize, name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(from_id, position, name))
    }

    pub fn int(v: i64) -> Self {
        Expr::Constant(Datum::Int64(v))
    }

    pub fn func(kind: ScalarFuncKind, args: Vec<Expr>) -> Self {
        Expr::ScalarFunc { kind, args }
    }

    /// All column references in this expression, in visit order.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Expr::Column(c) => out.push(c),
            Expr::Constant(_) => {}
            Expr::ScalarFunc { args, .. } => {
                for arg in args {
                    arg.collect_columns(out);
                }
            }
        }
    }

    /// Whether every function in this tree is coprocessor-evaluable.
    pub fn can_push_to_storage(&self) -> bool {
        match self {
            Expr::Column(_) | Expr::Constant(_) => true,
            Expr::ScalarFunc { kind, args } => {
                kind.storage_supported() && args.iter().all(Expr::can_push_to_storage)
            }
        }
    }
}

/// Ordered list of output columns of a plan node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnRef>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnRef>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `col` by identity, or `None` if it is not produced here.
    pub fn column_index(&self, col: &ColumnRef) -> Option<usize> {
        self.columns.iter().position(|c| c == col)
    }

    pub fn contains(&self, col: &ColumnRef) -> bool {
        self.column_index(col).is_some()
    }
}

/// One `ORDER BY` item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByItem {
    pub expr: Expr,
    pub desc: bool,
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// One aggregate expression, e.g. `SUM(DISTINCT a + b)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggExpr {
    pub func: AggFunc,
    pub args: Vec<Expr>,
    pub distinct: bool,
}
