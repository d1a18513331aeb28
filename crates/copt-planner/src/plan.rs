//! # Logical Plan Arena
//!
//! The planner's input: a tree of logical operators produced upstream by
//! binding and logical rewrite. Nodes live in an arena and reference each
//! other by index, with an optional parent back-link per node. The back-link
//! exists for exactly one consumer -- the selection strategy peeks at its
//! parent to decide whether a cop task may stay unfinished -- and is set in
//! a single pass by `set_root` once the tree shape is final, so there is no
//! ownership cycle to manage.
//!
//! The per-kind payloads also carry the two push-down analyses that belong
//! to the logical layer: a sort derives the property it could push to its
//! child, and a selection splits its conjuncts into storage-evaluable and
//! retained sets.

use crate::context::{RequestType, StorageClient};
use crate::expr::{AggExpr, ByItem, Expr, Schema};
use crate::meta::{ColumnInfo, IndexHint, TableInfo};
use crate::prop::RequiredProp;
use copt_core::StatisticsTable;
use std::sync::Arc;

/// Index of a node in the arena.
pub type NodeId = usize;

/// Access to one base table, with everything scan selection needs.
#[derive(Clone)]
pub struct DataSource {
    pub db_name: String,
    pub table: Arc<TableInfo>,
    /// Columns this query reads, in schema order.
    pub columns: Vec<ColumnInfo>,
    /// Conjuncts already pushed down to this source by logical rewrite.
    pub pushed_down_conds: Vec<Expr>,
    pub index_hints: Vec<IndexHint>,
    /// Immutable statistics snapshot for this planning call.
    pub statistics: Arc<StatisticsTable>,
}

/// A conjunctive filter.
#[derive(Clone)]
pub struct Selection {
    pub conditions: Vec<Expr>,
}

impl Selection {
    /// Split the conjuncts into (storage-evaluable, retained). Nothing is
    /// pushable at all when the client cannot serve coprocessor selects.
    pub fn split_conditions(&self, client: Option<&dyn StorageClient>) -> (Vec<Expr>, Vec<Expr>) {
        let can_push = client.is_some_and(|c| c.support_request_type(RequestType::Select, 0));
        if !can_push {
            return (Vec::new(), self.conditions.clone());
        }
        self.conditions
            .iter()
            .cloned()
            .partition(Expr::can_push_to_storage)
    }
}

/// Computed output columns.
#[derive(Clone)]
pub struct Projection {
    pub exprs: Vec<Expr>,
}

impl Projection {
    /// Rewrite an ordering demand through this projection, or refuse.
    ///
    /// Each demanded column must be produced by this projection. A column
    /// that maps to a bare child column is replaced by it; one that maps to
    /// a constant is dropped (ordering on a constant is vacuous); a scalar
    /// function refuses the push, since the function need not preserve
    /// order. The direction carries over unchanged.
    pub fn pushed_prop(&self, schema: &Schema, prop: &RequiredProp) -> Option<RequiredProp> {
        if prop.is_empty() {
            return None;
        }
        let mut cols = Vec::with_capacity(prop.cols.len());
        for col in &prop.cols {
            let idx = schema.column_index(col)?;
            match self.exprs.get(idx)? {
                Expr::Column(child_col) => cols.push(child_col.clone()),
                Expr::Constant(_) => {}
                Expr::ScalarFunc { .. } => return None,
            }
        }
        Some(RequiredProp::ordered(cols, prop.desc))
    }
}

/// The limit a top-N sort carries along.
#[derive(Clone, Copy)]
pub struct ExecLimit {
    pub offset: u64,
    pub count: u64,
}

/// An ORDER BY, optionally in top-N form.
#[derive(Clone)]
pub struct Sort {
    pub by_items: Vec<ByItem>,
    pub exec_limit: Option<ExecLimit>,
}

impl Sort {
    /// The property this sort could push to its child: legal only when every
    /// item is a bare column and all share one direction.
    pub fn pushed_prop(&self) -> Option<RequiredProp> {
        let mut desc = false;
        let mut cols = Vec::with_capacity(self.by_items.len());
        for (i, item) in self.by_items.iter().enumerate() {
            let Expr::Column(col) = &item.expr else {
                return None;
            };
            cols.push(col.clone());
            desc = item.desc;
            if i > 0 && item.desc != self.by_items[i - 1].desc {
                return None;
            }
        }
        Some(RequiredProp::ordered(cols, desc))
    }

    pub fn can_push_down(&self) -> bool {
        self.pushed_prop().is_some()
    }
}

/// LIMIT ... OFFSET ...
#[derive(Clone, Copy)]
pub struct Limit {
    pub offset: u64,
    pub count: u64,
}

/// GROUP BY plus aggregate functions.
#[derive(Clone)]
pub struct Aggregation {
    pub group_by: Vec<Expr>,
    pub agg_funcs: Vec<AggExpr>,
}

/// Logical operator variants.
#[derive(Clone)]
pub enum LogicalKind {
    DataSource(DataSource),
    Selection(Selection),
    Projection(Projection),
    Sort(Sort),
    Limit(Limit),
    Aggregation(Aggregation),
}

impl LogicalKind {
    pub fn op_name(&self) -> &'static str {
        match self {
            LogicalKind::DataSource(_) => "DataSource",
            LogicalKind::Selection(_) => "Selection",
            LogicalKind::Projection(_) => "Projection",
            LogicalKind::Sort(_) => "Sort",
            LogicalKind::Limit(_) => "Limit",
            LogicalKind::Aggregation(_) => "Aggregation",
        }
    }
}

/// One arena node.
pub struct LogicalNode {
    pub kind: LogicalKind,
    pub schema: Schema,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// The arena. Nodes are added bottom-up; `set_root` fixes the root and
/// back-fills parent links in one walk.
#[derive(Default)]
pub struct LogicalPlan {
    nodes: Vec<LogicalNode>,
    root: Option<NodeId>,
}

impl LogicalPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: LogicalKind, schema: Schema, children: Vec<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(LogicalNode {
            kind,
            schema,
            children,
            parent: None,
        });
        id
    }

    /// Fix the root and set every node's parent back-link.
    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let children = self.nodes[id].children.clone();
            for child in children {
                self.nodes[child].parent = Some(id);
                stack.push(child);
            }
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &LogicalNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticClient;
    use crate::expr::{ColumnRef, ScalarFuncKind};

    #[test]
    fn set_root_backfills_parent_links() {
        let mut plan = LogicalPlan::new();
        let leaf = plan.add(
            LogicalKind::Limit(Limit { offset: 0, count: 1 }),
            Schema::default(),
            vec![],
        );
        let mid = plan.add(
            LogicalKind::Limit(Limit { offset: 0, count: 1 }),
            Schema::default(),
            vec![leaf],
        );
        plan.set_root(mid);
        assert_eq!(plan.node(leaf).parent, Some(mid));
        assert_eq!(plan.node(mid).parent, None);
    }

    #[test]
    fn sort_push_down_requires_bare_columns_and_one_direction() {
        let bare = Sort {
            by_items: vec![
                ByItem { expr: Expr::col(1, 0, "a"), desc: true },
                ByItem { expr: Expr::col(1, 1, "b"), desc: true },
            ],
            exec_limit: None,
        };
        let prop = bare.pushed_prop().unwrap();
        assert_eq!(prop.cols.len(), 2);
        assert!(prop.desc);

        let mixed = Sort {
            by_items: vec![
                ByItem { expr: Expr::col(1, 0, "a"), desc: false },
                ByItem { expr: Expr::col(1, 1, "b"), desc: true },
            ],
            exec_limit: None,
        };
        assert!(!mixed.can_push_down());

        let computed = Sort {
            by_items: vec![ByItem {
                expr: Expr::func(ScalarFuncKind::Plus, vec![Expr::col(1, 0, "a"), Expr::int(1)]),
                desc: false,
            }],
            exec_limit: None,
        };
        assert!(!computed.can_push_down());
    }

    #[test]
    fn selection_split_follows_storage_support() {
        let pushable = Expr::func(ScalarFuncKind::Gt, vec![Expr::col(1, 0, "a"), Expr::int(5)]);
        let blocked = Expr::func(ScalarFuncKind::Like, vec![Expr::col(1, 1, "b")]);
        let sel = Selection {
            conditions: vec![pushable.clone(), blocked.clone()],
        };

        let client = StaticClient::full();
        let (pushed, retained) = sel.split_conditions(Some(&client as &dyn StorageClient));
        assert_eq!(pushed, vec![pushable]);
        assert_eq!(retained, vec![blocked]);

        let (pushed, retained) = sel.split_conditions(None);
        assert!(pushed.is_empty());
        assert_eq!(retained.len(), 2);
    }

    #[test]
    fn projection_push_rewrites_drops_and_refuses() {
        // SELECT b AS y, 1 AS k, a + 1 AS x FROM ...
        let proj = Projection {
            exprs: vec![
                Expr::col(1, 1, "b"),
                Expr::int(1),
                Expr::func(ScalarFuncKind::Plus, vec![Expr::col(1, 0, "a"), Expr::int(1)]),
            ],
        };
        let schema = Schema::new(vec![
            ColumnRef::new(2, 0, "y"),
            ColumnRef::new(2, 1, "k"),
            ColumnRef::new(2, 2, "x"),
        ]);

        // y rewrites to b, k drops out.
        let prop = RequiredProp::ordered(
            vec![ColumnRef::new(2, 0, "y"), ColumnRef::new(2, 1, "k")],
            true,
        );
        let pushed = proj.pushed_prop(&schema, &prop).unwrap();
        assert_eq!(pushed.cols.len(), 1);
        assert_eq!(pushed.cols[0].name, "b");
        assert!(pushed.desc);

        // x is computed: refuse.
        let prop = RequiredProp::ordered(vec![ColumnRef::new(2, 2, "x")], false);
        assert!(proj.pushed_prop(&schema, &prop).is_none());

        // A column this projection does not produce: refuse.
        let prop = RequiredProp::ordered(vec![ColumnRef::new(9, 0, "z")], false);
        assert!(proj.pushed_prop(&schema, &prop).is_none());
    }
}
