//! # The Property-Directed Search
//!
//! This module implements the planner's top-down, memoized search. Every
//! logical node answers one question: *what is the cheapest physical task
//! whose output satisfies a required ordering?* The answer is found by
//! comparing at most two branches:
//!
//! 1. **Enforce**: plan the child with no requirement, attach this operator,
//!    and wrap the result in an explicit sort.
//! 2. **Push**: rewrite the requirement through this operator (when the
//!    operator's semantics allow it), ask the child to satisfy it natively,
//!    and attach this operator on top.
//!
//! Whichever branch costs less wins; ties keep the enforce branch. The memo
//! caches the winner per `(node, property)` pair, so the search does each
//! subproblem once, and a failed computation leaves no memo entry behind.
//!
//! ## Scan Selection
//!
//! The leaves do the real work. A `DataSource` enumerates a table scan plus
//! one index scan per available index, estimates each one's row count from
//! the statistics snapshot, and keeps the cheapest. Index scans check two
//! orthogonal properties: whether the index *covers* the queried columns
//! (if not, the task becomes a double read with a row-lookup table plan),
//! and whether the index's column order matches the required ordering (if
//! not, the task is wrapped in an enforcing sort).
//!
//! ## Cop Tasks and Fairness
//!
//! A cop task's cost does not yet include shipping its rows out of the
//! coprocessor. Comparing it directly against a root task would flatter it,
//! so the selection strategy finishes its pushed branch early whenever the
//! parent operator cannot push anything further down -- at that point the
//! finishing charge is inevitable and should count.

use crate::context::{IdAllocator, RequestType, SessionContext};
use crate::cost::{sort_cost, CPU_FACTOR, DESC_SCAN_FACTOR, SCAN_FACTOR, SELECTION_FACTOR};
use crate::error::PlanError;
use crate::expr::{ByItem, ColumnRef, Expr, Schema};
use crate::meta::{available_indices, is_covering_index, IndexColumn, IndexInfo};
use crate::physical::{IndexScan, MemTableScan, PhysicalKind, PhysicalPlan, TableScan};
use crate::plan::{DataSource, LogicalKind, LogicalPlan, NodeId};
use crate::prop::RequiredProp;
use crate::range_builder::RangeBuilder;
use crate::task::{CopTask, RootTask, Task};
use copt_core::ranges::{IndexRange, IntColumnRange};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// One planning session over one logical plan.
pub struct Planner<'a> {
    plan: &'a LogicalPlan,
    ctx: &'a SessionContext,
    ranges: Arc<dyn RangeBuilder>,
    alloc: IdAllocator,
    memo: HashMap<(NodeId, RequiredProp), Task>,
}

impl<'a> Planner<'a> {
    pub fn new(plan: &'a LogicalPlan, ctx: &'a SessionContext, ranges: Arc<dyn RangeBuilder>) -> Self {
        Self {
            plan,
            ctx,
            ranges,
            alloc: IdAllocator::new(),
            memo: HashMap::new(),
        }
    }

    /// Plan the arena root under `prop` and return the cheapest task.
    pub fn optimize(&mut self, prop: &RequiredProp) -> Result<Task, PlanError> {
        let root = self
            .plan
            .root()
            .ok_or_else(|| PlanError::Internal("logical plan has no root".into()))?;
        let task = self.best_task(root, prop)?;
        debug!(cost = task.cost(), rows = task.row_count(), prop = %prop, "planning complete");
        Ok(task)
    }

    /// The memoized per-node entry point.
    fn best_task(&mut self, node_id: NodeId, prop: &RequiredProp) -> Result<Task, PlanError> {
        let key = (node_id, prop.clone());
        if let Some(task) = self.memo.get(&key) {
            return Ok(task.clone());
        }
        let plan = self.plan;
        let task = match &plan.node(node_id).kind {
            LogicalKind::DataSource(_) => self.plan_data_source(node_id, prop)?,
            LogicalKind::Projection(_) => self.plan_projection(node_id, prop)?,
            LogicalKind::Sort(_) => self.plan_sort(node_id, prop)?,
            LogicalKind::Selection(_) => self.plan_selection(node_id, prop)?,
            LogicalKind::Limit(_) | LogicalKind::Aggregation(_) => {
                self.plan_generic(node_id, prop)?
            }
        };
        self.memo.insert(key, task.clone());
        Ok(task)
    }

    /// Default strategy: enforce branch, plus a push branch that assumes
    /// attaching this operator preserves the child's order.
    fn plan_generic(&mut self, node_id: NodeId, prop: &RequiredProp) -> Result<Task, PlanError> {
        let plan = self.plan;
        let node = plan.node(node_id);
        let mut task = match node.children.first() {
            None => Task::Root(RootTask {
                plan: self.build_physical(node_id)?,
                cnt: 0.0,
                cst: 0.0,
            }),
            Some(&child) => {
                let child_task = self.best_task(child, &RequiredProp::none())?;
                self.attach_node(node_id, child_task)?
            }
        };
        task = self.enforce_property(prop, task)?;

        if !prop.is_empty() {
            if let Some(&child) = node.children.first() {
                let ordered = self.best_task(child, prop)?;
                let ordered = self.attach_node(node_id, ordered)?;
                if ordered.cost() < task.cost() {
                    task = ordered;
                }
            }
        }
        Ok(task)
    }

    /// Projection: the push branch rewrites the demanded columns through the
    /// projection's expressions, refusing on scalar functions and dropping
    /// constants.
    fn plan_projection(&mut self, node_id: NodeId, prop: &RequiredProp) -> Result<Task, PlanError> {
        let plan = self.plan;
        let node = plan.node(node_id);
        let LogicalKind::Projection(proj) = &node.kind else {
            return Err(PlanError::Internal("projection strategy on a non-projection".into()));
        };
        let &child = node
            .children
            .first()
            .ok_or_else(|| PlanError::Internal("projection has no child".into()))?;

        let child_task = self.best_task(child, &RequiredProp::none())?;
        let mut task = self.attach_node(node_id, child_task)?;
        task = self.enforce_property(prop, task)?;

        if let Some(pushed) = proj.pushed_prop(&node.schema, prop) {
            let ordered = self.best_task(child, &pushed)?;
            let ordered = self.attach_node(node_id, ordered)?;
            if ordered.cost() < task.cost() {
                trace!(node = node_id, "projection push branch wins");
                task = ordered;
            }
        }
        Ok(task)
    }

    /// Sort: the push branch hands the sort's own order to the child; in
    /// top-N form the sort is elided and only the limit remains. The final
    /// enforcement answers the *caller's* property, which may differ from
    /// this sort's own order.
    fn plan_sort(&mut self, node_id: NodeId, prop: &RequiredProp) -> Result<Task, PlanError> {
        let plan = self.plan;
        let node = plan.node(node_id);
        let LogicalKind::Sort(sort) = &node.kind else {
            return Err(PlanError::Internal("sort strategy on a non-sort".into()));
        };
        let &child = node
            .children
            .first()
            .ok_or_else(|| PlanError::Internal("sort has no child".into()))?;

        let child_task = self.best_task(child, &RequiredProp::none())?;
        let mut task = self.attach_node(node_id, child_task)?;

        if let Some(own_prop) = sort.pushed_prop() {
            let mut ordered = self.best_task(child, &own_prop)?;
            if let Some(limit) = sort.exec_limit {
                // The child already delivers the order, so only the limit
                // survives of the top-N.
                ordered = self.attach_limit(limit.offset, limit.count, node.schema.clone(), ordered)?;
            }
            if ordered.cost() < task.cost() {
                trace!(node = node_id, "sort push branch wins");
                task = ordered;
            }
        }
        self.enforce_property(prop, task)
    }

    /// Selection: as the default strategy, except that the pushed branch's
    /// cop task is finished before the cost comparison whenever the parent
    /// cannot push anything further down.
    fn plan_selection(&mut self, node_id: NodeId, prop: &RequiredProp) -> Result<Task, PlanError> {
        let plan = self.plan;
        let node = plan.node(node_id);
        let &child = node
            .children
            .first()
            .ok_or_else(|| PlanError::Internal("selection has no child".into()))?;

        let child_task = self.best_task(child, &RequiredProp::none())?;
        let mut task = self.attach_node(node_id, child_task)?;
        task = self.enforce_property(prop, task)?;

        if !prop.is_empty() {
            let ordered = self.best_task(child, prop)?;
            let mut ordered = self.attach_node(node_id, ordered)?;
            if let Task::Cop(cop) = ordered {
                let parent_can_push = node
                    .parent
                    .is_some_and(|parent| self.plan_can_push_down(parent));
                ordered = if parent_can_push {
                    Task::Cop(cop)
                } else {
                    Task::Root(cop.finish()?)
                };
            }
            if ordered.cost() < task.cost() {
                task = ordered;
            }
        }
        Ok(task)
    }

    /// Whether `node` can keep pushing work into an unfinished cop task.
    fn plan_can_push_down(&self, node_id: NodeId) -> bool {
        match &self.plan.node(node_id).kind {
            LogicalKind::Selection(sel) => {
                let (pushed, _) = sel.split_conditions(self.ctx.client.as_deref());
                !pushed.is_empty()
            }
            LogicalKind::Sort(sort) => sort.can_push_down(),
            LogicalKind::Limit(_) => true,
            // TODO: check group-by items and aggregate arguments for storage
            // support instead of assuming they all qualify.
            LogicalKind::Aggregation(_) => true,
            _ => false,
        }
    }

    /// Scan selection: memtable short-circuit, then the cheapest of a table
    /// scan and one index scan per available index.
    fn plan_data_source(&mut self, node_id: NodeId, prop: &RequiredProp) -> Result<Task, PlanError> {
        let plan = self.plan;
        let node = plan.node(node_id);
        let LogicalKind::DataSource(ds) = &node.kind else {
            return Err(PlanError::Internal("data source strategy on a non-source".into()));
        };

        if let Some(task) = self.mem_table_task(ds, &node.schema, prop)? {
            return Ok(task);
        }

        let (indices, include_table_scan) = available_indices(&ds.index_hints, &ds.table);
        let mut best: Option<Task> = None;
        if include_table_scan {
            let task = self.convert_to_table_scan(ds, &node.schema, prop)?;
            trace!(cost = task.cost(), "table scan candidate");
            best = Some(task);
        }
        for index in indices {
            let task = self.convert_to_index_scan(node_id, ds, &node.schema, prop, index)?;
            trace!(index = %index.name, cost = task.cost(), "index scan candidate");
            match &best {
                Some(current) if task.cost() >= current.cost() => {}
                _ => best = Some(task),
            }
        }
        best.ok_or_else(|| {
            PlanError::Internal(format!("no access path for table {}", ds.table.name))
        })
    }

    /// A memtable scan in the SQL layer, used when the database is an
    /// in-memory schema or the storage client cannot serve selects.
    fn mem_table_task(
        &mut self,
        ds: &DataSource,
        schema: &Schema,
        prop: &RequiredProp,
    ) -> Result<Option<Task>, PlanError> {
        let mem_db = self.ctx.info_schema.is_memory_db(&ds.db_name);
        let is_dist_req = !mem_db && self.ctx.supports(RequestType::Select);
        if is_dist_req {
            return Ok(None);
        }
        let scan = MemTableScan {
            db_name: ds.db_name.clone(),
            table_id: ds.table.id,
            table_name: ds.table.name.clone(),
            columns: ds.columns.clone(),
            ranges: vec![IntColumnRange::full()],
        };
        let plan = PhysicalPlan::new(
            self.alloc.alloc(),
            schema.clone(),
            PhysicalKind::MemTableScan(scan),
        );
        let task = Task::Root(RootTask {
            plan,
            cnt: ds.statistics.count as f64,
            cst: 0.0,
        });
        Ok(Some(self.enforce_property(prop, task)?))
    }

    /// Build the table-scan candidate.
    fn convert_to_table_scan(
        &mut self,
        ds: &DataSource,
        schema: &Schema,
        prop: &RequiredProp,
    ) -> Result<Task, PlanError> {
        let mut ts = TableScan {
            table_id: ds.table.id,
            table_name: ds.table.name.clone(),
            columns: ds.columns.clone(),
            ranges: Vec::new(),
            access_conditions: Vec::new(),
            filter_conditions: Vec::new(),
            keep_order: false,
            desc: false,
        };
        if !ds.pushed_down_conds.is_empty() {
            let (access, filter) = self
                .ranges
                .detach_table_conditions(ds.pushed_down_conds.clone(), &ds.table);
            ts.ranges = self.ranges.build_table_range(&access)?;
            ts.access_conditions = access;
            ts.filter_conditions = filter;
        } else {
            ts.ranges = vec![IntColumnRange::full()];
        }

        // With the PK as the row handle, the histogram over the PK column
        // prices the ranges; otherwise the whole-table count stands.
        let mut row_count = ds.statistics.count as f64;
        let mut pk_col: Option<&ColumnRef> = None;
        if ds.table.pk_is_handle {
            for (i, col) in ts.columns.iter().enumerate() {
                if col.primary_key {
                    if let Some(schema_col) = schema.columns.get(i) {
                        pk_col = Some(schema_col);
                        row_count = ds
                            .statistics
                            .row_count_by_int_column_ranges(col.id, &ts.ranges)?;
                    }
                    break;
                }
            }
        }

        let mut cst = row_count * SCAN_FACTOR;
        let keeps_order =
            pk_col.is_some_and(|pk| prop.cols.len() == 1 && prop.cols[0] == *pk);
        if keeps_order {
            if prop.desc {
                ts.desc = true;
                cst = row_count * DESC_SCAN_FACTOR;
            }
            ts.keep_order = true;
        }
        let plan = PhysicalPlan::new(self.alloc.alloc(), schema.clone(), PhysicalKind::TableScan(ts));
        let task = Task::Cop(CopTask {
            index_plan: None,
            table_plan: Some(plan),
            cnt: row_count,
            cst,
            index_plan_finished: true,
        });
        if keeps_order {
            Ok(task)
        } else {
            self.enforce_property(prop, task)
        }
    }

    /// Build one index-scan candidate.
    fn convert_to_index_scan(
        &mut self,
        node_id: NodeId,
        ds: &DataSource,
        schema: &Schema,
        prop: &RequiredProp,
        index: &IndexInfo,
    ) -> Result<Task, PlanError> {
        let mut is = IndexScan {
            table_id: ds.table.id,
            table_name: ds.table.name.clone(),
            index_id: index.id,
            index_name: index.name.clone(),
            index_columns: index.columns.clone(),
            columns: ds.columns.clone(),
            ranges: Vec::new(),
            access_conditions: Vec::new(),
            filter_conditions: Vec::new(),
            access_equal_count: 0,
            access_in_and_eq_count: 0,
            out_of_order: false,
            desc: false,
        };
        let mut row_count = ds.statistics.count as f64;
        if !ds.pushed_down_conds.is_empty() {
            let detached = self
                .ranges
                .detach_index_conditions(ds.pushed_down_conds.clone(), index);
            is.access_conditions = detached.access;
            is.filter_conditions = detached.filter;
            is.access_equal_count = detached.eq_count;
            is.access_in_and_eq_count = detached.in_and_eq_count;
            is.ranges = self.ranges.build_index_range(index, &is.access_conditions)?;
            row_count = ds.statistics.row_count_by_index_ranges(
                index.id,
                &is.ranges,
                is.access_in_and_eq_count,
            )?;
        } else {
            is.ranges = vec![IndexRange::full()];
        }

        // Covering decides single read vs. double read. A double read scans
        // the index's own columns first, then fetches full rows by handle.
        let covering = is_covering_index(&ds.columns, &index.columns, ds.table.pk_is_handle);
        let (index_schema, table_plan) = if covering {
            (schema.clone(), None)
        } else {
            let from_id = schema
                .columns
                .first()
                .map(|c| c.from_id)
                .unwrap_or(node_id as u32);
            let mut index_cols: Vec<ColumnRef> = index
                .columns
                .iter()
                .map(|col| ColumnRef::new(from_id, col.offset, col.name.clone()))
                .collect();
            // The handle comes back with every index entry; exposing it in
            // the index schema lets parents that only need the PK avoid the
            // row lookup.
            if ds.table.pk_is_handle {
                if let Some((i, pk)) = ds.columns.iter().enumerate().find(|(_, c)| c.primary_key) {
                    let present = index_cols.iter().any(|c| c.position == pk.offset);
                    if !present {
                        if let Some(schema_col) = schema.columns.get(i) {
                            index_cols.push(schema_col.clone());
                        }
                    }
                }
            }
            let lookup = PhysicalPlan::new(
                self.alloc.alloc(),
                schema.clone(),
                PhysicalKind::TableScan(TableScan {
                    table_id: ds.table.id,
                    table_name: ds.table.name.clone(),
                    columns: ds.columns.clone(),
                    ranges: Vec::new(),
                    access_conditions: Vec::new(),
                    filter_conditions: Vec::new(),
                    keep_order: false,
                    desc: false,
                }),
            );
            (Schema::new(index_cols), Some(lookup))
        };

        // Order matching: find the demanded leading column among the index
        // columns. Positions before it must be pinned by equality, or the
        // scan's order says nothing about the demanded column.
        let mut matches_order = prop.is_empty();
        if !prop.is_empty() {
            for (i, col) in index.columns.iter().enumerate() {
                if col.name == prop.cols[0].name {
                    matches_order = match_indices_prop(&index.columns[i..], &prop.cols);
                    break;
                } else if i >= is.access_equal_count {
                    break;
                }
            }
        }

        let mut cst = row_count * SCAN_FACTOR;
        if !prop.is_empty() && matches_order {
            if prop.desc {
                is.desc = true;
                cst = row_count * DESC_SCAN_FACTOR;
            }
            let index_plan =
                PhysicalPlan::new(self.alloc.alloc(), index_schema, PhysicalKind::IndexScan(is));
            Ok(Task::Cop(CopTask {
                index_plan: Some(index_plan),
                table_plan,
                cnt: row_count,
                cst,
                index_plan_finished: false,
            }))
        } else {
            is.out_of_order = true;
            let index_plan =
                PhysicalPlan::new(self.alloc.alloc(), index_schema, PhysicalKind::IndexScan(is));
            let task = Task::Cop(CopTask {
                index_plan: Some(index_plan),
                table_plan,
                cnt: row_count,
                cst,
                index_plan_finished: false,
            });
            self.enforce_property(prop, task)
        }
    }

    /// Wrap `task` in a sort over the property's columns. The empty property
    /// enforces nothing.
    fn enforce_property(&mut self, prop: &RequiredProp, task: Task) -> Result<Task, PlanError> {
        if prop.is_empty() {
            return Ok(task);
        }
        let by_items = prop
            .cols
            .iter()
            .map(|col| ByItem {
                expr: Expr::Column(col.clone()),
                desc: prop.desc,
            })
            .collect();
        self.attach_sort(by_items, task)
    }

    /// Attach a physical sort. Sorting happens in the SQL layer, so the task
    /// is finished first.
    fn attach_sort(&mut self, by_items: Vec<ByItem>, task: Task) -> Result<Task, PlanError> {
        let mut root = task.into_root()?;
        let schema = root.plan.schema.clone();
        root.plan = PhysicalPlan::new(self.alloc.alloc(), schema, PhysicalKind::Sort { by_items })
            .with_child(root.plan);
        root.cst += sort_cost(root.cnt);
        Ok(Task::Root(root))
    }

    /// Attach a limit. Limits run fine inside the coprocessor, so a cop task
    /// stays cop; either way the row count clamps to `offset + count`.
    fn attach_limit(
        &mut self,
        offset: u64,
        count: u64,
        schema: Schema,
        task: Task,
    ) -> Result<Task, PlanError> {
        let clamp = (offset + count) as f64;
        match task {
            Task::Cop(mut cop) => {
                self.attach_to_cop_side(&mut cop, schema, PhysicalKind::Limit { offset, count })?;
                cop.cnt = cop.cnt.min(clamp);
                Ok(Task::Cop(cop))
            }
            Task::Root(mut root) => {
                root.plan = PhysicalPlan::new(
                    self.alloc.alloc(),
                    schema,
                    PhysicalKind::Limit { offset, count },
                )
                .with_child(root.plan);
                root.cnt = root.cnt.min(clamp);
                Ok(Task::Root(root))
            }
        }
    }

    /// Attach the physical counterpart of logical node `node_id` onto `task`.
    fn attach_node(&mut self, node_id: NodeId, task: Task) -> Result<Task, PlanError> {
        let plan = self.plan;
        let node = plan.node(node_id);
        let schema = node.schema.clone();
        match &node.kind {
            LogicalKind::Selection(sel) => match task {
                Task::Cop(mut cop) => {
                    let (pushed, retained) = sel.split_conditions(self.ctx.client.as_deref());
                    if !pushed.is_empty() {
                        self.attach_to_cop_side(
                            &mut cop,
                            schema.clone(),
                            PhysicalKind::Selection { conditions: pushed },
                        )?;
                        cop.cst += cop.cnt * CPU_FACTOR;
                        cop.cnt *= SELECTION_FACTOR;
                    }
                    let mut task = Task::Cop(cop);
                    if !retained.is_empty() {
                        let mut root = task.into_root()?;
                        root.plan = PhysicalPlan::new(
                            self.alloc.alloc(),
                            schema,
                            PhysicalKind::Selection { conditions: retained },
                        )
                        .with_child(root.plan);
                        root.cst += root.cnt * CPU_FACTOR;
                        root.cnt *= SELECTION_FACTOR;
                        task = Task::Root(root);
                    }
                    Ok(task)
                }
                Task::Root(mut root) => {
                    root.plan = PhysicalPlan::new(
                        self.alloc.alloc(),
                        schema,
                        PhysicalKind::Selection { conditions: sel.conditions.clone() },
                    )
                    .with_child(root.plan);
                    root.cst += root.cnt * CPU_FACTOR;
                    root.cnt *= SELECTION_FACTOR;
                    Ok(Task::Root(root))
                }
            },
            LogicalKind::Projection(proj) => {
                let mut root = task.into_root()?;
                root.plan = PhysicalPlan::new(
                    self.alloc.alloc(),
                    schema,
                    PhysicalKind::Projection { exprs: proj.exprs.clone() },
                )
                .with_child(root.plan);
                root.cst += root.cnt * CPU_FACTOR;
                Ok(Task::Root(root))
            }
            LogicalKind::Sort(sort) => self.attach_sort(sort.by_items.clone(), task),
            LogicalKind::Limit(limit) => self.attach_limit(limit.offset, limit.count, schema, task),
            LogicalKind::Aggregation(agg) => {
                let kind = PhysicalKind::Aggregation {
                    group_by: agg.group_by.clone(),
                    agg_funcs: agg.agg_funcs.clone(),
                };
                match task {
                    Task::Cop(mut cop) => {
                        self.attach_to_cop_side(&mut cop, schema, kind)?;
                        cop.cst += cop.cnt * CPU_FACTOR;
                        Ok(Task::Cop(cop))
                    }
                    Task::Root(mut root) => {
                        root.plan = PhysicalPlan::new(self.alloc.alloc(), schema, kind)
                            .with_child(root.plan);
                        root.cst += root.cnt * CPU_FACTOR;
                        Ok(Task::Root(root))
                    }
                }
            }
            LogicalKind::DataSource(_) => Err(PlanError::Internal(
                "a data source cannot be attached onto a task".into(),
            )),
        }
    }

    /// Wrap the cop task's active side -- the index side until it is
    /// finished, the table side after -- in a new operator node.
    fn attach_to_cop_side(
        &mut self,
        cop: &mut CopTask,
        schema: Schema,
        kind: PhysicalKind,
    ) -> Result<(), PlanError> {
        let side = if !cop.index_plan_finished && cop.index_plan.is_some() {
            &mut cop.index_plan
        } else {
            &mut cop.table_plan
        };
        let child = side.take().ok_or_else(|| {
            PlanError::Internal("cop task has no plan on its active side".into())
        })?;
        *side = Some(PhysicalPlan::new(self.alloc.alloc(), schema, kind).with_child(child));
        Ok(())
    }

    /// The standalone physical counterpart of a logical node, for childless
    /// nodes planned through the default strategy.
    fn build_physical(&mut self, node_id: NodeId) -> Result<PhysicalPlan, PlanError> {
        let plan = self.plan;
        let node = plan.node(node_id);
        let kind = match &node.kind {
            LogicalKind::Selection(sel) => PhysicalKind::Selection {
                conditions: sel.conditions.clone(),
            },
            LogicalKind::Projection(proj) => PhysicalKind::Projection {
                exprs: proj.exprs.clone(),
            },
            LogicalKind::Sort(sort) => PhysicalKind::Sort {
                by_items: sort.by_items.clone(),
            },
            LogicalKind::Limit(limit) => PhysicalKind::Limit {
                offset: limit.offset,
                count: limit.count,
            },
            LogicalKind::Aggregation(agg) => PhysicalKind::Aggregation {
                group_by: agg.group_by.clone(),
                agg_funcs: agg.agg_funcs.clone(),
            },
            LogicalKind::DataSource(_) => {
                return Err(PlanError::Internal(
                    "data sources are planned through scan selection".into(),
                ))
            }
        };
        Ok(PhysicalPlan::new(self.alloc.alloc(), node.schema.clone(), kind))
    }
}

/// Whether the index columns starting at the demanded leading column carry
/// the demanded ordering. The permissive default only requires the index to
/// have enough trailing columns, which reproduces the shipped behavior; the
/// `strict-index-order` feature also requires the names to line up pairwise.
fn match_indices_prop(idx_cols: &[IndexColumn], prop_cols: &[ColumnRef]) -> bool {
    if idx_cols.len() < prop_cols.len() {
        return false;
    }
    if cfg!(feature = "strict-index-order") {
        prop_cols
            .iter()
            .zip(idx_cols)
            .all(|(prop_col, idx_col)| prop_col.name == idx_col.name)
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx_col(name: &str, offset: usize) -> IndexColumn {
        IndexColumn::whole(name, offset)
    }

    #[test]
    fn prop_longer_than_index_never_matches() {
        let idx = [idx_col("a", 0)];
        let prop = [ColumnRef::new(1, 0, "a"), ColumnRef::new(1, 1, "b")];
        assert!(!match_indices_prop(&idx, &prop));
    }

    #[test]
    fn prefix_length_match() {
        let idx = [idx_col("a", 0), idx_col("b", 1)];
        let prop = [ColumnRef::new(1, 0, "a")];
        assert!(match_indices_prop(&idx, &prop));
    }
}
