//! # Range Builders
//!
//! The planner does not analyze predicates itself. It hands the pushed-down
//! conjuncts to a `RangeBuilder`, which detaches them into *access*
//! conditions (those that narrow the scanned key range) and *filter*
//! conditions (those that still have to be evaluated per row), and turns the
//! access conditions into concrete ranges. Production wiring plugs the full
//! range analyzer in behind this trait; `BasicRangeBuilder` implements the
//! common shapes -- conjunctions of comparisons and IN lists against
//! constants on the integer handle or on an index-column prefix -- which is
//! enough to drive the planner in tests and development.

use crate::error::PlanError;
use crate::expr::{ColumnRef, Expr, ScalarFuncKind};
use crate::meta::{IndexInfo, TableInfo};
use copt_core::ranges::{IndexRange, IntColumnRange};
use copt_core::Datum;
use std::cmp::Ordering;

/// Result of detaching predicates against one index.
#[derive(Debug, Clone, Default)]
pub struct DetachedIndexConditions {
    /// Conditions that narrow the index key range.
    pub access: Vec<Expr>,
    /// Conditions still evaluated per row.
    pub filter: Vec<Expr>,
    /// Leading access conditions that are plain equalities.
    pub eq_count: usize,
    /// Leading access conditions that are equalities or IN lists.
    pub in_and_eq_count: usize,
}

/// Predicate detachment and range construction, per scan shape.
pub trait RangeBuilder: Send + Sync {
    /// Split conjuncts into (access, filter) against the table's handle.
    fn detach_table_conditions(
        &self,
        conds: Vec<Expr>,
        table: &TableInfo,
    ) -> (Vec<Expr>, Vec<Expr>);

    /// Turn handle access conditions into integer ranges.
    fn build_table_range(&self, access: &[Expr]) -> Result<Vec<IntColumnRange>, PlanError>;

    /// Split conjuncts into access/filter against an index's key columns.
    fn detach_index_conditions(&self, conds: Vec<Expr>, index: &IndexInfo)
        -> DetachedIndexConditions;

    /// Turn index access conditions into composite key ranges.
    fn build_index_range(
        &self,
        index: &IndexInfo,
        access: &[Expr],
    ) -> Result<Vec<IndexRange>, PlanError>;
}

/// A comparison of one column against one constant, normalized so the column
/// is on the left.
struct ColumnCompare<'a> {
    col: &'a ColumnRef,
    kind: ScalarFuncKind,
    value: &'a Datum,
}

fn as_column_compare(expr: &Expr) -> Option<ColumnCompare<'_>> {
    let Expr::ScalarFunc { kind, args } = expr else {
        return None;
    };
    if !kind.is_comparison() || args.len() != 2 {
        return None;
    }
    match (&args[0], &args[1]) {
        (Expr::Column(col), Expr::Constant(value)) => Some(ColumnCompare { col, kind: *kind, value }),
        (Expr::Constant(value), Expr::Column(col)) => {
            let flipped = match kind {
                ScalarFuncKind::Lt => ScalarFuncKind::Gt,
                ScalarFuncKind::LtEq => ScalarFuncKind::GtEq,
                ScalarFuncKind::Gt => ScalarFuncKind::Lt,
                ScalarFuncKind::GtEq => ScalarFuncKind::LtEq,
                other => *other,
            };
            Some(ColumnCompare { col, kind: flipped, value })
        }
        _ => None,
    }
}

/// An IN list over one column with constant elements.
fn as_column_in(expr: &Expr) -> Option<(&ColumnRef, Vec<&Datum>)> {
    let Expr::ScalarFunc { kind: ScalarFuncKind::In, args } = expr else {
        return None;
    };
    let (first, rest) = args.split_first()?;
    let Expr::Column(col) = first else {
        return None;
    };
    let mut values = Vec::with_capacity(rest.len());
    for arg in rest {
        let Expr::Constant(value) = arg else {
            return None;
        };
        values.push(value);
    }
    Some((col, values))
}

/// Range builder for comparisons and IN lists against constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRangeBuilder;

impl RangeBuilder for BasicRangeBuilder {
    fn detach_table_conditions(
        &self,
        conds: Vec<Expr>,
        table: &TableInfo,
    ) -> (Vec<Expr>, Vec<Expr>) {
        let Some(pk) = table.pk_handle_column() else {
            return (Vec::new(), conds);
        };
        conds.into_iter().partition(|cond| {
            as_column_compare(cond).is_some_and(|cmp| {
                cmp.kind != ScalarFuncKind::NotEq
                    && cmp.col.name == pk.name
                    && matches!(cmp.value, Datum::Int64(_))
            })
        })
    }

    fn build_table_range(&self, access: &[Expr]) -> Result<Vec<IntColumnRange>, PlanError> {
        let mut range = IntColumnRange::full();
        for cond in access {
            let Some(cmp) = as_column_compare(cond) else {
                return Err(PlanError::Internal(format!(
                    "access condition is not a column comparison: {cond:?}"
                )));
            };
            let Datum::Int64(v) = *cmp.value else {
                return Err(PlanError::Internal(
                    "handle access condition with a non-integer constant".into(),
                ));
            };
            match cmp.kind {
                ScalarFuncKind::Eq => {
                    range.low = range.low.max(v);
                    range.high = range.high.min(v);
                }
                ScalarFuncKind::Lt => range.high = range.high.min(v.saturating_sub(1)),
                ScalarFuncKind::LtEq => range.high = range.high.min(v),
                ScalarFuncKind::Gt => range.low = range.low.max(v.saturating_add(1)),
                ScalarFuncKind::GtEq => range.low = range.low.max(v),
                _ => {
                    return Err(PlanError::Internal(format!(
                        "unsupported handle access comparison {:?}",
                        cmp.kind
                    )))
                }
            }
        }
        if range.low > range.high {
            return Ok(Vec::new());
        }
        Ok(vec![range])
    }

    fn detach_index_conditions(
        &self,
        conds: Vec<Expr>,
        index: &IndexInfo,
    ) -> DetachedIndexConditions {
        let mut out = DetachedIndexConditions::default();
        let mut used = vec![false; conds.len()];
        let mut eq_prefix_intact = true;

        for idx_col in &index.columns {
            // An equality or IN on this column extends the pinned prefix.
            let pinned = conds.iter().enumerate().find(|&(i, cond)| {
                if used[i] {
                    return false;
                }
                if let Some(cmp) = as_column_compare(cond) {
                    return cmp.kind == ScalarFuncKind::Eq && cmp.col.name == idx_col.name;
                }
                if let Some((col, _)) = as_column_in(cond) {
                    return col.name == idx_col.name;
                }
                false
            });
            match pinned {
                Some((i, cond)) => {
                    used[i] = true;
                    let is_in = matches!(
                        cond,
                        Expr::ScalarFunc { kind: ScalarFuncKind::In, .. }
                    );
                    out.access.push(cond.clone());
                    out.in_and_eq_count += 1;
                    if is_in {
                        eq_prefix_intact = false;
                    } else if eq_prefix_intact {
                        out.eq_count += 1;
                    }
                }
                None => {
                    // No more pinning: range comparisons on this column close
                    // out the access conditions.
                    for (i, cond) in conds.iter().enumerate() {
                        if used[i] {
                            continue;
                        }
                        let is_range = as_column_compare(cond).is_some_and(|cmp| {
                            cmp.col.name == idx_col.name && cmp.kind != ScalarFuncKind::Eq
                                && cmp.kind != ScalarFuncKind::NotEq
                        });
                        if is_range {
                            used[i] = true;
                            out.access.push(cond.clone());
                        }
                    }
                    break;
                }
            }
        }
        out.filter = conds
            .into_iter()
            .zip(used)
            .filter_map(|(cond, used)| (!used).then_some(cond))
            .collect();
        out
    }

    fn build_index_range(
        &self,
        index: &IndexInfo,
        access: &[Expr],
    ) -> Result<Vec<IndexRange>, PlanError> {
        if access.is_empty() {
            return Ok(vec![IndexRange::full()]);
        }
        let mut pinned: Vec<Datum> = Vec::new();
        let mut remaining = access;

        for idx_col in &index.columns {
            let Some((first, rest)) = remaining.split_first() else {
                break;
            };
            if let Some(cmp) = as_column_compare(first) {
                if cmp.kind == ScalarFuncKind::Eq && cmp.col.name == idx_col.name {
                    pinned.push(cmp.value.clone());
                    remaining = rest;
                    continue;
                }
            }
            if let Some((col, values)) = as_column_in(first) {
                if col.name == idx_col.name {
                    // One point range per list element, sharing the pinned
                    // prefix. Anything after the IN is evaluated as filter.
                    let mut ranges = Vec::with_capacity(values.len());
                    for value in values {
                        let mut point = pinned.clone();
                        point.push(value.clone());
                        ranges.push(IndexRange::point(point));
                    }
                    return Ok(ranges);
                }
            }
            // Range comparisons on this column finish the composite range.
            return self.close_range(idx_col.name.as_str(), pinned, remaining);
        }
        if pinned.is_empty() {
            Ok(vec![IndexRange::full()])
        } else {
            Ok(vec![IndexRange::point(pinned)])
        }
    }
}

impl BasicRangeBuilder {
    /// Fold the trailing range comparisons on `col_name` onto the pinned
    /// prefix, producing one composite range.
    fn close_range(
        &self,
        col_name: &str,
        pinned: Vec<Datum>,
        conds: &[Expr],
    ) -> Result<Vec<IndexRange>, PlanError> {
        let mut low = Datum::Null;
        let mut high = Datum::MaxValue;
        let mut low_exclude = false;
        let mut high_exclude = false;

        for cond in conds {
            let Some(cmp) = as_column_compare(cond) else {
                return Err(PlanError::Internal(format!(
                    "index access condition is not a column comparison: {cond:?}"
                )));
            };
            if cmp.col.name != col_name {
                return Err(PlanError::Internal(format!(
                    "index access condition on unexpected column {}",
                    cmp.col.name
                )));
            }
            match cmp.kind {
                ScalarFuncKind::Lt | ScalarFuncKind::LtEq => {
                    match cmp.value.compare(&high).map_err(PlanError::from)? {
                        Ordering::Less => {
                            high = cmp.value.clone();
                            high_exclude = cmp.kind == ScalarFuncKind::Lt;
                        }
                        Ordering::Equal => {
                            high_exclude = high_exclude || cmp.kind == ScalarFuncKind::Lt;
                        }
                        Ordering::Greater => {}
                    }
                }
                ScalarFuncKind::Gt | ScalarFuncKind::GtEq => {
                    match cmp.value.compare(&low).map_err(PlanError::from)? {
                        Ordering::Greater => {
                            low = cmp.value.clone();
                            low_exclude = cmp.kind == ScalarFuncKind::Gt;
                        }
                        Ordering::Equal => {
                            low_exclude = low_exclude || cmp.kind == ScalarFuncKind::Gt;
                        }
                        Ordering::Less => {}
                    }
                }
                other => {
                    return Err(PlanError::Internal(format!(
                        "unsupported index range comparison {other:?}"
                    )))
                }
            }
        }

        let mut low_key = pinned.clone();
        low_key.push(low);
        let mut high_key = pinned;
        high_key.push(high);
        Ok(vec![IndexRange {
            low: low_key,
            high: high_key,
            low_exclude,
            high_exclude,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{ColumnInfo, IndexColumn};

    fn pk_table() -> TableInfo {
        TableInfo {
            id: 1,
            name: "t".into(),
            columns: vec![
                ColumnInfo { id: 1, name: "id".into(), offset: 0, primary_key: true },
                ColumnInfo { id: 2, name: "v".into(), offset: 1, primary_key: false },
            ],
            indices: vec![],
            pk_is_handle: true,
        }
    }

    fn idx_ab() -> IndexInfo {
        IndexInfo {
            id: 10,
            name: "idx_ab".into(),
            columns: vec![IndexColumn::whole("a", 0), IndexColumn::whole("b", 1)],
            unique: false,
        }
    }

    fn gt(col: Expr, v: i64) -> Expr {
        Expr::func(ScalarFuncKind::Gt, vec![col, Expr::int(v)])
    }

    fn eq(col: Expr, v: i64) -> Expr {
        Expr::func(ScalarFuncKind::Eq, vec![col, Expr::int(v)])
    }

    #[test]
    fn table_detach_keeps_handle_comparisons() {
        let b = BasicRangeBuilder;
        let table = pk_table();
        let on_pk = gt(Expr::col(0, 0, "id"), 10);
        let on_other = eq(Expr::col(0, 1, "v"), 3);
        let (access, filter) = b.detach_table_conditions(vec![on_pk.clone(), on_other.clone()], &table);
        assert_eq!(access, vec![on_pk]);
        assert_eq!(filter, vec![on_other]);
    }

    #[test]
    fn table_range_intersects_comparisons() {
        let b = BasicRangeBuilder;
        let access = vec![
            gt(Expr::col(0, 0, "id"), 10),
            Expr::func(ScalarFuncKind::LtEq, vec![Expr::col(0, 0, "id"), Expr::int(100)]),
        ];
        let ranges = b.build_table_range(&access).unwrap();
        assert_eq!(ranges, vec![IntColumnRange { low: 11, high: 100 }]);

        // Contradictory bounds produce the empty range set.
        let none = b
            .build_table_range(&[eq(Expr::col(0, 0, "id"), 5), eq(Expr::col(0, 0, "id"), 6)])
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn index_detach_counts_the_pinned_prefix() {
        let b = BasicRangeBuilder;
        let conds = vec![
            gt(Expr::col(0, 1, "b"), 7),
            eq(Expr::col(0, 0, "a"), 1),
            eq(Expr::col(0, 2, "c"), 9),
        ];
        let detached = b.detach_index_conditions(conds, &idx_ab());
        assert_eq!(detached.eq_count, 1);
        assert_eq!(detached.in_and_eq_count, 1);
        assert_eq!(detached.access.len(), 2);
        assert_eq!(detached.filter.len(), 1);
    }

    #[test]
    fn index_range_combines_prefix_and_tail() {
        let b = BasicRangeBuilder;
        let index = idx_ab();
        let access = vec![eq(Expr::col(0, 0, "a"), 1), gt(Expr::col(0, 1, "b"), 7)];
        let ranges = b.build_index_range(&index, &access).unwrap();
        assert_eq!(
            ranges,
            vec![IndexRange {
                low: vec![Datum::Int64(1), Datum::Int64(7)],
                high: vec![Datum::Int64(1), Datum::MaxValue],
                low_exclude: true,
                high_exclude: false,
            }]
        );
    }

    #[test]
    fn index_in_list_expands_to_point_ranges() {
        let b = BasicRangeBuilder;
        let index = idx_ab();
        let access = vec![Expr::func(
            ScalarFuncKind::In,
            vec![Expr::col(0, 0, "a"), Expr::int(1), Expr::int(3)],
        )];
        let detached = b.detach_index_conditions(access.clone(), &index);
        assert_eq!(detached.in_and_eq_count, 1);
        assert_eq!(detached.eq_count, 0);

        let ranges = b.build_index_range(&index, &access).unwrap();
        assert_eq!(ranges.len(), 2);
        assert!(ranges.iter().all(|r| r.pinned_prefix_len().unwrap() == 1));
    }

    #[test]
    fn no_access_conditions_scan_everything() {
        let b = BasicRangeBuilder;
        let ranges = b.build_index_range(&idx_ab(), &[]).unwrap();
        assert_eq!(ranges, vec![IndexRange::full()]);
    }
}
