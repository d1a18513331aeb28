//! # Table Metadata
//!
//! The slice of catalog information the planner consumes: column and index
//! definitions, the `pk_is_handle` flag, and per-table index hints. In a
//! running system these come from the schema layer; tests populate them
//! programmatically.
//!
//! ## The Row Handle
//!
//! When a table's primary key is a single integer column, that column *is*
//! the row handle: rows are stored ordered by it, a table scan over it needs
//! no extra sort, and an index lookup can fetch the full row by handle. The
//! `pk_is_handle` flag gates both the order-preserving table scan and the
//! covering-index shortcut for the PK column.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub id: i64,
    pub name: String,
    /// Position of the column in the table definition.
    pub offset: usize,
    pub primary_key: bool,
}

/// One column of an index key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    /// Offset of the indexed column in the table definition.
    pub offset: usize,
    /// Prefix length for a prefix index; `None` indexes the whole value.
    pub length: Option<usize>,
}

impl IndexColumn {
    pub fn whole(name: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            offset,
            length: None,
        }
    }
}

/// Index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub id: i64,
    pub name: String,
    pub columns: Vec<IndexColumn>,
    pub unique: bool,
}

/// Table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: i64,
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub indices: Vec<IndexInfo>,
    /// True when the integer primary key doubles as the row handle.
    pub pk_is_handle: bool,
}

impl TableInfo {
    /// The handle column, when the primary key is the handle.
    pub fn pk_handle_column(&self) -> Option<&ColumnInfo> {
        if !self.pk_is_handle {
            return None;
        }
        self.columns.iter().find(|c| c.primary_key)
    }
}

/// Kinds of index hints a query can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexHintKind {
    Use,
    Ignore,
    Force,
}

/// A `USE/IGNORE/FORCE INDEX(...)` hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHint {
    pub kind: IndexHintKind,
    pub index_names: Vec<String>,
}

/// Resolve index hints into the set of indices the planner may consider and
/// whether a plain table scan is among the alternatives.
///
/// `Use` and `Force` restrict the search to the named indices and rule out
/// the table scan; `Ignore` removes the named indices but keeps everything
/// else, table scan included. Without hints, every index plus the table scan
/// is in play.
pub fn available_indices<'a>(
    hints: &[IndexHint],
    table: &'a TableInfo,
) -> (Vec<&'a IndexInfo>, bool) {
    let mut requested: Vec<&str> = Vec::new();
    let mut ignored: HashSet<&str> = HashSet::new();
    for hint in hints {
        match hint.kind {
            IndexHintKind::Use | IndexHintKind::Force => {
                requested.extend(hint.index_names.iter().map(String::as_str));
            }
            IndexHintKind::Ignore => {
                ignored.extend(hint.index_names.iter().map(String::as_str));
            }
        }
    }
    if requested.is_empty() {
        let indices = table
            .indices
            .iter()
            .filter(|idx| !ignored.contains(idx.name.as_str()))
            .collect();
        (indices, true)
    } else {
        let indices = table
            .indices
            .iter()
            .filter(|idx| {
                requested.contains(&idx.name.as_str()) && !ignored.contains(idx.name.as_str())
            })
            .collect();
        (indices, false)
    }
}

/// Whether an index covers the given output columns: every column is either
/// a whole-value index key column (matched by name) or the PK handle column.
/// A prefix index column never covers, because the stored value is truncated.
pub fn is_covering_index(
    columns: &[ColumnInfo],
    index_columns: &[IndexColumn],
    pk_is_handle: bool,
) -> bool {
    for col in columns {
        if pk_is_handle && col.primary_key {
            continue;
        }
        let in_index = index_columns
            .iter()
            .any(|idx_col| idx_col.name == col.name && idx_col.length.is_none());
        if !in_index {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableInfo {
        TableInfo {
            id: 1,
            name: "t".into(),
            columns: vec![
                ColumnInfo { id: 1, name: "a".into(), offset: 0, primary_key: true },
                ColumnInfo { id: 2, name: "b".into(), offset: 1, primary_key: false },
                ColumnInfo { id: 3, name: "c".into(), offset: 2, primary_key: false },
            ],
            indices: vec![
                IndexInfo {
                    id: 10,
                    name: "idx_b".into(),
                    columns: vec![IndexColumn::whole("b", 1)],
                    unique: false,
                },
                IndexInfo {
                    id: 11,
                    name: "idx_bc".into(),
                    columns: vec![IndexColumn::whole("b", 1), IndexColumn::whole("c", 2)],
                    unique: false,
                },
            ],
            pk_is_handle: true,
        }
    }

    #[test]
    fn no_hints_allows_everything() {
        let table = table();
        let (indices, table_scan) = available_indices(&[], &table);
        assert_eq!(indices.len(), 2);
        assert!(table_scan);
    }

    #[test]
    fn use_hint_restricts_and_drops_table_scan() {
        let table = table();
        let hints = [IndexHint { kind: IndexHintKind::Use, index_names: vec!["idx_b".into()] }];
        let (indices, table_scan) = available_indices(&hints, &table);
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].name, "idx_b");
        assert!(!table_scan);
    }

    #[test]
    fn ignore_hint_removes_named_indices() {
        let table = table();
        let hints = [IndexHint { kind: IndexHintKind::Ignore, index_names: vec!["idx_b".into()] }];
        let (indices, table_scan) = available_indices(&hints, &table);
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].name, "idx_bc");
        assert!(table_scan);
    }

    #[test]
    fn covering_counts_index_columns_and_the_handle() {
        let table = table();
        let bc = &table.indices[1];
        // b, c are key columns and a is the handle: covered.
        assert!(is_covering_index(&table.columns, &bc.columns, true));
        // Without the handle shortcut, a is missing from the index.
        assert!(!is_covering_index(&table.columns, &bc.columns, false));
    }

    #[test]
    fn prefix_index_columns_never_cover() {
        let cols = vec![ColumnInfo { id: 2, name: "b".into(), offset: 1, primary_key: false }];
        let prefix = vec![IndexColumn { name: "b".into(), offset: 1, length: Some(10) }];
        assert!(!is_covering_index(&cols, &prefix, false));
    }
}
