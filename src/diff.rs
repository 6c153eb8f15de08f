//! Schema Diff
//!
//! Pure set and field comparisons between a left (reference) schema and a
//! right schema. Nothing here touches a database.
//!
//! Direction is fixed: names only on the left are `added`, names only on the
//! right are `deleted`, and field changes report the right value as `old` and
//! the left value as `new`.

use crate::column::{Column, ColumnPair, Field};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Partition of two table-name lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSetDiff {
    /// In left, not in right. Left order.
    pub added: Vec<String>,
    /// In right, not in left. Right order.
    pub deleted: Vec<String>,
    /// In both. Left order.
    pub common: Vec<String>,
}

/// Compare two table-name lists by exact string equality.
pub fn diff_tables(left: &[String], right: &[String]) -> TableSetDiff {
    let left_set: HashSet<&str> = left.iter().map(String::as_str).collect();
    let right_set: HashSet<&str> = right.iter().map(String::as_str).collect();

    let mut diff = TableSetDiff::default();

    for name in right {
        if !left_set.contains(name.as_str()) {
            diff.deleted.push(name.clone());
        }
    }

    for name in left {
        if right_set.contains(name.as_str()) {
            diff.common.push(name.clone());
        } else {
            diff.added.push(name.clone());
        }
    }

    diff
}

/// Partition of two column lists for one table.
#[derive(Debug, Clone, Default)]
pub struct ColumnSetDiff<'a> {
    /// Column names only on the left.
    pub added: Vec<String>,
    /// Column names only on the right.
    pub deleted: Vec<String>,
    /// Columns present on both sides, keyed by name.
    pub common: BTreeMap<String, ColumnPair<'a>>,
}

impl ColumnSetDiff<'_> {
    /// True when at least one column exists on only one side.
    pub fn has_membership_changes(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty()
    }

    /// Names of common columns that are not whole-column equal, by name.
    pub fn changed(&self) -> Vec<String> {
        self.common
            .iter()
            .filter(|(_, pair)| !pair.is_equal())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Pair two column lists by column name.
pub fn diff_columns<'a>(left: &'a [Column], right: &'a [Column]) -> ColumnSetDiff<'a> {
    let by_name: HashMap<&str, &Column> = left.iter().map(|c| (c.name.as_str(), c)).collect();
    let right_names: HashSet<&str> = right.iter().map(|c| c.name.as_str()).collect();

    let mut diff = ColumnSetDiff::default();

    for rc in right {
        match by_name.get(rc.name.as_str()) {
            Some(&lc) => {
                diff.common.insert(
                    rc.name.clone(),
                    ColumnPair {
                        left: lc,
                        right: rc,
                    },
                );
            }
            None => diff.deleted.push(rc.name.clone()),
        }
    }

    for lc in left {
        if !right_names.contains(lc.name.as_str()) {
            diff.added.push(lc.name.clone());
        }
    }

    debug_assert!(
        diff.common
            .values()
            .all(|p| p.left.name == p.right.name && right_names.contains(p.left.name.as_str())),
        "column pairing produced a mismatched pair"
    );

    diff
}

/// One tracked field that differs between the two sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub name: String,
    /// Right-side value.
    pub old: String,
    /// Left-side value.
    pub new: String,
}

/// Compare every tracked field of a paired column.
pub fn diff_fields(left: &Column, right: &Column) -> Vec<FieldChange> {
    Field::ALL
        .iter()
        .filter(|f| !left.field_eq(right, **f))
        .map(|f| FieldChange {
            name: f.as_str().to_string(),
            old: right.field(*f).to_string(),
            new: left.field(*f).to_string(),
        })
        .collect()
}
