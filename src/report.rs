//! Report assembly.
//!
//! [`Comparer`] reads from a left and a right [`SchemaSource`] and builds the
//! three report shapes. Each report, with all of its reads, is bounded by one
//! deadline; any failed read aborts the report.

use serde::Serialize;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use crate::diff::{FieldChange, diff_columns, diff_fields, diff_tables};
use crate::error::{DiffError, DiffResult, Side};
use crate::source::SchemaSource;

/// Default deadline for a whole report.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tables added, deleted, or changed between the two schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub changed: Vec<String>,
}

/// Columns added, deleted, or changed within one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnReport {
    pub table: String,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub changed: Vec<String>,
}

/// Field-level changes of one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub table: String,
    pub column: String,
    pub changed: Vec<FieldChange>,
}

impl TableReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.changed.is_empty()
    }
}

impl ColumnReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.changed.is_empty()
    }
}

/// The read a report is currently waiting on, so a timeout can name it.
struct Progress(Mutex<(Side, String)>);

impl Progress {
    fn new() -> Self {
        Self(Mutex::new((Side::Left, "start".to_string())))
    }

    fn enter(&self, side: Side, op: &str) {
        let mut current = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *current = (side, op.to_string());
    }

    fn timed_out(&self) -> DiffError {
        let (side, op) = self.0.lock().unwrap_or_else(|e| e.into_inner()).clone();
        DiffError::Timeout { side, op }
    }
}

/// Compares a left (reference) schema against a right one.
pub struct Comparer<L, R> {
    left: L,
    right: R,
    timeout: Duration,
}

impl<L: SchemaSource, R: SchemaSource> Comparer<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self {
            left,
            right,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the deadline for a whole report, covering all of its reads.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn left(&self) -> &L {
        &self.left
    }

    pub fn right(&self) -> &R {
        &self.right
    }

    /// Run a whole report under the deadline.
    async fn within<T>(
        &self,
        progress: &Progress,
        fut: impl Future<Output = DiffResult<T>>,
    ) -> DiffResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(progress.timed_out()),
        }
    }

    /// Run one read against one side and attribute its errors.
    async fn read<T>(
        &self,
        progress: &Progress,
        side: Side,
        op: &str,
        fut: impl Future<Output = DiffResult<T>>,
    ) -> DiffResult<T> {
        tracing::debug!("{} {}", side, op);
        progress.enter(side, op);
        fut.await.map_err(|e| e.on(side, op))
    }

    /// Compare table sets, then drill into every common table.
    ///
    /// A table with any added or deleted column is marked changed without
    /// looking at its common columns.
    pub async fn table_report(&self) -> DiffResult<TableReport> {
        let progress = Progress::new();
        self.within(&progress, self.collect_tables(&progress)).await
    }

    /// Compare the columns of one table.
    pub async fn column_report(&self, table: &str) -> DiffResult<ColumnReport> {
        let progress = Progress::new();
        self.within(&progress, self.collect_columns(&progress, table))
            .await
    }

    /// Compare the tracked fields of one column.
    pub async fn field_report(&self, table: &str, column: &str) -> DiffResult<FieldReport> {
        let progress = Progress::new();
        self.within(&progress, self.collect_fields(&progress, table, column))
            .await
    }

    async fn collect_tables(&self, progress: &Progress) -> DiffResult<TableReport> {
        let left_tables = self
            .read(progress, Side::Left, "list_tables", self.left.list_tables())
            .await?;
        let right_tables = self
            .read(progress, Side::Right, "list_tables", self.right.list_tables())
            .await?;

        let tables = diff_tables(&left_tables, &right_tables);
        let mut report = TableReport {
            added: tables.added,
            deleted: tables.deleted,
            changed: Vec::new(),
        };

        for table in &tables.common {
            let op = format!("list_columns({})", table);
            let left_cols = self
                .read(progress, Side::Left, &op, self.left.list_columns(table))
                .await?;
            let right_cols = self
                .read(progress, Side::Right, &op, self.right.list_columns(table))
                .await?;

            let columns = diff_columns(&left_cols, &right_cols);
            let changed = columns.has_membership_changes()
                || columns.common.values().any(|pair| !pair.is_equal());
            if changed {
                report.changed.push(table.clone());
            }
        }

        tracing::info!(
            "Table report: {} added, {} deleted, {} changed",
            report.added.len(),
            report.deleted.len(),
            report.changed.len()
        );
        Ok(report)
    }

    async fn collect_columns(&self, progress: &Progress, table: &str) -> DiffResult<ColumnReport> {
        let op = format!("list_columns({})", table);
        let left_cols = self
            .read(progress, Side::Left, &op, self.left.list_columns(table))
            .await?;
        let right_cols = self
            .read(progress, Side::Right, &op, self.right.list_columns(table))
            .await?;

        let columns = diff_columns(&left_cols, &right_cols);
        let changed = columns.changed();
        Ok(ColumnReport {
            table: table.to_string(),
            added: columns.added,
            deleted: columns.deleted,
            changed,
        })
    }

    async fn collect_fields(
        &self,
        progress: &Progress,
        table: &str,
        column: &str,
    ) -> DiffResult<FieldReport> {
        let op = format!("get_column({}.{})", table, column);
        let left_col = self
            .read(progress, Side::Left, &op, self.left.get_column(table, column))
            .await?;
        let right_col = self
            .read(progress, Side::Right, &op, self.right.get_column(table, column))
            .await?;
        tracing::debug!("left: {}", left_col);
        tracing::debug!("right: {}", right_col);

        Ok(FieldReport {
            table: table.to_string(),
            column: column.to_string(),
            changed: diff_fields(&left_col, &right_col),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::source::{Snapshot, SnapshotSource};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    fn id() -> Column {
        Column::new("", "id").typed("int", "int(11)").not_null().key("PRI")
    }

    fn name() -> Column {
        Column::new("", "name").typed("varchar", "varchar(64)")
    }

    /// Never answers, so every read hits the deadline.
    struct Stalled;

    #[async_trait]
    impl SchemaSource for Stalled {
        async fn list_tables(&self) -> DiffResult<Vec<String>> {
            std::future::pending().await
        }

        async fn list_columns(&self, _table: &str) -> DiffResult<Vec<Column>> {
            std::future::pending().await
        }

        async fn get_column(&self, _table: &str, _column: &str) -> DiffResult<Column> {
            std::future::pending().await
        }

        fn describe(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    /// Answers like the wrapped snapshot, but only after a delay.
    struct Slow {
        inner: SnapshotSource,
        delay: Duration,
    }

    #[async_trait]
    impl SchemaSource for Slow {
        async fn list_tables(&self) -> DiffResult<Vec<String>> {
            tokio::time::sleep(self.delay).await;
            self.inner.list_tables().await
        }

        async fn list_columns(&self, table: &str) -> DiffResult<Vec<Column>> {
            tokio::time::sleep(self.delay).await;
            self.inner.list_columns(table).await
        }

        async fn get_column(&self, table: &str, column: &str) -> DiffResult<Column> {
            tokio::time::sleep(self.delay).await;
            self.inner.get_column(table, column).await
        }

        fn describe(&self) -> serde_json::Value {
            self.inner.describe()
        }
    }

    fn slow(snapshot: Snapshot, delay: Duration) -> Slow {
        Slow {
            inner: SnapshotSource::new(snapshot),
            delay,
        }
    }

    #[tokio::test]
    async fn test_identical_schemas_report_nothing() {
        let snap = Snapshot::new("a").table("users", vec![id(), name()]);
        let comparer = Comparer::new(
            SnapshotSource::new(snap.clone()),
            SnapshotSource::new(snap),
        );
        assert!(comparer.table_report().await.unwrap().is_empty());
        assert!(comparer.column_report("users").await.unwrap().is_empty());
        assert!(
            comparer
                .field_report("users", "id")
                .await
                .unwrap()
                .changed
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_changed_field_marks_table() {
        let left = Snapshot::new("left").table("users", vec![id(), name().not_null()]);
        let right = Snapshot::new("right").table("users", vec![id(), name()]);
        let comparer = Comparer::new(SnapshotSource::new(left), SnapshotSource::new(right));

        let report = comparer.table_report().await.unwrap();
        assert_eq!(report.changed, vec!["users".to_string()]);

        let report = comparer.column_report("users").await.unwrap();
        assert_eq!(report.changed, vec!["name".to_string()]);
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let comparer = Comparer::new(SnapshotSource::new(Snapshot::default()), Stalled)
            .timeout(Duration::from_millis(20));
        let err = comparer.table_report().await.unwrap_err();
        assert!(matches!(
            err,
            DiffError::Timeout {
                side: Side::Right,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_deadline_covers_whole_report() {
        let snap = ["a", "b", "c", "d"]
            .into_iter()
            .fold(Snapshot::new("s"), |snap, t| snap.table(t, vec![id()]));
        let delay = Duration::from_millis(60);

        // Ten reads of 60ms each, every one well inside the 200ms deadline.
        let comparer = Comparer::new(slow(snap.clone(), delay), slow(snap.clone(), delay))
            .timeout(Duration::from_millis(200));
        let err = comparer.table_report().await.unwrap_err();
        match err {
            DiffError::Timeout { op, .. } => assert!(op.starts_with("list_columns("), "{}", op),
            other => panic!("expected a timeout, got {:?}", other),
        }

        let comparer = Comparer::new(slow(snap.clone(), delay), slow(snap, delay))
            .timeout(Duration::from_secs(5));
        assert!(comparer.table_report().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_field_report_timeout_names_stalled_side() {
        let snap = Snapshot::new("s").table("users", vec![id()]);
        let comparer = Comparer::new(Stalled, SnapshotSource::new(snap))
            .timeout(Duration::from_millis(20));
        let err = comparer.field_report("users", "id").await.unwrap_err();
        assert!(matches!(
            err,
            DiffError::Timeout { side: Side::Left, ref op } if op == "get_column(users.id)"
        ));
    }
}
