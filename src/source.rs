//! Schema sources.
//!
//! A [`SchemaSource`] is anything that can list tables and describe their
//! columns. The comparison engine only ever talks to this trait; the MySQL
//! implementation lives in [`crate::mysql`], and [`SnapshotSource`] serves a
//! schema captured earlier into a JSON file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::column::Column;
use crate::error::{DiffError, DiffResult};

/// Read access to one database's schema catalog.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Table names, in catalog order.
    async fn list_tables(&self) -> DiffResult<Vec<String>>;

    /// Columns of one table, in ordinal order. Unknown tables yield an empty list.
    async fn list_columns(&self, table: &str) -> DiffResult<Vec<Column>>;

    /// A single column definition. Fails with [`DiffError::Missing`] when absent.
    async fn get_column(&self, table: &str, column: &str) -> DiffResult<Column>;

    /// Human-readable description for logs and `/server/info`.
    fn describe(&self) -> serde_json::Value;
}

#[async_trait]
impl<S: SchemaSource + ?Sized> SchemaSource for Box<S> {
    async fn list_tables(&self) -> DiffResult<Vec<String>> {
        (**self).list_tables().await
    }

    async fn list_columns(&self, table: &str) -> DiffResult<Vec<Column>> {
        (**self).list_columns(table).await
    }

    async fn get_column(&self, table: &str, column: &str) -> DiffResult<Column> {
        (**self).get_column(table, column).await
    }

    fn describe(&self) -> serde_json::Value {
        (**self).describe()
    }
}

/// An in-memory schema: table name → columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub title: String,
    pub tables: BTreeMap<String, Vec<Column>>,
}

impl Snapshot {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tables: BTreeMap::new(),
        }
    }

    /// Add a table. Each column's `table` is overwritten with `name`.
    pub fn table(mut self, name: impl Into<String>, columns: Vec<Column>) -> Self {
        let name = name.into();
        let columns = columns
            .into_iter()
            .map(|mut c| {
                c.table = name.clone();
                c
            })
            .collect();
        self.tables.insert(name, columns);
        self
    }

    /// Capture every table of a live source.
    pub async fn capture<S: SchemaSource + ?Sized>(
        source: &S,
        title: impl Into<String>,
    ) -> DiffResult<Self> {
        let mut snapshot = Self::new(title);
        for table in source.list_tables().await? {
            let columns = source.list_columns(&table).await?;
            snapshot.tables.insert(table, columns);
        }
        Ok(snapshot)
    }

    pub fn load(path: impl AsRef<Path>) -> DiffResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> DiffResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

/// Serves a [`Snapshot`] as a schema source.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
    origin: Option<String>,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            origin: None,
        }
    }

    /// Load a snapshot file written by `mysqldiff dump`.
    pub fn from_file(path: impl AsRef<Path>) -> DiffResult<Self> {
        let path = path.as_ref();
        tracing::info!("Loading snapshot from: {}", path.display());
        Ok(Self {
            snapshot: Snapshot::load(path)?,
            origin: Some(path.display().to_string()),
        })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

#[async_trait]
impl SchemaSource for SnapshotSource {
    async fn list_tables(&self) -> DiffResult<Vec<String>> {
        Ok(self.snapshot.tables.keys().cloned().collect())
    }

    async fn list_columns(&self, table: &str) -> DiffResult<Vec<Column>> {
        Ok(self.snapshot.tables.get(table).cloned().unwrap_or_default())
    }

    async fn get_column(&self, table: &str, column: &str) -> DiffResult<Column> {
        self.snapshot
            .tables
            .get(table)
            .and_then(|cols| cols.iter().find(|c| c.name == column))
            .cloned()
            .ok_or_else(|| DiffError::not_found(table, column))
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": "snapshot",
            "title": self.snapshot.title,
            "path": self.origin,
            "tables": self.snapshot.tables.len(),
        })
    }
}
