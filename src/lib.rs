//! # mysqldiff — Schema drift detection for MySQL
//!
//! Compares the schema of two databases, a **left** (reference) side and a
//! **right** side, and reports what drifted:
//!
//! | Level  | Report          | Contents                                    |
//! |--------|-----------------|---------------------------------------------|
//! | Table  | [`TableReport`]  | tables only on left / only on right / changed |
//! | Column | [`ColumnReport`] | columns of one table                         |
//! | Field  | [`FieldReport`]  | declared attributes of one column            |
//!
//! Names only on the left are reported as `added`, names only on the right
//! as `deleted`.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use mysqldiff::prelude::*;
//!
//! let left = MySqlSource::connect(ServerConfig::load("left.json")?).await?;
//! let right = MySqlSource::connect(ServerConfig::load("right.json")?).await?;
//!
//! let report = Comparer::new(left, right).table_report().await?;
//! println!("{}", serde_json::to_string(&report)?);
//! ```
//!
//! [`TableReport`]: report::TableReport
//! [`ColumnReport`]: report::ColumnReport
//! [`FieldReport`]: report::FieldReport

pub mod column;
pub mod config;
pub mod diff;
pub mod error;
pub mod mysql;
pub mod report;
pub mod server;
pub mod source;

pub mod prelude {
    pub use crate::column::{Column, ColumnPair, Field};
    pub use crate::config::{ServerConfig, SideConfig};
    pub use crate::diff::{FieldChange, diff_columns, diff_fields, diff_tables};
    pub use crate::error::*;
    pub use crate::mysql::MySqlSource;
    pub use crate::report::{ColumnReport, Comparer, FieldReport, TableReport};
    pub use crate::source::{SchemaSource, Snapshot, SnapshotSource};
}

use crate::config::SideConfig;
use crate::error::DiffResult;
use crate::source::{SchemaSource, SnapshotSource};

/// Open the schema source a side is configured for.
pub async fn open_side(config: SideConfig) -> DiffResult<Box<dyn SchemaSource>> {
    match config {
        SideConfig::Server(server) => Ok(Box::new(mysql::MySqlSource::connect(server).await?)),
        SideConfig::Snapshot(path) => Ok(Box::new(SnapshotSource::from_file(path)?)),
    }
}
