//! Error types for mysqldiff.

use std::fmt;
use thiserror::Error;

/// Which database a read was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// The main error type for mysqldiff operations.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A schema read failed (connectivity or query error).
    #[error("{side} {op} failed: {message}")]
    DataSource {
        side: Side,
        op: String,
        message: String,
    },

    /// Query error reported by a schema source, before it is attributed to a side.
    #[error("Query error: {0}")]
    Query(String),

    /// A schema source has no such column, before it is attributed to a side.
    #[error("Column not found: {table}.{column}")]
    Missing { table: String, column: String },

    /// A single-column fetch found nothing on one side.
    #[error("{side} {op}: column not found")]
    NotFound {
        side: Side,
        op: String,
        table: String,
        column: String,
    },

    /// A schema read exceeded its deadline.
    #[error("{side} {op} timed out")]
    Timeout { side: Side, op: String },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decode error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DiffError {
    /// Create a data source error for an operation.
    pub fn data_source(side: Side, op: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::DataSource {
            side,
            op: op.into(),
            message: message.to_string(),
        }
    }

    /// Create a not-found error, as reported by a schema source.
    pub fn not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Missing {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Attribute a raw source error to the side and operation that produced it.
    ///
    /// Errors that are already attributed, or not about a read, pass through.
    pub fn on(self, side: Side, op: &str) -> Self {
        match self {
            Self::Query(message) | Self::Connection(message) => Self::DataSource {
                side,
                op: op.to_string(),
                message,
            },
            Self::Missing { table, column } => Self::NotFound {
                side,
                op: op.to_string(),
                table,
                column,
            },
            other => other,
        }
    }

    /// Short machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DataSource { .. } | Self::Query(_) => "DATA_SOURCE",
            Self::NotFound { .. } | Self::Missing { .. } => "NOT_FOUND",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Connection(_) => "CONNECTION",
            Self::Config(_) => "CONFIG",
            Self::Io(_) | Self::Json(_) | Self::Toml(_) => "INTERNAL",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::Missing { .. } => 404,
            Self::Timeout { .. } => 504,
            Self::DataSource { .. } | Self::Query(_) | Self::Connection(_) => 502,
            _ => 500,
        }
    }
}

/// Result type alias for mysqldiff operations.
pub type DiffResult<T> = Result<T, DiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DiffError::data_source(Side::Right, "list_columns(users)", "connection reset");
        assert_eq!(
            err.to_string(),
            "right list_columns(users) failed: connection reset"
        );

        let err = DiffError::not_found("users", "email");
        assert_eq!(err.to_string(), "Column not found: users.email");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DiffError::not_found("t", "c").status_code(), 404);
        assert_eq!(
            DiffError::Timeout {
                side: Side::Left,
                op: "list_tables".into()
            }
            .status_code(),
            504
        );
        assert_eq!(DiffError::data_source(Side::Left, "x", "y").status_code(), 502);
        assert_eq!(DiffError::Config("bad".into()).status_code(), 500);
    }

    #[test]
    fn test_on_annotates_query_errors_only() {
        let err = DiffError::Query("gone away".into()).on(Side::Left, "list_tables");
        assert!(matches!(err, DiffError::DataSource { side: Side::Left, .. }));
        assert_eq!(err.to_string(), "left list_tables failed: gone away");

        let err = DiffError::Timeout {
            side: Side::Left,
            op: "list_tables".into(),
        }
        .on(Side::Right, "get_column(users.id)");
        assert!(matches!(err, DiffError::Timeout { side: Side::Left, .. }));
    }

    #[test]
    fn test_on_attributes_missing_column() {
        let err = DiffError::not_found("users", "email").on(Side::Right, "get_column(users.email)");
        assert!(matches!(
            err,
            DiffError::NotFound { side: Side::Right, ref table, .. } if table == "users"
        ));
        assert_eq!(err.to_string(), "right get_column(users.email): column not found");
        assert_eq!(err.status_code(), 404);
    }
}
