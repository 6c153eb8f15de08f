//! MySQL schema source.
//!
//! Reads column definitions from `information_schema.columns` of the
//! configured database, using sqlx.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};

use crate::column::Column;
use crate::config::ServerConfig;
use crate::error::{DiffError, DiffResult};
use crate::source::SchemaSource;

const LIST_TABLES_SQL: &str = "\
SELECT DISTINCT CAST(TABLE_NAME AS CHAR) AS table_name
FROM information_schema.columns
WHERE TABLE_SCHEMA = ?
ORDER BY table_name";

const COLUMN_FIELDS: &str = "\
SELECT CAST(COLUMN_NAME AS CHAR) AS column_name,
       CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
       CAST(IS_NULLABLE AS CHAR) AS is_nullable,
       CAST(DATA_TYPE AS CHAR) AS data_type,
       CAST(COLUMN_TYPE AS CHAR) AS column_type,
       CAST(COLUMN_COMMENT AS CHAR) AS column_comment,
       CAST(COLUMN_KEY AS CHAR) AS column_key
FROM information_schema.columns
WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

/// At most this many connections per side.
const MAX_CONNECTIONS: u32 = 3;

/// A MySQL server whose schema is read through `information_schema`.
#[derive(Clone)]
pub struct MySqlSource {
    pool: MySqlPool,
    config: ServerConfig,
}

impl MySqlSource {
    /// Connect to the server described by `config`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = ServerConfig::load("left.json")?;
    /// let left = MySqlSource::connect(config).await?;
    /// ```
    pub async fn connect(config: ServerConfig) -> DiffResult<Self> {
        tracing::info!(
            "Connecting to {} ({}:{}/{})",
            config.label(),
            config.host,
            config.port,
            config.database
        );

        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.database)
            .charset("utf8mb4");
        if !config.password.is_empty() {
            options = options.password(&config.password);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .min_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DiffError::Connection(format!("{}: {}", config.label(), e)))?;

        Ok(Self { pool, config })
    }
}

#[async_trait]
impl SchemaSource for MySqlSource {
    async fn list_tables(&self) -> DiffResult<Vec<String>> {
        let rows = sqlx::query(LIST_TABLES_SQL)
            .bind(&self.config.database)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DiffError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("table_name")
                    .map_err(|e| DiffError::Query(e.to_string()))
            })
            .collect()
    }

    async fn list_columns(&self, table: &str) -> DiffResult<Vec<Column>> {
        let sql = format!("{} ORDER BY ORDINAL_POSITION", COLUMN_FIELDS);
        let rows = sqlx::query(&sql)
            .bind(&self.config.database)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DiffError::Query(e.to_string()))?;

        rows.iter().map(|row| row_to_column(table, row)).collect()
    }

    async fn get_column(&self, table: &str, column: &str) -> DiffResult<Column> {
        let sql = format!("{} AND COLUMN_NAME = ?", COLUMN_FIELDS);
        let row = sqlx::query(&sql)
            .bind(&self.config.database)
            .bind(table)
            .bind(column)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DiffError::Query(e.to_string()))?;

        match row {
            Some(row) => row_to_column(table, &row),
            None => Err(DiffError::not_found(table, column)),
        }
    }

    fn describe(&self) -> serde_json::Value {
        describe_server(&self.config)
    }
}

fn describe_server(config: &ServerConfig) -> serde_json::Value {
    serde_json::json!({
        "kind": "mysql",
        "title": config.title,
        "host": config.host,
        "port": config.port,
        "user": config.user,
        "database": config.database,
        "path": config.path.as_ref().map(|p| p.display().to_string()),
    })
}

/// Convert an `information_schema.columns` row to a Column.
fn row_to_column(table: &str, row: &MySqlRow) -> DiffResult<Column> {
    let text = |name: &str| -> DiffResult<String> {
        row.try_get::<Option<String>, _>(name)
            .map(Option::unwrap_or_default)
            .map_err(|e| DiffError::Query(format!("{}: {}", name, e)))
    };

    Ok(Column {
        table: table.to_string(),
        name: text("column_name")?,
        default_value: row
            .try_get::<Option<String>, _>("column_default")
            .map_err(|e| DiffError::Query(format!("column_default: {}", e)))?,
        is_nullable: text("is_nullable")?,
        data_type: text("data_type")?,
        column_type: text("column_type")?,
        comment: text("column_comment")?,
        key: text("column_key")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_describe_reports_config_path() {
        let config = ServerConfig {
            title: "prod".into(),
            password: "secret".into(),
            database: "dw".into(),
            path: Some(PathBuf::from("/etc/mysqldiff/prod.json")),
            ..Default::default()
        };
        let info = describe_server(&config);
        assert_eq!(info["kind"], "mysql");
        assert_eq!(info["database"], "dw");
        assert_eq!(info["path"], "/etc/mysqldiff/prod.json");
        assert!(!info.to_string().contains("secret"));
    }
}
