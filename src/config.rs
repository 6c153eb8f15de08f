//! Configuration for the two compared databases.
//!
//! Each side is described by its own file: a MySQL server definition in JSON
//! (or TOML when the file ends in `.toml`), or a `snapshot:<path>` reference to
//! a schema captured with `mysqldiff dump`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DiffError, DiffResult};

/// Prefix marking a side as a snapshot file rather than a server config.
pub const SNAPSHOT_PREFIX: &str = "snapshot:";

/// Connection settings for one MySQL server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, alias = "Title")]
    pub title: String,

    #[serde(alias = "Host")]
    pub host: String,

    #[serde(default = "default_port", alias = "Port")]
    pub port: u16,

    #[serde(alias = "User")]
    pub user: String,

    #[serde(default, alias = "Password", skip_serializing)]
    pub password: String,

    /// Schema whose tables are compared.
    #[serde(alias = "DataBase", alias = "Database")]
    pub database: String,

    /// File this definition was loaded from.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

fn default_port() -> u16 {
    3306
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            host: "127.0.0.1".to_string(),
            port: default_port(),
            user: "root".to_string(),
            password: String::new(),
            database: String::new(),
            path: None,
        }
    }
}

impl ServerConfig {
    /// Load a server definition from a JSON or TOML file.
    pub fn load(path: impl AsRef<Path>) -> DiffResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DiffError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let mut config = Self::parse(&content, is_toml(path))?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(content: &str, toml: bool) -> DiffResult<Self> {
        let config: Self = if toml {
            toml::from_str(content)?
        } else {
            serde_json::from_str(content.trim())?
        };
        if config.database.is_empty() {
            return Err(DiffError::Config("database must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Title if set, otherwise `host:port/database`.
    pub fn label(&self) -> String {
        if self.title.is_empty() {
            format!("{}:{}/{}", self.host, self.port, self.database)
        } else {
            self.title.clone()
        }
    }
}

/// What one side of the comparison reads from.
#[derive(Debug, Clone)]
pub enum SideConfig {
    Server(ServerConfig),
    Snapshot(PathBuf),
}

impl SideConfig {
    /// Resolve a `--left`/`--right` argument.
    pub fn from_arg(arg: &str) -> DiffResult<Self> {
        if let Some(path) = arg.strip_prefix(SNAPSHOT_PREFIX) {
            return Ok(Self::Snapshot(resolve_path(path)?));
        }
        Ok(Self::Server(ServerConfig::load(resolve_path(arg)?)?))
    }
}

/// Find a config file: as given, else under the user config dir.
pub fn resolve_path(path: &str) -> DiffResult<PathBuf> {
    let direct = PathBuf::from(path);
    if direct.exists() || direct.is_absolute() {
        return Ok(direct);
    }
    if let Some(dir) = dirs::config_dir() {
        let fallback = dir.join("mysqldiff").join(path);
        if fallback.exists() {
            tracing::debug!("Using config from {}", fallback.display());
            return Ok(fallback);
        }
    }
    Err(DiffError::Config(format!("Config file not found: {}", path)))
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}
