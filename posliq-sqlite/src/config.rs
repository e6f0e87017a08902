//! Configuration types for the SQLite database connection.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for SQLite database connections.
///
/// # Examples
///
/// ```
/// use posliq_sqlite::config::SqliteConfig;
/// use std::path::PathBuf;
///
/// // In-memory database (default)
/// let config = SqliteConfig::default();
///
/// // File-based database
/// let config = SqliteConfig {
///     database_path: Some(PathBuf::from("posliq.db")),
///     ..SqliteConfig::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    /// Database file path. If None, uses a private in-memory database
    pub database_path: Option<PathBuf>,

    /// Whether to create the database if it doesn't exist
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    /// How long a cached crossing preview stays valid, in seconds.
    /// Invalidation after a write is explicit and does not wait for this.
    #[serde(default = "default_preview_ttl")]
    pub preview_ttl_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_preview_ttl() -> u64 {
    30
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            create_if_missing: true,
            preview_ttl_secs: default_preview_ttl(),
        }
    }
}
