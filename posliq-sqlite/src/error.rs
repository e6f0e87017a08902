use thiserror::Error;

/// Database operations generate errors for multiple reasons, this is a
/// unified error type that the repository implementations return.
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the connection pool
    #[error("pool error: {0}")]
    ConnectionPool(#[from] r2d2::Error),

    /// Error from SQLite operations
    #[error("sql error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Error in JSON serialization or deserialization of payload snapshots
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Generic failure with message
    #[error("failure: {0}")]
    Failure(String),
}
