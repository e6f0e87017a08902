#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub mod config;
mod error;
mod impls;
mod types;

mod cache;
use cache::PreviewCache;

pub use error::Error;

use config::SqliteConfig;

const SCHEMA: &str = include_str!("../schema/init.sql");

/// Where the database lives.
pub enum Storage {
    /// Store data in a file at the specified path
    File(PathBuf),

    /// Store data in memory with the given identifier
    Memory(String),
}

/// Main database connection manager.
///
/// Sqlite does not have parallel writes, so we create two separate
/// connection pools. The reader has unlimited connections, while the writer
/// is capped to one. Every generator and ledger write goes through the
/// writer inside an explicit transaction, which serializes concurrent
/// generation attempts for the same store-period while reads stay
/// concurrent under WAL.
#[derive(Clone)]
pub struct Db {
    /// Connection pool for read operations
    pub reader: Pool<SqliteConnectionManager>,
    /// Connection pool for write operations (capped to one connection)
    pub writer: Pool<SqliteConnectionManager>,
    previews: Arc<PreviewCache>,
}

impl Db {
    /// Opens a database with the specified configuration.
    ///
    /// Creates a new database if one doesn't exist (when `create_if_missing`
    /// is set) and applies the schema on first open, stamped through
    /// `PRAGMA user_version`.
    pub fn open(config: &SqliteConfig) -> Result<Self, Error> {
        let storage = config
            .database_path
            .as_ref()
            .map(|path| Storage::File(path.clone()))
            .unwrap_or_else(|| Storage::Memory(format!("posliq-{}", uuid::Uuid::new_v4())));

        // Writer first: it creates the file and applies the schema before
        // any read-only connection is opened.
        let writer = pool(&storage, Some(1), false, config.create_if_missing)?;
        {
            let mut conn = writer.get()?;
            bootstrap(&mut conn)?;
        }
        let reader = pool(&storage, None, true, false)?;

        Ok(Self {
            reader,
            writer,
            previews: Arc::new(PreviewCache::new(Duration::from_secs(
                config.preview_ttl_secs,
            ))),
        })
    }

    /// Obtains a connection from the pool.
    pub fn connect(
        &self,
        write: bool,
    ) -> Result<PooledConnection<SqliteConnectionManager>, Error> {
        let conn = if write {
            self.writer.get()
        } else {
            self.reader.get()
        };
        Ok(conn?)
    }

    pub(crate) fn previews(&self) -> &PreviewCache {
        &self.previews
    }
}

impl posliq_core::ports::Repository for Db {
    type Error = Error;
}

impl posliq_core::ports::PayoutRepository for Db {}

/// Constructs one connection pool.
fn pool(
    storage: &Storage,
    max_size: Option<u32>,
    readonly: bool,
    create_if_missing: bool,
) -> Result<Pool<SqliteConnectionManager>, Error> {
    let mut flags = OpenFlags::default();
    if readonly {
        flags.set(OpenFlags::SQLITE_OPEN_READ_WRITE, false);
        flags.set(OpenFlags::SQLITE_OPEN_READ_ONLY, true);
    }
    if readonly || !create_if_missing {
        flags.set(OpenFlags::SQLITE_OPEN_CREATE, false);
    }

    let manager = match storage {
        Storage::File(path) => SqliteConnectionManager::file(path),
        Storage::Memory(name) => {
            // a named memdb is shared between both pools, unlike `:memory:`
            SqliteConnectionManager::file(format!("file:/{name}?vfs=memdb"))
        }
    }
    .with_flags(flags)
    .with_init(|c| {
        c.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = true;
            PRAGMA mmap_size = 134217728;
            PRAGMA journal_size_limit = 27103364;
            PRAGMA cache_size = 2000;
            "#,
        )
    });

    let pool = if let Some(n) = max_size {
        r2d2::Pool::builder().max_size(n)
    } else {
        r2d2::Pool::builder()
    }
    .build(manager)?;

    Ok(pool)
}

/// Applies the schema on a fresh database.
fn bootstrap(conn: &mut rusqlite::Connection) -> Result<(), Error> {
    let version: i64 = conn.query_row("PRAGMA user_version", (), |row| row.get(0))?;
    if version == 0 {
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch("PRAGMA user_version = 1")?;
    }
    Ok(())
}
