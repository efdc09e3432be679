//! SQLite-backed note store.
//!
//! One `Database` is created at startup and shared across workers through
//! an r2d2 connection pool. Per-statement write atomicity comes from
//! SQLite itself; no locking happens at this layer.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use thiserror::Error;

pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (creating if needed) the database file and ensure the schema.
    pub fn new(database_path: &str) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let manager = SqliteConnectionManager::file(database_path);
        let pool = Pool::new(manager)?;

        let db = Self { pool };
        db.init_schema()?;

        Ok(db)
    }

    pub(crate) fn conn(&self) -> Result<DbConn, StoreError> {
        Ok(self.pool.get()?)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id         TEXT PRIMARY KEY,
                title      TEXT NOT NULL,
                content    TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}
