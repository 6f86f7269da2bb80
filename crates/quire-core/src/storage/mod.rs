//! Recents database
//!
//! One SQLite file in the data directory holds the recent documents list,
//! their bookmark tokens and cached metadata. Schema changes are applied on
//! open by [`run_migrations`].

mod migrations;
mod queries;

pub use migrations::run_migrations;
pub use queries::*;

use crate::error::{Error, Result, StorageError};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the database inside the data directory
pub const DB_FILE_NAME: &str = "quire.db";

/// Pooled SQLite connections
pub type DbPool = Pool<SqliteConnectionManager>;

/// Handle to the recents database
pub struct Storage {
    pool: DbPool,
    db_path: PathBuf,
}

impl Storage {
    /// Open `quire.db` under `data_dir`, creating the directory on first run
    pub fn new_with_path(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(|e| {
            Error::Storage(StorageError::Database(format!(
                "cannot create data directory {:?}: {}",
                data_dir, e
            )))
        })?;

        Self::from_path(data_dir.join(DB_FILE_NAME))
    }

    /// Open the database file at `db_path`
    pub fn from_path(db_path: PathBuf) -> Result<Self> {
        info!("Opening recents database at {:?}", db_path);
        let pool = build_pool(SqliteConnectionManager::file(&db_path), 10)?;
        Self::migrated(pool, db_path)
    }

    /// Private database that lives as long as the handle.
    ///
    /// The pool holds a single connection; every SQLite memory connection
    /// would otherwise see its own empty database.
    pub fn in_memory() -> Result<Self> {
        let pool = build_pool(SqliteConnectionManager::memory(), 1)?;
        Self::migrated(pool, PathBuf::from(":memory:"))
    }

    fn migrated(pool: DbPool, db_path: PathBuf) -> Result<Self> {
        run_migrations(&*pool.get()?)?;
        debug!("Schema up to date for {:?}", db_path);
        Ok(Self { pool, db_path })
    }

    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| Error::Storage(StorageError::Pool(e.to_string())))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn build_pool(manager: SqliteConnectionManager, max_size: u32) -> Result<DbPool> {
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| Error::Storage(StorageError::Pool(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_storage() {
        let storage = Storage::in_memory().unwrap();
        assert!(storage.connection().is_ok());
        assert_eq!(storage.db_path(), Path::new(":memory:"));
    }

    #[test]
    fn test_storage_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new_with_path(dir.path().join("data")).unwrap();

        assert!(storage.db_path().ends_with(DB_FILE_NAME));
        assert!(storage.db_path().exists());

        // Reopening runs migrations again without error
        let reopened = Storage::from_path(storage.db_path().to_path_buf()).unwrap();
        let conn = reopened.connection().unwrap();
        assert!(list_recent_documents(&conn, 10).unwrap().is_empty());
    }

    #[test]
    fn test_data_dir_that_is_a_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"").unwrap();

        let err = Storage::new_with_path(&blocker).err().unwrap();
        assert!(matches!(err, Error::Storage(StorageError::Database(_))), "{err:?}");
    }
}
