//! SQLite connection and schema management

use dirs::cache_dir;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::cache::QueryCache;
use crate::{cli::types::TableName, OutrankError, Result};

/// SQLite-backed ranking store.
///
/// One connection is shared by all writers; blocking database work runs on
/// the tokio blocking pool. Cloning is cheap and shares the connection and
/// the read cache.
#[derive(Clone)]
pub struct SqliteRankingStore {
    pub(crate) conn: Arc<Mutex<Connection>>,
    pub(crate) cache: Arc<QueryCache>,
}

impl SqliteRankingStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self::from_connection(conn))
    }

    /// Open the database at the default location.
    pub fn open_default() -> Result<Self> {
        Self::open(&Self::database_path()?)
    }

    /// Private in-memory database, used by tests and dry runs.
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            cache: Arc::new(QueryCache::default()),
        }
    }

    /// Get the path to the default database file
    pub fn database_path() -> Result<PathBuf> {
        let cache_dir = cache_dir().ok_or_else(|| OutrankError::Config {
            message: "Could not determine cache directory".to_string(),
        })?;
        Ok(cache_dir.join("outrank").join("rankings.db"))
    }

    /// Create the normalized rankings table and its secondary index.
    ///
    /// The primary key is the (team, date, statistic) identity, so a repeat
    /// write of the same triple replaces the earlier row.
    pub fn ensure_rankings_table(&self, table: &TableName) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                team TEXT NOT NULL,
                date TEXT NOT NULL,
                statistic TEXT NOT NULL,
                value INTEGER NOT NULL,
                PRIMARY KEY (team, date, statistic)
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_stat_date
             ON {table}(statistic, date DESC, team);",
            table = table.as_str()
        ))?;
        Ok(())
    }

    /// Create a legacy wide-format table. Each row holds one record's
    /// attribute map as JSON.
    pub fn ensure_legacy_table(&self, table: &TableName) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    item TEXT NOT NULL
                )",
                table.as_str()
            ),
            [],
        )?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        lock_connection(&self.conn)
    }

    /// Run `f` against the connection on the blocking pool.
    pub(crate) async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock_connection(&conn)?;
            f(&mut guard)
        })
        .await?
    }
}

fn lock_connection(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| OutrankError::Storage {
        message: "database connection lock poisoned".to_string(),
    })
}
