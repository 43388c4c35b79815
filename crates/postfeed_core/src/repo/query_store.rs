//! Query store contract, SQLite implementation and in-memory implementation.
//!
//! # Invariants
//! - `save` overwrites the previous value under the fixed key.
//! - SQLite writes survive process restart.

use crate::db::{open_db, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fixed key holding the last search text.
pub const SEARCH_QUERY_KEY: &str = "SEARCH_HISTORY";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// A previous holder of the in-memory slot panicked.
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "query store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Poisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Single-value store for the user's last search text.
///
/// Implementations are blocking; the screen runs writes on a background
/// writer so callers on the UI flow never wait for them.
pub trait QueryStore: Send + Sync + 'static {
    fn load(&self) -> StoreResult<Option<String>>;
    fn save(&self, value: &str) -> StoreResult<()>;
    fn clear(&self) -> StoreResult<()>;
}

/// SQLite-backed store. Opens the database file for each operation.
#[derive(Debug, Clone)]
pub struct SqliteQueryStore {
    path: PathBuf,
}

impl SqliteQueryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StoreResult<Connection> {
        Ok(open_db(&self.path)?)
    }
}

impl QueryStore for SqliteQueryStore {
    fn load(&self) -> StoreResult<Option<String>> {
        let conn = self.connect()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [SEARCH_QUERY_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, value: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![SEARCH_QUERY_KEY, value],
        )?;
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1;", [SEARCH_QUERY_KEY])?;
        Ok(())
    }
}

/// Process-local store for hosts without a writable data directory.
#[derive(Debug, Default)]
pub struct MemoryQueryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryQueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `value`.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(value.into())),
        }
    }
}

impl QueryStore for MemoryQueryStore {
    fn load(&self) -> StoreResult<Option<String>> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, value: &str) -> StoreResult<()> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}
