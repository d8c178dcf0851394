//! Database Connection and Setup
//!
//! Manages the SQLite connection backing the key-value store, and its
//! migrations.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::traits::{KeyValueStore, StorageError, StorageResult};

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: Arc<Mutex<Option<Connection>>>,
    pub db_path: PathBuf,
}

impl DbState {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            db_path,
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Drop the connection; later calls fail with `NotInitialized`
    pub async fn close(&self) {
        self.conn.lock().await.take();
    }
}

/// Open (or create) the database at `db_path` and run migrations.
/// `":memory:"` gives a private in-memory database.
pub async fn init_db(db_path: &Path) -> StorageResult<DbState> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = if db_path == Path::new(":memory:") {
        Connection::open_in_memory()?
    } else {
        Connection::open(db_path)?
    };

    run_migrations(&conn)?;

    let state = DbState::new(db_path.to_path_buf());
    *state.conn.lock().await = Some(conn);
    tracing::debug!(path = %db_path.display(), "database initialized");
    Ok(state)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(names) = stmt.query_map([], |row| row.get::<_, String>(1)) else {
        return false;
    };
    let exists = names.flatten().any(|name| name == column);
    exists
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    if !column_exists(conn, "kv_store", "updated_at") {
        conn.execute(
            "ALTER TABLE kv_store ADD COLUMN updated_at INTEGER NOT NULL DEFAULT 0",
            [],
        )?;
    }

    Ok(())
}

/// SQLite implementation of the key-value store
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    pub fn new(db_state: &DbState) -> Self {
        Self {
            conn: db_state.conn.clone(),
        }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(StorageError::NotInitialized)?;

        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(StorageError::NotInitialized)?;

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(StorageError::NotInitialized)?;

        conn.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(StorageError::NotInitialized)?;

        // Range scan on the primary key index
        let keys = match prefix_upper_bound(prefix) {
            Some(upper) => {
                let mut stmt = conn.prepare("SELECT key FROM kv_store WHERE key >= ?1 AND key < ?2 ORDER BY key")?;
                let rows = stmt.query_map(params![prefix, upper], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare("SELECT key FROM kv_store WHERE key >= ?1 ORDER BY key")?;
                let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(keys)
    }
}

/// Smallest string greater than every string starting with `prefix`, or
/// `None` when no such bound exists (empty prefix, or all chars at `char::MAX`)
fn prefix_upper_bound(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        let next = (last as u32 + 1..=char::MAX as u32).find_map(char::from_u32);
        if let Some(next) = next {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}
