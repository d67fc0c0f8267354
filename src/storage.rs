use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;

/// Record holding the serialized history log
pub const HISTORY_KEY: &str = "quizHistory";
/// Record holding the raw quiz text the user is composing
pub const DRAFT_KEY: &str = "quizInputValue";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {limit} available")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("storage is unavailable")]
    Unavailable,
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A medium of named string records
pub trait KeyValueStore: std::fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Key-value records kept in a single SQLite table
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at the default state location, creating it if needed
    pub fn open_default() -> Result<Self, StorageError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("quizline.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!(path = %path.display(), "opening record store");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM records WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            r#"
            INSERT INTO records (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM records WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// In-process store, optionally with a byte quota to model a full medium
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
    quota: Option<usize>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes (keys plus values) the store may hold
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::default()
        }
    }

    /// Every write fails
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.records
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        if let Some(limit) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        self.records.remove(key);
        Ok(())
    }
}

/// Persist the quiz text being composed so it survives restarts
pub fn save_draft<S: KeyValueStore + ?Sized>(store: &mut S, text: &str) -> Result<(), StorageError> {
    store.set(DRAFT_KEY, text)
}

pub fn load_draft<S: KeyValueStore + ?Sized>(store: &S) -> Option<String> {
    match store.get(DRAFT_KEY) {
        Ok(draft) => draft.filter(|d| !d.trim().is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "could not read saved quiz input");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn test_sqlite_set_get_overwrite_remove() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("quizline.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set(DRAFT_KEY, "{\"quiz\":[]}").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(DRAFT_KEY).unwrap().as_deref(), Some("{\"quiz\":[]}"));
    }

    #[test]
    fn test_memory_quota() {
        let mut store = MemoryStore::with_quota(10);
        store.set("a", "123456789").unwrap();
        // Replacing a record only counts the new value
        store.set("a", "987654321").unwrap();
        assert_matches!(
            store.set("b", "x"),
            Err(StorageError::QuotaExceeded { needed: 12, limit: 10 })
        );
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn test_memory_unavailable() {
        let mut store = MemoryStore::unavailable();
        assert_matches!(store.set("a", "b"), Err(StorageError::Unavailable));
    }

    #[test]
    fn test_draft_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(load_draft(&store), None);
        save_draft(&mut store, "   ").unwrap();
        assert_eq!(load_draft(&store), None);
        save_draft(&mut store, "{\"quiz\": []}").unwrap();
        assert_eq!(load_draft(&store).as_deref(), Some("{\"quiz\": []}"));
    }
}
