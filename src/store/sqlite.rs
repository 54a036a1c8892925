//! SQLite-backed durable store.

use std::marker::PhantomData;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::DurableStore;
use crate::types::errors::BackendError;

/// Key/value table in a SQLite database. Values are stored as JSON text.
pub struct SqliteStore<V> {
    conn: Connection,
    _value: PhantomData<fn() -> V>,
}

impl<V> SqliteStore<V> {
    /// Creates or opens the database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self, BackendError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Self::with_connection(Connection::open(db_path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, BackendError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, BackendError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
        )?;

        Ok(Self {
            conn,
            _value: PhantomData,
        })
    }

    /// Number of stored keys.
    pub fn count(&self) -> Result<usize, BackendError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// All stored keys in ascending order.
    pub fn keys(&self) -> Result<Vec<String>, BackendError> {
        let mut stmt = self.conn.prepare("SELECT key FROM entries ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl<V> DurableStore<String, V> for SqliteStore<V>
where
    V: Serialize + DeserializeOwned,
{
    fn read(&self, key: &String) -> Result<Option<V>, BackendError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM entries WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn write(&mut self, key: &String, value: &V) -> Result<(), BackendError> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
            params![key, json, Utc::now().to_rfc3339()],
        )?;

        tracing::trace!(key = %key, "row upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_store() {
        let store: SqliteStore<u32> = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.read(&"missing".to_string()).unwrap(), None);
    }

    #[test]
    fn test_upsert_replaces_value() {
        let mut store: SqliteStore<Vec<u8>> = SqliteStore::open_in_memory().unwrap();
        store.write(&"k".to_string(), &vec![1, 2]).unwrap();
        store.write(&"k".to_string(), &vec![3]).unwrap();

        assert_eq!(store.read(&"k".to_string()).unwrap(), Some(vec![3]));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_keys_sorted() {
        let mut store: SqliteStore<u32> = SqliteStore::open_in_memory().unwrap();
        for (i, key) in ["b", "c", "a"].iter().enumerate() {
            store.write(&key.to_string(), &(i as u32)).unwrap();
        }
        assert_eq!(store.keys().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("data").join("store.db");

        {
            let mut store: SqliteStore<String> = SqliteStore::open(&db_path).unwrap();
            store.write(&"a".to_string(), &"1".to_string()).unwrap();
        }

        assert!(db_path.exists());
        let store: SqliteStore<String> = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.read(&"a".to_string()).unwrap(), Some("1".to_string()));
    }
}
