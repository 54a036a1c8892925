//! Durable store kept as a single JSON document on disk.
//!
//! Every read parses the document and every write rewrites it, which keeps
//! the format trivially inspectable at the cost of O(n) writes. Rewrites go
//! to a sibling temp file that is synced and renamed over the original, so a
//! crash mid-write leaves the previous document intact.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DurableStore;
use crate::types::errors::BackendError;

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    entries: BTreeMap<String, Record>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    value: Value,
    updated_at: DateTime<Utc>,
}

/// JSON document store with `String` keys.
#[derive(Debug)]
pub struct JsonFileStore<V> {
    path: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> JsonFileStore<V> {
    /// Opens the store at `path`, creating parent directories if needed.
    ///
    /// The file itself is created on first write; until then the store is
    /// empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                tracing::debug!(dir = %parent.display(), "created store directory");
            }
        }

        Ok(Self {
            path,
            _value: PhantomData,
        })
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored keys.
    pub fn len(&self) -> Result<usize, BackendError> {
        Ok(self.load()?.entries.len())
    }

    /// Whether the document holds no entries.
    pub fn is_empty(&self) -> Result<bool, BackendError> {
        Ok(self.len()? == 0)
    }

    fn load(&self) -> Result<Document, BackendError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Document::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, document: &Document) -> Result<(), BackendError> {
        let json = serde_json::to_string_pretty(document)?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| BackendError::unavailable("store path has no file name"))?;
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let mut file = File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

impl<V> DurableStore<String, V> for JsonFileStore<V>
where
    V: Serialize + DeserializeOwned,
{
    fn read(&self, key: &String) -> Result<Option<V>, BackendError> {
        let mut document = self.load()?;
        match document.entries.remove(key) {
            Some(record) => Ok(Some(serde_json::from_value(record.value)?)),
            None => Ok(None),
        }
    }

    fn write(&mut self, key: &String, value: &V) -> Result<(), BackendError> {
        let mut document = self.load()?;
        document.entries.insert(
            key.clone(),
            Record {
                value: serde_json::to_value(value)?,
                updated_at: Utc::now(),
            },
        );
        self.persist(&document)?;

        tracing::trace!(key = %key, path = %self.path.display(), "document rewritten");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        visits: u32,
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store: JsonFileStore<u32> = JsonFileStore::open(dir.path().join("db.json")).unwrap();

        assert_eq!(store.read(&"a".to_string()).unwrap(), None);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_write_then_read_structured_value() {
        let dir = tempdir().unwrap();
        let mut store: JsonFileStore<Profile> =
            JsonFileStore::open(dir.path().join("db.json")).unwrap();
        let profile = Profile {
            name: "ada".to_string(),
            visits: 3,
        };

        store.write(&"ada".to_string(), &profile).unwrap();
        assert_eq!(store.read(&"ada".to_string()).unwrap(), Some(profile));
    }

    #[test]
    fn test_reopen_sees_previous_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        {
            let mut store: JsonFileStore<u32> = JsonFileStore::open(&path).unwrap();
            store.write(&"a".to_string(), &1u32).unwrap();
            store.write(&"b".to_string(), &2u32).unwrap();
            store.write(&"a".to_string(), &10u32).unwrap();
        }

        let store: JsonFileStore<u32> = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.read(&"a".to_string()).unwrap(), Some(10));
        assert_eq!(store.read(&"b".to_string()).unwrap(), Some(2));
        assert_eq!(store.len().unwrap(), 2);
        assert!(!path.with_file_name("db.json.tmp").exists());
    }

    #[test]
    fn test_document_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let mut store: JsonFileStore<String> = JsonFileStore::open(&path).unwrap();
        store.write(&"k".to_string(), &"v".to_string()).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["entries"]["k"]["value"], Value::from("v"));
        assert!(raw["entries"]["k"]["updated_at"].is_string());
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{ not json").unwrap();

        let store: JsonFileStore<u32> = JsonFileStore::open(&path).unwrap();
        assert!(matches!(
            store.read(&"a".to_string()),
            Err(BackendError::Json(_))
        ));
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let mut writer: JsonFileStore<String> = JsonFileStore::open(&path).unwrap();
        writer.write(&"a".to_string(), &"text".to_string()).unwrap();

        let reader: JsonFileStore<u32> = JsonFileStore::open(&path).unwrap();
        assert!(reader.read(&"a".to_string()).is_err());
    }
}
