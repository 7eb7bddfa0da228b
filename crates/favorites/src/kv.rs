//! Device key-value storage contract and backends.
//!
//! The favorites subsystem treats device storage as a flat string-to-string
//! map with atomic single-key reads and writes; it adds no locking of its
//! own. [`MemoryKv`] backs tests and in-process use; [`JsonFileKv`]
//! persists the whole map to a single JSON file and stands in for the
//! device store in the CLI.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a storage backend.
///
/// Callers above [`IdentityScopedStore`](crate::IdentityScopedStore) never
/// see these; the store converts them into fail-soft results and logs.
#[derive(Debug, Error)]
pub enum KvError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store file contents could not be serialized or parsed.
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Device key-value storage.
///
/// Used as `Arc<dyn KeyValueStore>`. Implementations must serialize their
/// own operations; single-key read/write is assumed atomic.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value at `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Write `value` at `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), KvError>;

    /// Remove every key in `keys`.
    async fn remove_many(&self, keys: &[String]) -> Result<(), KvError>;

    /// Every key currently present in the store.
    async fn list_keys(&self) -> Result<Vec<String>, KvError>;
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        self.lock().remove(key);
        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> Result<(), KvError> {
        let mut entries = self.lock();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, KvError> {
        Ok(self.lock().keys().cloned().collect())
    }
}

/// Key-value store persisted as a single JSON object in one file.
///
/// The whole map is loaded at open and rewritten on every mutation via
/// write-to-temp-then-rename, so a crash mid-write leaves the previous
/// file intact.
#[derive(Debug)]
pub struct JsonFileKv {
    path: PathBuf,
    entries: tokio::sync::Mutex<HashMap<String, String>>,
}

impl JsonFileKv {
    /// Open a store at `path`, creating an empty one if the file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Io`] if the file exists but cannot be read, or
    /// [`KvError::Serialize`] if its contents are not a JSON string map.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, KvError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(KvError::Io(e)),
        };
        Ok(Self {
            path,
            entries: tokio::sync::Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn flush(&self, entries: &HashMap<String, String>) -> Result<(), KvError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_owned(), value.to_owned());
        self.flush(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> Result<(), KvError> {
        let mut entries = self.entries.lock().await;
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(key).is_some();
        }
        if changed {
            self.flush(&entries).await?;
        }
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, KvError> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_kv_round_trip() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("a").await.unwrap(), None);

        kv.set("a", "1").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("1"));

        kv.remove("a").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_kv_remove_many_and_list() {
        let kv = MemoryKv::new();
        kv.set("a", "1").await.unwrap();
        kv.set("b", "2").await.unwrap();
        kv.set("c", "3").await.unwrap();

        kv.remove_many(&["a".to_owned(), "c".to_owned()]).await.unwrap();

        let keys = kv.list_keys().await.unwrap();
        assert_eq!(keys, vec!["b".to_owned()]);
    }

    #[tokio::test]
    async fn test_json_file_kv_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let kv = JsonFileKv::open(&path).await.unwrap();
        kv.set("favorites_u1", "[]").await.unwrap();
        drop(kv);

        let kv = JsonFileKv::open(&path).await.unwrap();
        assert_eq!(kv.get("favorites_u1").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_json_file_kv_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        assert!(matches!(
            JsonFileKv::open(&path).await,
            Err(KvError::Serialize(_))
        ));
    }

    #[tokio::test]
    async fn test_json_file_kv_remove_absent_key_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let kv = JsonFileKv::open(dir.path().join("store.json")).await.unwrap();
        kv.remove("missing").await.unwrap();
        assert!(kv.list_keys().await.unwrap().is_empty());
    }
}
