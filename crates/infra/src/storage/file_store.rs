//! JSON-file key-value store
//!
//! The whole store is a single JSON object. Every write rewrites the file
//! through a sibling temp file and a rename, so a crash leaves either the old
//! or the new contents on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use userdesk_core::KeyValueStore;
use userdesk_domain::{Result, UserDeskError};

type Entries = BTreeMap<String, String>;

/// Durable [`KeyValueStore`] persisted to one file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    // Single writer; also orders read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => {
                return Err(UserDeskError::Storage(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&contents).map_err(|err| {
            UserDeskError::Storage(format!("corrupt store file {}: {err}", self.path.display()))
        })
    }

    async fn write_entries(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                UserDeskError::Storage(format!("failed to create {}: {err}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|err| UserDeskError::Internal(format!("failed to encode store: {err}")))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await.map_err(|err| {
            UserDeskError::Storage(format!("failed to write {}: {err}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|err| {
            UserDeskError::Storage(format!("failed to replace {}: {err}", self.path.display()))
        })
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_entries().await?.remove(key))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await?;
        debug!("entry written");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries).await?;
        debug!("entry removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;

    fn store_in(dir: &TempDir) -> FileKeyValueStore {
        FileKeyValueStore::new(dir.path().join("nested").join("store.json"))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.get("simpleAuthUser").await.unwrap(), None);
        store.remove("simpleAuthUser").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_values_survive_a_new_instance() {
        let dir = TempDir::new().unwrap();
        store_in(&dir).set("simpleAuthUser", "admin").await.unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.get("simpleAuthUser").await.unwrap().as_deref(), Some("admin"));

        reopened.remove("simpleAuthUser").await.unwrap();
        assert_eq!(store_in(&dir).get("simpleAuthUser").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        let err = store.get("any").await.unwrap_err();
        assert!(matches!(err, UserDeskError::Storage(_)));
    }

    #[tokio::test]
    async fn test_concurrent_writers_keep_every_key() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set(&format!("key{i}"), "v").await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        for i in 0..8 {
            assert!(store.get(&format!("key{i}")).await.unwrap().is_some());
        }
    }
}
