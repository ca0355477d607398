//! JSON file store engine
//!
//! Keeps the whole map in memory and writes it to a single pretty-printed
//! JSON object file. With auto-save on, every mutation is written through.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

use super::{KeyValueStore, StoreHandle, StoreOpener, StoreOptions};

/// File-backed key-value store
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    options: StoreOptions,
    entries: RwLock<Map<String, Value>>,
    /// Serializes writes so the file always ends with the newest snapshot
    flush: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; the file
    /// is only created by the first save.
    pub async fn open<P: Into<PathBuf>>(path: P, options: StoreOptions) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path).await?;
        log::debug!(
            "Opened store {} ({} keys, auto_save={})",
            path.display(),
            entries.len(),
            options.auto_save
        );

        Ok(Self {
            path,
            options,
            entries: RwLock::new(entries),
            flush: Mutex::new(()),
        })
    }

    async fn after_mutation(&self) -> Result<()> {
        if self.options.auto_save {
            self.save().await
        } else {
            Ok(())
        }
    }

    /// Undo a mutation whose write-through failed
    async fn restore_entry(&self, key: &str, previous: Option<Value>) {
        let mut entries = self.entries.write().await;
        match previous {
            Some(value) => {
                entries.insert(key.to_string(), value);
            }
            None => {
                entries.remove(key);
            }
        }
        log::debug!("Rolled back '{}' in {} after failed write", key, self.path.display());
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let previous = self.entries.write().await.insert(key.to_string(), value);
        if let Err(e) = self.after_mutation().await {
            self.restore_entry(key, previous).await;
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.entries.write().await.remove(key);
        if removed.is_none() {
            return Ok(false);
        }
        if let Err(e) = self.after_mutation().await {
            self.restore_entry(key, removed).await;
            return Err(e);
        }
        Ok(true)
    }

    async fn has(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    async fn clear(&self) -> Result<()> {
        let previous = std::mem::take(&mut *self.entries.write().await);
        if let Err(e) = self.after_mutation().await {
            *self.entries.write().await = previous;
            return Err(e);
        }
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let _guard = self.flush.lock().await;

        let data = {
            let entries = self.entries.read().await;
            serde_json::to_vec_pretty(&*entries).context("Failed to serialize store entries")?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        fs::write(&self.path, data)
            .await
            .with_context(|| format!("Failed to write store file: {}", self.path.display()))?;

        log::debug!("Saved store {}", self.path.display());
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let fresh = read_entries(&self.path).await?;
        *self.entries.write().await = fresh;
        log::debug!("Reloaded store {}", self.path.display());
        Ok(())
    }
}

/// Read the store file, treating a missing or blank file as empty
async fn read_entries(path: &Path) -> Result<Map<String, Value>> {
    match fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Map::new()),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse store file: {}", path.display())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to read store file: {}", path.display())),
    }
}

/// Opens [`JsonFileStore`]s relative to a base directory
#[derive(Debug, Clone)]
pub struct JsonFileOpener {
    dir: PathBuf,
}

impl JsonFileOpener {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Where a store named `file_name` lives
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

#[async_trait]
impl StoreOpener for JsonFileOpener {
    async fn open(&self, file_name: &str, options: StoreOptions) -> Result<StoreHandle> {
        let store = JsonFileStore::open(self.resolve(file_name), options).await?;
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn auto_save() -> StoreOptions {
        StoreOptions { auto_save: true }
    }

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::open(&path, auto_save()).await.unwrap();
        assert!(store.keys().await.is_empty());
        assert!(store.get("editor").await.is_none());
        // opening alone does not create the file
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_set_writes_through_and_reopens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = JsonFileStore::open(&path, auto_save()).await.unwrap();
        store.set("editor", json!({ "content": "hi" })).await.unwrap();
        store.set("app", json!({ "tabs": [] })).await.unwrap();
        assert!(path.exists());

        let reopened = JsonFileStore::open(&path, auto_save()).await.unwrap();
        assert_eq!(reopened.get("editor").await, Some(json!({ "content": "hi" })));
        assert!(reopened.has("app").await);

        let mut keys = reopened.keys().await;
        keys.sort();
        assert_eq!(keys, vec!["app".to_string(), "editor".to_string()]);
    }

    #[tokio::test]
    async fn test_without_auto_save_waits_for_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::open(&path, StoreOptions { auto_save: false })
            .await
            .unwrap();
        store.set("editor", json!(1)).await.unwrap();
        assert!(!path.exists());

        store.save().await.unwrap();
        let reopened = JsonFileStore::open(&path, auto_save()).await.unwrap();
        assert_eq!(reopened.get("editor").await, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::open(&path, auto_save()).await.unwrap();
        store.set("a", json!("x")).await.unwrap();
        store.set("b", json!("y")).await.unwrap();

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());

        let reopened = JsonFileStore::open(&path, auto_save()).await.unwrap();
        assert_eq!(reopened.keys().await, vec!["b".to_string()]);

        store.clear().await.unwrap();
        reopened.reload().await.unwrap();
        assert!(reopened.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::open(&path, auto_save()).await.unwrap();
        store.set("editor", json!({ "content": "kept" })).await.unwrap();
        store.set("app", json!({ "tabs": [] })).await.unwrap();

        // a directory in place of the file makes every write fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.set("editor", json!({ "content": "lost" })).await.is_err());
        assert_eq!(store.get("editor").await, Some(json!({ "content": "kept" })));

        assert!(store.set("new", json!(1)).await.is_err());
        assert!(!store.has("new").await);

        assert!(store.delete("app").await.is_err());
        assert!(store.has("app").await);

        assert!(store.clear().await.is_err());
        assert_eq!(store.keys().await.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "  \n").unwrap();

        let store = JsonFileStore::open(&path, auto_save()).await.unwrap();
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::open(&path, auto_save()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse store file"));
    }

    #[tokio::test]
    async fn test_opener_resolves_relative_to_dir() {
        let dir = TempDir::new().unwrap();
        let opener = JsonFileOpener::new(dir.path());

        let handle = opener.open("editor-state.json", auto_save()).await.unwrap();
        handle.set("editor", json!({})).await.unwrap();
        assert!(dir.path().join("editor-state.json").exists());
    }
}
