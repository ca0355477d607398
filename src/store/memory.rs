//! In-memory store double
//!
//! Used by tests (and anyone who wants a throwaway session) in place of the
//! file engine. The opener counts how often it is asked to open a store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{KeyValueStore, StoreHandle, StoreOpener, StoreOptions};

/// Key-value store that never touches disk
#[derive(Debug, Default)]
pub struct MemoryStore {
    options: StoreOptions,
    entries: RwLock<Map<String, Value>>,
    /// Last explicitly saved snapshot, what `reload` restores
    saved: RwLock<Map<String, Value>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Number of times the entries were persisted
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    async fn after_mutation(&self) -> Result<()> {
        if self.options.auto_save {
            self.save().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        self.after_mutation().await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let existed = self.entries.write().await.remove(key).is_some();
        if existed {
            self.after_mutation().await?;
        }
        Ok(existed)
    }

    async fn has(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        self.after_mutation().await
    }

    async fn save(&self) -> Result<()> {
        let snapshot = self.entries.read().await.clone();
        *self.saved.write().await = snapshot;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let snapshot = self.saved.read().await.clone();
        *self.entries.write().await = snapshot;
        Ok(())
    }
}

/// Opener handing out fresh [`MemoryStore`]s
#[derive(Debug, Default)]
pub struct MemoryOpener {
    opens: AtomicUsize,
    failure: Option<String>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// An opener whose every open fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            opens: AtomicUsize::new(0),
            failure: Some(message.into()),
        }
    }

    /// Number of open attempts so far, failed ones included
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreOpener for MemoryOpener {
    async fn open(&self, file_name: &str, options: StoreOptions) -> Result<StoreHandle> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        // Suspend once like real I/O would, so concurrent callers interleave
        tokio::task::yield_now().await;

        if let Some(message) = &self.failure {
            bail!("{}: {}", file_name, message);
        }
        Ok(Arc::new(MemoryStore::new(options)))
    }
}
