//! Key-value store layer
//!
//! A store is a named map of JSON values. Engines implement
//! [`KeyValueStore`]; a [`StoreOpener`] knows how to open one by file name,
//! and the [`StoreProvider`] owns the single shared handle.

pub mod file;
pub mod memory;
pub mod provider;

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use file::{JsonFileOpener, JsonFileStore};
pub use memory::{MemoryOpener, MemoryStore};
pub use provider::{STORE_FILE, StoreProvider};

/// Options recognized when opening a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOptions {
    /// Flush to disk after every mutation
    pub auto_save: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { auto_save: true }
    }
}

/// Shared handle to an opened store
pub type StoreHandle = Arc<dyn KeyValueStore>;

/// A named, persistent map of JSON values
#[async_trait]
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Read a value. Absent keys are `None`, never an error.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Insert or replace a value
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove a key; returns whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn has(&self, key: &str) -> bool;

    async fn keys(&self) -> Vec<String>;

    /// Remove every key
    async fn clear(&self) -> Result<()>;

    /// Persist the current entries
    async fn save(&self) -> Result<()>;

    /// Replace in-memory entries with the persisted ones
    async fn reload(&self) -> Result<()>;
}

/// Opens stores by file name
#[async_trait]
pub trait StoreOpener: Send + Sync {
    async fn open(&self, file_name: &str, options: StoreOptions) -> Result<StoreHandle>;
}

#[async_trait]
impl<O: StoreOpener + ?Sized> StoreOpener for Arc<O> {
    async fn open(&self, file_name: &str, options: StoreOptions) -> Result<StoreHandle> {
        (**self).open(file_name, options).await
    }
}

/// Read `key` and decode it as `T`.
///
/// A missing key or a stored JSON `null` yields `Ok(None)`. A value of the
/// wrong shape is an error naming the key.
pub async fn get_as<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .with_context(|| format!("Failed to decode stored value for key '{}'", key)),
    }
}

/// Encode `value` and write it under `key`
pub async fn set_as<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let value = serde_json::to_value(value)
        .with_context(|| format!("Failed to encode value for key '{}'", key))?;
    store.set(key, value).await
}
