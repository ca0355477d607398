//! Shared store handle
//!
//! One provider owns the handle for one store file. The first call to
//! [`StoreProvider::store`] opens it; every later call gets the same `Arc`.
//! The open itself is memoized, so callers racing on first use all await a
//! single open instead of each opening the file.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use anyhow::{Context, Result, anyhow};
use tokio::sync::OnceCell;

use super::{JsonFileOpener, StoreHandle, StoreOpener, StoreOptions};
use crate::config::Config;

/// Default store file name
pub const STORE_FILE: &str = "editor-state.json";

static GLOBAL: OnceLock<Arc<StoreProvider>> = OnceLock::new();

/// Lazily opened, memoized store handle
pub struct StoreProvider {
    file_name: String,
    options: StoreOptions,
    opener: Box<dyn StoreOpener>,
    /// Swapped out wholesale by `reset`; in-flight opens finish on the old cell
    handle: Mutex<Arc<OnceCell<StoreHandle>>>,
}

impl fmt::Debug for StoreProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreProvider")
            .field("file_name", &self.file_name)
            .field("options", &self.options)
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl StoreProvider {
    pub fn new<O: StoreOpener + 'static>(
        opener: O,
        file_name: impl Into<String>,
        options: StoreOptions,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            options,
            opener: Box::new(opener),
            handle: Mutex::new(Arc::new(OnceCell::new())),
        }
    }

    /// Provider for the JSON file engine described by `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            JsonFileOpener::new(config.store_dir.clone()),
            config.store_file.clone(),
            config.store_options(),
        )
    }

    /// The process-wide provider, created from the default configuration on
    /// first use unless [`StoreProvider::install_global`] ran earlier.
    pub fn global() -> Arc<StoreProvider> {
        GLOBAL
            .get_or_init(|| Arc::new(StoreProvider::from_config(&Config::default())))
            .clone()
    }

    /// Install the process-wide provider. Fails if one is already in place,
    /// including the default one created by an earlier [`StoreProvider::global`].
    pub fn install_global(provider: StoreProvider) -> Result<Arc<StoreProvider>> {
        let provider = Arc::new(provider);
        GLOBAL
            .set(provider.clone())
            .map_err(|_| anyhow!("A global store provider is already installed"))?;
        Ok(provider)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Whether a handle is currently cached
    pub fn is_ready(&self) -> bool {
        self.current_cell().initialized()
    }

    /// Get the shared handle, opening the store on first use.
    ///
    /// Open failures propagate and leave the provider uninitialized; the
    /// next call tries again.
    pub async fn store(&self) -> Result<StoreHandle> {
        let cell = self.current_cell();
        let handle = cell
            .get_or_try_init(|| async {
                log::debug!(
                    "Opening store {} (auto_save={})",
                    self.file_name,
                    self.options.auto_save
                );
                self.opener
                    .open(&self.file_name, self.options)
                    .await
                    .with_context(|| format!("Failed to open store '{}'", self.file_name))
            })
            .await?;
        Ok(handle.clone())
    }

    /// Drop the cached handle so the next [`StoreProvider::store`] reopens.
    /// Returns the handle that was cached, if any.
    pub fn reset(&self) -> Option<StoreHandle> {
        let mut slot = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *slot, Arc::new(OnceCell::new()));
        previous.get().cloned()
    }

    fn current_cell(&self) -> Arc<OnceCell<StoreHandle>> {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryOpener};
    use serde_json::json;

    fn provider_with(opener: &Arc<MemoryOpener>) -> StoreProvider {
        StoreProvider::new(opener.clone(), STORE_FILE, StoreOptions::default())
    }

    #[tokio::test]
    async fn test_store_is_memoized() {
        let opener = Arc::new(MemoryOpener::new());
        let provider = provider_with(&opener);
        assert!(!provider.is_ready());

        let first = provider.store().await.unwrap();
        let second = provider.store().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(provider.is_ready());
        assert_eq!(opener.open_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_opens_once() {
        let opener = Arc::new(MemoryOpener::new());
        let provider = provider_with(&opener);

        let (a, b, c) = tokio::join!(provider.store(), provider.store(), provider.store());
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
        assert_eq!(opener.open_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_forces_reopen() {
        let opener = Arc::new(MemoryOpener::new());
        let provider = provider_with(&opener);

        let first = provider.store().await.unwrap();
        first.set("editor", json!({})).await.unwrap();

        let dropped = provider.reset().expect("cached handle");
        assert!(Arc::ptr_eq(&first, &dropped));
        assert!(!provider.is_ready());

        let second = provider.store().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.get("editor").await.is_none());
        assert_eq!(opener.open_count(), 2);

        // reset on an empty provider is a no-op
        provider.reset();
        assert!(provider.reset().is_none());
    }

    #[tokio::test]
    async fn test_open_failure_propagates_and_is_not_cached() {
        let opener = Arc::new(MemoryOpener::failing("permission denied"));
        let provider = StoreProvider::new(opener.clone(), STORE_FILE, StoreOptions::default());

        let err = provider.store().await.unwrap_err();
        assert!(format!("{:#}", err).contains("permission denied"));
        assert!(err.to_string().contains(STORE_FILE));
        assert!(!provider.is_ready());

        assert!(provider.store().await.is_err());
        assert_eq!(opener.open_count(), 2);
    }

    #[test]
    fn test_from_config_uses_configured_names() {
        let config = Config {
            store_file: "custom.json".to_string(),
            auto_save: false,
            ..Config::default()
        };
        let provider = StoreProvider::from_config(&config);
        assert_eq!(provider.file_name(), "custom.json");
        assert!(!provider.options().auto_save);
    }
}
