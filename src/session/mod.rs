//! Typed session accessors
//!
//! Both the single-buffer editor state (`editor`) and the multi-tab app
//! state (`app`) live in the same store file and go through the same
//! [`StoreProvider`], so the file is opened once per provider.
//!
//! The free functions at the bottom use the process-wide provider.

mod app;
mod editor;

use std::sync::Arc;

use anyhow::Result;

use crate::store::{StoreHandle, StoreProvider};
use crate::types::{AppState, EditorState};

pub use app::APP_KEY;
pub use editor::EDITOR_KEY;

/// Save/load front end over one store provider
#[derive(Debug, Clone)]
pub struct Session {
    provider: Arc<StoreProvider>,
}

impl Session {
    pub fn new(provider: Arc<StoreProvider>) -> Self {
        Self { provider }
    }

    /// Session bound to [`StoreProvider::global`]
    pub fn global() -> Self {
        Self::new(StoreProvider::global())
    }

    pub fn provider(&self) -> &Arc<StoreProvider> {
        &self.provider
    }

    /// Persist the store explicitly. Only needed with auto-save off.
    pub async fn flush(&self) -> Result<()> {
        self.store().await?.save().await
    }

    async fn store(&self) -> Result<StoreHandle> {
        self.provider.store().await
    }
}

pub async fn save_editor_state(state: &EditorState) -> Result<()> {
    Session::global().save_editor_state(state).await
}

pub async fn load_editor_state() -> Result<Option<EditorState>> {
    Session::global().load_editor_state().await
}

pub async fn save_app_state(state: &AppState) -> Result<()> {
    Session::global().save_app_state(state).await
}

pub async fn load_app_state() -> Result<Option<AppState>> {
    Session::global().load_app_state().await
}
