//! Single-buffer editor state under the `editor` key.

use anyhow::Result;

use super::Session;
use crate::store::{get_as, set_as};
use crate::types::EditorState;

pub const EDITOR_KEY: &str = "editor";

impl Session {
    /// Write the editor snapshot. Durability comes from the store's auto-save.
    pub async fn save_editor_state(&self, state: &EditorState) -> Result<()> {
        let store = self.store().await?;
        set_as(&*store, EDITOR_KEY, state).await?;
        log::debug!(
            "Saved editor state ({} bytes, {})",
            state.content.len(),
            state.language
        );
        Ok(())
    }

    /// Read the editor snapshot; `None` if nothing was saved yet
    pub async fn load_editor_state(&self) -> Result<Option<EditorState>> {
        let store = self.store().await?;
        get_as(&*store, EDITOR_KEY).await
    }

    /// Remove the editor snapshot; returns whether one existed
    pub async fn clear_editor_state(&self) -> Result<bool> {
        self.store().await?.delete(EDITOR_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryOpener, STORE_FILE, StoreOptions, StoreProvider};
    use crate::types::LanguageId;
    use std::sync::Arc;

    fn memory_session() -> (Session, Arc<MemoryOpener>) {
        let opener = Arc::new(MemoryOpener::new());
        let provider = StoreProvider::new(opener.clone(), STORE_FILE, StoreOptions::default());
        (Session::new(Arc::new(provider)), opener)
    }

    #[tokio::test]
    async fn test_load_before_save_is_absent() {
        let (session, _) = memory_session();
        assert_eq!(session.load_editor_state().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (session, opener) = memory_session();
        let state = EditorState {
            content: "# Title\n\nbody".to_string(),
            language: LanguageId::Markdown,
        };

        session.save_editor_state(&state).await.unwrap();
        session.save_editor_state(&state).await.unwrap();

        assert_eq!(session.load_editor_state().await.unwrap(), Some(state));
        assert_eq!(opener.open_count(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let (session, _) = memory_session();
        assert!(!session.clear_editor_state().await.unwrap());

        session
            .save_editor_state(&EditorState::default())
            .await
            .unwrap();
        assert!(session.clear_editor_state().await.unwrap());
        assert_eq!(session.load_editor_state().await.unwrap(), None);
    }
}
