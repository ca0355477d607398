//! Multi-tab session state under the `app` key.

use anyhow::Result;

use super::Session;
use crate::store::{get_as, set_as};
use crate::types::AppState;

pub const APP_KEY: &str = "app";

impl Session {
    /// Write the tab list and active tab id.
    ///
    /// A non-empty active id that matches no tab is saved as is, with a warning.
    pub async fn save_app_state(&self, state: &AppState) -> Result<()> {
        if state.has_dangling_active_tab() {
            log::warn!(
                "Saving app state whose active tab '{}' is not among its {} tabs",
                state.active_tab_id,
                state.tabs.len()
            );
        }

        let store = self.store().await?;
        set_as(&*store, APP_KEY, state).await?;
        log::debug!("Saved app state ({} tabs)", state.tabs.len());
        Ok(())
    }

    /// Read the tab session; `None` if nothing was saved yet
    pub async fn load_app_state(&self) -> Result<Option<AppState>> {
        let store = self.store().await?;
        get_as(&*store, APP_KEY).await
    }

    /// Remove the tab session; returns whether one existed
    pub async fn clear_app_state(&self) -> Result<bool> {
        self.store().await?.delete(APP_KEY).await
    }
}
