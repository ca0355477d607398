//! Persisted data shapes
//!
//! Tabs, languages and the two state snapshots the session layer writes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content language of a buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    TypeScript,
    Markdown,
    #[default]
    PlainText,
}

impl LanguageId {
    pub const ALL: [LanguageId; 3] = [
        LanguageId::TypeScript,
        LanguageId::Markdown,
        LanguageId::PlainText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageId::TypeScript => "typescript",
            LanguageId::Markdown => "markdown",
            LanguageId::PlainText => "plaintext",
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Unknown language '{}', expected one of: typescript, markdown, plaintext",
                    s
                )
            })
    }
}

/// One open document buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub content: String,
    pub language: LanguageId,
}

/// Mint a fresh, empty plaintext tab titled `untitled-<index>`.
///
/// The id is a random v4 UUID, so tabs created in one process never collide.
pub fn create_tab(index: usize) -> Tab {
    Tab {
        id: Uuid::new_v4().to_string(),
        title: format!("untitled-{}", index),
        content: String::new(),
        language: LanguageId::PlainText,
    }
}

/// Snapshot of the single-buffer editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    pub content: String,
    pub language: LanguageId,
}

impl From<&Tab> for EditorState {
    fn from(tab: &Tab) -> Self {
        Self {
            content: tab.content.clone(),
            language: tab.language,
        }
    }
}

/// Snapshot of the multi-tab session
///
/// `active_tab_id` should name a tab in `tabs` when non-empty. Callers own
/// that invariant; [`AppState::has_dangling_active_tab`] reports violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub tabs: Vec<Tab>,
    pub active_tab_id: String,
}

impl AppState {
    /// Look up the active tab
    pub fn active_tab(&self) -> Option<&Tab> {
        if self.active_tab_id.is_empty() {
            return None;
        }
        self.tabs.iter().find(|tab| tab.id == self.active_tab_id)
    }

    /// True when `active_tab_id` is set but matches no tab
    pub fn has_dangling_active_tab(&self) -> bool {
        !self.active_tab_id.is_empty() && self.active_tab().is_none()
    }
}
