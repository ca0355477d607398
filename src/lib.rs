//! Editor State Store
//!
//! Persists desktop text-editor UI state across restarts in a JSON-backed
//! key-value file.
//!
//! This library provides:
//! - Tab and language data types
//! - A file-backed key-value store with auto-save
//! - One shared, lazily opened store handle
//! - Typed save/load for the editor buffer and the tab session
//! - Configuration management

pub mod cli;
pub mod config;
pub mod session;
pub mod store;
pub mod types;

// Re-exports for clean public API
pub use config::Config;
pub use session::{Session, load_app_state, load_editor_state, save_app_state, save_editor_state};
pub use store::{KeyValueStore, StoreOptions, StoreProvider};
pub use types::{AppState, EditorState, LanguageId, Tab, create_tab};
