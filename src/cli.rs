//! `editor-state` command line
//!
//! A small front end over [`Session`] for inspecting and editing the store
//! file outside the editor.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};

use crate::config::{Config, StoreArgs};
use crate::session::{APP_KEY, EDITOR_KEY, Session};
use crate::store::StoreProvider;
use crate::types::{EditorState, LanguageId, create_tab};

/// Command-line interface of the `editor-state` binary
#[derive(Debug, Parser)]
#[command(name = "editor-state")]
#[command(about = "Inspect and edit persisted editor state")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Which persisted sections a command touches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Section {
    #[default]
    All,
    Editor,
    App,
}

impl Section {
    fn editor(self) -> bool {
        matches!(self, Section::All | Section::Editor)
    }

    fn app(self) -> bool {
        matches!(self, Section::All | Section::App)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the store file location
    Path,
    /// Print persisted state as JSON
    Show {
        #[arg(long, value_enum, default_value_t = Section::All)]
        section: Section,
    },
    /// Append a fresh tab to the session and make it active
    NewTab {
        #[arg(long, help = "Tab title (default: untitled-<n>)")]
        title: Option<String>,
        #[arg(long, help = "typescript, markdown or plaintext")]
        language: Option<LanguageId>,
        #[arg(long, help = "Initial buffer content")]
        content: Option<String>,
    },
    /// Save the single-buffer editor state
    SetEditor {
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "plaintext")]
        language: LanguageId,
    },
    /// Delete persisted state
    Clear {
        #[arg(long, value_enum, default_value_t = Section::All)]
        section: Section,
    },
}

/// What a command produced
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Text to print
    pub output: String,
    /// Whether persisted state changed
    pub modified: bool,
}

impl Outcome {
    fn print(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            modified: false,
        }
    }

    fn modified(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            modified: true,
        }
    }
}

/// Run `command` against the store `config` describes and print its output.
///
/// With auto-save off the store is flushed once, and only if the command
/// changed something.
pub async fn run_with(config: &Config, command: Command) -> Result<()> {
    log::debug!("Using store {}", config.store_path().display());

    let session = Session::new(Arc::new(StoreProvider::from_config(config)));
    let outcome = execute(&session, config, command).await?;

    if !config.auto_save && outcome.modified {
        session.flush().await?;
    }

    if !outcome.output.is_empty() {
        println!("{}", outcome.output);
    }
    Ok(())
}

/// Run one command against `session`
pub async fn execute(session: &Session, config: &Config, command: Command) -> Result<Outcome> {
    match command {
        Command::Path => Ok(Outcome::print(config.store_path().display().to_string())),
        Command::Show { section } => show(session, section).await.map(Outcome::print),
        Command::NewTab {
            title,
            language,
            content,
        } => {
            let mut state = session.load_app_state().await?.unwrap_or_default();

            let mut tab = create_tab(state.tabs.len() + 1);
            if let Some(title) = title {
                tab.title = title;
            }
            if let Some(language) = language {
                tab.language = language;
            }
            if let Some(content) = content {
                tab.content = content;
            }

            let id = tab.id.clone();
            state.active_tab_id = id.clone();
            state.tabs.push(tab);
            session.save_app_state(&state).await?;

            log::info!("Created tab {} ({} open)", id, state.tabs.len());
            Ok(Outcome::modified(id))
        }
        Command::SetEditor { content, language } => {
            session
                .save_editor_state(&EditorState { content, language })
                .await?;
            Ok(Outcome::modified(String::new()))
        }
        Command::Clear { section } => {
            let mut removed = Vec::new();
            if section.editor() && session.clear_editor_state().await? {
                removed.push(EDITOR_KEY);
            }
            if section.app() && session.clear_app_state().await? {
                removed.push(APP_KEY);
            }
            log::info!("Removed {} section(s)", removed.len());
            Ok(Outcome {
                output: removed.join("\n"),
                modified: !removed.is_empty(),
            })
        }
    }
}

async fn show(session: &Session, section: Section) -> Result<String> {
    let editor = if section.editor() {
        Some(serde_json::to_value(session.load_editor_state().await?)?)
    } else {
        None
    };
    let app = if section.app() {
        Some(serde_json::to_value(session.load_app_state().await?)?)
    } else {
        None
    };

    let value = match (editor, app) {
        (Some(editor), Some(app)) => {
            let mut map = Map::new();
            map.insert(EDITOR_KEY.to_string(), editor);
            map.insert(APP_KEY.to_string(), app);
            Value::Object(map)
        }
        (Some(single), None) | (None, Some(single)) => single,
        (None, None) => Value::Null,
    };

    Ok(serde_json::to_string_pretty(&value)?)
}
