//! Configuration management for the editor state store.
//!
//! Handles:
//! - Command-line arguments for the store location
//! - The `EDITOR_STATE_DIR` environment override
//! - An optional TOML config file
//!
//! Precedence is command line, then environment, then file, then defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::store::{STORE_FILE, StoreOptions};

/// Environment variable overriding the store directory
pub const STORE_DIR_ENV: &str = "EDITOR_STATE_DIR";

const APP_DIR: &str = "editor-state";

/// Store-related command-line arguments
#[derive(Debug, Default, clap::Args)]
pub struct StoreArgs {
    /// Directory holding the store file
    #[arg(long, help = "Directory holding the store file")]
    pub store_dir: Option<PathBuf>,

    /// Store file name inside the store directory
    #[arg(long, help = "Store file name (default: editor-state.json)")]
    pub store_file: Option<String>,

    /// Turn off write-through persistence
    #[arg(long, help = "Disable auto-save; changes are flushed once at exit")]
    pub no_auto_save: bool,

    /// Explicit config file
    #[arg(long, help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Settings read from the TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub store_dir: Option<PathBuf>,
    pub store_file: Option<String>,
    pub auto_save: Option<bool>,
}

impl FileConfig {
    /// Load and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the store file lives in
    pub store_dir: PathBuf,
    /// Store file name
    pub store_file: String,
    /// Flush every mutation to disk
    pub auto_save: bool,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            store_file: STORE_FILE.to_string(),
            auto_save: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create configuration from command-line arguments and the environment
    pub fn from_args(args: StoreArgs) -> Result<Self> {
        let env_dir = std::env::var_os(STORE_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);
        Self::resolve_with(args, env_dir, default_config_path())
    }

    /// Merge explicit arguments with an environment directory and the config
    /// file consulted when `--config` is absent (useful for testing)
    pub fn resolve_with(
        args: StoreArgs,
        env_dir: Option<PathBuf>,
        default_config: Option<PathBuf>,
    ) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => match default_config.filter(|path| path.is_file()) {
                Some(path) => {
                    log::debug!("Using config file {}", path.display());
                    FileConfig::load(&path)?
                }
                None => FileConfig::default(),
            },
        };

        let defaults = Config::default();

        let store_dir = args
            .store_dir
            .or(env_dir)
            .or(file.store_dir)
            .unwrap_or(defaults.store_dir);

        let store_file = args
            .store_file
            .or(file.store_file)
            .unwrap_or(defaults.store_file);

        let auto_save = if args.no_auto_save {
            false
        } else {
            file.auto_save.unwrap_or(defaults.auto_save)
        };

        Ok(Config {
            store_dir,
            store_file,
            auto_save,
            log_level: args.log_level,
        })
    }

    /// Full path of the store file
    pub fn store_path(&self) -> PathBuf {
        self.store_dir.join(&self.store_file)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            auto_save: self.auto_save,
        }
    }
}

/// `<data dir>/editor-state`, or the working directory when the platform has none
pub fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `<config dir>/editor-state/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}
