// CLI Configuration
//
// Layers (lowest to highest): built-in defaults, optional focusblox.toml,
// FOCUSBLOX_* environment variables, command-line flags.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use focusblox_infra_system::DebugLog;

pub const APP_DIR: &str = "focusblox";
pub const CONFIG_FILE_NAME: &str = "focusblox.toml";
pub const DATABASE_FILE_NAME: &str = "tasks.db";
pub const ENV_PREFIX: &str = "FOCUSBLOX";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// SQLite file, `~` is expanded
    pub database_path: String,
    /// Debug log file, `~` is expanded
    pub debug_log_path: String,
    /// `pretty` or `json`
    pub log_format: String,
    /// Days shown by `completed` when no flag is given
    pub completed_days: u32,
}

impl AppConfig {
    /// Load configuration; `file` overrides the default config file location
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("database_path", default_database_path().display().to_string())?
            .set_default("debug_log_path", DebugLog::default_path().display().to_string())?
            .set_default("log_format", "pretty")?
            .set_default("completed_days", 7)?;

        builder = match file {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => match default_config_file() {
                Some(path) => builder.add_source(config::File::from(path).required(false)),
                None => builder,
            },
        };

        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn database_file(&self) -> PathBuf {
        expand(&self.database_path)
    }

    pub fn debug_log_file(&self) -> PathBuf {
        expand(&self.debug_log_path)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// `<data dir>/focusblox/tasks.db`, falling back to the working directory
pub fn default_database_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.data_dir().join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATABASE_FILE_NAME)
}

/// `<config dir>/focusblox/focusblox.toml`
pub fn default_config_file() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR).join(CONFIG_FILE_NAME))
}
