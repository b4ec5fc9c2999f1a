//! Layered configuration: built-in defaults, then the TOML file, then
//! `CALSYNC__` environment variables.
//!
//! Example `~/.config/calsync/config.toml`:
//!
//! ```toml
//! [sync]
//! window_days = 14
//! time_zone = "Asia/Tokyo"
//!
//! [source]
//! path = "~/Calendars/outlook-export.ics"
//!
//! [google]
//! calendar_id = "primary"
//! ```

use std::path::{Path, PathBuf};

use calsync_core::{SyncConfig, SyncError, SyncResult};
use calsync_google::GoogleConfig;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Legacy variable naming the Google client secret file.
const KEY_FILE_VAR: &str = "KEY_FILE_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub source: SourceConfig,
    pub google: GoogleConfig,
}

/// Where the local calendar store lives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// A `.ics` file or a directory of them.
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            path: calsync_google::config::base_dir().join("calendar.ics"),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        calsync_google::config::base_dir().join("config.toml")
    }

    /// Load from `path` (must exist) or from the default location (optional).
    pub fn load(path: Option<&Path>) -> SyncResult<Self> {
        dotenvy::dotenv().ok();

        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        Self::from_sources(
            &path,
            required,
            environment(),
            std::env::var(KEY_FILE_VAR).ok(),
        )
    }

    fn from_sources(
        path: &Path,
        required: bool,
        env: Environment,
        key_file: Option<String>,
    ) -> SyncResult<Self> {
        let mut config: AppConfig = Config::builder()
            .add_source(File::from(path).required(required))
            .add_source(env)
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        if let Some(key_file) = key_file.filter(|k| !k.trim().is_empty()) {
            config.google.client_secret_path = PathBuf::from(key_file);
        }

        config.source.path = expand_tilde(&config.source.path);
        config.google.client_secret_path = expand_tilde(&config.google.client_secret_path);
        config.google.token_cache_path = expand_tilde(&config.google.token_cache_path);

        config.sync.validate()?;
        Ok(config)
    }
}

/// `CALSYNC__SYNC__WINDOW_DAYS=14` sets `sync.window_days`.
fn environment() -> Environment {
    Environment::with_prefix("CALSYNC")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn expand_tilde(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
