//! Global calsync configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{CalSyncError, CalSyncResult};

static DEFAULT_SERVER_URL: &str = "http://localhost:3000";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SYNC_DAYS: i64 = 30;

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_sync_days() -> i64 {
    DEFAULT_SYNC_DAYS
}

/// Configuration at ~/.config/calsync/config.toml, overridden by `CALSYNC_*` variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CalSyncConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    pub access_token: Option<String>,

    /// Where the event cache is kept. Defaults to the platform data directory.
    pub cache_path: Option<PathBuf>,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Days either side of today covered when no range is given.
    #[serde(default = "default_sync_days")]
    pub sync_days: i64,
}

impl CalSyncConfig {
    /// Load from the default location, writing a commented default file on first use.
    pub fn load() -> CalSyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path, Environment::with_prefix("CALSYNC"))
    }

    /// Load from `path` overlaid by `env`. A missing file is treated as empty.
    pub fn load_from(path: &Path, env: Environment) -> CalSyncResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSyncError::Config(e.to_string()))
    }

    pub fn config_path() -> CalSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalSyncError::Config("Could not determine config directory".into()))?
            .join("calsync");

        Ok(config_dir.join("config.toml"))
    }

    pub fn cache_path(&self) -> CalSyncResult<PathBuf> {
        match &self.cache_path {
            Some(path) => Ok(PathBuf::from(
                shellexpand::tilde(&path.to_string_lossy()).into_owned(),
            )),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| CalSyncError::Config("Could not determine data directory".into()))?
                .join("calsync")
                .join("events.json")),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalSyncResult<()> {
        let contents = format!(
            "\
# calsync configuration

# Calendar server:
# server_url = \"{}\"

# Bearer token sent with every request:
# access_token = \"...\"

# Where cached events are stored:
# cache_path = \"~/.local/share/calsync/events.json\"

# Seconds to wait for the server before serving cached events:
# fetch_timeout_secs = {}

# Days either side of today shown by `calsync events`:
# sync_days = {}
",
            DEFAULT_SERVER_URL, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_SYNC_DAYS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
