use std::path::{Path, PathBuf};

use home_config::HomeConfig;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::libs::constants::{DATABASE_FILE_NAME, FALLBACK_FILE_NAME, STATS_RESET_INTERVAL_DAYS};
use crate::libs::error::AnyResult;

const APP_NAME: &str = "reddens";
const CONFIG_FILE_NAME: &str = "config.toml";

/**
 * Store configuration, read from ~/.config/reddens/config.toml when present
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the database and the fallback file
    pub storage_dir: Option<PathBuf>,
    pub database_file: String,
    pub fallback_file: String,
    /// Play statistics older than this are wiped on startup
    pub stats_reset_days: u32,
    /// Skip the SQLite probe and go straight to the single-blob store
    pub force_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_dir: None,
            database_file: DATABASE_FILE_NAME.to_owned(),
            fallback_file: FALLBACK_FILE_NAME.to_owned(),
            stats_reset_days: STATS_RESET_INTERVAL_DAYS,
            force_fallback: false,
        }
    }
}

impl Config {
    /// A config rooted at the given directory, mostly useful for tests and embedding
    pub fn with_storage_dir(dir: impl Into<PathBuf>) -> Self {
        Config {
            storage_dir: Some(dir.into()),
            ..Config::default()
        }
    }

    /// Load the user config file, or the defaults if there is none
    pub fn load() -> AnyResult<Self> {
        let home_config = HomeConfig::with_config_dir(APP_NAME, CONFIG_FILE_NAME);
        let path = home_config.path();

        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        Config::from_file(path)
    }

    pub fn from_file(path: &Path) -> AnyResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Config::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> AnyResult<Self> {
        let config: Config = toml::from_str(raw)?;

        if config.stats_reset_days == 0 {
            warn!("stats_reset_days is 0, statistics will be reset on every start");
        }

        Ok(config)
    }

    pub fn to_toml_string(&self) -> AnyResult<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn storage_dir(&self) -> PathBuf {
        match &self.storage_dir {
            Some(dir) => dir.clone(),
            None => get_storage_dir(),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.storage_dir().join(&self.database_file)
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.storage_dir().join(&self.fallback_file)
    }

    pub fn stats_reset_interval(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.stats_reset_days))
    }
}

/**
 * Default data directory, e.g. ~/.local/share/reddens on Linux
 */
pub fn get_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}
