//! # Refresher Configuration
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! 1. Defaults
//! 2. refresher.toml
//!      ~/.config/tally/refresher.toml (Linux)
//!      ~/Library/Application Support/com.tally.tally/refresher.toml (macOS)
//! 3. Environment
//!      TALLY_DB_PATH, TALLY_REFRESH_INTERVAL_SECS, TALLY_AUTO_CLOSE
//! ```
//!
//! ## File Format
//! ```toml
//! database_path = "/var/lib/tally/tally.db"
//! interval_secs = 30
//! auto_close = true
//! max_connections = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RefresherError, RefresherResult};

/// Settings for the refresh loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefresherConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Seconds between passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Whether to idle regular tables the reconciler recommends closing.
    #[serde(default = "default_true")]
    pub auto_close: bool,

    /// Pool size for the database.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "tally", "tally")
        .map(|dirs| dirs.data_dir().join("tally.db"))
        .unwrap_or_else(|| PathBuf::from("./tally.db"))
}

fn default_interval_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

impl Default for RefresherConfig {
    fn default() -> Self {
        RefresherConfig {
            database_path: default_database_path(),
            interval_secs: default_interval_secs(),
            auto_close: default_true(),
            max_connections: default_max_connections(),
        }
    }
}

impl RefresherConfig {
    /// Loads defaults, then the config file, then environment overrides,
    /// and validates the result.
    ///
    /// A missing file is not an error; an unreadable or invalid one is.
    pub fn load(config_path: Option<PathBuf>) -> RefresherResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading refresher config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses a config file.
    pub fn from_file(path: &Path) -> RefresherResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| RefresherError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Writes the config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> RefresherResult<()> {
        let io_err = |source| RefresherError::ConfigIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(io_err)?;

        info!(?path, "Refresher config saved");
        Ok(())
    }

    /// Rejects settings the loop cannot run with.
    pub fn validate(&self) -> RefresherResult<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(RefresherError::InvalidConfig(
                "database_path must not be empty".into(),
            ));
        }
        if self.interval_secs == 0 {
            return Err(RefresherError::InvalidConfig(
                "interval_secs must be greater than 0".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(RefresherError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Time between passes.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `TALLY_*` overrides from `lookup`. Unparseable values are
    /// logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("TALLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Some(secs) = lookup("TALLY_REFRESH_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => self.interval_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid TALLY_REFRESH_INTERVAL_SECS"),
            }
        }

        if let Some(flag) = lookup("TALLY_AUTO_CLOSE") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.auto_close = true,
                "0" | "false" | "no" | "off" => self.auto_close = false,
                _ => warn!(value = %flag, "Ignoring invalid TALLY_AUTO_CLOSE"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "tally")
            .map(|dirs| dirs.config_dir().join("refresher.toml"))
    }
}
