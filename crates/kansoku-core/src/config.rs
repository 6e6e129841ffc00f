use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{ProjectDirs, UserDirs};
use kansoku_detect::MediaServerConfig;
use serde::{Deserialize, Serialize};

use crate::engine::UpdatePolicy;
use crate::error::TrackerError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub media_server: MediaServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub enabled: bool,
    /// lsof command regex, e.g. `mpv|vlc`.
    pub process_name: String,
    #[serde(default)]
    pub watch_dir: Option<PathBuf>,
    /// Seconds between polls.
    pub interval: u64,
    /// Seconds before a detected episode is committed.
    pub update_wait: u64,
    pub update_close: bool,
}

impl TrackerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }

    pub fn policy(&self) -> UpdatePolicy {
        UpdatePolicy {
            wait: Duration::from_secs(self.update_wait),
            wait_close: self.update_close,
        }
    }

    /// Configured watch root, or the user's video directory.
    pub fn watch_dir(&self) -> Option<PathBuf> {
        self.watch_dir.clone().or_else(|| {
            UserDirs::new().and_then(|dirs| dirs.video_dir().map(Path::to_path_buf))
        })
    }
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, TrackerError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load a specific file merged over built-in defaults.
    pub fn load_from(path: &Path) -> Result<Self, TrackerError> {
        let user_str = std::fs::read_to_string(path)?;
        Self::from_toml(&user_str)
    }

    /// Parse `user` TOML merged over built-in defaults.
    pub fn from_toml(user: &str) -> Result<Self, TrackerError> {
        let mut merged: toml::Value =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| TrackerError::Config(e.to_string()))?;
        let user: toml::Value = toml::from_str(user).map_err(|e| TrackerError::Config(e.to_string()))?;
        merge_toml(&mut merged, user);
        merged
            .try_into()
            .map_err(|e: toml::de::Error| TrackerError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Directory for the show list and log files.
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Path to the show list file.
    pub fn shows_path() -> PathBuf {
        Self::data_dir().join("shows.toml")
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "kansoku")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Recursively overlay `overlay` onto `base`. Tables merge key by key;
/// any other value replaces.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
