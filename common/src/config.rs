//! Configuration loading.
//!
//! The config file lives at the platform config dir (on the Pi:
//! `~/.config/porch-clock/config.json`) and mostly exists to keep the
//! broker credentials out of the source tree. A missing file is not an
//! error; the app then runs with canned outdoor values.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory known for this platform")]
    NoConfigDir,
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Connection settings for the telemetry broker.
#[derive(Deserialize, Clone, Debug)]
pub struct BrokerConfig {
    pub host: String,
    pub username: String,
    pub key: String,
    /// TLS on port 8883 when set, plaintext on 1883 otherwise.
    #[serde(default = "default_secure")]
    pub secure: bool,
    /// Use a fixed client id and a persistent session, so the broker queues
    /// messages across reconnects.
    #[serde(default)]
    pub persist: bool,
    /// Group topic carrying the outdoor probe feeds as one JSON payload.
    pub subscribe_topic: String,
    /// Prepended to every published feed name.
    pub publish_prefix: String,
}

fn default_secure() -> bool {
    true
}

#[derive(Deserialize, Clone, Copy, Debug)]
pub struct DisplayConfig {
    /// Pixel doubling factor for the simulator window.
    pub scale: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { scale: 2 }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    /// No broker section means no broker: outdoor values come canned.
    pub broker: Option<BrokerConfig>,
    pub display: DisplayConfig,
}

impl Config {
    /// Reads the config file, or returns defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("", "", "porch-clock").ok_or(ConfigError::NoConfigDir)?;
        let path = dirs.config_dir().join("config.json");
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Ok(serde_json::from_str(&text)?)
    }
}
