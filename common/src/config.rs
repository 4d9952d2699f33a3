use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_PORT: &str = "/dev/ttyUSB0";
const DEFAULT_BAUD_RATE: u32 = 9600;
const DEFAULT_POLL_INTERVAL: u64 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

#[derive(Deserialize, Default, Debug, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct DeviceConfig {
    #[serde(default = "default_port")]
    pub port: PathBuf,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// seconds between status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl DeviceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            port: default_port(),
            baud_rate: DEFAULT_BAUD_RATE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

fn default_port() -> PathBuf {
    PathBuf::from(DEFAULT_PORT)
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL
}

/// Loads the config file, falling back to built-in defaults when there is
/// none at the default locations.
pub fn load() -> Result<Config, ConfigError> {
    let Some(path) = config_path() else {
        log::info!("no config file found, using defaults");
        return Ok(Config::default());
    };

    log::info!("reading config from: {}", path.display());
    let text = std::fs::read_to_string(&path)?;
    parse(&text)
}

pub fn parse(text: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(text)?)
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("HAIERAC_CONFIG") {
        return Some(PathBuf::from(path));
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let cwd_config = current_dir.join("haierac.toml");
        if cwd_config.exists() {
            return Some(cwd_config);
        }
    }

    let etc_config = PathBuf::from("/etc/haierac/haierac.toml");
    if etc_config.exists() {
        return Some(etc_config);
    }

    None
}
