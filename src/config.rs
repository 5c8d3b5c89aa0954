use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::history::HistoryFormat;

/// Default fiat currency for price display.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Default console history file, relative to the working directory.
pub const DEFAULT_HISTORY_FILE: &str = "crypto_history.txt";

/// Default append-only log written by `report`.
pub const DEFAULT_REPORT_LOG: &str = "history.txt";

/// File name used in the XDG config directory.
pub const CONFIG_FILE_NAME: &str = "cryptotrack.toml";

/// Application configuration loaded from `$XDG_CONFIG_HOME/cryptotrack.toml`
/// or `~/.config/cryptotrack.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub defaults: DefaultsConfig,
    pub history: HistoryConfig,
    pub api: ApiConfig,
}

/// General defaults used when CLI flags are not provided.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub currency: Option<String>,
}

/// Where and how query history is persisted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: Option<PathBuf>,
    pub format: Option<HistoryFormat>,
    pub report_log: Option<PathBuf>,
}

/// Pricing API overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
}

impl AppConfig {
    /// Currency to use when the user gives none, normalized to lowercase.
    pub fn default_currency(&self) -> String {
        self.defaults
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_lowercase()
    }

    pub fn history_path(&self) -> PathBuf {
        self.history
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_FILE))
    }

    pub fn history_format(&self) -> HistoryFormat {
        self.history.format.unwrap_or_default()
    }

    pub fn report_log_path(&self) -> PathBuf {
        self.history
            .report_log
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_LOG))
    }
}

/// Resolve the configuration file path based on XDG conventions.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config_home.trim().is_empty()
    {
        return Some(PathBuf::from(xdg_config_home).join(CONFIG_FILE_NAME));
    }

    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config").join(CONFIG_FILE_NAME))
}

/// Load config from disk. Returns defaults when the file does not exist.
pub fn load() -> Result<AppConfig> {
    let Some(path) = config_path() else {
        return Ok(AppConfig::default());
    };

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(err) => {
            return Err(read_config_error(&path, err));
        }
    };

    parse(&raw).map_err(|err| parse_config_error(&path, err))
}

/// Load config from an explicit path.
///
/// Unlike [`load`], this returns an error when the file is missing.
pub fn load_from_path(path: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(path).map_err(|err| read_config_error(path, err))?;
    parse(&raw).map_err(|err| parse_config_error(path, err))
}

fn parse(raw: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    toml::from_str(raw)
}

fn read_config_error(path: &Path, err: std::io::Error) -> Error {
    Error::Config(format!(
        "failed to read config file '{}': {}",
        path.display(),
        err
    ))
}

fn parse_config_error(path: &Path, err: toml::de::Error) -> Error {
    Error::Config(format!(
        "failed to parse config file '{}': {}",
        path.display(),
        err
    ))
}
