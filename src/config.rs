//! Application-level configuration loading: database location, autosave
//! debounce, draft freshness window and the weather provider.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the app looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/fairplay.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FAIRPLAY_CONFIG_PATH";
/// Environment variable that overrides the database path from the file.
const DB_PATH_ENV: &str = "FAIRPLAY_DB_PATH";

const DEFAULT_DATABASE_PATH: &str = "fairplay.db";
const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 250;
const DEFAULT_DRAFT_MAX_AGE_HOURS: u64 = 72;
const DEFAULT_WEATHER_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_WEATHER_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub database_path: PathBuf,
    pub autosave_delay: Duration,
    pub draft_max_age: Duration,
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, PartialEq)]
/// Settings of the weather lookup done at round start.
pub struct WeatherConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout: Duration,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(db_path) = env::var_os(DB_PATH_ENV).filter(|value| !value.is_empty()) {
            config.database_path = PathBuf::from(db_path);
        }
        config
    }

    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    database_path: String,
    autosave_delay_ms: u64,
    draft_max_age_hours: u64,
    weather: RawWeather,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.into(),
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            draft_max_age_hours: DEFAULT_DRAFT_MAX_AGE_HOURS,
            weather: RawWeather::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawWeather {
    enabled: bool,
    base_url: String,
    timeout_ms: u64,
}

impl Default for RawWeather {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_WEATHER_BASE_URL.into(),
            timeout_ms: DEFAULT_WEATHER_TIMEOUT_MS,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            database_path: PathBuf::from(value.database_path),
            autosave_delay: Duration::from_millis(value.autosave_delay_ms),
            draft_max_age: Duration::from_secs(value.draft_max_age_hours * 60 * 60),
            weather: WeatherConfig {
                enabled: value.weather.enabled,
                base_url: value.weather.base_url,
                timeout: Duration::from_millis(value.weather.timeout_ms),
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.database_path, PathBuf::from("fairplay.db"));
        assert_eq!(config.autosave_delay, Duration::from_millis(250));
        assert_eq!(config.draft_max_age, Duration::from_secs(72 * 3600));
        assert!(config.weather.enabled);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config =
            AppConfig::from_json(r#"{"autosave_delay_ms": 100, "weather": {"enabled": false}}"#)
                .unwrap();
        assert_eq!(config.autosave_delay, Duration::from_millis(100));
        assert!(!config.weather.enabled);
        assert_eq!(config.weather.base_url, DEFAULT_WEATHER_BASE_URL);
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(AppConfig::from_json("{not json").is_err());
    }
}
