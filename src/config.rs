//! Application-level configuration loading: round deadline and event buffering.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MISALIGN_CONFIG_PATH";
/// Time a round stays open before it resolves on its own.
const DEFAULT_ROUND_DURATION: Duration = Duration::from_secs(180);
/// Capacity of the notification broadcast channel.
const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    round_duration: Duration,
    event_capacity: usize,
}

impl AppConfig {
    /// Build a configuration from explicit values.
    pub fn new(round_duration: Duration, event_capacity: usize) -> Self {
        Self {
            round_duration,
            event_capacity,
        }
    }

    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path())
    }

    /// Load the configuration from `path`, falling back to built-in defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        round_secs = app_config.round_duration.as_secs(),
                        event_capacity = app_config.event_capacity,
                        "loaded config"
                    );
                    app_config
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
        }
    }

    /// Deadline applied to every round.
    pub fn round_duration(&self) -> Duration {
        self.round_duration
    }

    /// Buffered notifications per subscriber before it starts lagging.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_DURATION, DEFAULT_EVENT_CAPACITY)
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    round_duration_secs: Option<Duration>,
    #[serde(default)]
    event_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            round_duration: value
                .round_duration_secs
                .filter(|duration| !duration.is_zero())
                .unwrap_or(DEFAULT_ROUND_DURATION),
            event_capacity: value
                .event_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(DEFAULT_EVENT_CAPACITY),
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
    fn parses_seconds_and_capacity() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"round_duration_secs": 45, "event_capacity": 8}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.round_duration(), Duration::from_secs(45));
        assert_eq!(config.event_capacity(), 8);
    }

    #[test]
    fn missing_or_zero_keys_fall_back() {
        let raw: RawConfig = serde_json::from_str(r#"{"round_duration_secs": 0}"#).unwrap();
        assert_eq!(AppConfig::from(raw), AppConfig::default());
    }

    #[test]
    fn unreadable_file_uses_defaults() {
        let missing = env::temp_dir().join("misalign-config-that-does-not-exist.json");
        assert_eq!(AppConfig::load_from(&missing), AppConfig::default());

        let broken = env::temp_dir().join(format!("misalign-broken-{}.json", std::process::id()));
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(AppConfig::load_from(&broken), AppConfig::default());
        let _ = fs::remove_file(broken);
    }
}
