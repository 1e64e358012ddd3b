//! Configuration management for flightstrip.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timeline::WindowSpan;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flightstrip";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "flightstrip.db";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "FLIGHTSTRIP_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLIGHTSTRIP_`, sections split by `__`)
/// 2. TOML config file at `~/.config/flightstrip/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Timeline and polling configuration.
    pub timeline: TimelineConfig,
    /// Sample data configuration.
    pub demo: DemoConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/flightstrip/flightstrip.db`
    pub database_path: Option<PathBuf>,
}

/// Timeline-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Initial window length in minutes; one of 10, 15, 30, 60, 120.
    pub default_window_minutes: u32,
    /// Seconds between automatic refreshes.
    pub refresh_interval_secs: u64,
}

/// Sample data configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Runway names created by `populate` and required by `runways ensure`.
    pub runway_names: Vec<String>,
    /// Number of flights to generate.
    pub flight_count: usize,
    /// Flights are spread over this many minutes from now.
    pub horizon_minutes: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            default_window_minutes: WindowSpan::DEFAULT.minutes(),
            refresh_interval_secs: 10,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            runway_names: vec!["09L".to_string(), "09R".to_string(), "27".to_string()],
            flight_count: 18,
            horizon_minutes: 60,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if WindowSpan::from_minutes(self.timeline.default_window_minutes).is_none() {
            let allowed: Vec<String> = WindowSpan::ALL
                .iter()
                .map(|span| span.minutes().to_string())
                .collect();
            return Err(Error::config_validation(format!(
                "default_window_minutes ({}) must be one of {}",
                self.timeline.default_window_minutes,
                allowed.join(", ")
            )));
        }

        if self.timeline.refresh_interval_secs == 0 {
            return Err(Error::config_validation(
                "refresh_interval_secs must be greater than 0",
            ));
        }

        if self.demo.horizon_minutes == 0 {
            return Err(Error::config_validation(
                "horizon_minutes must be greater than 0",
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.demo.runway_names {
            if name.trim().is_empty() {
                return Err(Error::config_validation("runway names cannot be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::config_validation(format!(
                    "duplicate runway name: {name}"
                )));
            }
        }

        if self.demo.flight_count > 0 && self.demo.runway_names.is_empty() {
            return Err(Error::config_validation(
                "flight_count requires at least one runway name",
            ));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the initial window span.
    ///
    /// Falls back to the nearest allowed span for unvalidated values.
    #[must_use]
    pub fn default_window(&self) -> WindowSpan {
        WindowSpan::nearest(self.timeline.default_window_minutes)
    }

    /// Get the refresh interval as a Duration.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.timeline.refresh_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.timeline.default_window_minutes, 15);
        assert_eq!(config.timeline.refresh_interval_secs, 10);
        assert_eq!(config.demo.flight_count, 18);
        assert_eq!(config.demo.horizon_minutes, 60);
        assert_eq!(config.demo.runway_names.len(), 3);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_window_not_a_step() {
        let mut config = Config::default();
        config.timeline.default_window_minutes = 45;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_window_minutes"));
        assert!(err.contains("10, 15, 30, 60, 120"));
    }

    #[test]
    fn test_validate_zero_refresh_interval() {
        let mut config = Config::default();
        config.timeline.refresh_interval_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("refresh_interval_secs"));
    }

    #[test]
    fn test_validate_zero_horizon() {
        let mut config = Config::default();
        config.demo.horizon_minutes = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("horizon_minutes"));
    }

    #[test]
    fn test_validate_duplicate_runway() {
        let mut config = Config::default();
        config.demo.runway_names = vec!["27".to_string(), "27".to_string()];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("duplicate runway name: 27"));
    }

    #[test]
    fn test_validate_blank_runway() {
        let mut config = Config::default();
        config.demo.runway_names = vec!["  ".to_string()];

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_flights_without_runways() {
        let mut config = Config::default();
        config.demo.runway_names.clear();
        assert!(config.validate().is_err());

        config.demo.flight_count = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("flightstrip.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_window() {
        let mut config = Config::default();
        assert_eq!(config.default_window(), WindowSpan::FifteenMinutes);

        config.timeline.default_window_minutes = 120;
        assert_eq!(config.default_window(), WindowSpan::TwoHours);
    }

    #[test]
    fn test_refresh_interval() {
        assert_eq!(Config::default().refresh_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("flightstrip"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    // Loading reads the process environment, so these tests run inside a
    // `Jail` to serialize them and restore the environment afterwards.

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|_| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[timeline]\ndefault_window_minutes = 60\n\n[demo]\nflight_count = 4\n",
            )?;

            let config =
                Config::load_from(Some(PathBuf::from("config.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.timeline.default_window_minutes, 60);
            assert_eq!(config.timeline.refresh_interval_secs, 10);
            assert_eq!(config.demo.flight_count, 4);
            assert_eq!(config.demo.runway_names.len(), 3);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[timeline]\nrefresh_interval_secs = 0\n")?;

            let err = Config::load_from(Some(PathBuf::from("config.toml"))).unwrap_err();
            assert!(matches!(err, Error::ConfigValidation { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("FLIGHTSTRIP_TIMELINE__REFRESH_INTERVAL_SECS", "5");
            jail.set_env("FLIGHTSTRIP_STORAGE__DATABASE_PATH", "/tmp/strips.db");

            let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.timeline.refresh_interval_secs, 5);
            assert_eq!(config.database_path(), PathBuf::from("/tmp/strips.db"));
            assert_eq!(config.timeline.default_window_minutes, 15);
            Ok(())
        });
    }

    #[test]
    fn test_env_beats_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[timeline]\ndefault_window_minutes = 30\nrefresh_interval_secs = 20\n",
            )?;
            jail.set_env("FLIGHTSTRIP_TIMELINE__REFRESH_INTERVAL_SECS", "3");

            let config =
                Config::load_from(Some(PathBuf::from("config.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.timeline.refresh_interval_secs, 3);
            assert_eq!(config.timeline.default_window_minutes, 30);
            Ok(())
        });
    }

    #[test]
    fn test_env_override_is_validated() {
        Jail::expect_with(|jail| {
            jail.set_env("FLIGHTSTRIP_TIMELINE__DEFAULT_WINDOW_MINUTES", "45");

            let err = Config::load_from(Some(PathBuf::from("missing.toml"))).unwrap_err();
            assert!(err.to_string().contains("default_window_minutes"));
            Ok(())
        });
    }

    #[test]
    fn test_timeline_config_deserialize() {
        let json = r#"{"default_window_minutes": 30}"#;
        let timeline: TimelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(timeline.default_window_minutes, 30);
        assert_eq!(timeline.refresh_interval_secs, 10);
    }
}
