use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slots::DEFAULT_SLOT_MINUTES;

/// Application-level constants
pub const APP_NAME: &str = "Medibook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How far ahead patients may book, in days.
pub const DEFAULT_BOOKING_HORIZON_DAYS: u32 = 30;

const MAX_SLOT_MINUTES: u32 = 24 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables of the booking flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub slot_duration_minutes: u32,
    pub booking_horizon_days: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_duration_minutes: DEFAULT_SLOT_MINUTES,
            booking_horizon_days: DEFAULT_BOOKING_HORIZON_DAYS,
        }
    }
}

impl BookingConfig {
    /// Read a JSON config file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            slot_minutes = config.slot_duration_minutes,
            horizon_days = config.booking_horizon_days,
            "loaded booking config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_duration_minutes == 0 || self.slot_duration_minutes > MAX_SLOT_MINUTES {
            return Err(ConfigError::Invalid {
                field: "slot_duration_minutes",
                reason: format!(
                    "must be between 1 and {MAX_SLOT_MINUTES}, got {}",
                    self.slot_duration_minutes
                ),
            });
        }
        Ok(())
    }
}

/// Get the application data directory (`<data dir>/Medibook`)
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_NAME))
}

/// Default location of the SQLite database
pub fn database_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("medibook.db"))
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medibook=info"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_booking_rules() {
        let config = BookingConfig::default();
        assert_eq!(config.slot_duration_minutes, 30);
        assert_eq!(config.booking_horizon_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "slot_duration_minutes": 20 }}"#).unwrap();

        let config = BookingConfig::load(file.path()).unwrap();
        assert_eq!(config.slot_duration_minutes, 20);
        assert_eq!(config.booking_horizon_days, DEFAULT_BOOKING_HORIZON_DAYS);
    }

    #[test]
    fn load_rejects_zero_duration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "slot_duration_minutes": 0 }}"#).unwrap();

        let err = BookingConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "slot_duration_minutes", .. }));
    }

    #[test]
    fn load_reports_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "slot_duration_minutes = 30").unwrap();
        assert!(matches!(
            BookingConfig::load(file.path()).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BookingConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn database_lives_under_app_data() {
        if let (Some(db), Some(app)) = (database_path(), app_data_dir()) {
            assert!(db.starts_with(&app));
            assert!(app.ends_with(APP_NAME));
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
