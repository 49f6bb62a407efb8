//! Spin preferences, persisted between sessions.

use directories::ProjectDirs;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const SETTINGS_FILE: &str = "spin.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinSettings {
    pub duration_seconds: f64,
    pub speed_multiplier: f64,
}

impl Default for SpinSettings {
    fn default() -> Self {
        Self {
            duration_seconds: 5.0,
            speed_multiplier: 1.0,
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to determine data directory")]
    DataDirNotFound,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpinSettings {
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_seconds).unwrap_or(Duration::ZERO)
    }

    /// Copy with out-of-range values pulled back to something spinnable.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            duration_seconds: if self.duration_seconds.is_finite() {
                self.duration_seconds.clamp(0.3, 60.0)
            } else {
                defaults.duration_seconds
            },
            speed_multiplier: if self.speed_multiplier.is_finite() {
                self.speed_multiplier.clamp(0.0, 10.0)
            } else {
                defaults.speed_multiplier
            },
        }
    }

    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let dirs = ProjectDirs::from("org", "troia", "next-wheel")
            .ok_or(SettingsError::DataDirNotFound)?;
        Ok(dirs.data_dir().join(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Self>(&json)?.sanitized())
    }

    /// Persisted settings, or `fallback` when none are stored yet or they
    /// cannot be read.
    pub fn load_or(fallback: Self) -> Self {
        match Self::default_path().and_then(|p| Self::load_from(&p)) {
            Ok(settings) => {
                log::info!("Loaded spin settings");
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => fallback,
            Err(e) => {
                log::warn!("Using default spin settings: {}", e);
                fallback
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::default_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        let s = SpinSettings {
            duration_seconds: -4.0,
            speed_multiplier: f64::NAN,
        }
        .sanitized();
        assert_eq!(s.duration_seconds, 0.3);
        assert_eq!(s.speed_multiplier, 1.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s: SpinSettings = serde_json::from_str(r#"{"speed_multiplier": 2.0}"#).unwrap();
        assert_eq!(s.duration_seconds, 5.0);
        assert_eq!(s.speed_multiplier, 2.0);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("wheelkit-settings-{}", std::process::id()))
            .join(SETTINGS_FILE);
        let s = SpinSettings {
            duration_seconds: 7.5,
            speed_multiplier: 1.5,
        };
        s.save_to(&path).unwrap();
        assert_eq!(SpinSettings::load_from(&path).unwrap(), s);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_negative_duration_is_zero() {
        let s = SpinSettings {
            duration_seconds: -1.0,
            speed_multiplier: 1.0,
        };
        assert_eq!(s.duration(), Duration::ZERO);
    }
}
