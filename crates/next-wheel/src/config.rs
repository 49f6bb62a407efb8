use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::path::PathBuf;
use thiserror::Error;
use wheelkit::poster::DEFAULT_CONCURRENCY;
use wheelkit::{PresetId, SpinSettings, View};

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Catalog JSON with presets and items; defaults to the data directory.
    pub catalog: Option<PathBuf>,
    /// Where roll history is kept; defaults to the data directory.
    pub history: Option<PathBuf>,
    pub default_preset: Option<PresetId>,
    pub poster_concurrency: usize,
    /// Show as a layer-shell overlay instead of a regular window.
    pub overlay: bool,
    #[serde_as(as = "DisplayFromStr")]
    pub start_view: View,
    /// Spin settings used until the user changes them.
    pub spin: SpinSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            history: None,
            default_preset: None,
            poster_concurrency: DEFAULT_CONCURRENCY,
            overlay: false,
            start_view: View::Wheel,
            spin: SpinSettings::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("org", "troia", "next-wheel").ok_or(ConfigError::ConfigDirNotFound)
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

impl Config {
    pub fn catalog_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.catalog {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("catalog.json")),
        }
    }

    pub fn history_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.history {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("history.json")),
        }
    }
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(config::Environment::with_prefix("NEXT_WHEEL"))
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {}", e);
        Config::default()
    })
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

use crate::events::AppEvent;
use async_channel::Sender;

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let Some(config_dir) = config_path.parent().map(|p| p.to_path_buf()) else {
        return;
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", ConfigError::from(e));
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );

                if meaningful_event
                    && event.paths.iter().any(|p| p == &config_path)
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_view_is_case_insensitive() {
        let cases = vec![
            (r#"{"start_view": "wheel"}"#, View::Wheel),
            (r#"{"start_view": "History"}"#, View::History),
            (r#"{"start_view": "SETTINGS"}"#, View::Settings),
        ];

        for (json, expected) in cases {
            let config: Config = serde_json::from_str(json).unwrap();
            assert_eq!(config.start_view, expected);
        }
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"default_preset": "movies", "spin": {"speed_multiplier": 2}}"#)
                .unwrap();
        assert_eq!(config.default_preset, Some(PresetId::from("movies")));
        assert_eq!(config.poster_concurrency, DEFAULT_CONCURRENCY);
        assert!(!config.overlay);
        assert_eq!(config.spin.speed_multiplier, 2.0);
        assert_eq!(config.spin.duration_seconds, 5.0);
    }

    #[test]
    fn test_explicit_paths_win() {
        let config = Config {
            catalog: Some(PathBuf::from("/srv/wheel/catalog.json")),
            ..Config::default()
        };
        assert_eq!(
            config.catalog_path().unwrap(),
            PathBuf::from("/srv/wheel/catalog.json")
        );
    }

    #[test]
    fn test_default_config_parses() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .unwrap();
        let config: Config = s.try_deserialize().unwrap();
        assert_eq!(config.poster_concurrency, 5);
        assert_eq!(config.start_view, View::Wheel);
    }
}
