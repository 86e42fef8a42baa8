use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::StorageError;
use crate::stats::backend::{JsonFileBackend, SqliteBackend, StatsBackend};
use crate::stats::model::DEFAULT_DAILY_GOAL;

/// Which backend holds the statistics blob
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub daily_goal_points: u32,
    /// Awarded on the first visit of each day
    pub visit_points: u32,
    pub storage: StorageKind,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daily_goal_points: DEFAULT_DAILY_GOAL,
            visit_points: 5,
            storage: StorageKind::Json,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(AppDirs::data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn open_backend(&self) -> Result<Box<dyn StatsBackend>, StorageError> {
        let dir = self.resolved_data_dir();
        log::debug!("using {} statistics in {}", self.storage, dir.display());
        Ok(match self.storage {
            StorageKind::Json => Box::new(JsonFileBackend::with_path(dir.join("stats.json"))),
            StorageKind::Sqlite => Box::new(SqliteBackend::open(dir.join("stats.db"))?),
        })
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("lernen_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    /// First run: leave an editable default config behind. Returns whether
    /// a file was written.
    pub fn write_default_if_missing(&self) -> std::io::Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&Config::default())?;
        Ok(true)
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                log::warn!("ignoring invalid config {}: {e}", self.path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            daily_goal_points: 120,
            visit_points: 10,
            storage: StorageKind::Sqlite,
            data_dir: Some(dir.path().join("data")),
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_or_broken_config_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ nope").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn default_config_written_only_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lernen").join("config.json");
        let store = FileConfigStore::with_path(&path);

        assert!(store.write_default_if_missing().unwrap());
        assert_eq!(store.load(), Config::default());

        fs::write(&path, br#"{ "visit_points": 9 }"#).unwrap();
        assert!(!store.write_default_if_missing().unwrap());
        assert_eq!(store.load().visit_points, 9);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "storage": "sqlite" }"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.storage, StorageKind::Sqlite);
        assert_eq!(cfg.daily_goal_points, 50);
        assert_eq!(cfg.visit_points, 5);
    }

    #[test]
    fn backend_follows_storage_kind() {
        let dir = tempdir().unwrap();
        let cfg = Config {
            storage: StorageKind::Sqlite,
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let backend = cfg.open_backend().unwrap();
        assert!(backend.load().unwrap().is_none());
        assert!(dir.path().join("stats.db").exists());
    }
}
