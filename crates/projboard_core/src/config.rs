//! Runtime configuration.
//!
//! # Responsibility
//! - Resolve data directory, storage backend, storage key and logging setup.
//! - Layer sources: defaults < `<data_dir>/config.json` < environment <
//!   explicit overrides.
//!
//! # Invariants
//! - A resolved config always has an absolute `data_dir` and `log_dir`.
//! - `storage_key` and `log_level` are validated during resolution.

use crate::logging::{default_log_level, normalize_level};
use crate::repo::project_repo::{BlobProjectRepository, DEFAULT_STORAGE_KEY};
use crate::storage::{validate_key, BlobStorage, FileStorage, SqliteStorage, StorageResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const ENV_DATA_DIR: &str = "PROJBOARD_DATA_DIR";
pub const ENV_BACKEND: &str = "PROJBOARD_BACKEND";
pub const ENV_STORAGE_KEY: &str = "PROJBOARD_STORAGE_KEY";
pub const ENV_LOG_LEVEL: &str = "PROJBOARD_LOG_LEVEL";

const DEFAULT_DIR_NAME: &str = ".projboard";
const SQLITE_FILE_NAME: &str = "projboard.sqlite3";
const LOG_DIR_NAME: &str = "logs";

/// Which `BlobStorage` implementation backs the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "sqlite" | "db" => Ok(Self::Sqlite),
            other => Err(format!(
                "unsupported storage backend `{other}`; expected file|sqlite"
            )),
        }
    }
}

/// Values a caller (e.g. CLI flags) forces over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub backend: Option<StorageBackend>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    backend: Option<StorageBackend>,
    storage_key: Option<String>,
    log_level: Option<String>,
    log_dir: Option<PathBuf>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    pub storage_key: String,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
}

impl BoardConfig {
    /// Built-in defaults rooted at `data_dir`.
    pub fn defaults_for(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            log_dir: data_dir.join(LOG_DIR_NAME),
            data_dir,
            backend: StorageBackend::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            log_level: default_log_level(),
        }
    }

    /// Resolves config from the process environment and config file.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self, String> {
        Self::resolve_with(overrides, |name| std::env::var(name).ok())
    }

    /// Same as `resolve`, with an injectable environment lookup.
    pub fn resolve_with(
        overrides: &ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let data_dir = match (&overrides.data_dir, env(ENV_DATA_DIR)) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ => default_data_dir()?,
        };
        let data_dir = absolutize(&data_dir)?;
        let mut config = Self::defaults_for(&data_dir);

        let file = read_config_file(&data_dir.join(CONFIG_FILE_NAME))?;
        if let Some(backend) = file.backend {
            config.backend = backend;
        }
        if let Some(key) = file.storage_key {
            config.storage_key = key;
        }
        if let Some(level) = file.log_level {
            config.log_level = normalize_level(&level)?;
        }
        if let Some(log_dir) = file.log_dir {
            config.log_dir = if log_dir.is_absolute() {
                log_dir
            } else {
                data_dir.join(log_dir)
            };
        }

        if let Some(backend) = env(ENV_BACKEND) {
            config.backend = backend.parse()?;
        }
        if let Some(key) = env(ENV_STORAGE_KEY) {
            config.storage_key = key.trim().to_string();
        }
        if let Some(level) = env(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level)?;
        }

        if let Some(backend) = overrides.backend {
            config.backend = backend;
        }
        if let Some(level) = &overrides.log_level {
            config.log_level = normalize_level(level)?;
        }

        validate_key(&config.storage_key).map_err(|err| err.to_string())?;
        Ok(config)
    }

    /// Path of the SQLite database used by `StorageBackend::Sqlite`.
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(SQLITE_FILE_NAME)
    }

    /// Builds the configured storage backend.
    pub fn open_storage(&self) -> StorageResult<Box<dyn BlobStorage>> {
        let storage: Box<dyn BlobStorage> = match self.backend {
            StorageBackend::File => Box::new(FileStorage::new(&self.data_dir)),
            StorageBackend::Sqlite => Box::new(SqliteStorage::open(self.sqlite_path())?),
        };
        Ok(storage)
    }

    /// Builds a repository over the configured backend and key.
    pub fn open_repository(&self) -> StorageResult<BlobProjectRepository<Box<dyn BlobStorage>>> {
        Ok(BlobProjectRepository::with_key(
            self.open_storage()?,
            self.storage_key.clone(),
        ))
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .map_err(|err| format!("invalid config file `{}`: {err}", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(err) => Err(format!(
            "failed to read config file `{}`: {err}",
            path.display()
        )),
    }
}

fn default_data_dir() -> Result<PathBuf, String> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(DEFAULT_DIR_NAME))
        .ok_or_else(|| format!("cannot locate a home directory; set {ENV_DATA_DIR}"))
}

fn absolutize(path: &Path) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|err| format!("cannot resolve `{}`: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{
        BoardConfig, ConfigOverrides, StorageBackend, CONFIG_FILE_NAME, ENV_BACKEND,
        ENV_LOG_LEVEL, ENV_STORAGE_KEY,
    };
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = ConfigOverrides {
            data_dir: Some(dir.path().to_path_buf()),
            ..ConfigOverrides::default()
        };
        let config = BoardConfig::resolve_with(&overrides, env_from(&[])).unwrap();

        assert_eq!(config.backend, StorageBackend::File);
        assert_eq!(config.storage_key, "project-dashboard-data");
        assert_eq!(config.log_dir, dir.path().join("logs"));
    }

    #[test]
    fn env_beats_file_and_overrides_beat_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"backend": "sqlite", "storage_key": "from-file", "log_level": "error"}"#,
        )
        .unwrap();
        let overrides = ConfigOverrides {
            data_dir: Some(dir.path().to_path_buf()),
            log_level: Some("TRACE".to_string()),
            ..ConfigOverrides::default()
        };
        let env = env_from(&[
            (ENV_BACKEND, "file"),
            (ENV_STORAGE_KEY, "from-env"),
            (ENV_LOG_LEVEL, "warning"),
        ]);

        let config = BoardConfig::resolve_with(&overrides, env).unwrap();
        assert_eq!(config.backend, StorageBackend::File);
        assert_eq!(config.storage_key, "from-env");
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn invalid_sources_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = ConfigOverrides {
            data_dir: Some(dir.path().to_path_buf()),
            ..ConfigOverrides::default()
        };

        let err = BoardConfig::resolve_with(&overrides, env_from(&[(ENV_BACKEND, "s3")]))
            .unwrap_err();
        assert!(err.contains("unsupported storage backend"));

        let err = BoardConfig::resolve_with(&overrides, env_from(&[(ENV_STORAGE_KEY, "../x")]))
            .unwrap_err();
        assert!(err.contains("invalid storage key"));

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"colour": "red"}"#).unwrap();
        let err = BoardConfig::resolve_with(&overrides, env_from(&[])).unwrap_err();
        assert!(err.contains("invalid config file"));
    }
}
