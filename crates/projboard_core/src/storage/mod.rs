//! Key -> blob storage boundary.
//!
//! # Responsibility
//! - Play the role of browser local storage: one opaque string per key.
//! - Hide backend details (memory, JSON file, SQLite) from the repository.
//!
//! # Invariants
//! - A `write` either replaces the whole blob or leaves the old one intact.
//! - Keys are validated before any backend sees them.

use crate::db::DbError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod file;
mod memory;
mod sqlite;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

static STORAGE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("valid key regex"));

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer failure.
#[derive(Debug)]
pub enum StorageError {
    InvalidKey(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(
                f,
                "invalid storage key `{key}`; expected [A-Za-z0-9._-], max 128 chars"
            ),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidKey(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable key -> blob store.
pub trait BlobStorage {
    /// Returns the blob stored under `key`, or `None` when absent.
    fn read(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replaces the blob stored under `key`.
    fn write(&mut self, key: &str, blob: &str) -> StorageResult<()>;
    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}

impl<S: BlobStorage + ?Sized> BlobStorage for Box<S> {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, blob: &str) -> StorageResult<()> {
        (**self).write(key, blob)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// Rejects keys that are empty, too long, or unsafe as file names.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if STORAGE_KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::validate_key;

    #[test]
    fn validate_key_accepts_namespace_style_keys() {
        assert!(validate_key("project-dashboard-data").is_ok());
        assert!(validate_key("board.v2_backup").is_ok());
    }

    #[test]
    fn validate_key_rejects_path_like_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("nested/key").is_err());
        assert!(validate_key(".hidden").is_err());
    }
}
