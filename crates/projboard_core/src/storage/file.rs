//! JSON-file storage backend.
//!
//! # Invariants
//! - Each key maps to exactly one `<dir>/<key>.json` file.
//! - Writes go through a temp file in the same directory and are renamed into
//!   place, so readers never observe a partially written blob.

use super::{validate_key, BlobStorage, StorageError, StorageResult};
use log::debug;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a backend rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds the blob for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl BlobStorage for FileStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(&path, err)),
        }
    }

    fn write(&mut self, key: &str, blob: &str) -> StorageResult<()> {
        validate_key(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|err| self.io_error(&self.dir, err))?;

        let path = self.path_for(key);
        let mut staged =
            NamedTempFile::new_in(&self.dir).map_err(|err| self.io_error(&self.dir, err))?;
        staged
            .write_all(blob.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|err| self.io_error(staged.path(), err))?;
        staged
            .persist(&path)
            .map_err(|err| self.io_error(&path, err.error))?;

        debug!(
            "event=blob_write module=storage backend=file status=ok bytes={}",
            blob.len()
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
