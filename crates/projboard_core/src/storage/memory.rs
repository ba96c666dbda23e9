use super::{validate_key, BlobStorage, StorageResult};
use std::collections::HashMap;

/// Process-local storage, mainly for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    blobs: HashMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a blob without counting it as a write.
    pub fn with_blob(mut self, key: impl Into<String>, blob: impl Into<String>) -> Self {
        self.blobs.insert(key.into(), blob.into());
        self
    }

    /// Number of successful `write` calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl BlobStorage for MemoryStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, blob: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.blobs.insert(key.to_string(), blob.to_string());
        self.writes += 1;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
