//! Project collection codec and blob-backed repository.
//!
//! # Responsibility
//! - Serialize the collection into a versioned JSON envelope.
//! - Accept the legacy unversioned array format on read.
//!
//! # Invariants
//! - Written blobs always carry `schemaVersion`.
//! - A blob newer than `SCHEMA_VERSION` is rejected, never guessed at.
//! - Decoded collections have unique, non-nil ids. Records whose
//!   `updatedAt` lags `createdAt` are repaired, not rejected.
//! - An unreadable blob is copied to `<key>.unreadable` before anything
//!   overwrites it.

use crate::model::project::{Project, ProjectId};
use crate::storage::{BlobStorage, StorageError};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed namespace key the collection lives under.
pub const DEFAULT_STORAGE_KEY: &str = "project-dashboard-data";
/// Envelope version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Suffix of the key an unreadable blob is preserved under.
pub const UNREADABLE_KEY_SUFFIX: &str = ".unreadable";

const SCHEMA_VERSION_FIELD: &str = "schemaVersion";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for project persistence.
#[derive(Debug)]
pub enum RepoError {
    Storage(StorageError),
    Codec(serde_json::Error),
    UnsupportedSchemaVersion { found: u64, latest_supported: u32 },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "project blob is not valid: {err}"),
            Self::UnsupportedSchemaVersion {
                found,
                latest_supported,
            } => write!(
                f,
                "project blob schema version {found} is newer than supported {latest_supported}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted project data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

/// Shape the blob was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobFormat {
    /// Versioned `{ schemaVersion, projects }` envelope.
    Envelope,
    /// Bare array written before versioning existed.
    LegacyArray,
}

/// Successfully decoded collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProjects {
    pub projects: Vec<Project>,
    pub format: BlobFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeOut<'a> {
    schema_version: u32,
    projects: &'a [Project],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeIn {
    projects: Vec<Project>,
}

/// Encodes the collection as a versioned envelope.
pub fn encode_projects(projects: &[Project]) -> RepoResult<String> {
    let envelope = EnvelopeOut {
        schema_version: SCHEMA_VERSION,
        projects,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a stored blob in either the envelope or legacy array format.
pub fn decode_projects(blob: &str) -> RepoResult<LoadedProjects> {
    let value: Value = serde_json::from_str(blob)?;
    let format = match &value {
        Value::Array(_) => BlobFormat::LegacyArray,
        Value::Object(map) => {
            let version = map
                .get(SCHEMA_VERSION_FIELD)
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "missing or non-integer `{SCHEMA_VERSION_FIELD}`"
                    ))
                })?;
            if version > u64::from(SCHEMA_VERSION) {
                return Err(RepoError::UnsupportedSchemaVersion {
                    found: version,
                    latest_supported: SCHEMA_VERSION,
                });
            }
            BlobFormat::Envelope
        }
        other => {
            return Err(RepoError::InvalidData(format!(
                "expected array or object at top level, found {}",
                json_kind(other)
            )));
        }
    };

    let mut projects = match format {
        BlobFormat::LegacyArray => serde_json::from_value::<Vec<Project>>(value)?,
        BlobFormat::Envelope => serde_json::from_value::<EnvelopeIn>(value)?.projects,
    };

    check_identity(&projects)?;
    repair_timestamps(&mut projects);
    Ok(LoadedProjects { projects, format })
}

fn check_identity(projects: &[Project]) -> RepoResult<()> {
    let mut seen: HashSet<ProjectId> = HashSet::with_capacity(projects.len());
    for project in projects {
        if project.id.is_nil() {
            return Err(RepoError::InvalidData(
                "project id must not be nil".to_string(),
            ));
        }
        if !seen.insert(project.id) {
            return Err(RepoError::InvalidData(format!(
                "duplicate project id {}",
                project.id
            )));
        }
    }
    Ok(())
}

fn repair_timestamps(projects: &mut [Project]) {
    for project in projects.iter_mut() {
        let created_at = project.created_at;
        let updated_at = project.updated_at;
        if project.repair_timestamps() {
            warn!(
                "event=blob_decode module=repo status=repaired project_id={} created_at={} updated_at={}",
                project.id,
                created_at.to_rfc3339(),
                updated_at.to_rfc3339()
            );
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Persistence contract for the whole project collection.
pub trait ProjectRepository {
    /// Reads the stored collection; `Ok(None)` when nothing was ever saved.
    fn load_projects(&self) -> RepoResult<Option<LoadedProjects>>;
    /// Replaces the stored collection with `projects`.
    fn save_projects(&mut self, projects: &[Project]) -> RepoResult<()>;
    /// Copies whatever is stored to a side key so a later save cannot
    /// destroy it.
    ///
    /// # Contract
    /// - Returns the side key, or `None` when nothing is stored.
    /// - Never touches the primary key.
    fn back_up_unreadable(&mut self) -> RepoResult<Option<String>>;
}

/// Repository writing the collection as one blob under a fixed key.
pub struct BlobProjectRepository<S: BlobStorage> {
    storage: S,
    key: String,
}

impl<S: BlobStorage> BlobProjectRepository<S> {
    /// Uses `DEFAULT_STORAGE_KEY`.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Key an unreadable blob is preserved under.
    pub fn unreadable_key(&self) -> String {
        format!("{}{UNREADABLE_KEY_SUFFIX}", self.key)
    }
}

impl<S: BlobStorage> ProjectRepository for BlobProjectRepository<S> {
    fn load_projects(&self) -> RepoResult<Option<LoadedProjects>> {
        match self.storage.read(&self.key)? {
            Some(blob) => decode_projects(&blob).map(Some),
            None => Ok(None),
        }
    }

    fn save_projects(&mut self, projects: &[Project]) -> RepoResult<()> {
        let blob = encode_projects(projects)?;
        self.storage.write(&self.key, &blob)?;
        Ok(())
    }

    fn back_up_unreadable(&mut self) -> RepoResult<Option<String>> {
        let Some(blob) = self.storage.read(&self.key)? else {
            return Ok(None);
        };
        let side_key = self.unreadable_key();
        self.storage.write(&side_key, &blob)?;
        warn!(
            "event=blob_backup module=repo status=ok backend={} key={} side_key={} bytes={}",
            self.storage.backend_name(),
            self.key,
            side_key,
            blob.len()
        );
        Ok(Some(side_key))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_projects, encode_projects, BlobFormat, BlobProjectRepository, ProjectRepository,
        RepoError, SCHEMA_VERSION,
    };
    use crate::model::project::{Project, ProjectDraft};
    use crate::storage::{BlobStorage, MemoryStorage};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn sample(title: &str) -> Project {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        Project::from_draft(Uuid::new_v4(), ProjectDraft::new(title, 3, 7), now)
    }

    #[test]
    fn encoded_blob_carries_schema_version() {
        let blob = encode_projects(&[sample("Alpha")]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["projects"][0]["title"], "Alpha");
    }

    #[test]
    fn decode_rejects_future_schema_version() {
        let err = decode_projects(r#"{"schemaVersion": 99, "projects": []}"#).unwrap_err();
        assert!(matches!(
            err,
            RepoError::UnsupportedSchemaVersion { found: 99, .. }
        ));
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let project = sample("Twice");
        let blob = serde_json::to_string(&vec![project.clone(), project]).unwrap();
        let err = decode_projects(&blob).unwrap_err();
        assert!(err.to_string().contains("duplicate project id"));
    }

    #[test]
    fn decode_repairs_updated_before_created() {
        let mut skewed = sample("Skewed");
        skewed.updated_at = skewed.created_at - Duration::seconds(1);
        let blob = serde_json::to_string(&vec![sample("Good"), skewed.clone()]).unwrap();

        let loaded = decode_projects(&blob).unwrap();

        assert_eq!(loaded.projects.len(), 2);
        assert_eq!(loaded.projects[1].updated_at, skewed.created_at);
        assert!(loaded.projects[1].validate().is_ok());
    }

    #[test]
    fn decode_rejects_nil_id() {
        let mut project = sample("Nil");
        project.id = Uuid::nil();
        let blob = serde_json::to_string(&vec![project]).unwrap();
        assert!(matches!(
            decode_projects(&blob).unwrap_err(),
            RepoError::InvalidData(_)
        ));
    }

    #[test]
    fn back_up_copies_blob_to_side_key() {
        let storage = MemoryStorage::new().with_blob("board", "{\"schemaVersion\": 9}");
        let mut repo = BlobProjectRepository::with_key(storage, "board");

        let side_key = repo.back_up_unreadable().unwrap();

        assert_eq!(side_key.as_deref(), Some("board.unreadable"));
        let storage = repo.storage();
        assert_eq!(
            storage.read("board.unreadable").unwrap().as_deref(),
            Some("{\"schemaVersion\": 9}")
        );
        assert_eq!(
            storage.read("board").unwrap().as_deref(),
            Some("{\"schemaVersion\": 9}")
        );
    }

    #[test]
    fn back_up_of_empty_storage_is_none() {
        let mut repo = BlobProjectRepository::new(MemoryStorage::new());
        assert_eq!(repo.back_up_unreadable().unwrap(), None);
        assert_eq!(repo.storage().write_count(), 0);
    }

    #[test]
    fn decode_accepts_legacy_array() {
        let blob = serde_json::to_string(&vec![sample("Old")]).unwrap();
        let loaded = decode_projects(&blob).unwrap();
        assert_eq!(loaded.format, BlobFormat::LegacyArray);
        assert_eq!(loaded.projects[0].title, "Old");
    }

    #[test]
    fn decode_rejects_scalar_blob() {
        let err = decode_projects("42").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("number")));
    }
}
