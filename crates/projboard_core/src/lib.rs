//! Core domain logic for the project board.
//! This crate owns the project collection, its persistence and the pure
//! projections (priority matrix, timeline) that presentation layers render.

pub mod clock;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;
pub mod service;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BoardConfig, ConfigOverrides, StorageBackend};
pub use export::{
    screenshot_file_name, snapshot_file_name, write_snapshot, DashboardSnapshot, ExportError,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::project::{
    Attachment, DayChange, Narrative, NarrativeField, Project, ProjectDraft, ProjectId,
    ProjectPatch, ProjectValidationError, Score,
};
pub use projection::matrix::{
    identity_hue, layout_matrix, palette_slot, project_point, MatrixBall, MatrixPoint,
    PaletteSlot, Quadrant,
};
pub use projection::timeline::{
    classify_day, day_emphasis, partition_timeline, timeline_entries, DateLabel,
    Emphasis, TimelineEntry, TimelinePartition,
};
pub use repo::project_repo::{
    BlobFormat, BlobProjectRepository, LoadedProjects, ProjectRepository, RepoError, RepoResult,
    DEFAULT_STORAGE_KEY, SCHEMA_VERSION,
};
pub use service::project_store::{LoadOutcome, PersistOutcome, ProjectStore, Saved};
pub use storage::{BlobStorage, FileStorage, MemoryStorage, SqliteStorage, StorageError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
