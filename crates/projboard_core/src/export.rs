//! Dashboard export: file naming and a read-only snapshot of rendered state.
//!
//! # Invariants
//! - Export never mutates the store; it only reads a project slice.
//! - File names follow `dashboard-<YYYY-MM-DD>.<ext>` using the UTC date of
//!   the capture instant; labels inside the snapshot use the clock's "today".

use crate::clock::Clock;
use crate::model::project::{Project, ProjectId};
use crate::projection::matrix::{layout_matrix, MatrixBall};
use crate::projection::timeline::{partition_timeline, timeline_entries, TimelineEntry};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const EXPORT_PREFIX: &str = "dashboard";

#[derive(Debug)]
pub enum ExportError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to write export `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "failed to encode export: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Download name for a raster capture taken on `date`.
pub fn screenshot_file_name(date: NaiveDate) -> String {
    export_file_name(date, "png")
}

/// Download name for a JSON snapshot taken on `date`.
pub fn snapshot_file_name(date: NaiveDate) -> String {
    export_file_name(date, "json")
}

fn export_file_name(date: NaiveDate, extension: &str) -> String {
    format!("{EXPORT_PREFIX}-{}.{extension}", date.format("%Y-%m-%d"))
}

/// Structured view of what the dashboard shows on `generated_on`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    /// Day the timeline labels were evaluated against.
    pub generated_on: NaiveDate,
    pub project_count: usize,
    pub matrix: Vec<MatrixBall>,
    pub timeline: Vec<TimelineEntry>,
    pub backlog: Vec<ProjectId>,
}

impl DashboardSnapshot {
    /// Captures what the dashboard shows at `clock`'s current instant.
    ///
    /// # Contract
    /// - Timeline labels are relative to `clock.today()`.
    /// - Reads `projects` only.
    pub fn build(projects: &[Project], clock: &impl Clock) -> Self {
        let today = clock.today();
        let partition = partition_timeline(projects);
        Self {
            generated_at: clock.now(),
            generated_on: today,
            project_count: projects.len(),
            matrix: layout_matrix(projects),
            timeline: timeline_entries(&partition, today),
            backlog: partition.backlog.iter().map(|project| project.id).collect(),
        }
    }

    /// UTC calendar day of the capture, used for export file names.
    pub fn export_day(&self) -> NaiveDate {
        self.generated_at.date_naive()
    }
}

/// Writes `snapshot` as pretty JSON into `dir` and returns the file path.
pub fn write_snapshot(dir: &Path, snapshot: &DashboardSnapshot) -> Result<PathBuf, ExportError> {
    let path = dir.join(snapshot_file_name(snapshot.export_day()));
    let body = serde_json::to_string_pretty(snapshot)?;
    std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(&path, body))
        .map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
    info!(
        "event=dashboard_export module=export status=ok projects={} path={}",
        snapshot.project_count,
        path.display()
    );
    Ok(path)
}
