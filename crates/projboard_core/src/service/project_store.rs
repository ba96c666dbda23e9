//! Project store: the single owner of the project collection.
//!
//! # Responsibility
//! - Hold the in-memory collection in insertion order.
//! - Write every mutation through to the repository synchronously.
//! - Degrade to an empty collection when persisted data is unusable.
//!
//! # Invariants
//! - Ids are unique; the store assigns them, callers never do.
//! - `created_at` is set once; `updated_at` is bumped on every merge and
//!   never drops below `created_at`.
//! - No failure from storage or decoding is raised to the caller; failures
//!   are logged and reported through `PersistOutcome` / `LoadOutcome`.
//! - After a `Recovered` load, nothing is written until the unreadable blob
//!   has been copied aside by the repository.

use crate::clock::{Clock, SystemClock};
use crate::model::project::{Project, ProjectDraft, ProjectId, ProjectPatch};
use crate::repo::project_repo::{BlobFormat, ProjectRepository};
use log::{error, info, warn};
use std::time::Instant;
use uuid::Uuid;

/// Result of writing the collection through to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted,
    /// Nothing changed, so nothing was written.
    Skipped,
    /// The write failed; in-memory state still holds the mutation.
    Failed(String),
}

impl PersistOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// Mutation result paired with its persistence outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved<T> {
    pub value: T,
    pub persist: PersistOutcome,
}

/// What `load` found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored yet.
    Empty,
    Loaded { count: usize, format: BlobFormat },
    /// Stored data was unusable; the store fell back to an empty collection.
    /// The blob is preserved under a side key before the next write.
    Recovered { reason: String },
}

/// State holder exposing load/create/update/delete/save_all.
pub struct ProjectStore<R: ProjectRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    projects: Vec<Project>,
    unreadable_pending: bool,
}

impl<R: ProjectRepository> ProjectStore<R, SystemClock> {
    /// Creates an empty store over `repo`. Call `load` to read stored data.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }

    /// Creates a store and immediately loads persisted data.
    pub fn open(repo: R) -> Self {
        let mut store = Self::new(repo);
        store.load();
        store
    }
}

impl<R: ProjectRepository, C: Clock> ProjectStore<R, C> {
    /// Creates an empty store whose timestamps and "today" come from `clock`.
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            projects: Vec::new(),
            unreadable_pending: false,
        }
    }

    /// Replaces in-memory state with whatever storage holds.
    ///
    /// Absent or malformed data yields an empty collection; the failure is
    /// logged and reported as `LoadOutcome::Recovered`, never raised.
    pub fn load(&mut self) -> LoadOutcome {
        let started_at = Instant::now();
        self.unreadable_pending = false;
        match self.repo.load_projects() {
            Ok(Some(loaded)) => {
                let count = loaded.projects.len();
                self.projects = loaded.projects;
                info!(
                    "event=store_load module=store status=ok count={} format={:?} duration_ms={}",
                    count,
                    loaded.format,
                    started_at.elapsed().as_millis()
                );
                LoadOutcome::Loaded {
                    count,
                    format: loaded.format,
                }
            }
            Ok(None) => {
                self.projects.clear();
                info!("event=store_load module=store status=ok count=0 stored=false");
                LoadOutcome::Empty
            }
            Err(err) => {
                self.projects.clear();
                self.unreadable_pending = true;
                warn!(
                    "event=store_load module=store status=recovered error_code=load_failed error={}",
                    err
                );
                LoadOutcome::Recovered {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Appends a new project built from `draft` and persists.
    pub fn create(&mut self, draft: ProjectDraft) -> Saved<Project> {
        let project = Project::from_draft(self.fresh_id(), draft, self.clock.now());
        self.projects.push(project.clone());
        info!(
            "event=project_create module=store status=ok project_id={} total={}",
            project.id,
            self.projects.len()
        );
        Saved {
            value: project,
            persist: self.persist("project_create"),
        }
    }

    /// Merges `patch` into the project with `id`.
    ///
    /// A missing id is a silent no-op: nothing changes and nothing is written.
    pub fn update(&mut self, id: ProjectId, patch: ProjectPatch) -> Saved<Option<Project>> {
        let now = self.clock.now();
        let Some(project) = self.projects.iter_mut().find(|project| project.id == id) else {
            info!("event=project_update module=store status=skipped reason=not_found project_id={id}");
            return Saved {
                value: None,
                persist: PersistOutcome::Skipped,
            };
        };

        project.apply_patch(patch, now);
        let updated = project.clone();
        info!("event=project_update module=store status=ok project_id={id}");
        Saved {
            value: Some(updated),
            persist: self.persist("project_update"),
        }
    }

    /// Removes the project with `id` if present, then persists.
    ///
    /// Idempotent: deleting an absent id leaves the collection unchanged.
    pub fn delete(&mut self, id: ProjectId) -> Saved<bool> {
        let before = self.projects.len();
        self.projects.retain(|project| project.id != id);
        let removed = self.projects.len() != before;
        info!(
            "event=project_delete module=store status=ok project_id={id} removed={removed} total={}",
            self.projects.len()
        );
        Saved {
            value: removed,
            persist: self.persist("project_delete"),
        }
    }

    /// Re-persists the current collection verbatim.
    pub fn save_all(&mut self) -> PersistOutcome {
        self.persist("save_all")
    }

    /// Projects in insertion order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Looks a project up by id.
    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    /// Number of projects held in memory.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the in-memory collection holds no projects.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Clock driving timestamps; presentation layers read "today" from it.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Consumes the store and hands back its repository.
    pub fn into_repository(self) -> R {
        self.repo
    }

    fn fresh_id(&self) -> ProjectId {
        loop {
            let candidate = Uuid::new_v4();
            if self.get(candidate).is_none() {
                return candidate;
            }
        }
    }

    fn persist(&mut self, event: &'static str) -> PersistOutcome {
        let started_at = Instant::now();
        if self.unreadable_pending {
            match self.repo.back_up_unreadable() {
                Ok(side_key) => {
                    self.unreadable_pending = false;
                    info!(
                        "event=store_backup module=store status=ok trigger={event} preserved={}",
                        side_key.is_some()
                    );
                }
                Err(err) => {
                    error!(
                        "event=store_persist module=store status=error trigger={event} error_code=backup_failed error={}",
                        err
                    );
                    return PersistOutcome::Failed(format!(
                        "stored data is unreadable and could not be set aside: {err}"
                    ));
                }
            }
        }

        match self.repo.save_projects(&self.projects) {
            Ok(()) => {
                info!(
                    "event=store_persist module=store status=ok trigger={event} count={} duration_ms={}",
                    self.projects.len(),
                    started_at.elapsed().as_millis()
                );
                PersistOutcome::Persisted
            }
            Err(err) => {
                error!(
                    "event=store_persist module=store status=error trigger={event} error_code=persist_failed error={}",
                    err
                );
                PersistOutcome::Failed(err.to_string())
            }
        }
    }
}
