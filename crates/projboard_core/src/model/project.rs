//! Project domain model.
//!
//! # Responsibility
//! - Define the persisted project record and the draft/patch inputs used by
//!   the store's create and update paths.
//! - Revive date-typed fields from their serialized string form.
//!
//! # Invariants
//! - `id` is stable and never reused for another project.
//! - `effort` and `benefit` are always within `[0, 10]`.
//! - `updated_at >= created_at` for every valid record; stored records that
//!   break this are repaired on load, not rejected.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static ISO_DATE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{4}-\d{2}-\d{2})").expect("valid date prefix regex"));

/// Stable identifier for every project.
pub type ProjectId = Uuid;

/// Effort or benefit rating, saturated into `[0, 10]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 10;

    /// Builds a score, clamping out-of-range input instead of rejecting it.
    pub fn new(value: i64) -> Self {
        Self(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    /// Builds a score from a JSON-style number. Non-finite input maps to 0.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        Self(value.round().clamp(f64::from(Self::MIN), f64::from(Self::MAX)) as u8)
    }

    /// Raw rating in `[Score::MIN, Score::MAX]`.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for Score {
    fn from(value: u8) -> Self {
        Self::new(i64::from(value))
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Stored blobs come from slider widgets, so floats are tolerated.
        let raw = f64::deserialize(deserializer)?;
        Ok(Self::from_f64(raw))
    }
}

/// Named link attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// One of the six free-text planning fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NarrativeField {
    DiscoveryAndScope,
    ComplexityFactors,
    Blockers,
    NeedsAndDependencies,
    NextSteps,
    ResearchFocus,
}

impl NarrativeField {
    /// All fields in card display order.
    pub const ALL: [NarrativeField; 6] = [
        Self::DiscoveryAndScope,
        Self::ComplexityFactors,
        Self::Blockers,
        Self::NeedsAndDependencies,
        Self::NextSteps,
        Self::ResearchFocus,
    ];

    /// Human-readable section heading.
    pub fn label(self) -> &'static str {
        match self {
            Self::DiscoveryAndScope => "Discovery & Scope",
            Self::ComplexityFactors => "Complexity Factors",
            Self::Blockers => "Blockers",
            Self::NeedsAndDependencies => "Needs & Dependencies",
            Self::NextSteps => "Next Steps",
            Self::ResearchFocus => "Research Focus",
        }
    }

    /// Wire name used in the persisted blob.
    pub fn as_key(self) -> &'static str {
        match self {
            Self::DiscoveryAndScope => "discoveryAndScope",
            Self::ComplexityFactors => "complexityFactors",
            Self::Blockers => "blockers",
            Self::NeedsAndDependencies => "needsAndDependencies",
            Self::NextSteps => "nextSteps",
            Self::ResearchFocus => "researchFocus",
        }
    }
}

/// Free-text planning notes shared by drafts and records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Narrative {
    pub discovery_and_scope: String,
    pub complexity_factors: String,
    pub blockers: String,
    pub needs_and_dependencies: String,
    pub next_steps: String,
    pub research_focus: String,
}

impl Narrative {
    /// Text of one section; empty when the section was never filled.
    pub fn get(&self, field: NarrativeField) -> &str {
        match field {
            NarrativeField::DiscoveryAndScope => &self.discovery_and_scope,
            NarrativeField::ComplexityFactors => &self.complexity_factors,
            NarrativeField::Blockers => &self.blockers,
            NarrativeField::NeedsAndDependencies => &self.needs_and_dependencies,
            NarrativeField::NextSteps => &self.next_steps,
            NarrativeField::ResearchFocus => &self.research_focus,
        }
    }

    /// Replaces one section wholesale.
    ///
    /// # Contract
    /// - Other sections are left untouched.
    /// - An empty `value` clears the section (it drops out of `filled`).
    pub fn set(&mut self, field: NarrativeField, value: impl Into<String>) {
        let slot = match field {
            NarrativeField::DiscoveryAndScope => &mut self.discovery_and_scope,
            NarrativeField::ComplexityFactors => &mut self.complexity_factors,
            NarrativeField::Blockers => &mut self.blockers,
            NarrativeField::NeedsAndDependencies => &mut self.needs_and_dependencies,
            NarrativeField::NextSteps => &mut self.next_steps,
            NarrativeField::ResearchFocus => &mut self.research_focus,
        };
        *slot = value.into();
    }

    /// Non-empty sections in display order, as rendered on an expanded card.
    pub fn filled(&self) -> impl Iterator<Item = (NarrativeField, &str)> + '_ {
        NarrativeField::ALL
            .into_iter()
            .map(|field| (field, self.get(field)))
            .filter(|(_, value)| !value.is_empty())
    }
}

/// Validation errors for persisted project state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectValidationError {
    /// `id` must not be the nil UUID.
    NilId,
    /// `updated_at` must not be earlier than `created_at`.
    UpdatedBeforeCreated {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "project id must not be nil"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updatedAt ({}) must be >= createdAt ({})",
                updated_at.to_rfc3339(),
                created_at.to_rfc3339()
            ),
        }
    }
}

impl Error for ProjectValidationError {}

/// Caller-supplied form data for a new project.
///
/// The store assigns `id` and timestamps; everything else comes from here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    pub effort: Score,
    pub benefit: Score,
    pub narrative: Narrative,
    pub images: Vec<String>,
    pub attachments: Vec<Attachment>,
    pub expected_day: Option<NaiveDate>,
}

impl ProjectDraft {
    pub fn new(title: impl Into<String>, effort: i64, benefit: i64) -> Self {
        Self {
            title: title.into(),
            effort: Score::new(effort),
            benefit: Score::new(benefit),
            ..Self::default()
        }
    }

    /// Presentation-boundary rule: a draft is submittable only with a title.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Appends an image URL. Blank input is ignored.
    pub fn add_image(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }
        self.images.push(url.to_string());
        true
    }

    /// Removes the image at `index`; out-of-range indices are a no-op.
    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    /// Appends a named attachment. Both name and URL must be non-blank.
    pub fn add_attachment(&mut self, name: &str, url: &str) -> bool {
        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || url.is_empty() {
            return false;
        }
        self.attachments.push(Attachment {
            name: name.to_string(),
            url: url.to_string(),
        });
        true
    }

    /// Removes the attachment at `index`; out-of-range indices are a no-op.
    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }
}

/// Change to apply to `expected_day` during an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayChange {
    #[default]
    Keep,
    Clear,
    Set(NaiveDate),
}

/// Partial field-set merged over an existing project by `update`.
///
/// `None` (or `DayChange::Keep`) leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub effort: Option<Score>,
    pub benefit: Option<Score>,
    pub narrative: BTreeMap<NarrativeField, String>,
    pub images: Option<Vec<String>>,
    pub attachments: Option<Vec<Attachment>>,
    pub expected_day: DayChange,
}

impl ProjectPatch {
    /// Full-replacement patch, matching an edit form submitted as a whole.
    pub fn from_draft(draft: ProjectDraft) -> Self {
        let narrative = NarrativeField::ALL
            .into_iter()
            .map(|field| (field, draft.narrative.get(field).to_string()))
            .collect();
        Self {
            title: Some(draft.title),
            effort: Some(draft.effort),
            benefit: Some(draft.benefit),
            narrative,
            images: Some(draft.images),
            attachments: Some(draft.attachments),
            expected_day: match draft.expected_day {
                Some(day) => DayChange::Set(day),
                None => DayChange::Clear,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.effort.is_none()
            && self.benefit.is_none()
            && self.narrative.is_empty()
            && self.images.is_none()
            && self.attachments.is_none()
            && self.expected_day == DayChange::Keep
    }
}

/// Canonical persisted project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub effort: Score,
    pub benefit: Score,
    #[serde(flatten)]
    pub narrative: Narrative,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "revive_expected_day"
    )]
    pub expected_day: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Materializes a draft with store-assigned identity and timestamps.
    pub fn from_draft(id: ProjectId, draft: ProjectDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            effort: draft.effort,
            benefit: draft.benefit,
            narrative: draft.narrative,
            images: draft.images,
            attachments: draft.attachments,
            expected_day: draft.expected_day,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `patch` and bumps `updated_at`.
    ///
    /// # Invariants
    /// - `id` and `created_at` never change.
    /// - `updated_at` never drops below `created_at`, even if `now` does.
    pub fn apply_patch(&mut self, patch: ProjectPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(effort) = patch.effort {
            self.effort = effort;
        }
        if let Some(benefit) = patch.benefit {
            self.benefit = benefit;
        }
        for (field, value) in patch.narrative {
            self.narrative.set(field, value);
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(attachments) = patch.attachments {
            self.attachments = attachments;
        }
        match patch.expected_day {
            DayChange::Keep => {}
            DayChange::Clear => self.expected_day = None,
            DayChange::Set(day) => self.expected_day = Some(day),
        }
        self.updated_at = now.max(self.created_at);
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.id.is_nil() {
            return Err(ProjectValidationError::NilId);
        }
        if self.updated_at < self.created_at {
            return Err(ProjectValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Pulls `updated_at` up to `created_at` when it lags behind.
    ///
    /// # Contract
    /// - Returns `true` when the record was changed.
    /// - After the call `validate` can only fail with `NilId`.
    pub fn repair_timestamps(&mut self) -> bool {
        if self.updated_at >= self.created_at {
            return false;
        }
        self.updated_at = self.created_at;
        true
    }

    /// Whether the project has a committed date (i.e. is not backlog).
    pub fn is_scheduled(&self) -> bool {
        self.expected_day.is_some()
    }
}

/// Parses a stored day value.
///
/// Accepts `YYYY-MM-DD` and full ISO-8601 timestamps; for timestamps only the
/// calendar-date prefix is kept.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let prefix = ISO_DATE_PREFIX_RE.captures(value)?.get(1)?.as_str();
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

fn revive_expected_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_day(text).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid expectedDay value `{text}`"))
        }),
    }
}
