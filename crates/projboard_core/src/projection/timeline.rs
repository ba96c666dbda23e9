//! Timeline partitioning and date labels.
//!
//! # Invariants
//! - Every input project lands in exactly one of `dated` / `backlog`.
//! - `dated` is ascending by `expected_day`; equal days keep input order.
//! - `backlog` keeps input order.

use crate::model::project::{Project, ProjectId};
use crate::projection::matrix::identity_hue;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::{Display, Formatter};

const DISPLAY_DATE_FORMAT: &str = "%b %d, %Y";

/// Projects split for temporal display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelinePartition<'a> {
    pub dated: Vec<&'a Project>,
    pub backlog: Vec<&'a Project>,
}

/// Splits `projects` into scheduled (sorted) and backlog groups.
pub fn partition_timeline(projects: &[Project]) -> TimelinePartition<'_> {
    let (mut dated, backlog): (Vec<&Project>, Vec<&Project>) =
        projects.iter().partition(|project| project.is_scheduled());
    // `sort_by_key` is stable, which gives the tie-break on input order.
    dated.sort_by_key(|project| project.expected_day);
    TimelinePartition { dated, backlog }
}

/// Relative label for a scheduled day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLabel {
    Today,
    Tomorrow,
    Yesterday,
    On(NaiveDate),
}

impl Display for DateLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Today => f.write_str("Today"),
            Self::Tomorrow => f.write_str("Tomorrow"),
            Self::Yesterday => f.write_str("Yesterday"),
            Self::On(day) => write!(f, "{}", day.format(DISPLAY_DATE_FORMAT)),
        }
    }
}

/// Display emphasis for a scheduled day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Emphasized,
    Overdue,
    Neutral,
}

/// Labels `day` relative to `today` by calendar-day distance.
pub fn classify_day(day: NaiveDate, today: NaiveDate) -> DateLabel {
    match (day - today).num_days() {
        0 => DateLabel::Today,
        1 => DateLabel::Tomorrow,
        -1 => DateLabel::Yesterday,
        _ => DateLabel::On(day),
    }
}

/// Today is emphasized, any earlier day is overdue, later days are neutral.
pub fn day_emphasis(day: NaiveDate, today: NaiveDate) -> Emphasis {
    if day == today {
        Emphasis::Emphasized
    } else if day < today {
        Emphasis::Overdue
    } else {
        Emphasis::Neutral
    }
}

/// Render-ready row for the dated group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub project_id: ProjectId,
    pub title: String,
    pub day: NaiveDate,
    pub label: String,
    pub emphasis: Emphasis,
    pub hue: f64,
}

/// Builds labelled rows for the dated group, evaluated against `today`.
pub fn timeline_entries(partition: &TimelinePartition<'_>, today: NaiveDate) -> Vec<TimelineEntry> {
    partition
        .dated
        .iter()
        .filter_map(|project| {
            let day = project.expected_day?;
            Some(TimelineEntry {
                project_id: project.id,
                title: project.title.clone(),
                day,
                label: classify_day(day, today).to_string(),
                emphasis: day_emphasis(day, today),
                hue: identity_hue(&project.id),
            })
        })
        .collect()
}
