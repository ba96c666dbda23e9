//! Priority matrix geometry.
//!
//! # Invariants
//! - `x_pct` and `y_pct` are always within `[EDGE_PADDING_PCT, 100 - EDGE_PADDING_PCT]`.
//! - `diameter_px` is always within `[BASE_DIAMETER_PX, MAX_DIAMETER_PX]`.
//! - Palette slots are positional: they follow render order, not identity.

use crate::model::project::{Project, ProjectId, Score};
use serde::Serialize;

pub const EDGE_PADDING_PCT: f64 = 5.0;
pub const BASE_DIAMETER_PX: f64 = 24.0;
pub const MAX_DIAMETER_PX: f64 = BASE_DIAMETER_PX * 2.0;
pub const PALETTE_SIZE: usize = 10;

/// Scores at or above this are "high" for quadrant purposes.
const QUADRANT_SPLIT: u8 = 5;
const BADGE_CHARS: usize = 2;

/// Plot position (percent of width/height from top-left) and marker size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatrixPoint {
    pub x_pct: f64,
    pub y_pct: f64,
    pub diameter_px: f64,
}

/// Maps a score pair onto the plot.
///
/// Effort grows to the right; benefit grows upward, so the vertical axis is
/// inverted relative to raw percentage.
pub fn project_point(effort: Score, benefit: Score) -> MatrixPoint {
    let max = f64::from(Score::MAX);
    let effort = f64::from(effort.get());
    let benefit = f64::from(benefit.get());

    let x = effort / max * 100.0;
    let y = 100.0 - benefit / max * 100.0;

    MatrixPoint {
        x_pct: clamp_to_plot(x),
        y_pct: clamp_to_plot(y),
        diameter_px: marker_diameter(effort + benefit),
    }
}

fn clamp_to_plot(pct: f64) -> f64 {
    pct.clamp(EDGE_PADDING_PCT, 100.0 - EDGE_PADDING_PCT)
}

fn marker_diameter(total_score: f64) -> f64 {
    let max_total = f64::from(Score::MAX) * 2.0;
    let size = BASE_DIAMETER_PX + total_score / max_total * (MAX_DIAMETER_PX - BASE_DIAMETER_PX);
    size.min(MAX_DIAMETER_PX)
}

/// One of the ten palette colors, numbered 1..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct PaletteSlot(u8);

impl PaletteSlot {
    pub fn number(self) -> u8 {
        self.0
    }

    /// Theme token, e.g. `project-3`.
    pub fn token(self) -> String {
        format!("project-{}", self.0)
    }
}

impl From<PaletteSlot> for String {
    fn from(value: PaletteSlot) -> Self {
        value.token()
    }
}

/// Color slot for the project at `index` in the current render order.
pub fn palette_slot(index: usize) -> PaletteSlot {
    PaletteSlot((index % PALETTE_SIZE) as u8 + 1)
}

/// Order-independent hue derived from the id's first character.
///
/// Used for timeline dots, where a color must survive re-sorting.
pub fn identity_hue(id: &ProjectId) -> f64 {
    let first = id
        .to_string()
        .chars()
        .next()
        .map_or(0, u32::from);
    (f64::from(first) * 137.508) % 360.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    LowEffortHighBenefit,
    HighEffortHighBenefit,
    LowEffortLowBenefit,
    HighEffortLowBenefit,
}

impl Quadrant {
    pub fn classify(effort: Score, benefit: Score) -> Self {
        let high_effort = effort.get() >= QUADRANT_SPLIT;
        let high_benefit = benefit.get() >= QUADRANT_SPLIT;
        match (high_effort, high_benefit) {
            (false, true) => Self::LowEffortHighBenefit,
            (true, true) => Self::HighEffortHighBenefit,
            (false, false) => Self::LowEffortLowBenefit,
            (true, false) => Self::HighEffortLowBenefit,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LowEffortHighBenefit => "Low Effort, High Benefit",
            Self::HighEffortHighBenefit => "High Effort, High Benefit",
            Self::LowEffortLowBenefit => "Low Effort, Low Benefit",
            Self::HighEffortLowBenefit => "High Effort, Low Benefit",
        }
    }
}

/// Everything needed to draw one project marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixBall {
    pub project_id: ProjectId,
    pub badge: String,
    pub tooltip: String,
    pub point: MatrixPoint,
    pub slot: PaletteSlot,
    pub quadrant: Quadrant,
}

/// Lays out markers for `projects` in the given render order.
pub fn layout_matrix(projects: &[Project]) -> Vec<MatrixBall> {
    projects
        .iter()
        .enumerate()
        .map(|(index, project)| MatrixBall {
            project_id: project.id,
            badge: badge_text(&project.title),
            tooltip: format!(
                "{} (E:{}, B:{})",
                project.title, project.effort, project.benefit
            ),
            point: project_point(project.effort, project.benefit),
            slot: palette_slot(index),
            quadrant: Quadrant::classify(project.effort, project.benefit),
        })
        .collect()
}

fn badge_text(title: &str) -> String {
    title
        .trim()
        .chars()
        .take(BADGE_CHARS)
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        badge_text, palette_slot, project_point, Quadrant, BASE_DIAMETER_PX, MAX_DIAMETER_PX,
    };
    use crate::model::project::Score;

    #[test]
    fn alpha_scenario_stays_unclamped() {
        let point = project_point(Score::new(2), Score::new(8));
        assert_eq!(point.x_pct, 20.0);
        assert_eq!(point.y_pct, 20.0);
        assert_eq!(point.diameter_px, 36.0);
    }

    #[test]
    fn maximum_scores_clamp_to_padding_and_cap_diameter() {
        let point = project_point(Score::new(10), Score::new(10));
        assert_eq!(point.x_pct, 95.0);
        assert_eq!(point.y_pct, 5.0);
        assert_eq!(point.diameter_px, 48.0);
    }

    #[test]
    fn every_score_pair_lands_inside_padded_plot() {
        for effort in 0..=10 {
            for benefit in 0..=10 {
                let point = project_point(Score::new(effort), Score::new(benefit));
                assert!((5.0..=95.0).contains(&point.x_pct), "{effort},{benefit}");
                assert!((5.0..=95.0).contains(&point.y_pct), "{effort},{benefit}");
                assert!(
                    (BASE_DIAMETER_PX..=MAX_DIAMETER_PX).contains(&point.diameter_px),
                    "{effort},{benefit}"
                );
            }
        }
    }

    #[test]
    fn palette_wraps_every_ten_positions() {
        assert_eq!(palette_slot(0).token(), "project-1");
        assert_eq!(palette_slot(9).token(), "project-10");
        assert_eq!(palette_slot(10), palette_slot(0));
        assert_eq!(palette_slot(23).number(), 4);
    }

    #[test]
    fn quadrant_split_at_five() {
        assert_eq!(
            Quadrant::classify(Score::new(4), Score::new(5)),
            Quadrant::LowEffortHighBenefit
        );
        assert_eq!(
            Quadrant::classify(Score::new(5), Score::new(4)),
            Quadrant::HighEffortLowBenefit
        );
    }

    #[test]
    fn badge_uses_first_two_characters_uppercased() {
        assert_eq!(badge_text("alpha"), "AL");
        assert_eq!(badge_text("x"), "X");
        assert_eq!(badge_text("  über"), "ÜB");
    }
}
