//! Plain-text rendering of cards, the priority matrix and the timeline.
//!
//! Every renderer builds into a `String` through `fmt::Write` and returns
//! `fmt::Result`-style errors instead of printing directly.

use chrono::NaiveDate;
use projboard_core::{layout_matrix, partition_timeline, timeline_entries, Emphasis, Project};
use std::fmt::{self, Write};

const GRID_WIDTH: usize = 41;
const GRID_HEIGHT: usize = 21;
const SHORT_ID_LEN: usize = 8;
const NO_DATE: &str = "No date";

/// One line per project in insertion order: number, short id, title,
/// scores and expected day.
pub fn project_list(projects: &[Project]) -> Result<String, fmt::Error> {
    if projects.is_empty() {
        return Ok(
            "No projects yet. Use `projboard add --title ...` to create one.\n".to_string(),
        );
    }

    let mut out = String::new();
    for (index, project) in projects.iter().enumerate() {
        let due = project
            .expected_day
            .map(|day| day.to_string())
            .unwrap_or_else(|| NO_DATE.to_string());
        writeln!(
            out,
            "{:>3}. {}  {:<32} E:{:<2} B:{:<2} {}",
            index + 1,
            short_id(project),
            project.title,
            project.effort,
            project.benefit,
            due
        )?;
    }
    Ok(out)
}

/// Expanded card: scores, day, filled narrative sections, links and
/// timestamps.
pub fn project_card(project: &Project) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{}", project.title)?;
    writeln!(out, "  id:       {}", project.id)?;
    writeln!(
        out,
        "  scores:   Effort {} / Benefit {}",
        project.effort, project.benefit
    )?;
    writeln!(
        out,
        "  expected: {}",
        project
            .expected_day
            .map(|day| day.to_string())
            .unwrap_or_else(|| NO_DATE.to_string())
    )?;
    for (field, text) in project.narrative.filled() {
        writeln!(out, "  {}:", field.label())?;
        for line in text.lines() {
            writeln!(out, "    {line}")?;
        }
    }
    if !project.images.is_empty() {
        writeln!(out, "  images:")?;
        for url in &project.images {
            writeln!(out, "    - {url}")?;
        }
    }
    if !project.attachments.is_empty() {
        writeln!(out, "  attachments:")?;
        for attachment in &project.attachments {
            writeln!(out, "    - {} <{}>", attachment.name, attachment.url)?;
        }
    }
    writeln!(
        out,
        "  created:  {}\n  updated:  {}",
        project.created_at.to_rfc3339(),
        project.updated_at.to_rfc3339()
    )?;
    Ok(out)
}

/// Draws a character grid with benefit rising upward and effort rising
/// rightward, followed by a legend of markers.
pub fn matrix(projects: &[Project]) -> Result<String, fmt::Error> {
    let balls = layout_matrix(projects);
    let mut grid = vec![vec!['.'; GRID_WIDTH]; GRID_HEIGHT];
    for (row, line) in grid.iter_mut().enumerate() {
        for (col, cell) in line.iter_mut().enumerate() {
            if col == GRID_WIDTH / 2 && row == GRID_HEIGHT / 2 {
                *cell = '+';
            } else if col == GRID_WIDTH / 2 {
                *cell = '|';
            } else if row == GRID_HEIGHT / 2 {
                *cell = '-';
            } else {
                *cell = ' ';
            }
        }
    }
    for (index, ball) in balls.iter().enumerate() {
        let col = grid_cell(ball.point.x_pct, GRID_WIDTH);
        let row = grid_cell(ball.point.y_pct, GRID_HEIGHT);
        grid[row][col] = marker(index);
    }

    let mut out = String::new();
    writeln!(out, "Benefit ^")?;
    for line in &grid {
        writeln!(out, "  |{}", line.iter().collect::<String>())?;
    }
    writeln!(out, "  +{}> Effort", "-".repeat(GRID_WIDTH))?;

    if balls.is_empty() {
        writeln!(out, "\n(no projects to plot)")?;
        return Ok(out);
    }
    writeln!(out)?;
    for (index, ball) in balls.iter().enumerate() {
        writeln!(
            out,
            "  {} [{}] {:<10} {:<26} x={:.1}% y={:.1}% d={:.1}px {}",
            marker(index),
            ball.badge,
            ball.slot.token(),
            ball.quadrant.label(),
            ball.point.x_pct,
            ball.point.y_pct,
            ball.point.diameter_px,
            ball.tooltip
        )?;
    }
    Ok(out)
}

/// Dated group labelled against `today`, then the backlog.
pub fn timeline(projects: &[Project], today: NaiveDate) -> Result<String, fmt::Error> {
    let partition = partition_timeline(projects);
    let entries = timeline_entries(&partition, today);
    let mut out = String::new();

    writeln!(out, "Timeline")?;
    if entries.is_empty() {
        writeln!(out, "  (nothing scheduled)")?;
    }
    for entry in &entries {
        let flag = match entry.emphasis {
            Emphasis::Emphasized => "  <- today",
            Emphasis::Overdue => "  (overdue)",
            Emphasis::Neutral => "",
        };
        writeln!(out, "  {:<14} {}{}", entry.label, entry.title, flag)?;
    }

    writeln!(out, "Backlog")?;
    if partition.backlog.is_empty() {
        writeln!(out, "  (empty)")?;
    }
    for project in &partition.backlog {
        writeln!(out, "  {:<14} {}", NO_DATE, project.title)?;
    }
    Ok(out)
}

fn short_id(project: &Project) -> String {
    project.id.to_string().chars().take(SHORT_ID_LEN).collect()
}

fn grid_cell(pct: f64, cells: usize) -> usize {
    let scaled = (pct / 100.0 * (cells - 1) as f64).round();
    (scaled.max(0.0) as usize).min(cells - 1)
}

/// Single-character marker for the `index`-th ball: 1-9, then a-z.
fn marker(index: usize) -> char {
    const MARKERS: &[u8] = b"123456789abcdefghijklmnopqrstuvwxyz";
    MARKERS.get(index).map_or('*', |byte| char::from(*byte))
}
