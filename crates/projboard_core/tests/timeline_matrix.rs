use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use projboard_core::{
    layout_matrix, partition_timeline, timeline_entries, BlobProjectRepository, Clock,
    DashboardSnapshot, Emphasis, ManualClock, MemoryStorage, Project, ProjectDraft, ProjectStore,
    Quadrant,
};
use std::collections::HashSet;
use uuid::Uuid;

fn project(title: &str, effort: i64, benefit: i64, day: Option<(i32, u32, u32)>) -> Project {
    let mut draft = ProjectDraft::new(title, effort, benefit);
    draft.expected_day = day.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    Project::from_draft(Uuid::new_v4(), draft, now)
}

fn titles(projects: &[&Project]) -> Vec<String> {
    projects.iter().map(|p| p.title.clone()).collect()
}

#[test]
fn partition_covers_input_exactly_once() {
    let projects = vec![
        project("a", 1, 1, Some((2026, 5, 1))),
        project("b", 1, 1, None),
        project("c", 1, 1, Some((2026, 4, 1))),
        project("d", 1, 1, None),
    ];
    let partition = partition_timeline(&projects);

    let dated: HashSet<_> = partition.dated.iter().map(|p| p.id).collect();
    let backlog: HashSet<_> = partition.backlog.iter().map(|p| p.id).collect();
    let all: HashSet<_> = projects.iter().map(|p| p.id).collect();

    assert!(dated.is_disjoint(&backlog));
    assert_eq!(&dated | &backlog, all);
    assert!(partition.dated.iter().all(|p| p.expected_day.is_some()));
    assert!(partition.backlog.iter().all(|p| p.expected_day.is_none()));
}

#[test]
fn dated_group_sorts_ascending_with_stable_ties() {
    let projects = vec![
        project("late", 1, 1, Some((2026, 9, 1))),
        project("tie-first", 1, 1, Some((2026, 3, 1))),
        project("early", 1, 1, Some((2025, 12, 31))),
        project("tie-second", 1, 1, Some((2026, 3, 1))),
    ];
    let partition = partition_timeline(&projects);

    assert_eq!(
        titles(&partition.dated),
        vec!["early", "tie-first", "tie-second", "late"]
    );
    for pair in partition.dated.windows(2) {
        assert!(pair[0].expected_day <= pair[1].expected_day);
    }
}

#[test]
fn undated_projects_stay_in_backlog_in_insertion_order() {
    let projects = vec![project("first", 3, 3, None), project("second", 4, 4, None)];
    let partition = partition_timeline(&projects);

    assert!(partition.dated.is_empty());
    assert_eq!(titles(&partition.backlog), vec!["first", "second"]);
}

#[test]
fn timeline_entries_label_against_given_today() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    let projects = vec![
        project("overdue", 1, 1, Some((2026, 10, 1))),
        project("yesterday", 1, 1, Some((2026, 10, 15))),
        project("today", 1, 1, Some((2026, 10, 16))),
        project("tomorrow", 1, 1, Some((2026, 10, 17))),
        project("later", 1, 1, Some((2026, 11, 20))),
    ];
    let partition = partition_timeline(&projects);
    let entries = timeline_entries(&partition, today);

    let labels: Vec<_> = entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Oct 01, 2026", "Yesterday", "Today", "Tomorrow", "Nov 20, 2026"]
    );
    let emphasis: Vec<_> = entries.iter().map(|e| e.emphasis).collect();
    assert_eq!(
        emphasis,
        vec![
            Emphasis::Overdue,
            Emphasis::Overdue,
            Emphasis::Emphasized,
            Emphasis::Neutral,
            Emphasis::Neutral
        ]
    );
}

#[test]
fn matrix_layout_follows_render_order() {
    let projects = vec![
        project("Alpha", 2, 8, None),
        project("zeta", 10, 10, None),
    ];
    let balls = layout_matrix(&projects);

    assert_eq!(balls.len(), 2);
    assert_eq!(balls[0].badge, "AL");
    assert_eq!(balls[0].tooltip, "Alpha (E:2, B:8)");
    assert_eq!(balls[0].slot.token(), "project-1");
    assert_eq!(balls[0].quadrant, Quadrant::LowEffortHighBenefit);
    assert_eq!((balls[0].point.x_pct, balls[0].point.y_pct), (20.0, 20.0));
    assert_eq!(balls[0].point.diameter_px, 36.0);

    assert_eq!(balls[1].slot.token(), "project-2");
    assert_eq!((balls[1].point.x_pct, balls[1].point.y_pct), (95.0, 5.0));
    assert_eq!(balls[1].point.diameter_px, 48.0);

    let reversed: Vec<_> = projects.iter().rev().cloned().collect();
    let reordered = layout_matrix(&reversed);
    assert_eq!(reordered[0].project_id, projects[1].id);
    assert_eq!(reordered[0].slot.token(), "project-1");
}

#[test]
fn snapshot_combines_matrix_and_timeline() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap());
    let projects = vec![
        project("Dated", 5, 5, Some((2026, 10, 16))),
        project("Someday", 1, 9, None),
    ];
    let snapshot = DashboardSnapshot::build(&projects, &clock);

    assert_eq!(snapshot.project_count, 2);
    assert_eq!(snapshot.matrix.len(), 2);
    assert_eq!(snapshot.timeline.len(), 1);
    assert_eq!(snapshot.timeline[0].label, "Today");
    assert_eq!(snapshot.backlog, vec![projects[1].id]);

    let dir = tempfile::tempdir().unwrap();
    let path = projboard_core::write_snapshot(dir.path(), &snapshot).unwrap();
    assert!(path.ends_with("dashboard-2026-10-16.json"));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["generatedOn"], "2026-10-16");
    assert_eq!(written["matrix"][0]["slot"], "project-1");
    assert_eq!(written["timeline"][0]["emphasis"], "emphasized");
}

#[test]
fn store_clock_drives_timeline_labels() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap());
    let repo = BlobProjectRepository::new(MemoryStorage::new());
    let mut store = ProjectStore::with_clock(repo, &clock);
    let mut draft = ProjectDraft::new("Launch", 4, 8);
    draft.expected_day = Some(store.clock().today());
    store.create(draft);

    let today = store.clock().today();
    let entries = timeline_entries(&partition_timeline(store.projects()), today);
    assert_eq!(entries[0].label, "Today");
    assert_eq!(entries[0].emphasis, Emphasis::Emphasized);

    clock.advance(Duration::days(1));
    let today = store.clock().today();
    let entries = timeline_entries(&partition_timeline(store.projects()), today);
    assert_eq!(entries[0].label, "Yesterday");
    assert_eq!(entries[0].emphasis, Emphasis::Overdue);
}

#[test]
fn export_names_use_utc_day_while_labels_use_local_day() {
    // 23:30 UTC is already the next morning east of Greenwich.
    let clock = AheadOfUtcClock(Utc.with_ymd_and_hms(2026, 10, 16, 23, 30, 0).unwrap());
    let projects = vec![project("Tomorrow in UTC", 3, 3, Some((2026, 10, 17)))];

    let snapshot = DashboardSnapshot::build(&projects, &clock);
    assert_eq!(snapshot.generated_on, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
    assert_eq!(snapshot.export_day(), NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
    assert_eq!(snapshot.timeline[0].label, "Today");

    let dir = tempfile::tempdir().unwrap();
    let path = projboard_core::write_snapshot(dir.path(), &snapshot).unwrap();
    assert!(path.ends_with("dashboard-2026-10-16.json"));
}

/// Clock whose local day runs one day ahead of its UTC day.
struct AheadOfUtcClock(DateTime<Utc>);

impl Clock for AheadOfUtcClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }

    fn today(&self) -> NaiveDate {
        (self.0 + Duration::hours(2)).date_naive()
    }
}
