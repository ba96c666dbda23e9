//! `projboard` command-line front end.
//!
//! # Responsibility
//! - Stand in for the dashboard form, cards, top bar and export button.
//! - Enforce presentation-boundary rules (a project needs a title).
//!
//! # Invariants
//! - Every mutation goes through `ProjectStore`; this binary never touches
//!   storage directly.

mod render;

use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{error, warn};
use projboard_core::{
    init_logging, screenshot_file_name, write_snapshot, BlobProjectRepository, BlobStorage,
    BoardConfig, Clock, ConfigOverrides, DashboardSnapshot, DayChange, LoadOutcome,
    NarrativeField, PersistOutcome, ProjectDraft, ProjectId, ProjectPatch, ProjectStore, Score,
    StorageBackend,
};
use std::path::PathBuf;
use std::process::ExitCode;

type Store = ProjectStore<BlobProjectRepository<Box<dyn BlobStorage>>>;

const MIN_ID_PREFIX: usize = 4;

const NARRATIVE_ARGS: [(&str, NarrativeField, &str); 6] = [
    ("scope", NarrativeField::DiscoveryAndScope, "Discovery and scope notes"),
    ("complexity", NarrativeField::ComplexityFactors, "Complexity factors"),
    ("blockers", NarrativeField::Blockers, "Known blockers"),
    ("needs", NarrativeField::NeedsAndDependencies, "Needs and dependencies"),
    ("next", NarrativeField::NextSteps, "Next steps"),
    ("research", NarrativeField::ResearchFocus, "Research focus"),
];

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn build_cli() -> Command {
    Command::new("projboard")
        .version(projboard_core::core_version())
        .about("Track projects on an effort/benefit matrix and a timeline")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding board data, config.json and logs"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .global(true)
                .value_parser(["file", "sqlite"])
                .help("Storage backend"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("trace|debug|info|warn|error"),
        )
        .subcommand(with_project_fields(
            Command::new("add").about("Create a project").arg(
                Arg::new("title")
                    .long("title")
                    .required(true)
                    .help("Project title (must not be blank)"),
            ),
            true,
        ))
        .subcommand(with_project_fields(
            Command::new("edit")
                .about("Update fields of an existing project")
                .arg(id_arg())
                .arg(Arg::new("title").long("title").help("New title"))
                .arg(
                    Arg::new("clear-due")
                        .long("clear-due")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("due")
                        .help("Move the project back to the backlog"),
                ),
            false,
        ))
        .subcommand(
            Command::new("remove")
                .about("Delete a project")
                .arg(id_arg()),
        )
        .subcommand(Command::new("list").about("List projects in insertion order"))
        .subcommand(
            Command::new("show")
                .about("Show every field of one project")
                .arg(id_arg()),
        )
        .subcommand(Command::new("matrix").about("Plot projects on the priority matrix"))
        .subcommand(Command::new("timeline").about("Show dated projects and the backlog"))
        .subcommand(Command::new("save").about("Re-save the whole board"))
        .subcommand(
            Command::new("export")
                .about("Write a JSON dashboard snapshot")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Target directory (defaults to the current directory)"),
                ),
        )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .help("Project id or a unique prefix of it")
}

/// Adds score, date, narrative and link options shared by `add` and `edit`.
///
/// `add` defaults scores to zero; `edit` leaves them unset so stored values
/// survive unless given.
fn with_project_fields(command: Command, default_scores: bool) -> Command {
    let score = |name: &'static str| {
        let arg = Arg::new(name)
            .long(name)
            .value_parser(value_parser!(i64))
            .help("Score 0-10 (out-of-range values are clamped)");
        if default_scores {
            arg.default_value("0")
        } else {
            arg
        }
    };

    let command = command
        .arg(score("effort"))
        .arg(score("benefit"))
        .arg(
            Arg::new("due")
                .long("due")
                .value_parser(parse_day_arg)
                .help("Expected day, YYYY-MM-DD"),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .action(ArgAction::Append)
                .help("Image URL (repeatable)"),
        )
        .arg(
            Arg::new("attachment")
                .long("attachment")
                .action(ArgAction::Append)
                .value_parser(parse_attachment_arg)
                .help("Attachment as NAME=URL (repeatable)"),
        );

    NARRATIVE_ARGS
        .iter()
        .fold(command, |command, (name, _, help)| {
            command.arg(Arg::new(*name).long(*name).help(*help))
        })
}

fn parse_day_arg(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn parse_attachment_arg(value: &str) -> Result<(String, String), String> {
    let (name, url) = value
        .split_once('=')
        .ok_or_else(|| "expected NAME=URL".to_string())?;
    let (name, url) = (name.trim(), url.trim());
    if name.is_empty() || url.is_empty() {
        return Err("attachment name and url must not be blank".to_string());
    }
    Ok((name.to_string(), url.to_string()))
}

fn run(matches: &ArgMatches) -> Result<(), String> {
    let overrides = ConfigOverrides {
        data_dir: matches.get_one::<PathBuf>("data-dir").cloned(),
        backend: matches
            .get_one::<String>("backend")
            .map(|value| value.parse::<StorageBackend>())
            .transpose()?,
        log_level: matches.get_one::<String>("log-level").cloned(),
    };
    let config = BoardConfig::resolve(&overrides)?;

    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let repo = config.open_repository().map_err(|err| {
        error!(
            "event=cli_open module=cli status=error backend={} error={err}",
            config.backend.as_str()
        );
        format!("cannot open {} storage: {err}", config.backend.as_str())
    })?;
    let mut store = ProjectStore::new(repo);
    if let LoadOutcome::Recovered { reason } = store.load() {
        eprintln!("warning: stored board was unreadable and has been ignored ({reason})");
    }

    match matches.subcommand() {
        Some(("add", args)) => add(&mut store, args),
        Some(("edit", args)) => edit(&mut store, args),
        Some(("remove", args)) => remove(&mut store, args),
        Some(("list", _)) => emit(render::project_list(store.projects())),
        Some(("show", args)) => {
            let id = resolve_id(&store, args)?;
            let project = store
                .get(id)
                .ok_or_else(|| format!("project {id} not found"))?;
            emit(render::project_card(project))
        }
        Some(("matrix", _)) => emit(render::matrix(store.projects())),
        Some(("timeline", _)) => emit(render::timeline(
            store.projects(),
            store.clock().today(),
        )),
        Some(("save", _)) => {
            report_persist(store.save_all());
            println!("Saved {} project(s).", store.len());
            Ok(())
        }
        Some(("export", args)) => {
            export(&store, args);
            Ok(())
        }
        _ => Err("unknown command".to_string()),
    }
}

fn add(store: &mut Store, args: &ArgMatches) -> Result<(), String> {
    let title = args.get_one::<String>("title").cloned().unwrap_or_default();
    let mut draft = ProjectDraft::new(
        title.trim(),
        args.get_one::<i64>("effort").copied().unwrap_or(0),
        args.get_one::<i64>("benefit").copied().unwrap_or(0),
    );
    if !draft.has_title() {
        return Err("a project needs a non-blank --title".to_string());
    }
    for (name, field, _) in NARRATIVE_ARGS {
        if let Some(value) = args.get_one::<String>(name) {
            draft.narrative.set(field, value.as_str());
        }
    }
    for url in args.get_many::<String>("image").into_iter().flatten() {
        draft.add_image(url);
    }
    for (name, url) in args
        .get_many::<(String, String)>("attachment")
        .into_iter()
        .flatten()
    {
        draft.add_attachment(name, url);
    }
    draft.expected_day = args.get_one::<NaiveDate>("due").copied();

    let saved = store.create(draft);
    report_persist(saved.persist);
    println!("Created {} ({})", saved.value.title, saved.value.id);
    Ok(())
}

fn edit(store: &mut Store, args: &ArgMatches) -> Result<(), String> {
    let id = resolve_id(store, args)?;
    let patch = patch_from_args(args)?;
    if patch.is_empty() {
        return Err("nothing to change; pass at least one field flag".to_string());
    }

    let saved = store.update(id, patch);
    report_persist(saved.persist);
    match saved.value {
        Some(project) => println!("Updated {} ({})", project.title, project.id),
        None => println!("No project with id {id}; nothing changed."),
    }
    Ok(())
}

fn patch_from_args(args: &ArgMatches) -> Result<ProjectPatch, String> {
    let mut patch = ProjectPatch::default();
    if let Some(title) = args.get_one::<String>("title") {
        if title.trim().is_empty() {
            return Err("--title must not be blank".to_string());
        }
        patch.title = Some(title.trim().to_string());
    }
    patch.effort = args.get_one::<i64>("effort").map(|value| Score::new(*value));
    patch.benefit = args.get_one::<i64>("benefit").map(|value| Score::new(*value));
    for (name, field, _) in NARRATIVE_ARGS {
        if let Some(value) = args.get_one::<String>(name) {
            patch.narrative.insert(field, value.clone());
        }
    }
    if let Some(urls) = args.get_many::<String>("image") {
        let mut draft = ProjectDraft::default();
        urls.for_each(|url| {
            draft.add_image(url);
        });
        patch.images = Some(draft.images);
    }
    if let Some(pairs) = args.get_many::<(String, String)>("attachment") {
        let mut draft = ProjectDraft::default();
        pairs.for_each(|(name, url)| {
            draft.add_attachment(name, url);
        });
        patch.attachments = Some(draft.attachments);
    }
    patch.expected_day = match (args.get_one::<NaiveDate>("due"), args.get_flag("clear-due")) {
        (Some(day), _) => DayChange::Set(*day),
        (None, true) => DayChange::Clear,
        (None, false) => DayChange::Keep,
    };
    Ok(patch)
}

fn remove(store: &mut Store, args: &ArgMatches) -> Result<(), String> {
    let id = resolve_id(store, args)?;
    let saved = store.delete(id);
    report_persist(saved.persist);
    if saved.value {
        println!("Removed {id}");
    } else {
        println!("No project with id {id}; nothing removed.");
    }
    Ok(())
}

fn export(store: &Store, args: &ArgMatches) {
    let dir = args
        .get_one::<PathBuf>("out")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let snapshot = DashboardSnapshot::build(store.projects(), store.clock());
    match write_snapshot(&dir, &snapshot) {
        Ok(path) => println!(
            "Exported {} (name screen captures {})",
            path.display(),
            screenshot_file_name(snapshot.export_day())
        ),
        Err(err) => {
            error!("event=dashboard_export module=cli status=error error={err}");
            eprintln!("warning: export failed: {err}");
        }
    }
}

/// Accepts a full id, or a unique prefix of at least `MIN_ID_PREFIX` chars.
fn resolve_id(store: &Store, args: &ArgMatches) -> Result<ProjectId, String> {
    let raw = args
        .get_one::<String>("id")
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if let Ok(id) = ProjectId::parse_str(&raw) {
        return Ok(id);
    }
    if raw.len() < MIN_ID_PREFIX {
        return Err(format!(
            "id `{raw}` is too short; give at least {MIN_ID_PREFIX} characters"
        ));
    }

    let mut matching = store
        .projects()
        .iter()
        .filter(|project| project.id.to_string().starts_with(&raw));
    match (matching.next(), matching.next()) {
        (Some(project), None) => Ok(project.id),
        (None, _) => Err(format!("no project id starts with `{raw}`")),
        (Some(_), Some(_)) => Err(format!("id prefix `{raw}` is ambiguous")),
    }
}

fn emit(rendered: Result<String, std::fmt::Error>) -> Result<(), String> {
    print!("{}", rendered.map_err(|err| format!("cannot render output: {err}"))?);
    Ok(())
}

fn report_persist(outcome: PersistOutcome) {
    if let PersistOutcome::Failed(reason) = outcome {
        warn!("event=cli_persist module=cli status=error");
        eprintln!("warning: change kept in memory but not saved: {reason}");
    }
}
