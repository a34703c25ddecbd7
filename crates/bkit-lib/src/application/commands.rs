//! Command execution handlers
//!
//! Every handler takes the session, does its work through the `bkit` core and
//! returns a [`CommandReport`]. The dispatcher emits exactly one report per
//! command, so `--json` output is always a single object.

use crate::application::cli::{DepsAction, MultiProjectArgs, ProjectArgs};
use crate::application::session::{CommandSession, PromptCancelled, Session};
use crate::application::{AppConfig, CliConfig, Commands};
use crate::bkit::bump::{self, BumpSpec};
use crate::bkit::config::{Project, ScriptDependency};
use crate::bkit::manifest::{DEFAULT_SCRIPT_API_VERSION, is_bundled_package};
use crate::bkit::materialize::{Materializer, PackOutcome, Strategy};
use crate::bkit::registry::{self, Selection};
use crate::bkit::scaffold::{self, ScaffoldOptions};
use crate::bkit::sync::{self, ResolvedTarget, SyncAction, SyncEntry, SyncMode};
use crate::bkit::validate::validate_project;
use crate::bkit::watch::{self, Recovery, WatchState, WatchedProject};
use crate::bkit::package;
use crate::display::{CommandReport, ReportEntry};
use crate::primitives::{BumpLevel, PackKind, ScriptLanguage, VersionTuple};
use anyhow::{Context, Result, anyhow, bail};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A command finished but reported problems (validation issues)
#[derive(Debug, Error)]
#[error("{command} reported {count} issue(s)")]
pub struct IssuesFound {
    pub command: String,
    pub count: usize,
}

/// Execute CLI commands with a live session
pub async fn execute_command(config: CliConfig) -> Result<()> {
    let app_config = AppConfig::resolve(config.app_config)?;
    let session = CommandSession::new(app_config)?;

    let command = match config.command {
        Some(cmd) => cmd,
        None => {
            session
                .display()
                .status()
                .message("bkit - Minecraft Bedrock add-on tooling");
            session
                .display()
                .status()
                .subtle("Run 'bkit --help' for usage information");
            return Ok(());
        }
    };

    execute_command_with_session(command, &session).await
}

/// Execute a specific command with a provided session (for testing)
pub async fn execute_command_with_session(command: Commands, session: &dyn Session) -> Result<()> {
    let name = command.name();
    tracing::debug!(
        command = name,
        requires_project = command.requires_project(),
        "Executing command"
    );

    if command.recovers_watch_state() {
        recover_watch_state(session);
    } else if matches!(command, Commands::Sync { dry_run: true, .. }) {
        let path = WatchState::path_in(&session.settings().state_dir());
        if path.exists() {
            session.display().status().warning(&format!(
                "A watch session was not shut down cleanly; the next real command finalizes {}",
                path.display()
            ));
        }
    }

    let result = match command {
        Commands::Version => handle_version(session).await,
        Commands::Init {
            dir,
            name,
            description,
            language,
            no_script,
            force,
            skip_install,
        } => {
            handle_init(
                session,
                InitArgs {
                    dir,
                    name,
                    description,
                    language,
                    no_script,
                    force,
                    skip_install,
                },
            )
            .await
        }
        Commands::Build { projects } => handle_build(session, &projects).await,
        Commands::Link { project, target } => handle_link(session, &project, target).await,
        Commands::Unlink { project, target } => handle_unlink(session, &project, target).await,
        Commands::Package { project, no_build } => handle_package(session, &project, no_build).await,
        Commands::Sync {
            project,
            target,
            dry_run,
            no_build,
        } => handle_sync(session, &project, target, dry_run, no_build).await,
        Commands::Watch { projects, target } => handle_watch(session, &projects, target).await,
        Commands::Bump {
            project,
            level,
            set,
            min_engine,
        } => handle_bump(session, &project, level, set, min_engine).await,
        Commands::Deps { project, action } => handle_deps(session, &project, action).await,
        Commands::Validate { projects, strict } => handle_validate(session, &projects, strict).await,
        Commands::List => handle_list(session).await,
        Commands::Settings {
            language,
            project_root,
            clear_project_root,
        } => handle_settings(session, language, project_root, clear_project_root).await,
    };

    match result {
        Ok(report) => {
            session.display().report(&report);
            if report.ok {
                Ok(())
            } else {
                Err(IssuesFound {
                    command: name.to_string(),
                    count: report.issues.as_ref().map_or(0, Vec::len),
                }
                .into())
            }
        }
        Err(e) => {
            let message = if e.is::<PromptCancelled>() {
                "cancelled".to_string()
            } else {
                format!("{e:#}")
            };
            session
                .display()
                .report(&CommandReport::failure(message).for_command(name));
            Err(e)
        }
    }
}

/// Finalize a link-mode watch that was killed before it could clean up
fn recover_watch_state(session: &dyn Session) {
    let path = WatchState::path_in(&session.settings().state_dir());
    match watch::recover(&path, session.toolchain()) {
        Recovery::NoRecord => {}
        Recovery::Discarded { reason } => {
            session
                .display()
                .status()
                .warning(&format!("Discarded stale watch state ({reason})"));
        }
        Recovery::Finalized {
            pid,
            projects,
            failed,
        } => {
            session.display().status().warning(&format!(
                "Watch process {pid} did not shut down cleanly; finalized its links"
            ));
            for name in &projects {
                session.display().status().success(name, "finalized");
            }
            for (name, error) in &failed {
                session.display().status().error(name, error);
            }
        }
    }
}

/// Pick one project: `--project`, the working directory, or a prompt
fn resolve_project(session: &dyn Session, args: &ProjectArgs) -> Result<Project> {
    let workdir = session.workdir()?;
    let search_root = session.settings().search_root(&workdir);

    match registry::select(args.project.as_deref(), &workdir, &search_root)? {
        Selection::One(project) => Ok(*project),
        Selection::Ambiguous(candidates) => {
            let labels: Vec<String> = candidates.iter().map(|c| c.label()).collect();
            let index = session
                .interactive()
                .fuzzy_select("Select a project", &labels)?
                .ok_or(PromptCancelled)?;
            let chosen = candidates
                .get(index)
                .ok_or_else(|| anyhow!("No project at selection {index}"))?;
            Ok(chosen.load()?)
        }
    }
}

fn resolve_projects(session: &dyn Session, args: &MultiProjectArgs) -> Result<Vec<Project>> {
    if args.all {
        let workdir = session.workdir()?;
        let search_root = session.settings().search_root(&workdir);
        Ok(registry::load_all(&search_root)?)
    } else {
        Ok(vec![resolve_project(session, &args.selection)?])
    }
}

fn resolve_target(session: &dyn Session, project: &Project, target: Option<&str>) -> Result<ResolvedTarget> {
    Ok(sync::resolve_target(
        project,
        target,
        session.toolchain().roots.as_ref(),
    )?)
}

fn show_outcomes(session: &dyn Session, outcomes: &[PackOutcome]) {
    for outcome in outcomes {
        match outcome {
            PackOutcome::Done {
                kind,
                strategy,
                dest,
                bundled,
                ..
            } => {
                let details = if *bundled {
                    format!("{strategy} + bundle -> {}", dest.display())
                } else {
                    format!("{strategy} -> {}", dest.display())
                };
                session.display().status().success(&kind.to_string(), &details);
            }
            PackOutcome::Skipped { kind, reason } => {
                session
                    .display()
                    .status()
                    .subtle(&format!("{kind}: skipped ({reason})"));
            }
        }
    }
}

fn show_entries(session: &dyn Session, entries: &[SyncEntry]) -> Vec<ReportEntry> {
    entries
        .iter()
        .map(|entry| {
            let report = entry.to_report_entry();
            let dest = report.dest.clone().unwrap_or_default();
            if entry.is_applied() {
                session
                    .display()
                    .status()
                    .success(&report.pack, &format!("{} -> {dest}", report.action));
            } else {
                session
                    .display()
                    .status()
                    .subtle(&format!("{}: {}", report.pack, report.action));
            }
            report
        })
        .collect()
}

fn build(session: &dyn Session, project: &Project, strategy: Strategy) -> Result<Vec<PackOutcome>> {
    let spinner = session
        .display()
        .progress()
        .spinner(&format!("Building {} ({strategy})", project.name()));

    let outcome = Materializer::new(project, session.toolchain())
        .and_then(|materializer| materializer.build(strategy));

    match outcome {
        Ok(outcomes) => {
            spinner.finish(&format!("Built {}", project.name()));
            show_outcomes(session, &outcomes);
            Ok(outcomes)
        }
        Err(e) => {
            spinner.abandon(&format!("Build of {} failed", project.name()));
            Err(e).with_context(|| format!("Failed to build {}", project.name()))
        }
    }
}

async fn handle_version(session: &dyn Session) -> Result<CommandReport> {
    let version = env!("CARGO_PKG_VERSION");
    session.display().status().message(&format!("bkit {version}"));
    session
        .display()
        .status()
        .subtle("Scaffold, build, package and deploy Bedrock add-ons");

    Ok(CommandReport::success("version").with_version(version))
}

/// Arguments of `bkit init`, gathered from the CLI
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    pub dir: Option<PathBuf>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<ScriptLanguage>,
    pub no_script: bool,
    pub force: bool,
    pub skip_install: bool,
}

const LANGUAGE_CHOICES: [&str; 3] = ["TypeScript", "JavaScript", "No scripts"];

async fn handle_init(session: &dyn Session, args: InitArgs) -> Result<CommandReport> {
    let workdir = session.workdir()?;
    let target_dir = match &args.dir {
        Some(dir) => workdir.join(dir),
        None => workdir,
    };

    let default_name = target_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("addon")
        .to_string();
    let name = match args.name {
        Some(name) => name,
        None => session.interactive().text_input("Project name", default_name)?,
    };
    scaffold::check_name(&name)?;

    let description = match args.description {
        Some(description) => description,
        None => session
            .interactive()
            .text_input("Description", format!("{name} add-on"))?,
    };

    let language = if args.no_script {
        None
    } else if let Some(language) = args.language {
        Some(language)
    } else {
        match session.interactive().select("Script language", &LANGUAGE_CHOICES)? {
            0 => Some(ScriptLanguage::Typescript),
            1 => Some(ScriptLanguage::Javascript),
            _ => None,
        }
    };

    session
        .display()
        .status()
        .section(&format!("Creating {name} in {}", target_dir.display()));

    let scaffolded = scaffold::scaffold(
        &target_dir,
        &ScaffoldOptions {
            name: name.clone(),
            description,
            language,
            force: args.force,
        },
    )?;

    for file in &scaffolded.files {
        let shown = file.strip_prefix(&target_dir).unwrap_or(file);
        session
            .display()
            .status()
            .success("created", &shown.display().to_string());
    }

    if language.is_some() {
        if args.skip_install {
            session
                .display()
                .status()
                .subtle("Skipped installing script dependencies");
        } else {
            let spinner = session
                .display()
                .progress()
                .spinner("Installing script dependencies");
            match scaffold::install_dependencies(&scaffolded.project, session.toolchain().installer.as_ref()) {
                Ok(specs) => spinner.finish(&format!("Installed {}", specs.join(", "))),
                Err(e) => {
                    spinner.abandon("Installing script dependencies failed");
                    return Err(e).context("Project created, but installing dependencies failed");
                }
            }
        }
    }

    Ok(CommandReport::success("init").with_artifacts(&scaffolded.files))
}

async fn handle_build(session: &dyn Session, args: &MultiProjectArgs) -> Result<CommandReport> {
    let projects = resolve_projects(session, args)?;
    let mut artifacts = Vec::new();

    for project in &projects {
        let outcomes = build(session, project, Strategy::Copy)?;
        artifacts.extend(outcomes.iter().filter_map(|o| o.dest().map(Path::to_path_buf)));
    }

    Ok(CommandReport::success("build").with_artifacts(&artifacts))
}

async fn handle_link(
    session: &dyn Session,
    args: &ProjectArgs,
    target: Option<String>,
) -> Result<CommandReport> {
    let project = resolve_project(session, args)?;
    let target = resolve_target(session, &project, target.as_deref())?;

    build(session, &project, Strategy::Link)?;
    let entries = sync::sync(&project, &target, SyncMode::Link, false)
        .with_context(|| format!("Failed to link target '{}'", target.name))?;

    session.display().status().info(&format!(
        "Linked to '{}'; run 'bkit unlink' to replace the links with copies",
        target.name
    ));
    let linked = show_entries(session, &entries);
    Ok(CommandReport::success("link").with_linked(linked))
}

async fn handle_unlink(
    session: &dyn Session,
    args: &ProjectArgs,
    target: Option<String>,
) -> Result<CommandReport> {
    let project = resolve_project(session, args)?;
    let target = resolve_target(session, &project, target.as_deref())?;

    let mut entries: Vec<SyncEntry> = sync::remove_target_links(&target)?
        .into_iter()
        .map(|link| SyncEntry {
            kind: owning_kind(&target, &link),
            action: SyncAction::Unlink,
            source: None,
            dest: Some(link),
            dry_run: false,
        })
        .collect();

    build(session, &project, Strategy::Copy)?;
    entries.extend(sync::sync(&project, &target, SyncMode::Copy, false)?);

    let synced = show_entries(session, &entries);
    Ok(CommandReport::success("unlink").with_synced(synced))
}

/// The pack whose destination holds `path`
fn owning_kind(target: &ResolvedTarget, path: &Path) -> PackKind {
    PackKind::ALL
        .into_iter()
        .find(|kind| target.path(*kind).is_some_and(|dest| path.starts_with(dest)))
        .unwrap_or(PackKind::Behavior)
}

async fn handle_package(
    session: &dyn Session,
    args: &ProjectArgs,
    no_build: bool,
) -> Result<CommandReport> {
    let project = resolve_project(session, args)?;
    if !no_build {
        build(session, &project, Strategy::Copy)?;
    }

    let spinner = session
        .display()
        .progress()
        .spinner(&format!("Packaging {}", project.name()));
    let artifacts = match package::package(&project, session.toolchain()) {
        Ok(artifacts) => {
            spinner.finish(&format!("Packaged {}", project.name()));
            artifacts
        }
        Err(e) => {
            spinner.abandon("Packaging failed");
            return Err(e.into());
        }
    };

    for artifact in &artifacts {
        session
            .display()
            .status()
            .success(&artifact.name, &format_size(artifact.size));
    }

    let paths: Vec<&Path> = artifacts.iter().map(|a| a.path.as_path()).collect();
    Ok(CommandReport::success("package").with_artifacts(&paths))
}

async fn handle_sync(
    session: &dyn Session,
    args: &ProjectArgs,
    target: Option<String>,
    dry_run: bool,
    no_build: bool,
) -> Result<CommandReport> {
    let project = resolve_project(session, args)?;
    let target = resolve_target(session, &project, target.as_deref())?;

    if dry_run {
        session
            .display()
            .status()
            .info("Dry run: nothing will be written");
    } else if !no_build {
        build(session, &project, Strategy::Copy)?;
    }

    let entries = sync::sync(&project, &target, SyncMode::Copy, dry_run)
        .with_context(|| format!("Failed to sync target '{}'", target.name))?;
    let synced = show_entries(session, &entries);
    Ok(CommandReport::success("sync").with_synced(synced))
}

async fn handle_watch(
    session: &dyn Session,
    args: &MultiProjectArgs,
    target: Option<String>,
) -> Result<CommandReport> {
    let projects = resolve_projects(session, args)?;
    let mut watched = Vec::with_capacity(projects.len());
    for project in projects {
        let target = resolve_target(session, &project, target.as_deref())?;
        watched.push(WatchedProject { project, target });
    }

    session.display().status().section(&format!(
        "Watching {} project(s); press Ctrl-C to stop",
        watched.len()
    ));

    let state_path = WatchState::path_in(&session.settings().state_dir());
    let summary = watch::run(
        watched,
        session.toolchain().clone(),
        state_path,
        target,
        watch::shutdown_signal(),
    )
    .await?;

    session.display().status().info(&format!(
        "{} rebuild(s), {} change(s) dropped while busy",
        summary.rebuilds, summary.dropped
    ));
    if summary.failed_rebuilds > 0 {
        session
            .display()
            .status()
            .warning(&format!("{} rebuild(s) failed", summary.failed_rebuilds));
    }
    let synced = show_entries(session, &summary.finalized);
    Ok(CommandReport::success("watch").with_synced(synced))
}

async fn handle_bump(
    session: &dyn Session,
    args: &ProjectArgs,
    level: Option<BumpLevel>,
    set: Option<String>,
    min_engine: Option<String>,
) -> Result<CommandReport> {
    let spec = match (set, level) {
        (Some(version), _) => BumpSpec::Explicit(VersionTuple::parse(&version)?),
        (None, Some(level)) => BumpSpec::Level(level),
        (None, None) => bail!("Give a bump level or --set <version>"),
    };
    let min_engine = min_engine
        .as_deref()
        .map(VersionTuple::parse)
        .transpose()?;

    let mut project = resolve_project(session, args)?;
    let outcome = bump::bump(&mut project, spec, min_engine)?;

    session.display().status().success(
        &project.name(),
        &format!("{} -> {}", outcome.previous, outcome.version),
    );
    if let Some(min_engine) = outcome.min_engine {
        session
            .display()
            .status()
            .subtle(&format!("min_engine_version set to {min_engine}"));
    }

    Ok(CommandReport::success("bump")
        .with_version(outcome.version.to_string())
        .with_artifacts(&outcome.files))
}

async fn handle_deps(
    session: &dyn Session,
    args: &ProjectArgs,
    action: DepsAction,
) -> Result<CommandReport> {
    let mut project = resolve_project(session, args)?;
    let project_dir = project.config_dir().to_path_buf();
    let config_path = project.config_path.clone();
    let name = project.name();
    let installer = session.toolchain().installer.clone();

    let Some(script) = project.config.script.as_mut() else {
        bail!(
            "{name} has no script module; add a `script` section to {} first",
            config_path.display()
        );
    };

    let mut removed = None;
    let changed = match action {
        DepsAction::List => false,
        DepsAction::Add { spec } => {
            let default_version = script
                .api_version
                .as_ref()
                .and_then(|v| v.as_str())
                .unwrap_or(DEFAULT_SCRIPT_API_VERSION)
                .to_string();
            let dependency = ScriptDependency::parse_spec(&spec, &default_version);
            let install_spec = dependency.install_spec();

            installer
                .install(&project_dir, std::slice::from_ref(&install_spec))
                .with_context(|| format!("Failed to install {install_spec}"))?;
            session.display().status().success("added", &install_spec);
            script.upsert_dependency(dependency);
            true
        }
        DepsAction::Remove { module_name } => {
            if !script.dependencies.iter().any(|d| d.module_name == module_name) {
                bail!("{module_name} is not a declared script dependency of {name}");
            }
            if script.dependencies.len() == 1 {
                bail!(
                    "{module_name} is the only script dependency of {name}; remove the `script` section from {} instead",
                    config_path.display()
                );
            }
            script.remove_dependency(&module_name);
            installer
                .uninstall(&project_dir, std::slice::from_ref(&module_name))
                .with_context(|| format!("Failed to uninstall {module_name}"))?;
            session.display().status().success("removed", &module_name);
            removed = Some(module_name);
            true
        }
    };

    let dependencies = script.dependencies.clone();
    if changed {
        project.save()?;
        if project.is_enabled(PackKind::Behavior) {
            sync_behavior_manifest(&project, removed.as_deref())?;
        }
    }

    let items: Vec<String> = dependencies.iter().map(ScriptDependency::install_spec).collect();
    let refs: Vec<&str> = items.iter().map(String::as_str).collect();
    if refs.is_empty() {
        session.display().status().subtle("No script dependencies");
    } else {
        session.display().status().list(&refs);
    }

    let values = dependencies
        .iter()
        .map(|d| {
            serde_json::json!({
                "moduleName": d.module_name,
                "version": d.version,
                "bundled": is_bundled_package(&d.module_name),
            })
        })
        .collect();
    Ok(CommandReport::success("deps").with_dependencies(values))
}

/// Rewrite the behavior manifest's script dependencies from the config
fn sync_behavior_manifest(project: &Project, removed: Option<&str>) -> Result<()> {
    let Some(script) = project.script() else {
        return Ok(());
    };
    let path = project
        .manifest_path(PackKind::Behavior)
        .context("No behavior pack configured")?;

    let mut manifest = project.load_manifest(PackKind::Behavior)?;
    if let Some(module_name) = removed {
        manifest.remove_script_dependency(module_name);
    }
    manifest.merge_script_dependencies(&script.packages())?;
    manifest.save(&path)?;
    Ok(())
}

async fn handle_validate(
    session: &dyn Session,
    args: &MultiProjectArgs,
    strict: bool,
) -> Result<CommandReport> {
    let projects = resolve_projects(session, args)?;
    let prefix = projects.len() > 1;
    let mut all_issues = Vec::new();

    for project in &projects {
        let issues = validate_project(project, strict);
        if issues.is_empty() {
            session.display().status().success(&project.name(), "valid");
            continue;
        }

        session
            .display()
            .status()
            .error(&project.name(), &format!("{} issue(s)", issues.len()));
        let refs: Vec<&str> = issues.iter().map(String::as_str).collect();
        session.display().status().list(&refs);

        all_issues.extend(issues.into_iter().map(|issue| {
            if prefix {
                format!("{}: {issue}", project.name())
            } else {
                issue
            }
        }));
    }

    Ok(CommandReport::success("validate").with_issues(all_issues))
}

async fn handle_list(session: &dyn Session) -> Result<CommandReport> {
    let workdir = session.workdir()?;
    let search_root = session.settings().search_root(&workdir);
    let found = registry::discover(&search_root)?;

    if found.is_empty() {
        session
            .display()
            .status()
            .info(&format!("No projects under {}", search_root.display()));
    }
    for project in &found {
        let shown = project
            .config_path
            .strip_prefix(&search_root)
            .unwrap_or(&project.config_path);
        session
            .display()
            .status()
            .success(&project.name, &shown.display().to_string());
    }

    let values = found
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name,
                "configPath": p.config_path.display().to_string(),
            })
        })
        .collect();
    Ok(CommandReport::success("list").with_projects(values))
}

async fn handle_settings(
    session: &dyn Session,
    language: Option<String>,
    project_root: Option<PathBuf>,
    clear_project_root: bool,
) -> Result<CommandReport> {
    let mut context = session.settings().clone();
    let changed = language.is_some() || project_root.is_some() || clear_project_root;

    if let Some(language) = language {
        context.settings.language = language;
    }
    if let Some(root) = project_root {
        let root = session.workdir()?.join(root);
        if !root.is_dir() {
            bail!("Project root {} is not a directory", root.display());
        }
        context.settings.project_root = Some(root);
    }
    if clear_project_root {
        context.settings.project_root = None;
    }

    if changed {
        context.save()?;
        session
            .display()
            .status()
            .success("saved", &context.settings_path().display().to_string());
    }

    let root = context
        .settings
        .project_root
        .as_ref()
        .map_or_else(|| "(working directory)".to_string(), |p| p.display().to_string());
    session
        .display()
        .status()
        .message(&format!("language: {}", context.settings.language));
    session
        .display()
        .status()
        .message(&format!("project root: {root}"));

    Ok(CommandReport::success("settings"))
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    match bytes {
        b if b >= MIB => format!("{:.1} MiB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.1} KiB", b as f64 / KIB as f64),
        b => format!("{b} B"),
    }
}

#[cfg(test)]
mod tests {
    include!("commands.test.rs");
}
