//! Link-mode watch loop and crash recovery
//!
//! `watch` links every project's packs into its sync target, then rebuilds a
//! project whenever one of its pack sources changes. On shutdown the target
//! links are replaced by plain copies, so the game never depends on files the
//! watcher owns.
//!
//! A [`WatchState`] record is written before the first link and deleted only
//! after finalization. Finding one on startup means a previous watcher died
//! without finalizing; [`recover`] finishes its work.

use super::config::{ConfigError, Project};
use super::externals::Toolchain;
use super::fsutil::{self, PathState};
use super::ignore::IgnoreFilter;
use super::materialize::{MaterializeError, Materializer, Strategy};
use super::sync::{self, ResolvedTarget, SyncEntry, SyncError, SyncMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

pub const WATCH_STATE_FILE: &str = "watch-link.json";
pub const LINK_MODE: &str = "link";

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to record watch state at {}: {source}", path.display())]
    State {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("File watcher failed: {0}")]
    Notify(#[from] notify::Error),

    #[error("Finalization task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedProjectRecord {
    pub name: String,
    pub config_path: PathBuf,
}

/// On-disk marker of a running link-mode watch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchState {
    pub mode: String,
    pub output_dir: PathBuf,
    pub projects: Vec<WatchedProjectRecord>,
    /// Seconds since the unix epoch
    pub started_at: u64,
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl WatchState {
    pub fn new(watched: &[WatchedProject], target: Option<String>) -> Self {
        Self {
            mode: LINK_MODE.to_string(),
            output_dir: watched
                .first()
                .map(|w| w.project.output_dir())
                .unwrap_or_default(),
            projects: watched
                .iter()
                .map(|w| WatchedProjectRecord {
                    name: w.project.name(),
                    config_path: w.project.config_path.clone(),
                })
                .collect(),
            started_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            pid: std::process::id(),
            target,
        }
    }

    /// `<settingsRoot>/.bkit/watch-link.json`
    pub fn path_in(state_dir: &Path) -> PathBuf {
        state_dir.join(WATCH_STATE_FILE)
    }

    pub fn write(&self, path: &Path) -> Result<(), WatchError> {
        fsutil::write_json(path, self).map_err(|source| WatchError::State {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn remove(path: &Path) -> Result<(), WatchError> {
        fsutil::remove_any(path)
            .map(|_| ())
            .map_err(|source| WatchError::State {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// What [`recover`] found and did
#[derive(Debug, Clone, PartialEq)]
pub enum Recovery {
    NoRecord,
    /// The record was unusable and has been deleted without finalizing
    Discarded { reason: String },
    Finalized {
        pid: u32,
        projects: Vec<String>,
        /// Projects that could not be finalized, with the error
        failed: Vec<(String, String)>,
    },
}

/// Finalize a watch session that ended without cleaning up
///
/// Runs at most once per record: the record is deleted whatever happens.
/// Failures are logged and reported, never retried.
pub fn recover(state_path: &Path, toolchain: &Toolchain) -> Recovery {
    let text = match fsutil::probe(state_path) {
        PathState::Absent => return Recovery::NoRecord,
        PathState::Error(e) => {
            tracing::warn!(path = %state_path.display(), error = %e, "Cannot inspect watch state");
            return Recovery::NoRecord;
        }
        PathState::Present(_) => std::fs::read_to_string(state_path),
    };

    let parsed = text
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<WatchState>(&text).map_err(|e| e.to_string()))
        .and_then(|state| {
            if state.mode == LINK_MODE {
                Ok(state)
            } else {
                Err(format!("unsupported mode '{}'", state.mode))
            }
        });

    let recovery = match parsed {
        Err(reason) => {
            tracing::warn!(path = %state_path.display(), %reason, "Discarding unreadable watch state");
            Recovery::Discarded { reason }
        }
        Ok(state) => {
            tracing::warn!(
                pid = state.pid,
                started_at = state.started_at,
                projects = state.projects.len(),
                "Found watch state from an interrupted session, finalizing"
            );
            let mut projects = Vec::new();
            let mut failed = Vec::new();
            for record in &state.projects {
                match finalize_record(record, state.target.as_deref(), toolchain) {
                    Ok(_) => projects.push(record.name.clone()),
                    Err(e) => {
                        tracing::warn!(project = %record.name, error = %e, "Recovery failed, discarding");
                        failed.push((record.name.clone(), e.to_string()));
                    }
                }
            }
            Recovery::Finalized {
                pid: state.pid,
                projects,
                failed,
            }
        }
    };

    if let Err(e) = WatchState::remove(state_path) {
        tracing::warn!(error = %e, "Failed to delete watch state");
    }
    recovery
}

fn finalize_record(
    record: &WatchedProjectRecord,
    target: Option<&str>,
    toolchain: &Toolchain,
) -> Result<Vec<SyncEntry>, WatchError> {
    let project = Project::load(&record.config_path)?;
    let target = sync::resolve_target(&project, target, toolchain.roots.as_ref())?;
    Ok(sync::finalize_link(&project, toolchain, &target)?)
}

/// A project under watch and where its packs are linked
#[derive(Debug, Clone)]
pub struct WatchedProject {
    pub project: Project,
    pub target: ResolvedTarget,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WatchSummary {
    pub rebuilds: usize,
    /// Change events that arrived while a rebuild was in flight
    pub dropped: usize,
    pub failed_rebuilds: usize,
    pub finalized: Vec<SyncEntry>,
}

/// Finalizes the watched projects exactly once, however the loop ends
struct Finalizer {
    watched: Vec<WatchedProject>,
    toolchain: Toolchain,
    state_path: PathBuf,
    done: AtomicBool,
}

impl Finalizer {
    /// Copy build and copy-sync run on the blocking pool, like rebuilds
    async fn finalize_blocking(self: &Arc<Self>) -> Result<Vec<SyncEntry>, WatchError> {
        let finalizer = Arc::clone(self);
        tokio::task::spawn_blocking(move || finalizer.finalize()).await?
    }

    fn finalize(&self) -> Result<Vec<SyncEntry>, WatchError> {
        if self.done.swap(true, Ordering::SeqCst) {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut first_error = None;
        for watched in &self.watched {
            match sync::finalize_link(&watched.project, &self.toolchain, &watched.target) {
                Ok(done) => entries.extend(done),
                Err(e) => {
                    tracing::warn!(project = %watched.project.name(), error = %e, "Finalization failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            // Keep the record so the next run retries the finalization
            Some(e) => Err(e.into()),
            None => {
                WatchState::remove(&self.state_path)?;
                Ok(entries)
            }
        }
    }
}

/// Resolves on interrupt, or terminate on unix
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Link, watch and rebuild until `shutdown` resolves, then finalize
pub async fn run<F>(
    watched: Vec<WatchedProject>,
    toolchain: Toolchain,
    state_path: PathBuf,
    target: Option<String>,
    shutdown: F,
) -> Result<WatchSummary, WatchError>
where
    F: Future<Output = ()>,
{
    WatchState::new(&watched, target).write(&state_path)?;

    let finalizer = Arc::new(Finalizer {
        watched,
        toolchain,
        state_path,
        done: AtomicBool::new(false),
    });

    let mut summary = match watch_loop(&finalizer.watched, &finalizer.toolchain, shutdown).await {
        Ok(summary) => summary,
        Err(e) => {
            if let Err(finalize_err) = finalizer.finalize_blocking().await {
                tracing::warn!(error = %finalize_err, "Finalization after failure also failed");
            }
            return Err(e);
        }
    };

    summary.finalized = finalizer.finalize_blocking().await?;
    tracing::info!(
        rebuilds = summary.rebuilds,
        dropped = summary.dropped,
        "Watch finished and finalized"
    );
    Ok(summary)
}

async fn watch_loop<F>(
    watched: &[WatchedProject],
    toolchain: &Toolchain,
    shutdown: F,
) -> Result<WatchSummary, WatchError>
where
    F: Future<Output = ()>,
{
    for w in watched {
        Materializer::new(&w.project, toolchain)?.build(Strategy::Link)?;
        sync::sync(&w.project, &w.target, SyncMode::Link, false)?;
        tracing::info!(project = %w.project.name(), target = %w.target.name, "Linked");
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<usize>();
    let mut watchers = Vec::with_capacity(watched.len());
    for (index, w) in watched.iter().enumerate() {
        watchers.push(watch_project(index, &w.project, tx.clone())?);
    }
    drop(tx);

    let in_flight: Vec<Arc<AtomicBool>> = watched
        .iter()
        .map(|_| Arc::new(AtomicBool::new(false)))
        .collect();
    let mut summary = WatchSummary::default();
    let mut tasks: JoinSet<(String, Result<(), MaterializeError>)> = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
            Some(index) = rx.recv() => {
                let gate = in_flight[index].clone();
                if gate.swap(true, Ordering::AcqRel) {
                    summary.dropped += 1;
                    tracing::debug!(project = %watched[index].project.name(), "Rebuild in flight, dropping change");
                    continue;
                }
                summary.rebuilds += 1;
                let project = watched[index].project.clone();
                let toolchain = toolchain.clone();
                tasks.spawn_blocking(move || {
                    let result = rebuild(&project, &toolchain);
                    gate.store(false, Ordering::Release);
                    (project.name(), result)
                });
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if !log_rebuild(joined) {
                    summary.failed_rebuilds += 1;
                }
            }
            else => break,
        }
    }

    drop(watchers);
    while let Some(joined) = tasks.join_next().await {
        if !log_rebuild(joined) {
            summary.failed_rebuilds += 1;
        }
    }
    Ok(summary)
}

fn rebuild(project: &Project, toolchain: &Toolchain) -> Result<(), MaterializeError> {
    Materializer::new(project, toolchain)?.build(Strategy::Link)?;
    Ok(())
}

fn log_rebuild(
    joined: Result<(String, Result<(), MaterializeError>), tokio::task::JoinError>,
) -> bool {
    match joined {
        Ok((name, Ok(()))) => {
            tracing::info!(project = %name, "Rebuilt");
            true
        }
        Ok((name, Err(e))) => {
            tracing::warn!(project = %name, error = %e, "Rebuild failed");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rebuild task panicked");
            false
        }
    }
}

/// Whether a change at `path` should trigger a rebuild
///
/// An ignored path still counts when it is created: LINK links a directory
/// whole while it holds nothing ignored, so the new entry would show through
/// until a rebuild splits that directory.
pub fn is_relevant_change(
    path: &Path,
    root: &Path,
    output_dir: &Path,
    ignore: &IgnoreFilter,
    created: bool,
) -> bool {
    !path.starts_with(output_dir) && (created || !ignore.is_ignored(path, root))
}

fn watch_project(
    index: usize,
    project: &Project,
    tx: mpsc::UnboundedSender<usize>,
) -> Result<RecommendedWatcher, WatchError> {
    let root = project.root();
    let output_dir = project.output_dir();
    let ignore = IgnoreFilter::load(&root).map_err(|source| {
        WatchError::Materialize(MaterializeError::Io {
            path: root.clone(),
            source,
        })
    })?;

    let filter_root = root.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
        Ok(event) => {
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            let created = matches!(event.kind, EventKind::Create(_));
            if event
                .paths
                .iter()
                .any(|p| is_relevant_change(p, &filter_root, &output_dir, &ignore, created))
            {
                let _ = tx.send(index);
            }
        }
        Err(e) => tracing::warn!(error = %e, "File watcher error"),
    })?;

    for kind in project.enabled_kinds() {
        if let Some(dir) = project.pack_dir(kind) {
            watcher.watch(&dir, RecursiveMode::Recursive)?;
            tracing::debug!(%kind, dir = %dir.display(), "Watching");
        }
    }
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    include!("watch.test.rs");
}
