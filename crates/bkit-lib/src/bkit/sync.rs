//! Sync engine: replicate built packs to a deployment target
//!
//! Targets are either explicit per-pack paths or a game product whose root
//! comes from [`DeploymentRootLookup`]. Copy-sync replaces the destination
//! with a fresh copy; link-sync points it at the output directory. Dry runs
//! resolve and validate everything but touch nothing.

use super::config::{Project, SyncTarget};
use super::externals::{DeploymentRootLookup, Toolchain};
use super::fsutil::{self, EntryKind, PathState};
use super::materialize::{self, MaterializeError, Materializer, Strategy};
use super::walk;
use crate::display::ReportEntry;
use crate::primitives::{PackKind, Product};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No sync target given and sync.defaultTarget is not set")]
    NoTarget,

    #[error("Unknown sync target '{name}' (available: {})", list_or_none(available))]
    UnknownTarget { name: String, available: Vec<String> },

    #[error("Sync target '{name}' is invalid: {reason}")]
    InvalidTarget { name: String, reason: String },

    #[error("No installation of {product} found for sync target '{name}'")]
    UnresolvedRoot { name: String, product: Product },

    #[error("The {kind} pack source directory does not exist: {}", path.display())]
    SourceNotFound { kind: PackKind, path: PathBuf },

    #[error("Sync of the {failed} pack failed after {} succeeded: {source}", join_kinds(applied))]
    PartialSyncFailure {
        applied: Vec<PackKind>,
        failed: PackKind,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn join_kinds(kinds: &[PackKind]) -> String {
    kinds.iter().map(PackKind::to_string).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Copy,
    Link,
}

/// A sync target with every destination path worked out
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub name: String,
    pub behavior: Option<PathBuf>,
    pub resource: Option<PathBuf>,
}

impl ResolvedTarget {
    pub fn path(&self, kind: PackKind) -> Option<&Path> {
        match kind {
            PackKind::Behavior => self.behavior.as_deref(),
            PackKind::Resource => self.resource.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    Copy,
    Link,
    /// Link removed from the destination
    Unlink,
    NotApplicable { reason: String },
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Copy => write!(f, "copy"),
            SyncAction::Link => write!(f, "link"),
            SyncAction::Unlink => write!(f, "unlink"),
            SyncAction::NotApplicable { reason } => write!(f, "not applicable ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncEntry {
    pub kind: PackKind,
    pub action: SyncAction,
    pub source: Option<PathBuf>,
    pub dest: Option<PathBuf>,
    /// Planned only; nothing was written
    pub dry_run: bool,
}

impl SyncEntry {
    fn not_applicable(kind: PackKind, reason: &str) -> Self {
        Self {
            kind,
            action: SyncAction::NotApplicable {
                reason: reason.to_string(),
            },
            source: None,
            dest: None,
            dry_run: false,
        }
    }

    pub fn is_applied(&self) -> bool {
        !matches!(self.action, SyncAction::NotApplicable { .. })
    }

    pub fn to_report_entry(&self) -> ReportEntry {
        let action = if self.dry_run && self.is_applied() {
            format!("would {}", self.action)
        } else {
            self.action.to_string()
        };
        ReportEntry {
            pack: self.kind.to_string(),
            action,
            source: self.source.as_ref().map(|p| p.display().to_string()),
            dest: self.dest.as_ref().map(|p| p.display().to_string()),
        }
    }
}

/// Look up `name` (or `sync.defaultTarget`) and resolve its destinations
pub fn resolve_target(
    project: &Project,
    name: Option<&str>,
    roots: &dyn DeploymentRootLookup,
) -> Result<ResolvedTarget, SyncError> {
    let sync = &project.config.sync;
    let name = name
        .or(sync.default_target.as_deref())
        .filter(|n| !n.trim().is_empty())
        .ok_or(SyncError::NoTarget)?
        .to_string();

    let config = sync
        .targets
        .get(&name)
        .ok_or_else(|| SyncError::UnknownTarget {
            name: name.clone(),
            available: sync.targets.keys().cloned().collect(),
        })?;

    let target = config.resolve().map_err(|reason| SyncError::InvalidTarget {
        name: name.clone(),
        reason,
    })?;

    match target {
        SyncTarget::Paths { behavior, resource } => {
            let base = project.config_dir();
            Ok(ResolvedTarget {
                behavior: behavior.map(|p| base.join(p)),
                resource: resource.map(|p| base.join(p)),
                name,
            })
        }
        SyncTarget::Product {
            product,
            project_name,
        } => {
            let root = roots.lookup(product).ok_or_else(|| SyncError::UnresolvedRoot {
                name: name.clone(),
                product,
            })?;
            let folder = project_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| project.name());
            let at = |kind: PackKind| root.join(kind.development_dir()).join(&folder);
            tracing::debug!(%product, root = %root.display(), "Resolved deployment root");

            Ok(ResolvedTarget {
                behavior: Some(at(PackKind::Behavior)),
                resource: Some(at(PackKind::Resource)),
                name,
            })
        }
    }
}

/// Sync every enabled pack's build output to `target`
///
/// A disabled pack or one without a destination is reported as not
/// applicable. A real run needs the output to exist; a dry run only needs the
/// pack sources, since the build that precedes a real run would create it.
pub fn sync(
    project: &Project,
    target: &ResolvedTarget,
    mode: SyncMode,
    dry_run: bool,
) -> Result<Vec<SyncEntry>, SyncError> {
    let mut entries = Vec::new();
    let mut applied = Vec::new();

    for kind in PackKind::ALL {
        if !project.is_enabled(kind) {
            entries.push(SyncEntry::not_applicable(kind, "pack disabled"));
            continue;
        }
        let Some(dest) = target.path(kind) else {
            entries.push(SyncEntry::not_applicable(kind, "no destination in target"));
            continue;
        };
        let Some(pack_source) = project.pack_dir(kind) else {
            entries.push(SyncEntry::not_applicable(kind, "pack not configured"));
            continue;
        };

        let source = project.pack_output_dir(kind);
        let required = if dry_run { &pack_source } else { &source };
        if !fsutil::require_dir(required).map_err(|e| SyncError::Io {
            path: required.clone(),
            source: e,
        })? {
            return Err(SyncError::SourceNotFound {
                kind,
                path: required.clone(),
            });
        }

        let action = match mode {
            SyncMode::Copy => SyncAction::Copy,
            SyncMode::Link => SyncAction::Link,
        };

        if dry_run {
            tracing::info!(%kind, %action, dest = %dest.display(), "Dry run, not syncing");
        } else {
            tracing::info!(%kind, %action, source = %source.display(), dest = %dest.display(), "Syncing pack");
            if let Err(e) = apply(mode, &source, dest) {
                return Err(if applied.is_empty() {
                    SyncError::Io {
                        path: dest.to_path_buf(),
                        source: e,
                    }
                } else {
                    SyncError::PartialSyncFailure {
                        applied,
                        failed: kind,
                        source: e,
                    }
                });
            }
            applied.push(kind);
        }

        entries.push(SyncEntry {
            kind,
            action,
            source: Some(source),
            dest: Some(dest.to_path_buf()),
            dry_run,
        });
    }

    Ok(entries)
}

fn apply(mode: SyncMode, source: &Path, dest: &Path) -> io::Result<()> {
    match mode {
        SyncMode::Link => fsutil::replace_with_link(source, dest),
        SyncMode::Copy => {
            fsutil::remove_any(dest)?;
            materialize::copy_tree(source, dest, |_| true).map(|_| ())
        }
    }
}

/// Remove the links a link-sync left at the target's destinations
///
/// A destination that is itself a link is removed; inside a real directory
/// every nested link is removed. Returns what was removed.
pub fn remove_target_links(target: &ResolvedTarget) -> Result<Vec<PathBuf>, SyncError> {
    let mut removed = Vec::new();
    for kind in PackKind::ALL {
        let Some(dest) = target.path(kind) else {
            continue;
        };
        let io_err = |source| SyncError::Io {
            path: dest.to_path_buf(),
            source,
        };

        match fsutil::probe(dest) {
            PathState::Present(EntryKind::Symlink) => {
                fsutil::remove_any(dest).map_err(io_err)?;
                removed.push(dest.to_path_buf());
            }
            PathState::Present(EntryKind::Dir) => {
                for link in walk::collect_symlinks(dest).map_err(io_err)? {
                    fsutil::remove_any(&link).map_err(io_err)?;
                    removed.push(link);
                }
            }
            PathState::Present(EntryKind::File) | PathState::Absent => {}
            PathState::Error(e) => return Err(io_err(e)),
        }
    }
    Ok(removed)
}

/// Leave `target` independent of any link: unlink, rebuild by copy, copy-sync
pub fn finalize_link(
    project: &Project,
    toolchain: &Toolchain,
    target: &ResolvedTarget,
) -> Result<Vec<SyncEntry>, SyncError> {
    let removed = remove_target_links(target)?;
    tracing::info!(target = %target.name, links = removed.len(), "Removed target links");

    Materializer::new(project, toolchain)?.build(Strategy::Copy)?;
    sync(project, target, SyncMode::Copy, false)
}

#[cfg(test)]
mod tests {
    include!("sync.test.rs");
}
