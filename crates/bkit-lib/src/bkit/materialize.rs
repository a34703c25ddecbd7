//! Pack materialization: COPY and LINK strategies
//!
//! Each enabled pack goes `NotRequested -> Copying|Linking -> Done`, or
//! straight to `Skipped` when it is disabled or has no configured directory.
//! Both strategies clear the destination first, so a re-run never leaves
//! stale entries from an earlier one.
//!
//! Packs with TypeScript sources get their script entry compiled by the
//! bundler. COPY bundles into the destination and leaves the `.ts` sources
//! behind; LINK stages the bundle under `<outDir>/.bundle` and copies it into
//! the otherwise linked tree.

use super::config::{DEFAULT_SCRIPT_ENTRY, Project};
use super::externals::{BundleRequest, ExternalToolError, Toolchain};
use super::fsutil::{self, EntryKind};
use super::ignore::{IGNORE_FILE, IgnoreFilter};
use super::manifest::{BUNDLED_PACKAGES, runtime_entry};
use super::walk::{self, Visit, WalkEntry, WalkOptions};
use crate::primitives::PackKind;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Copy,
    Link,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Copy => write!(f, "copy"),
            Strategy::Link => write!(f, "link"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NotConfigured,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "disabled"),
            SkipReason::NotConfigured => write!(f, "not configured"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PackOutcome {
    Done {
        kind: PackKind,
        strategy: Strategy,
        source: PathBuf,
        dest: PathBuf,
        /// Files copied plus links created
        entries: usize,
        bundled: bool,
    },
    Skipped {
        kind: PackKind,
        reason: SkipReason,
    },
}

impl PackOutcome {
    pub fn kind(&self) -> PackKind {
        match self {
            PackOutcome::Done { kind, .. } | PackOutcome::Skipped { kind, .. } => *kind,
        }
    }

    pub fn dest(&self) -> Option<&Path> {
        match self {
            PackOutcome::Done { dest, .. } => Some(dest),
            PackOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("The {kind} pack source directory does not exist: {}", path.display())]
    SourceNotFound { kind: PackKind, path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Tool(#[from] ExternalToolError),
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> MaterializeError + '_ {
    move |source| MaterializeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Module names the bundler must leave as runtime imports
pub fn bundle_externals(project: &Project) -> Vec<String> {
    let mut externals: Vec<String> = project
        .script()
        .map(|s| s.dependencies.iter().map(|d| d.module_name.clone()).collect())
        .unwrap_or_default();
    for helper in BUNDLED_PACKAGES {
        if !externals.iter().any(|e| e == helper) {
            externals.push(helper.to_string());
        }
    }
    externals
}

pub fn is_typescript(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "mts" | "tsx")
    )
}

/// Recursively copy `source` into `dest`, keeping only what `keep` accepts
///
/// Links in the source are followed. A rejected directory is not entered.
/// Returns the number of files copied.
pub fn copy_tree<F>(source: &Path, dest: &Path, mut keep: F) -> io::Result<usize>
where
    F: FnMut(&WalkEntry) -> bool,
{
    fs::create_dir_all(dest)?;
    let entries = walk::walk(source, &WalkOptions::following_links(), |entry| {
        if keep(entry) {
            Visit::Collect
        } else {
            Visit::Skip
        }
    })?;

    let mut copied = 0;
    for entry in entries {
        let target = dest.join(&entry.relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fsutil::copy_file(&entry.path, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Where a pack's compiled script comes from and goes to
#[derive(Debug, Clone, PartialEq)]
struct ScriptBuild {
    entry: PathBuf,
    /// First directory of the entry path; empty when the entry sits at the pack root
    scripts_dir: PathBuf,
    runtime_entry: String,
}

impl ScriptBuild {
    fn is_source(&self, relative: &Path) -> bool {
        relative.starts_with(&self.scripts_dir) && is_typescript(relative)
    }

    /// The bundle's own output paths; a file there in the sources is stale
    fn is_bundle_output(&self, relative: &Path) -> bool {
        let entry = Path::new(&self.runtime_entry);
        relative == entry || relative == Path::new(&format!("{}.map", self.runtime_entry))
    }
}

pub struct Materializer<'a> {
    project: &'a Project,
    toolchain: &'a Toolchain,
    ignore: IgnoreFilter,
    root: PathBuf,
}

impl<'a> Materializer<'a> {
    /// Load the project's ignore rules and get ready to materialize
    pub fn new(project: &'a Project, toolchain: &'a Toolchain) -> Result<Self, MaterializeError> {
        let root = project.root();
        let ignore =
            IgnoreFilter::load(&root).map_err(|source| MaterializeError::Io {
                path: root.join(IGNORE_FILE),
                source,
            })?;
        tracing::debug!(rules = ignore.rules().len(), "Loaded ignore rules");

        Ok(Self {
            project,
            toolchain,
            ignore,
            root,
        })
    }

    pub fn ignore(&self) -> &IgnoreFilter {
        &self.ignore
    }

    /// Materialize every pack with `strategy`, behavior first
    pub fn build(&self, strategy: Strategy) -> Result<Vec<PackOutcome>, MaterializeError> {
        PackKind::ALL
            .into_iter()
            .map(|kind| self.materialize(kind, strategy))
            .collect()
    }

    pub fn materialize(
        &self,
        kind: PackKind,
        strategy: Strategy,
    ) -> Result<PackOutcome, MaterializeError> {
        if !self.project.is_enabled(kind) {
            tracing::debug!(%kind, "Pack disabled, skipping");
            return Ok(PackOutcome::Skipped {
                kind,
                reason: SkipReason::Disabled,
            });
        }

        let Some(source) = self.project.pack_dir(kind) else {
            tracing::warn!(%kind, "No pack directory configured, skipping");
            return Ok(PackOutcome::Skipped {
                kind,
                reason: SkipReason::NotConfigured,
            });
        };

        if !fsutil::require_dir(&source).map_err(io_at(&source))? {
            return Err(MaterializeError::SourceNotFound { kind, path: source });
        }

        let dest = self.project.pack_output_dir(kind);
        let script = self.script_build(kind, &source)?;

        tracing::info!(%kind, %strategy, source = %source.display(), dest = %dest.display(), "Materializing pack");
        let entries = match strategy {
            Strategy::Copy => self.copy_pack(&source, &dest, script.as_ref())?,
            Strategy::Link => self.link_pack(kind, &source, &dest, script.as_ref())?,
        };

        Ok(PackOutcome::Done {
            kind,
            strategy,
            source,
            dest,
            entries,
            bundled: script.is_some(),
        })
    }

    /// Decide whether the pack's scripts need the bundler
    ///
    /// The configured language wins; without one the scripts directory is
    /// searched for TypeScript sources.
    fn script_build(
        &self,
        kind: PackKind,
        source: &Path,
    ) -> Result<Option<ScriptBuild>, MaterializeError> {
        if kind != PackKind::Behavior {
            return Ok(None);
        }

        let script = self.project.script();
        let entry = script.map_or(DEFAULT_SCRIPT_ENTRY, |s| s.entry_or_default());
        let entry_path = Path::new(entry);
        let scripts_dir = match entry_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                parent.components().next().map(|c| PathBuf::from(c.as_os_str())).unwrap_or_default()
            }
            _ => PathBuf::new(),
        };

        let compiled = match script.and_then(|s| s.language) {
            Some(language) => language.requires_compilation(),
            None => {
                let dir = source.join(&scripts_dir);
                dir.is_dir()
                    && walk::any_file(&dir, &WalkOptions::following_links(), |e| {
                        is_typescript(&e.path)
                    })
                    .map_err(io_at(&dir))?
            }
        };

        if !compiled {
            return Ok(None);
        }

        Ok(Some(ScriptBuild {
            entry: source.join(entry_path),
            scripts_dir,
            runtime_entry: runtime_entry(entry),
        }))
    }

    fn bundle(
        &self,
        script: &ScriptBuild,
        out_file: PathBuf,
        sourcemap: bool,
    ) -> Result<(), MaterializeError> {
        let request = BundleRequest {
            working_dir: self.project.config_dir().to_path_buf(),
            entry: script.entry.clone(),
            out_file,
            sourcemap,
            externals: bundle_externals(self.project),
        };
        tracing::info!(entry = %request.entry.display(), out = %request.out_file.display(), "Bundling scripts");
        self.toolchain.bundler.bundle(&request)?;
        Ok(())
    }

    fn copy_pack(
        &self,
        source: &Path,
        dest: &Path,
        script: Option<&ScriptBuild>,
    ) -> Result<usize, MaterializeError> {
        fsutil::remove_any(dest).map_err(io_at(dest))?;
        fs::create_dir_all(dest).map_err(io_at(dest))?;

        if let Some(script) = script {
            self.bundle(script, dest.join(&script.runtime_entry), false)?;
        }

        copy_tree(source, dest, |entry| {
            if self.ignore.is_ignored(&entry.path, &self.root) {
                tracing::debug!(path = %entry.relative.display(), "Ignored");
                return false;
            }
            !(entry.kind != EntryKind::Dir
                && script.is_some_and(|s| {
                    s.is_source(&entry.relative) || s.is_bundle_output(&entry.relative)
                }))
        })
        .map_err(io_at(source))
    }

    fn link_pack(
        &self,
        kind: PackKind,
        source: &Path,
        dest: &Path,
        script: Option<&ScriptBuild>,
    ) -> Result<usize, MaterializeError> {
        fsutil::remove_any(dest).map_err(io_at(dest))?;
        fs::create_dir_all(dest).map_err(io_at(dest))?;

        let staged = match script {
            Some(script) => {
                let staging = self.project.bundle_staging_dir().join(kind.to_string());
                fsutil::remove_any(&staging).map_err(io_at(&staging))?;
                self.bundle(script, staging.join(&script.runtime_entry), true)?;
                Some((script, staging))
            }
            None => None,
        };
        let staged_ref = staged.as_ref().map(|(s, p)| (*s, p.as_path()));

        let mut entries = self.link_dir(source, source, dest, staged_ref)?;

        if let Some((script, staging)) = staged_ref
            && script.scripts_dir.as_os_str().is_empty()
        {
            let from = staging.join(&script.runtime_entry);
            let to = dest.join(&script.runtime_entry);
            fsutil::copy_file(&from, &to).map_err(io_at(&to))?;
            entries += 1;
        }

        Ok(entries)
    }

    /// Link every child of `dir` into `dest`
    ///
    /// A child directory holding ignored entries is recreated as a real
    /// directory and linked one level deeper.
    fn link_dir(
        &self,
        pack_root: &Path,
        dir: &Path,
        dest: &Path,
        staged: Option<(&ScriptBuild, &Path)>,
    ) -> Result<usize, MaterializeError> {
        let mut children: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_at(dir))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<_>>()
            .map_err(io_at(dir))?;
        children.sort();

        let mut entries = 0;
        for child in children {
            if self.ignore.is_ignored(&child, &self.root) {
                tracing::debug!(path = %child.display(), "Ignored");
                continue;
            }

            let Some(name) = child.file_name() else {
                continue;
            };
            let target = dest.join(name);
            let relative = child.strip_prefix(pack_root).unwrap_or(&child);

            if let Some((script, staging)) = staged {
                if !script.scripts_dir.as_os_str().is_empty() && relative == script.scripts_dir {
                    let bundled = staging.join(&script.scripts_dir);
                    entries += copy_tree(&bundled, &target, |_| true).map_err(io_at(&target))?;
                    continue;
                }
                if script.is_source(relative) {
                    continue;
                }
            }

            if child.is_dir() && self.has_ignored_descendant(&child)? {
                fs::create_dir_all(&target).map_err(io_at(&target))?;
                entries += self.link_dir(pack_root, &child, &target, staged)?;
            } else {
                fsutil::replace_with_link(&child, &target).map_err(io_at(&target))?;
                entries += 1;
            }
        }

        Ok(entries)
    }

    fn has_ignored_descendant(&self, dir: &Path) -> Result<bool, MaterializeError> {
        if self.ignore.is_empty() {
            return Ok(false);
        }
        let mut found = false;
        walk::walk(dir, &WalkOptions::following_links(), |entry| {
            if self.ignore.is_ignored(&entry.path, &self.root) {
                found = true;
                Visit::Halt
            } else {
                Visit::Descend
            }
        })
        .map_err(io_at(dir))?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    include!("materialize.test.rs");
}
