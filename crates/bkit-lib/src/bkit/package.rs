//! Distributable archives of a COPY build
//!
//! One `.mcpack` per enabled pack, plus an `.mcaddon` holding both packs under
//! `behavior_pack/` and `resource_pack/` when both are enabled. Archives are
//! written next to `packs/` in the output directory and replaced on every run.

use super::config::Project;
use super::externals::{ArchiveGroup, ExternalToolError, Toolchain};
use super::fsutil::{self, EntryKind, PathState};
use crate::primitives::PackKind;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("No enabled packs to package")]
    NothingToPackage,

    #[error("The {kind} pack has not been built: {} (run `bkit build` or drop --no-build)", path.display())]
    NotBuilt { kind: PackKind, path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Tool(#[from] ExternalToolError),
}

/// A written archive
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl Artifact {
    fn from_path(path: &Path) -> Result<Self, PackageError> {
        let metadata = std::fs::metadata(path).map_err(|source| PackageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }
}

fn archive_stem(project: &Project) -> String {
    match project.version() {
        Some(version) => format!("{}-v{}", project.name(), version),
        None => project.name(),
    }
}

/// `<outDir>/<name>-v<version>-<kind>.mcpack`
pub fn pack_archive_path(project: &Project, kind: PackKind) -> PathBuf {
    project
        .output_dir()
        .join(format!("{}-{}.mcpack", archive_stem(project), kind))
}

/// `<outDir>/<name>-v<version>.mcaddon`
pub fn addon_archive_path(project: &Project) -> PathBuf {
    project
        .output_dir()
        .join(format!("{}.mcaddon", archive_stem(project)))
}

/// Archive the materialized packs of `project`
///
/// Expects a COPY build in `<outDir>/packs`; each enabled pack's output must exist.
pub fn package(project: &Project, toolchain: &Toolchain) -> Result<Vec<Artifact>, PackageError> {
    let kinds = project.enabled_kinds();
    if kinds.is_empty() {
        return Err(PackageError::NothingToPackage);
    }

    for kind in &kinds {
        let built = project.pack_output_dir(*kind);
        match fsutil::probe(&built) {
            PathState::Present(EntryKind::Dir) => {}
            PathState::Error(source) => return Err(PackageError::Io { path: built, source }),
            _ => return Err(PackageError::NotBuilt { kind: *kind, path: built }),
        }
    }

    let mut artifacts = Vec::new();
    for kind in &kinds {
        let out_file = pack_archive_path(project, *kind);
        let group = ArchiveGroup {
            contents: vec![project.pack_output_dir(*kind)],
            target: String::new(),
        };
        artifacts.push(write_archive(toolchain, &out_file, &[group])?);
    }

    let addon = addon_archive_path(project);
    if kinds.len() == PackKind::ALL.len() {
        let groups: Vec<ArchiveGroup> = kinds
            .iter()
            .map(|kind| ArchiveGroup {
                contents: vec![project.pack_output_dir(*kind)],
                target: kind.archive_dir().to_string(),
            })
            .collect();
        artifacts.push(write_archive(toolchain, &addon, &groups)?);
    } else {
        // A stale addon from a run with both packs would otherwise linger
        fsutil::remove_any(&addon).map_err(|source| PackageError::Io {
            path: addon.clone(),
            source,
        })?;
    }

    Ok(artifacts)
}

fn write_archive(
    toolchain: &Toolchain,
    out_file: &Path,
    groups: &[ArchiveGroup],
) -> Result<Artifact, PackageError> {
    fsutil::remove_any(out_file).map_err(|source| PackageError::Io {
        path: out_file.to_path_buf(),
        source,
    })?;
    tracing::info!(archive = %out_file.display(), groups = groups.len(), "Writing archive");
    toolchain.archiver.zip(out_file, groups)?;
    Artifact::from_path(out_file)
}

#[cfg(test)]
mod tests {
    include!("package.test.rs");
}
