//! Version bumping across the config and both manifests
//!
//! Everything is loaded, changed and staged before the first rename, so a
//! missing or malformed manifest leaves all three files untouched.

use super::config::Project;
use super::fsutil::{self, StagedWrite};
use super::manifest::{Manifest, ManifestError};
use crate::primitives::{BumpLevel, PackKind, VersionParseError, VersionTuple};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BumpError {
    #[error(transparent)]
    InvalidVersion(#[from] VersionParseError),

    #[error("No manifest configured for the {kind} pack")]
    NoManifest { kind: PackKind },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How the next version is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpSpec {
    Level(BumpLevel),
    /// Used as-is, whatever the current version
    Explicit(VersionTuple),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BumpOutcome {
    pub previous: VersionTuple,
    pub version: VersionTuple,
    pub min_engine: Option<VersionTuple>,
    /// Files rewritten, config first
    pub files: Vec<PathBuf>,
}

/// The project's version; an unset version counts as the initial one
pub fn current_version(project: &Project) -> Result<VersionTuple, BumpError> {
    match project.version().filter(|v| !v.trim().is_empty()) {
        Some(version) => Ok(VersionTuple::parse(version)?),
        None => Ok(VersionTuple::INITIAL),
    }
}

pub fn next_version(current: VersionTuple, spec: BumpSpec) -> VersionTuple {
    match spec {
        BumpSpec::Level(level) => current.bump(level),
        BumpSpec::Explicit(version) => version,
    }
}

/// Bump `project` and the manifests of its enabled packs, all or nothing
pub fn bump(
    project: &mut Project,
    spec: BumpSpec,
    min_engine: Option<VersionTuple>,
) -> Result<BumpOutcome, BumpError> {
    let previous = current_version(project)?;
    let version = next_version(previous, spec);

    let mut manifests = Vec::new();
    for kind in project.enabled_kinds() {
        let path = project
            .manifest_path(kind)
            .ok_or(BumpError::NoManifest { kind })?;
        let mut manifest = Manifest::load(&path)?;
        manifest.bump_version(version)?;
        if let Some(min_engine) = min_engine {
            manifest.set_min_engine_version(min_engine)?;
        }
        manifests.push((path, manifest.to_json()?));
    }

    let mut config = project.config.clone();
    config.project.version = Some(version.to_string());

    let mut staged: Vec<StagedWrite> = Vec::with_capacity(manifests.len() + 1);
    staged.push(stage(&project.config_path, config.to_json())?);
    for (path, text) in manifests {
        staged.push(stage(&path, text)?);
    }

    let mut files = Vec::with_capacity(staged.len());
    for write in staged {
        let path = write.target().to_path_buf();
        write.commit().map_err(|source| BumpError::Io {
            path: path.clone(),
            source,
        })?;
        files.push(path);
    }

    project.config = config;
    tracing::info!(%previous, %version, files = files.len(), "Bumped version");

    Ok(BumpOutcome {
        previous,
        version,
        min_engine,
        files,
    })
}

fn stage(path: &std::path::Path, text: String) -> Result<StagedWrite, BumpError> {
    fsutil::stage_write(path, text.as_bytes()).map_err(|source| BumpError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    include!("bump.test.rs");
}
