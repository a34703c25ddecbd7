//! Project discovery and selection
//!
//! A project is any directory holding `bkit.config.json`. Discovery walks the
//! search root (the saved project root, else the working directory) and skips
//! dependency and hidden directories.

use super::config::{CONFIG_FILE, ConfigError, Project};
use super::walk::{self, Visit, WalkOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How deep below the search root configs are looked for
pub const DISCOVERY_DEPTH: usize = 5;

const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist"];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No bkit projects found under {}", root.display())]
    NoProjects { root: PathBuf },

    #[error("No project named '{query}' under {} (found: {})", root.display(), found_list(found))]
    NotFound {
        query: String,
        root: PathBuf,
        found: Vec<String>,
    },

    #[error("Failed to search {}: {source}", root.display())]
    Io {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn found_list(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredProject {
    pub name: String,
    pub config_path: PathBuf,
}

impl DiscoveredProject {
    pub fn load(&self) -> Result<Project, ConfigError> {
        Project::load(&self.config_path)
    }

    /// `name (path)`, for pick lists
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.config_path.display())
    }
}

/// What [`select`] settled on
#[derive(Debug)]
pub enum Selection {
    One(Box<Project>),
    /// Several candidates; the caller has to ask
    Ambiguous(Vec<DiscoveredProject>),
}

/// Every project below `root`, sorted by path
///
/// Configs that fail to parse are logged and left out.
pub fn discover(root: &Path) -> Result<Vec<DiscoveredProject>, RegistryError> {
    let io_err = |source| RegistryError::Io {
        root: root.to_path_buf(),
        source,
    };

    let mut projects = Vec::new();
    let configs = walk::walk(
        root,
        &WalkOptions::default().max_depth(DISCOVERY_DEPTH),
        |entry| {
            let name = entry.file_name();
            if entry.is_dir() {
                if name.starts_with('.') || SKIPPED_DIRS.contains(&name) {
                    Visit::Skip
                } else {
                    Visit::Descend
                }
            } else if name == CONFIG_FILE {
                Visit::Collect
            } else {
                Visit::Descend
            }
        },
    )
    .map_err(io_err)?;

    for entry in configs {
        push_loaded(&mut projects, &entry.path);
    }

    projects.sort_by(|a, b| a.config_path.cmp(&b.config_path));
    tracing::debug!(root = %root.display(), found = projects.len(), "Discovered projects");
    Ok(projects)
}

fn push_loaded(projects: &mut Vec<DiscoveredProject>, config_path: &Path) {
    match Project::load(config_path) {
        Ok(project) => projects.push(DiscoveredProject {
            name: project.name(),
            config_path: project.config_path,
        }),
        Err(e) => tracing::warn!(path = %config_path.display(), error = %e, "Skipping unreadable project"),
    }
}

/// Pick the project a command acts on
///
/// In order: `query` as a path, `query` as a project name, the working
/// directory's own config, the only discovered project.
pub fn select(
    query: Option<&str>,
    workdir: &Path,
    search_root: &Path,
) -> Result<Selection, RegistryError> {
    if let Some(query) = query {
        let as_path = workdir.join(query);
        if as_path.is_dir() || as_path.is_file() {
            return Ok(Selection::One(Box::new(Project::load(&as_path)?)));
        }

        let found = discover(search_root)?;
        let mut matches: Vec<DiscoveredProject> =
            found.iter().filter(|p| p.name == query).cloned().collect();
        return match matches.len() {
            0 => Err(RegistryError::NotFound {
                query: query.to_string(),
                root: search_root.to_path_buf(),
                found: found.into_iter().map(|p| p.name).collect(),
            }),
            1 => Ok(Selection::One(Box::new(matches.remove(0).load()?))),
            _ => Ok(Selection::Ambiguous(matches)),
        };
    }

    if workdir.join(CONFIG_FILE).is_file() {
        return Ok(Selection::One(Box::new(Project::load(workdir)?)));
    }

    let mut found = discover(search_root)?;
    match found.len() {
        0 => Err(RegistryError::NoProjects {
            root: search_root.to_path_buf(),
        }),
        1 => Ok(Selection::One(Box::new(found.remove(0).load()?))),
        _ => Ok(Selection::Ambiguous(found)),
    }
}

/// Every discovered project, loaded
pub fn load_all(search_root: &Path) -> Result<Vec<Project>, RegistryError> {
    let found = discover(search_root)?;
    if found.is_empty() {
        return Err(RegistryError::NoProjects {
            root: search_root.to_path_buf(),
        });
    }
    found
        .iter()
        .map(|p| p.load().map_err(RegistryError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    include!("registry.test.rs");
}
