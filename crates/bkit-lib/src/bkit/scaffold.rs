//! Project scaffolding for `bkit init`
//!
//! Writes a complete, valid project: config, ignore file, `package.json`,
//! cross-linked manifests and (with a script language) an entry stub.

use super::config::{
    CONFIG_FILE, ConfigError, PackPaths, Project, ProjectConfig, ProjectInfo, ScriptConfig,
    ScriptDependency, SyncConfig, SyncTargetConfig,
};
use super::externals::{DependencyInstaller, ExternalToolError};
use super::fsutil;
use super::ignore::IGNORE_FILE;
use super::manifest::{
    DEFAULT_SCRIPT_API_VERSION, GenerateOptions, MANIFEST_FILE, Manifest, ManifestError,
    ScriptOptions, ScriptSelection, link_packs,
};
use super::templates::{self, TemplateEngine, TemplateError};
use crate::primitives::{PackKind, Product, ScriptLanguage, VersionTuple};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BEHAVIOR_DIR: &str = "packs/behavior";
pub const RESOURCE_DIR: &str = "packs/resource";
pub const DEFAULT_TARGET: &str = "stable";
pub const PREVIEW_TARGET: &str = "preview";

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("{} already exists (use --force to overwrite)", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Invalid project name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaffoldOptions {
    pub name: String,
    pub description: String,
    /// `None` creates packs without a script module
    pub language: Option<ScriptLanguage>,
    pub force: bool,
}

#[derive(Debug)]
pub struct Scaffolded {
    pub project: Project,
    /// Every file written, config first
    pub files: Vec<PathBuf>,
}

/// Reject names that cannot be a folder name
pub fn check_name(name: &str) -> Result<(), ScaffoldError> {
    let invalid = |reason| {
        Err(ScaffoldError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.trim().is_empty() {
        return invalid("must not be empty");
    }
    if name.contains(['/', '\\']) {
        return invalid("must not contain path separators");
    }
    if name.starts_with('.') {
        return invalid("must not start with a dot");
    }
    Ok(())
}

/// Lower-case, dash-separated package name for `package.json`
pub fn package_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "bkit-addon".to_string()
    } else {
        slug.to_string()
    }
}

/// Config a fresh project starts with
pub fn initial_config(options: &ScaffoldOptions) -> ProjectConfig {
    let mut targets = BTreeMap::new();
    targets.insert(
        DEFAULT_TARGET.to_string(),
        SyncTargetConfig {
            product: Some(Product::BedrockUWP.to_string()),
            ..SyncTargetConfig::default()
        },
    );
    targets.insert(
        PREVIEW_TARGET.to_string(),
        SyncTargetConfig {
            product: Some(Product::PreviewUWP.to_string()),
            ..SyncTargetConfig::default()
        },
    );

    ProjectConfig {
        project: ProjectInfo {
            name: Some(options.name.clone()),
            version: Some(VersionTuple::INITIAL.to_string()),
        },
        packs: PackPaths {
            behavior: Some(BEHAVIOR_DIR.to_string()),
            resource: Some(RESOURCE_DIR.to_string()),
        },
        script: options.language.map(|language| ScriptConfig {
            entry: Some(format!("scripts/main.{}", language.source_extension())),
            language: Some(language),
            dependencies: vec![ScriptDependency::new(
                "@minecraft/server",
                DEFAULT_SCRIPT_API_VERSION,
            )],
            api_version: None,
        }),
        sync: SyncConfig {
            default_target: Some(DEFAULT_TARGET.to_string()),
            targets,
        },
        ..ProjectConfig::default()
    }
}

fn package_json(options: &ScaffoldOptions) -> serde_json::Value {
    serde_json::json!({
        "name": package_name(&options.name),
        "version": VersionTuple::INITIAL.to_string(),
        "private": true,
        "type": "module",
        "description": options.description,
        "scripts": {
            "build": "bkit build",
            "watch": "bkit watch",
            "package": "bkit package"
        }
    })
}

/// Create the project in `dir`
///
/// An existing config is only replaced with `force`. Forced manifests keep
/// the pack and module uuids of the ones they replace, and an existing
/// script entry is never overwritten.
pub fn scaffold(dir: &Path, options: &ScaffoldOptions) -> Result<Scaffolded, ScaffoldError> {
    check_name(&options.name)?;

    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() && !options.force {
        return Err(ScaffoldError::AlreadyExists { path: config_path });
    }

    let config = initial_config(options);
    let engine = TemplateEngine::new();
    let context = serde_json::json!({
        "name": options.name,
        "message": templates::string_literal(&format!("{} loaded", options.name)),
        "behavior_dir": BEHAVIOR_DIR,
    });
    let mut files = Vec::new();

    let project = Project::new(config_path.clone(), config);
    project.save()?;
    files.push(config_path);

    let write = |relative: &str, content: &str| -> Result<PathBuf, ScaffoldError> {
        let path = dir.join(relative);
        fsutil::write_atomic(&path, content.as_bytes()).map_err(|source| ScaffoldError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    };

    files.push(write(IGNORE_FILE, &engine.render(templates::BKITIGNORE, &context)?)?);
    let package = fsutil::to_json_pretty(&package_json(options)).map_err(|e| ScaffoldError::Io {
        path: dir.join("package.json"),
        source: io::Error::other(e),
    })?;
    files.push(write("package.json", &package)?);

    let script = project.config.script.as_ref().and_then(|script| {
        Some(ScriptOptions {
            language: script.language?,
            entry: script.entry_or_default().to_string(),
            selection: ScriptSelection::default(),
        })
    });

    let generate = GenerateOptions {
        description: options.description.clone(),
        script: script.clone(),
        ..GenerateOptions::default()
    };
    let mut behavior = Manifest::generate(PackKind::Behavior, &options.name, &generate);
    let mut resource = Manifest::generate(PackKind::Resource, &options.name, &generate);
    for (dir_name, manifest) in [(BEHAVIOR_DIR, &mut behavior), (RESOURCE_DIR, &mut resource)] {
        keep_existing_identity(&dir.join(dir_name).join(MANIFEST_FILE), manifest)?;
    }
    link_packs(&mut behavior, &mut resource)?;

    for (dir_name, manifest) in [(BEHAVIOR_DIR, &behavior), (RESOURCE_DIR, &resource)] {
        let path = dir.join(dir_name).join(MANIFEST_FILE);
        manifest.save(&path)?;
        files.push(path);
    }

    if let Some(script) = &script {
        let entry = format!("{BEHAVIOR_DIR}/{}", script.entry);
        if dir.join(&entry).exists() {
            tracing::debug!(entry, "Keeping existing script entry");
        } else {
            let template = match script.language {
                ScriptLanguage::Typescript => templates::MAIN_TS,
                ScriptLanguage::Javascript => templates::MAIN_JS,
            };
            files.push(write(&entry, &engine.render(template, &context)?)?);
        }
        if script.language == ScriptLanguage::Typescript {
            files.push(write("tsconfig.json", &engine.render(templates::TSCONFIG, &context)?)?);
        }
    }

    let project = Project::load(dir)?;
    tracing::info!(name = %options.name, dir = %dir.display(), files = files.len(), "Scaffolded project");
    Ok(Scaffolded { project, files })
}

/// Reuse the uuids of a manifest already at `path`
///
/// A missing manifest keeps the fresh identity. One that cannot be read is
/// replaced, since there is no identity left to preserve.
fn keep_existing_identity(path: &Path, manifest: &mut Manifest) -> Result<(), ScaffoldError> {
    match Manifest::load(path) {
        Ok(previous) if previous.header.is_some() => {
            manifest.keep_identity_of(&previous)?;
            tracing::debug!(path = %path.display(), "Keeping existing pack identity");
        }
        Ok(_) | Err(ManifestError::NotFound { .. }) => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Replacing unreadable manifest"),
    }
    Ok(())
}

/// Install the project's declared script dependencies
pub fn install_dependencies(
    project: &Project,
    installer: &dyn DependencyInstaller,
) -> Result<Vec<String>, ExternalToolError> {
    let specs: Vec<String> = project
        .script()
        .map(|script| script.dependencies.iter().map(ScriptDependency::install_spec).collect())
        .unwrap_or_default();
    if specs.is_empty() {
        return Ok(specs);
    }
    installer.install(project.config_dir(), &specs)?;
    Ok(specs)
}

#[cfg(test)]
mod tests {
    include!("scaffold.test.rs");
}
