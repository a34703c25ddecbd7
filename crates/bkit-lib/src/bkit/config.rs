//! Project configuration (`bkit.config.json`)
//!
//! Fields are parsed leniently so that a half-written config still loads and
//! the validator can report every problem at once instead of failing on the
//! first missing key.

use super::fsutil;
use super::manifest::{MANIFEST_FILE, Manifest, ManifestError, ScriptPackage};
use crate::primitives::{PackKind, Product, ScriptLanguage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "bkit.config.json";
pub const DEFAULT_OUT_DIR: &str = "dist";
pub const DEFAULT_SCRIPT_ENTRY: &str = "scripts/main.ts";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No {CONFIG_FILE} found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project configuration:\n  - {}", issues.join("\n  - "))]
    Invalid { issues: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

impl PackPaths {
    pub fn get(&self, kind: PackKind) -> Option<&str> {
        match kind {
            PackKind::Behavior => self.behavior.as_deref(),
            PackKind::Resource => self.resource.as_deref(),
        }
        .filter(|s| !s.trim().is_empty())
    }
}

/// Per-pack enable flags; anything not explicitly `false` is enabled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<bool>,
}

impl PackSelection {
    pub fn is_enabled(&self, kind: PackKind) -> bool {
        let flag = match kind {
            PackKind::Behavior => self.behavior,
            PackKind::Resource => self.resource,
        };
        flag != Some(false)
    }
}

fn default_out_dir() -> String {
    DEFAULT_OUT_DIR.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptDependency {
    pub module_name: String,
    pub version: String,
}

impl ScriptDependency {
    pub fn new(module_name: &str, version: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            version: version.to_string(),
        }
    }

    /// Parse `name@version`; scoped names keep their leading `@`
    pub fn parse_spec(spec: &str, default_version: &str) -> Self {
        match spec.rfind('@') {
            Some(idx) if idx > 0 => Self::new(&spec[..idx], &spec[idx + 1..]),
            _ => Self::new(spec, default_version),
        }
    }

    /// `name@version` for the package installer
    pub fn install_spec(&self) -> String {
        format!("{}@{}", self.module_name, self.version)
    }
}

impl From<&ScriptDependency> for ScriptPackage {
    fn from(dep: &ScriptDependency) -> Self {
        ScriptPackage {
            module_name: dep.module_name.clone(),
            version: dep.version.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptConfig {
    /// Entry file relative to the behavior pack root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<ScriptLanguage>,
    #[serde(default)]
    pub dependencies: Vec<ScriptDependency>,
    /// Kept as raw JSON so a non-string value can be reported rather than rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<serde_json::Value>,
}

impl ScriptConfig {
    pub fn entry_or_default(&self) -> &str {
        self.entry
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(DEFAULT_SCRIPT_ENTRY)
    }

    /// Add or replace a dependency (unique by module name)
    pub fn upsert_dependency(&mut self, dependency: ScriptDependency) {
        match self
            .dependencies
            .iter_mut()
            .find(|d| d.module_name == dependency.module_name)
        {
            Some(existing) => existing.version = dependency.version,
            None => self.dependencies.push(dependency),
        }
    }

    pub fn remove_dependency(&mut self, module_name: &str) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| d.module_name != module_name);
        self.dependencies.len() != before
    }

    pub fn packages(&self) -> Vec<ScriptPackage> {
        self.dependencies.iter().map(ScriptPackage::from).collect()
    }
}

/// A sync target exactly as written in the config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTargetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

/// A sync target after shape resolution
#[derive(Debug, Clone, PartialEq)]
pub enum SyncTarget {
    Paths {
        behavior: Option<PathBuf>,
        resource: Option<PathBuf>,
    },
    Product {
        product: Product,
        project_name: Option<String>,
    },
}

impl SyncTargetConfig {
    pub fn has_paths(&self) -> bool {
        self.behavior.is_some() || self.resource.is_some()
    }

    pub fn path(&self, kind: PackKind) -> Option<&str> {
        match kind {
            PackKind::Behavior => self.behavior.as_deref(),
            PackKind::Resource => self.resource.as_deref(),
        }
        .filter(|s| !s.trim().is_empty())
    }

    /// Resolve to one of the two target shapes
    pub fn resolve(&self) -> Result<SyncTarget, String> {
        match &self.product {
            Some(product) => {
                let product = product.parse::<Product>()?;
                Ok(SyncTarget::Product {
                    product,
                    project_name: self.project_name.clone(),
                })
            }
            None => Ok(SyncTarget::Paths {
                behavior: self.path(PackKind::Behavior).map(PathBuf::from),
                resource: self.path(PackKind::Resource).map(PathBuf::from),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,
    #[serde(default)]
    pub targets: BTreeMap<String, SyncTargetConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub packs: PackPaths,
    #[serde(default)]
    pub pack_selection: PackSelection,
    #[serde(default)]
    pub build: BuildConfig,
    /// Redirects where pack and output paths are resolved from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl ProjectConfig {
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> String {
        // Every field is plain data; serialization cannot fail
        fsutil::to_json_pretty(self).unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.project.name.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// A loaded project: its config plus where it lives
#[derive(Debug, Clone)]
pub struct Project {
    pub config_path: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    /// Load `path`, which may be the config file or its directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_path = if path.is_dir() {
            path.join(CONFIG_FILE)
        } else {
            path.to_path_buf()
        };

        let text = std::fs::read_to_string(&config_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: config_path.clone(),
                }
            } else {
                ConfigError::Io {
                    path: config_path.clone(),
                    source,
                }
            }
        })?;

        let config = ProjectConfig::from_json(&text, &config_path)?;
        let config_path = config_path.canonicalize().unwrap_or(config_path);

        Ok(Self {
            config_path,
            config,
        })
    }

    pub fn new(config_path: PathBuf, config: ProjectConfig) -> Self {
        Self {
            config_path,
            config,
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        fsutil::write_atomic(&self.config_path, self.config.to_json().as_bytes()).map_err(
            |source| ConfigError::Io {
                path: self.config_path.clone(),
                source,
            },
        )
    }

    /// Directory holding the config file
    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or(Path::new("."))
    }

    /// Base for every project-relative path (honours `root`)
    pub fn root(&self) -> PathBuf {
        match self.config.root.as_deref().filter(|r| !r.trim().is_empty()) {
            Some(root) => self.config_dir().join(root),
            None => self.config_dir().to_path_buf(),
        }
    }

    /// Project name, falling back to the directory name
    pub fn name(&self) -> String {
        self.config.name().map(str::to_string).unwrap_or_else(|| {
            self.config_dir()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "project".to_string())
        })
    }

    pub fn is_enabled(&self, kind: PackKind) -> bool {
        self.config.pack_selection.is_enabled(kind)
    }

    pub fn enabled_kinds(&self) -> Vec<PackKind> {
        PackKind::ALL
            .into_iter()
            .filter(|k| self.is_enabled(*k))
            .collect()
    }

    /// Source directory of a pack, when configured
    pub fn pack_dir(&self, kind: PackKind) -> Option<PathBuf> {
        self.config.packs.get(kind).map(|p| self.root().join(p))
    }

    pub fn manifest_path(&self, kind: PackKind) -> Option<PathBuf> {
        self.pack_dir(kind).map(|d| d.join(MANIFEST_FILE))
    }

    pub fn load_manifest(&self, kind: PackKind) -> Result<Manifest, ManifestError> {
        let path = self
            .manifest_path(kind)
            .ok_or_else(|| ManifestError::Structural {
                reason: format!("no {kind} pack directory configured"),
            })?;
        Manifest::load(&path)
    }

    pub fn output_dir(&self) -> PathBuf {
        let out = self.config.build.out_dir.trim();
        self.root()
            .join(if out.is_empty() { DEFAULT_OUT_DIR } else { out })
    }

    /// `<outDir>/packs/<kind>`
    pub fn pack_output_dir(&self, kind: PackKind) -> PathBuf {
        self.output_dir().join("packs").join(kind.to_string())
    }

    /// Staging directory for bundler output used by link builds
    pub fn bundle_staging_dir(&self) -> PathBuf {
        self.output_dir().join(".bundle")
    }

    pub fn script(&self) -> Option<&ScriptConfig> {
        self.config.script.as_ref()
    }

    pub fn version(&self) -> Option<&str> {
        self.config.project.version.as_deref()
    }
}

#[cfg(test)]
mod tests {
    include!("config.test.rs");
}
