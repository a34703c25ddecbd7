//! Pack manifest model
//!
//! A manifest is a pack's permanent identity: its header uuid is minted once at
//! generation and never regenerated. Bumps and dependency merges edit the
//! manifest in place.

use super::fsutil;
use crate::primitives::{ModuleType, PackKind, ScriptLanguage, VersionTuple};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const FORMAT_VERSION: u32 = 2;

/// Script-API packages bkit knows how to declare
pub const KNOWN_SCRIPT_PACKAGES: &[&str] = &[
    "@minecraft/server",
    "@minecraft/server-ui",
    "@minecraft/server-gametest",
    "@minecraft/server-net",
    "@minecraft/server-admin",
    "@minecraft/server-editor",
    "@minecraft/debug-utilities",
    "@minecraft/math",
    "@minecraft/vanilla-data",
];

/// Helper packages that are bundled into the script output rather than
/// declared as manifest dependencies
pub const BUNDLED_PACKAGES: &[&str] = &["@minecraft/math", "@minecraft/vanilla-data"];

pub const DEFAULT_SCRIPT_API_VERSION: &str = "1.16.0";

pub fn is_bundled_package(module_name: &str) -> bool {
    BUNDLED_PACKAGES.contains(&module_name)
}

pub fn is_known_package(module_name: &str) -> bool {
    KNOWN_SCRIPT_PACKAGES.contains(&module_name)
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read manifest {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to parse manifest {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Malformed manifest: {reason}")]
    Structural { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub uuid: Uuid,
    pub version: VersionTuple,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_engine_version: Option<VersionTuple>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionTuple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

/// Pack-to-pack reference by header uuid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackRef {
    pub uuid: Uuid,
    pub version: VersionTuple,
}

/// Script-API module reference by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDependencyRef {
    pub module_name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackDependency {
    Pack(PackRef),
    Script(ScriptDependencyRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub dependencies: Vec<PackDependency>,
    /// Keys bkit does not model (metadata, capabilities, ...) survive a rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A script package to declare, with the version the manifest should carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPackage {
    pub module_name: String,
    pub version: String,
}

/// Which known script packages a new behavior pack uses
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSelection {
    /// Every known package with its on/off flag, in catalogue order
    pub packages: Vec<(String, bool)>,
    /// Version shared by every selected package
    pub version: String,
    /// Per-package versions that win over `version`
    pub overrides: Vec<(String, String)>,
}

impl Default for ScriptSelection {
    fn default() -> Self {
        Self {
            packages: KNOWN_SCRIPT_PACKAGES
                .iter()
                .map(|name| (name.to_string(), *name == "@minecraft/server"))
                .collect(),
            version: DEFAULT_SCRIPT_API_VERSION.to_string(),
            overrides: Vec::new(),
        }
    }
}

impl ScriptSelection {
    pub fn with_enabled(mut self, module_name: &str, enabled: bool) -> Self {
        match self.packages.iter_mut().find(|(name, _)| name == module_name) {
            Some(entry) => entry.1 = enabled,
            None => self.packages.push((module_name.to_string(), enabled)),
        }
        self
    }

    pub fn with_override(mut self, module_name: &str, version: &str) -> Self {
        self.overrides.retain(|(name, _)| name != module_name);
        self.overrides
            .push((module_name.to_string(), version.to_string()));
        self
    }

    /// Selected packages with their resolved versions
    pub fn resolve(&self) -> Vec<ScriptPackage> {
        self.packages
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(name, _)| ScriptPackage {
                module_name: name.clone(),
                version: self
                    .overrides
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| self.version.clone()),
            })
            .collect()
    }
}

/// Script module options for a generated behavior manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOptions {
    pub language: ScriptLanguage,
    /// Entry as authored, relative to the pack root (e.g. `scripts/main.ts`)
    pub entry: String,
    pub selection: ScriptSelection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub description: String,
    pub version: VersionTuple,
    pub min_engine_version: VersionTuple,
    pub script: Option<ScriptOptions>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            description: String::new(),
            version: VersionTuple::INITIAL,
            min_engine_version: VersionTuple::DEFAULT_MIN_ENGINE,
            script: None,
        }
    }
}

/// Entry path the game loads: compiled sources end in `.js`
pub fn runtime_entry(entry: &str) -> String {
    match entry.rsplit_once('.') {
        Some((stem, "ts" | "mts" | "tsx")) => format!("{stem}.js"),
        _ => entry.to_string(),
    }
}

impl Manifest {
    /// Build a fresh manifest; every uuid is newly minted
    pub fn generate(kind: PackKind, name: &str, options: &GenerateOptions) -> Self {
        let mut modules = vec![Module {
            module_type: kind.module_type(),
            uuid: Uuid::new_v4(),
            version: Some(options.version),
            description: None,
            language: None,
            entry: None,
        }];
        let mut dependencies = Vec::new();

        if let (PackKind::Behavior, Some(script)) = (kind, &options.script) {
            modules.push(Module {
                module_type: ModuleType::Script,
                uuid: Uuid::new_v4(),
                version: Some(options.version),
                description: None,
                language: Some("javascript".to_string()),
                entry: Some(runtime_entry(&script.entry)),
            });

            dependencies.extend(
                script
                    .selection
                    .resolve()
                    .into_iter()
                    .filter(|pkg| !is_bundled_package(&pkg.module_name))
                    .map(|pkg| {
                        PackDependency::Script(ScriptDependencyRef {
                            module_name: pkg.module_name,
                            version: pkg.version,
                        })
                    }),
            );
        }

        Self {
            format_version: FORMAT_VERSION,
            header: Some(Header {
                name: name.to_string(),
                description: options.description.clone(),
                uuid: Uuid::new_v4(),
                version: options.version,
                min_engine_version: Some(options.min_engine_version),
            }),
            modules,
            dependencies,
            extra: serde_json::Map::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ManifestError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ManifestError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> Result<String, ManifestError> {
        fsutil::to_json_pretty(self).map_err(|e| ManifestError::Structural {
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let text = self.to_json()?;
        fsutil::write_atomic(path, text.as_bytes()).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn header(&self) -> Result<&Header, ManifestError> {
        self.header.as_ref().ok_or_else(missing_header)
    }

    fn header_mut(&mut self) -> Result<&mut Header, ManifestError> {
        self.header.as_mut().ok_or_else(missing_header)
    }

    pub fn pack_uuid(&self) -> Option<Uuid> {
        self.header.as_ref().map(|h| h.uuid)
    }

    pub fn has_script_module(&self) -> bool {
        self.modules
            .iter()
            .any(|m| m.module_type == ModuleType::Script)
    }

    pub fn depends_on_pack(&self, uuid: Uuid) -> bool {
        self.dependencies
            .iter()
            .any(|d| matches!(d, PackDependency::Pack(p) if p.uuid == uuid))
    }

    pub fn script_dependency(&self, module_name: &str) -> Option<&ScriptDependencyRef> {
        self.dependencies.iter().find_map(|d| match d {
            PackDependency::Script(s) if s.module_name == module_name => Some(s),
            _ => None,
        })
    }

    /// Set the pack version everywhere it is mirrored
    ///
    /// Script modules and script-API dependencies keep their versions.
    pub fn bump_version(&mut self, version: VersionTuple) -> Result<(), ManifestError> {
        self.header_mut()?.version = version;

        for module in &mut self.modules {
            if module.module_type != ModuleType::Script {
                module.version = Some(version);
            }
        }

        for dependency in &mut self.dependencies {
            match dependency {
                PackDependency::Pack(pack) => pack.version = version,
                PackDependency::Script(_) => {}
            }
        }

        Ok(())
    }

    pub fn set_min_engine_version(&mut self, version: VersionTuple) -> Result<(), ManifestError> {
        self.header_mut()?.min_engine_version = Some(version);
        Ok(())
    }

    /// Replace declared script-API dependencies with `desired`
    ///
    /// Dependencies on known script packages, or on any name in `desired`, are
    /// dropped and `desired` (minus bundled helpers) is appended. Pack-to-pack
    /// dependencies and unrelated module names are kept as they are.
    pub fn merge_script_dependencies(
        &mut self,
        desired: &[ScriptPackage],
    ) -> Result<(), ManifestError> {
        self.header()?;

        self.dependencies.retain(|dependency| match dependency {
            PackDependency::Pack(_) => true,
            PackDependency::Script(s) => {
                !is_known_package(&s.module_name)
                    && !desired.iter().any(|d| d.module_name == s.module_name)
            }
        });

        let mut added: Vec<&str> = Vec::new();
        for package in desired {
            if is_bundled_package(&package.module_name)
                || added.contains(&package.module_name.as_str())
            {
                continue;
            }
            added.push(&package.module_name);
            self.dependencies
                .push(PackDependency::Script(ScriptDependencyRef {
                    module_name: package.module_name.clone(),
                    version: package.version.clone(),
                }));
        }

        Ok(())
    }

    pub fn remove_script_dependency(&mut self, module_name: &str) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|dependency| {
            !matches!(dependency, PackDependency::Script(s) if s.module_name == module_name)
        });
        self.dependencies.len() != before
    }

    /// Carry over the header and module uuids of an earlier manifest for the same pack
    ///
    /// Modules are paired by type in order; a module with no earlier
    /// counterpart keeps its fresh uuid.
    pub fn keep_identity_of(&mut self, previous: &Manifest) -> Result<(), ManifestError> {
        let previous_uuid = previous.header()?.uuid;
        self.header.as_mut().ok_or_else(missing_header)?.uuid = previous_uuid;

        let mut earlier: Vec<&Module> = previous.modules.iter().collect();
        for module in &mut self.modules {
            if let Some(pos) = earlier.iter().position(|m| m.module_type == module.module_type) {
                module.uuid = earlier.remove(pos).uuid;
            }
        }
        Ok(())
    }

    /// Make sure this manifest depends on `other`'s header uuid
    pub fn add_pack_dependency(&mut self, other: &Manifest) -> Result<(), ManifestError> {
        let other_header = other.header()?;
        let (uuid, version) = (other_header.uuid, other_header.version);
        self.header()?;

        if !self.depends_on_pack(uuid) {
            self.dependencies
                .insert(0, PackDependency::Pack(PackRef { uuid, version }));
        }
        Ok(())
    }
}

/// Cross-link a behavior/resource pair so each depends on the other
pub fn link_packs(behavior: &mut Manifest, resource: &mut Manifest) -> Result<(), ManifestError> {
    behavior.add_pack_dependency(resource)?;
    resource.add_pack_dependency(behavior)?;
    Ok(())
}

fn missing_header() -> ManifestError {
    ManifestError::Structural {
        reason: "missing header".to_string(),
    }
}

#[cfg(test)]
mod tests {
    include!("manifest.test.rs");
}
