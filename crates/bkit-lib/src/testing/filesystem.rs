//! Filesystem-based testing utilities
//!
//! - `TempDirFixture`: a temp directory with small read/write helpers
//! - `ProjectFixture`: a complete add-on project (config, linked manifests,
//!   deploy directories) inside a temp directory

use crate::bkit::config::{
    CONFIG_FILE, PackPaths, Project, ProjectConfig, ProjectInfo, ScriptConfig, ScriptDependency,
    SyncConfig, SyncTargetConfig,
};
use crate::bkit::manifest::{
    DEFAULT_SCRIPT_API_VERSION, GenerateOptions, Manifest, ScriptOptions, ScriptSelection,
    link_packs,
};
use crate::primitives::{PackKind, ScriptLanguage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory fixture with automatic cleanup
pub struct TempDirFixture {
    /// The temporary directory (automatically cleaned up on drop)
    pub temp_dir: TempDir,
}

impl TempDirFixture {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = tempfile::tempdir()?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn create_dir(&self, subdir: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let dir_path = self.path().join(subdir);
        fs::create_dir_all(&dir_path)?;
        Ok(dir_path)
    }

    /// Write content to a file, creating parent directories
    pub fn write_file(
        &self,
        file_path: &str,
        content: &str,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let full_path = self.path().join(file_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, content)?;
        Ok(full_path)
    }

    pub fn read_file(&self, file_path: &str) -> Result<String, Box<dyn std::error::Error>> {
        Ok(fs::read_to_string(self.path().join(file_path))?)
    }

    pub fn file_exists(&self, file_path: &str) -> bool {
        self.path().join(file_path).exists()
    }
}

/// An add-on project on disk
///
/// Layout below the temp root:
///
/// ```text
/// <name>/bkit.config.json
/// <name>/packs/behavior/manifest.json
/// <name>/packs/resource/manifest.json
/// deploy/behavior, deploy/resource   (targets of the "local" sync target)
/// ```
pub struct ProjectFixture {
    fixture: TempDirFixture,
    name: String,
}

impl ProjectFixture {
    /// A JavaScript-free project with both packs and a `local` path target
    pub fn new(name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let fixture = TempDirFixture::new()?;
        let this = Self {
            fixture,
            name: name.to_string(),
        };

        let deploy = this.fixture.path().join("deploy");
        let mut targets = std::collections::BTreeMap::new();
        targets.insert(
            "local".to_string(),
            SyncTargetConfig {
                behavior: Some(deploy.join("behavior").display().to_string()),
                resource: Some(deploy.join("resource").display().to_string()),
                ..SyncTargetConfig::default()
            },
        );

        let config = ProjectConfig {
            project: ProjectInfo {
                name: Some(name.to_string()),
                version: Some("1.0.0".to_string()),
            },
            packs: PackPaths {
                behavior: Some("packs/behavior".to_string()),
                resource: Some("packs/resource".to_string()),
            },
            sync: SyncConfig {
                default_target: Some("local".to_string()),
                targets,
            },
            ..ProjectConfig::default()
        };

        fs::create_dir_all(this.root())?;
        this.save_config(&config)?;
        this.write_manifests(None)?;
        Ok(this)
    }

    /// Add a script module in `language` with `@minecraft/server` as its dependency
    pub fn with_script(self, language: ScriptLanguage) -> Result<Self, Box<dyn std::error::Error>> {
        let entry = format!("scripts/main.{}", language.source_extension());

        let mut config = self.config()?;
        config.script = Some(ScriptConfig {
            entry: Some(entry.clone()),
            language: Some(language),
            dependencies: vec![ScriptDependency::new(
                "@minecraft/server",
                DEFAULT_SCRIPT_API_VERSION,
            )],
            api_version: None,
        });
        self.save_config(&config)?;

        self.write_manifests(Some(ScriptOptions {
            language,
            entry: entry.clone(),
            selection: ScriptSelection::default(),
        }))?;
        self.write(
            &format!("packs/behavior/{entry}"),
            "import { world } from \"@minecraft/server\";\n",
        )?;
        Ok(self)
    }

    pub fn temp_path(&self) -> &Path {
        self.fixture.path()
    }

    /// Directory holding `bkit.config.json`
    pub fn root(&self) -> PathBuf {
        self.fixture.path().join(&self.name)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join(CONFIG_FILE)
    }

    pub fn deploy_dir(&self, kind: PackKind) -> PathBuf {
        self.fixture.path().join("deploy").join(kind.to_string())
    }

    pub fn pack_dir(&self, kind: PackKind) -> PathBuf {
        self.root().join("packs").join(kind.to_string())
    }

    /// Write a file relative to the project root
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        self.fixture.write_file(&format!("{}/{relative}", self.name), content)
    }

    pub fn project(&self) -> Result<Project, Box<dyn std::error::Error>> {
        Ok(Project::load(&self.config_path())?)
    }

    pub fn config(&self) -> Result<ProjectConfig, Box<dyn std::error::Error>> {
        Ok(self.project()?.config)
    }

    /// Load, edit and save the config
    pub fn update_config<F>(&self, edit: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: FnOnce(&mut ProjectConfig),
    {
        let mut config = self.config()?;
        edit(&mut config);
        self.save_config(&config)
    }

    pub fn manifest(&self, kind: PackKind) -> Result<Manifest, Box<dyn std::error::Error>> {
        Ok(Manifest::load(&self.pack_dir(kind).join("manifest.json"))?)
    }

    fn save_config(&self, config: &ProjectConfig) -> Result<(), Box<dyn std::error::Error>> {
        Project::new(self.config_path(), config.clone()).save()?;
        Ok(())
    }

    fn write_manifests(&self, script: Option<ScriptOptions>) -> Result<(), Box<dyn std::error::Error>> {
        let options = GenerateOptions {
            description: format!("{} fixture", self.name),
            script,
            ..GenerateOptions::default()
        };
        let mut behavior = Manifest::generate(PackKind::Behavior, &self.name, &options);
        let mut resource = Manifest::generate(PackKind::Resource, &self.name, &options);
        link_packs(&mut behavior, &mut resource)?;

        behavior.save(&self.pack_dir(PackKind::Behavior).join("manifest.json"))?;
        resource.save(&self.pack_dir(PackKind::Resource).join("manifest.json"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    include!("filesystem.test.rs");
}
