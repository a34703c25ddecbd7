//! External capabilities the pipeline drives but does not implement
//!
//! - Bundler: compiles a script entry to a single runtime file (esbuild via npx)
//! - Archiver: writes zip archives (the `zip` crate)
//! - DeploymentRootLookup: finds a game installation root per product
//! - DependencyInstaller: manages script-API packages (npm)
//!
//! Everything is bundled into a cloneable [`Toolchain`] so long-running loops
//! can move it into blocking tasks.

use crate::application::session::ProcessProvider;
use crate::primitives::Product;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use zip::write::SimpleFileOptions;

#[derive(Debug, Error)]
pub enum ExternalToolError {
    #[error("{tool} failed (exit code {}): {stderr}", code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} not found on PATH")]
    NotFound { tool: String },

    #[error("{tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: io::Error,
    },
}

impl ExternalToolError {
    fn io(tool: &str, source: io::Error) -> Self {
        Self::Io {
            tool: tool.to_string(),
            source,
        }
    }
}

/// Input for one bundler run
#[derive(Debug, Clone, PartialEq)]
pub struct BundleRequest {
    /// Directory the bundler runs in (where `node_modules` lives)
    pub working_dir: PathBuf,
    pub entry: PathBuf,
    pub out_file: PathBuf,
    pub sourcemap: bool,
    /// Module names left as runtime imports
    pub externals: Vec<String>,
}

pub trait Bundler: Send + Sync {
    fn bundle(&self, request: &BundleRequest) -> Result<(), ExternalToolError>;
}

/// A set of files or directories placed under one directory in the archive
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveGroup {
    /// Directories are added recursively, their contents at `target`
    pub contents: Vec<PathBuf>,
    /// Path inside the archive; empty for the archive root
    pub target: String,
}

pub trait Archiver: Send + Sync {
    fn zip(&self, out_file: &Path, groups: &[ArchiveGroup]) -> Result<(), ExternalToolError>;
}

pub trait DeploymentRootLookup: Send + Sync {
    /// Game data root (the `com.mojang` directory) for `product`, if installed
    fn lookup(&self, product: Product) -> Option<PathBuf>;
}

pub trait DependencyInstaller: Send + Sync {
    fn install(&self, project_dir: &Path, specs: &[String]) -> Result<(), ExternalToolError>;

    fn uninstall(&self, project_dir: &Path, names: &[String]) -> Result<(), ExternalToolError>;
}

#[derive(Clone)]
pub struct Toolchain {
    pub bundler: Arc<dyn Bundler>,
    pub archiver: Arc<dyn Archiver>,
    pub roots: Arc<dyn DeploymentRootLookup>,
    pub installer: Arc<dyn DependencyInstaller>,
}

impl Toolchain {
    pub fn live(process: Arc<dyn ProcessProvider>) -> Self {
        Self {
            bundler: Arc::new(EsbuildBundler::new(process.clone())),
            archiver: Arc::new(ZipArchiver),
            roots: Arc::new(WindowsDeploymentRoots::from_base_dirs()),
            installer: Arc::new(NpmInstaller::new(process)),
        }
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}

/// Run a node-ecosystem tool through the process provider
fn run_tool(
    process: &dyn ProcessProvider,
    tool: &str,
    program: &str,
    args: &[String],
    working_dir: &Path,
) -> Result<(), ExternalToolError> {
    if process.find_program(program).is_none() {
        return Err(ExternalToolError::NotFound {
            tool: program.to_string(),
        });
    }

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    tracing::debug!(tool, program, args = ?args, dir = %working_dir.display(), "Running external tool");

    let output = process
        .execute(program, &arg_refs, working_dir)
        .map_err(|e| ExternalToolError::Io {
            tool: tool.to_string(),
            source: io::Error::other(e.to_string()),
        })?;

    if output.success {
        Ok(())
    } else {
        Err(ExternalToolError::Failed {
            tool: tool.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// `npx esbuild` bundler
pub struct EsbuildBundler {
    process: Arc<dyn ProcessProvider>,
}

impl EsbuildBundler {
    pub fn new(process: Arc<dyn ProcessProvider>) -> Self {
        Self { process }
    }

    pub fn arguments(request: &BundleRequest) -> Vec<String> {
        let mut args = vec![
            "esbuild".to_string(),
            request.entry.display().to_string(),
            "--bundle".to_string(),
            "--format=esm".to_string(),
            "--platform=neutral".to_string(),
            format!("--outfile={}", request.out_file.display()),
        ];
        args.extend(request.externals.iter().map(|m| format!("--external:{m}")));
        if request.sourcemap {
            args.push("--sourcemap".to_string());
        }
        args
    }
}

impl Bundler for EsbuildBundler {
    fn bundle(&self, request: &BundleRequest) -> Result<(), ExternalToolError> {
        if let Some(parent) = request.out_file.parent() {
            fs::create_dir_all(parent).map_err(|e| ExternalToolError::io("esbuild", e))?;
        }
        run_tool(
            self.process.as_ref(),
            "esbuild",
            "npx",
            &Self::arguments(request),
            &request.working_dir,
        )
    }
}

/// `npm install --save-dev` / `npm uninstall`
pub struct NpmInstaller {
    process: Arc<dyn ProcessProvider>,
}

impl NpmInstaller {
    pub fn new(process: Arc<dyn ProcessProvider>) -> Self {
        Self { process }
    }
}

impl DependencyInstaller for NpmInstaller {
    fn install(&self, project_dir: &Path, specs: &[String]) -> Result<(), ExternalToolError> {
        let mut args = vec!["install".to_string(), "--save-dev".to_string()];
        args.extend(specs.iter().cloned());
        run_tool(self.process.as_ref(), "npm install", "npm", &args, project_dir)
    }

    fn uninstall(&self, project_dir: &Path, names: &[String]) -> Result<(), ExternalToolError> {
        if names.is_empty() {
            return Ok(());
        }
        let mut args = vec!["uninstall".to_string()];
        args.extend(names.iter().cloned());
        run_tool(self.process.as_ref(), "npm uninstall", "npm", &args, project_dir)
    }
}

/// Zip archives written with the `zip` crate
///
/// Entries are sorted and carry a fixed timestamp so repeated runs over the
/// same inputs produce identical archives.
pub struct ZipArchiver;

impl ZipArchiver {
    fn collect_entries(groups: &[ArchiveGroup]) -> io::Result<Vec<(String, PathBuf)>> {
        let mut entries = Vec::new();
        for group in groups {
            let prefix = group.target.trim_matches('/');
            for source in &group.contents {
                if source.is_dir() {
                    for entry in walkdir::WalkDir::new(source)
                        .follow_links(true)
                        .sort_by_file_name()
                    {
                        let entry = entry.map_err(io::Error::from)?;
                        if !entry.file_type().is_file() {
                            continue;
                        }
                        let relative = super::fsutil::relative_slash(entry.path(), source)
                            .unwrap_or_default();
                        entries.push((join_archive_path(prefix, &relative), entry.into_path()));
                    }
                } else {
                    let name = source
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    entries.push((join_archive_path(prefix, &name), source.clone()));
                }
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|a, b| a.0 == b.0);
        Ok(entries)
    }
}

fn join_archive_path(prefix: &str, relative: &str) -> String {
    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{prefix}/{relative}")
    }
}

impl Archiver for ZipArchiver {
    fn zip(&self, out_file: &Path, groups: &[ArchiveGroup]) -> Result<(), ExternalToolError> {
        let io_err = |e: io::Error| ExternalToolError::io("zip", e);
        let zip_err = |e: zip::result::ZipError| ExternalToolError::io("zip", io::Error::other(e));

        let entries = Self::collect_entries(groups).map_err(io_err)?;
        if let Some(parent) = out_file.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = File::create(out_file).map_err(io_err)?;
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);

        for (name, path) in &entries {
            writer.start_file(name.as_str(), options).map_err(zip_err)?;
            let bytes = fs::read(path).map_err(io_err)?;
            writer.write_all(&bytes).map_err(io_err)?;
        }

        writer.finish().map_err(zip_err)?;
        tracing::debug!(archive = %out_file.display(), entries = entries.len(), "Wrote archive");
        Ok(())
    }
}

const UWP_PACKAGE: &str = "Microsoft.MinecraftUWP_8wekyb3d8bbwe";
const UWP_PREVIEW_PACKAGE: &str = "Microsoft.MinecraftWindowsBeta_8wekyb3d8bbwe";

/// Game roots derived from the user's local and roaming data directories
pub struct WindowsDeploymentRoots {
    local_app_data: Option<PathBuf>,
    roaming_app_data: Option<PathBuf>,
}

impl WindowsDeploymentRoots {
    pub fn from_base_dirs() -> Self {
        let base = directories::BaseDirs::new();
        Self {
            local_app_data: base.as_ref().map(|b| b.data_local_dir().to_path_buf()),
            roaming_app_data: base.as_ref().map(|b| b.data_dir().to_path_buf()),
        }
    }

    pub fn with_dirs(local_app_data: Option<PathBuf>, roaming_app_data: Option<PathBuf>) -> Self {
        Self {
            local_app_data,
            roaming_app_data,
        }
    }

    /// Where the product would live, whether or not it is installed
    pub fn candidate(&self, product: Product) -> Option<PathBuf> {
        match product {
            Product::BedrockUWP | Product::PreviewUWP => {
                let package = if product == Product::BedrockUWP {
                    UWP_PACKAGE
                } else {
                    UWP_PREVIEW_PACKAGE
                };
                self.local_app_data.as_ref().map(|local| {
                    local
                        .join("Packages")
                        .join(package)
                        .join("LocalState")
                        .join("games")
                        .join("com.mojang")
                })
            }
            Product::BedrockGDK | Product::PreviewGDK => {
                let folder = if product == Product::BedrockGDK {
                    "Minecraft Bedrock"
                } else {
                    "Minecraft Bedrock Preview"
                };
                self.roaming_app_data.as_ref().map(|roaming| {
                    roaming
                        .join(folder)
                        .join("Users")
                        .join("Shared")
                        .join("games")
                        .join("com.mojang")
                })
            }
        }
    }
}

impl DeploymentRootLookup for WindowsDeploymentRoots {
    fn lookup(&self, product: Product) -> Option<PathBuf> {
        self.candidate(product).filter(|p| p.is_dir())
    }
}

#[cfg(test)]
mod tests {
    include!("externals.test.rs");
}
