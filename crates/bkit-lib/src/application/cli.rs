use crate::primitives::{BumpLevel, ConfigError, ScriptLanguage};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::config::AppConfig;

/// bkit CLI - Minecraft Bedrock add-on tooling
#[derive(Debug, Clone, Parser)]
#[command(name = "bkit")]
#[command(about = "Scaffold, build, package and deploy Bedrock add-ons")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Global configuration options
    #[command(flatten)]
    pub config: AppConfig,

    /// bkit commands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Configuration loaded from CLI
pub struct CliConfig {
    pub app_config: AppConfig,
    pub command: Option<Commands>,
}

impl CliConfig {
    /// Load configuration from command line arguments
    pub fn load() -> Result<Self, ConfigError> {
        let cli = Cli::parse();
        Ok(Self {
            app_config: cli.config,
            command: cli.command,
        })
    }
}

/// Which project a command acts on
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct ProjectArgs {
    /// Project name or path (defaults to the project in the working directory)
    #[arg(short, long)]
    pub project: Option<String>,
}

/// Project selection for commands that can fan out over every project
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct MultiProjectArgs {
    #[command(flatten)]
    pub selection: ProjectArgs,

    /// Act on every discovered project, one after another
    #[arg(short, long, conflicts_with = "project")]
    pub all: bool,
}

/// Available bkit commands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show version information
    Version,

    /// Create a new add-on project
    Init {
        /// Directory to create the project in (defaults to the working directory)
        dir: Option<PathBuf>,

        /// Project name
        #[arg(short, long)]
        name: Option<String>,

        /// Pack description written into both manifests
        #[arg(short, long)]
        description: Option<String>,

        /// Script language for the behavior pack
        #[arg(short, long, value_enum)]
        language: Option<ScriptLanguage>,

        /// Create packs without a script module
        #[arg(long, conflicts_with = "language")]
        no_script: bool,

        /// Overwrite an existing project
        #[arg(short, long)]
        force: bool,

        /// Do not install script dependencies
        #[arg(long)]
        skip_install: bool,
    },

    /// Build packs into the output directory (copy)
    Build {
        #[command(flatten)]
        projects: MultiProjectArgs,
    },

    /// Build with links and point a sync target at the output
    Link {
        #[command(flatten)]
        project: ProjectArgs,

        /// Sync target name (defaults to sync.defaultTarget)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Replace a linked sync target with a plain copy
    Unlink {
        #[command(flatten)]
        project: ProjectArgs,

        /// Sync target name (defaults to sync.defaultTarget)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Archive built packs as .mcpack / .mcaddon
    Package {
        #[command(flatten)]
        project: ProjectArgs,

        /// Archive the existing output instead of building first
        #[arg(long)]
        no_build: bool,
    },

    /// Copy built packs to a sync target
    Sync {
        #[command(flatten)]
        project: ProjectArgs,

        /// Sync target name (defaults to sync.defaultTarget)
        #[arg(short, long)]
        target: Option<String>,

        /// Show what would happen without touching the filesystem
        #[arg(long)]
        dry_run: bool,

        /// Sync the existing output instead of building first
        #[arg(long)]
        no_build: bool,
    },

    /// Rebuild on change with linked output until interrupted
    Watch {
        #[command(flatten)]
        projects: MultiProjectArgs,

        /// Sync target name (defaults to each project's sync.defaultTarget)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Bump the project version in the config and both manifests
    Bump {
        #[command(flatten)]
        project: ProjectArgs,

        /// Semantic bump level
        #[arg(value_enum, required_unless_present = "set")]
        level: Option<BumpLevel>,

        /// Explicit version (overrides the level)
        #[arg(long)]
        set: Option<String>,

        /// New header.min_engine_version for both manifests
        #[arg(long)]
        min_engine: Option<String>,
    },

    /// Manage script-API dependencies
    Deps {
        #[command(flatten)]
        project: ProjectArgs,

        #[command(subcommand)]
        action: DepsAction,
    },

    /// Check the config and manifests for consistency
    Validate {
        #[command(flatten)]
        projects: MultiProjectArgs,

        /// Also require descriptions and min engine versions
        #[arg(long)]
        strict: bool,
    },

    /// List discovered projects
    List,

    /// Show or change CLI settings
    Settings {
        /// Interface language
        #[arg(long)]
        language: Option<String>,

        /// Directory searched for projects
        #[arg(long, conflicts_with = "clear_project_root")]
        project_root: Option<PathBuf>,

        /// Forget the saved project root
        #[arg(long)]
        clear_project_root: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum DepsAction {
    /// Add or update a dependency (`name` or `name@version`)
    Add { spec: String },
    /// Remove a dependency
    Remove { module_name: String },
    /// List declared dependencies
    List,
}

impl Commands {
    /// Name used in reports and logs
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Version => "version",
            Commands::Init { .. } => "init",
            Commands::Build { .. } => "build",
            Commands::Link { .. } => "link",
            Commands::Unlink { .. } => "unlink",
            Commands::Package { .. } => "package",
            Commands::Sync { .. } => "sync",
            Commands::Watch { .. } => "watch",
            Commands::Bump { .. } => "bump",
            Commands::Deps { .. } => "deps",
            Commands::Validate { .. } => "validate",
            Commands::List => "list",
            Commands::Settings { .. } => "settings",
        }
    }

    /// Check if command needs an existing project
    pub fn requires_project(&self) -> bool {
        !matches!(
            self,
            Commands::Version | Commands::Init { .. } | Commands::List | Commands::Settings { .. }
        )
    }

    /// Commands that first finalize a watch session left behind by a crash
    ///
    /// A dry-run sync only reports the leftover record.
    pub fn recovers_watch_state(&self) -> bool {
        matches!(
            self,
            Commands::Build { .. }
                | Commands::Link { .. }
                | Commands::Unlink { .. }
                | Commands::Sync { dry_run: false, .. }
                | Commands::Watch { .. }
        )
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    include!("cli.test.rs");
}
