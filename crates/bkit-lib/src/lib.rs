//! # bkit Library
//!
//! Minecraft Bedrock add-on tooling: scaffold, build, link, package and
//! deploy behavior and resource packs.
//!
//! ## Core Modules
//!
//! - [`primitives`] - Foundation types, errors, and the add-on vocabulary
//! - [`terminal`] - Cross-platform terminal capability detection
//! - [`logger`] - Structured logging with progress tracking
//! - [`display`] - Status lines, spinners and the JSON command report
//! - [`bkit`] - Project config, manifests, materialization, packaging, sync and watch
//! - [`application`] - CLI interface, configuration, sessions and commands
//!
//! ## Quick Start
//!
//! ```no_run
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! bkit_lib::main().await.unwrap();
//! # })
//! ```

pub mod application;
pub mod bkit;
pub mod display;
pub mod logger;
pub mod primitives;
pub mod terminal;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use application::{AppConfig, Cli, Commands, PromptCancelled, execute_command};
pub use bkit::{Project, ProjectConfig, Toolchain};
pub use logger::Logger;
pub use primitives::{
    ConfigError, LogFormat, LogLevel, LogOutput, LoggerError, TerminalCapsDetectIntent,
    TerminalColorCaps,
};
pub use terminal::TerminalCapabilities;

// Private imports for the main function
use anyhow::Result;
use application::CliConfig;

pub async fn main() -> Result<()> {
    // .env files feed clap's env fallbacks, so they go first
    AppConfig::load_env_files()?;
    let config = CliConfig::load()?;

    execute_command(config).await
}
