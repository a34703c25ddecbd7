//! Application layer modules
//!
//! Organizes CLI interface, configuration management, sessions and command
//! dispatch.

pub mod cli;
pub mod commands;
pub mod config;
pub mod env;
pub mod loader;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod session_mocks;
pub mod settings;

// Re-export main types for convenience
pub use cli::{Cli, CliConfig, Commands};
pub use commands::{execute_command, execute_command_with_session};
pub use config::AppConfig;
pub use session::{CommandSession, PromptCancelled, Session};
pub use settings::{Settings, SettingsContext};
