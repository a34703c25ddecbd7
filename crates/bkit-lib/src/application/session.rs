//! Command session architecture
//!
//! Implements the Session-Scoped Dependency Injection Pattern.
//! Each command execution creates a session that owns all ephemeral state.

use crate::application::config::AppConfig;
use crate::application::settings::SettingsContext;
use crate::bkit::externals::Toolchain;
use crate::display::{DisplayProvider, LiveDisplayProvider};
use crate::Result;
use anyhow::Context;
use indicatif::MultiProgress;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// The user dismissed a prompt; the command stops without side effects
#[derive(Debug, Error)]
#[error("cancelled")]
pub struct PromptCancelled;

/// Output of a finished external process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

/// Provider trait for running external programs
pub trait ProcessProvider: Send + Sync {
    /// Execute a command with arguments in a specific directory
    fn execute(&self, command: &str, args: &[&str], working_dir: &Path) -> Result<ProcessOutput>;

    /// Resolve a program on PATH
    fn find_program(&self, program: &str) -> Option<PathBuf>;
}

/// Provider trait for configuration access
pub trait ConfigProvider {
    fn app_config(&self) -> &AppConfig;
}

/// Provider trait for user prompts
pub trait InteractiveProvider {
    fn text_input(&self, prompt: &str, default: String) -> Result<String>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    fn select(&self, prompt: &str, options: &[&str]) -> Result<usize>;

    /// `None` when the user dismisses the list
    fn fuzzy_select(&self, prompt: &str, options: &[String]) -> Result<Option<usize>>;
}

/// Everything a command handler can reach
pub trait Session {
    fn display(&self) -> &dyn DisplayProvider;

    fn process(&self) -> &dyn ProcessProvider;

    fn config(&self) -> &dyn ConfigProvider;

    fn interactive(&self) -> &dyn InteractiveProvider;

    /// Bundler, archiver, deployment roots and package installer
    fn toolchain(&self) -> &Toolchain;

    fn settings(&self) -> &SettingsContext;

    /// Working directory from the config, else the process's own
    fn workdir(&self) -> Result<PathBuf> {
        Ok(self.config().app_config().workdir_or_current()?)
    }
}

/// Live implementation of ProcessProvider
#[derive(Debug, Default)]
pub struct LiveProcessProvider {
    /// Replaces PATH for lookups and children; `None` uses the process PATH
    search_path: Option<OsString>,
}

impl LiveProcessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve programs with `bin_dir` in front of the current PATH
    pub fn with_bin_dir(bin_dir: &Path) -> Self {
        let mut dirs = vec![bin_dir.to_path_buf()];
        if let Some(path) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path));
        }
        Self {
            search_path: std::env::join_paths(dirs).ok(),
        }
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        // which applies PATHEXT on Windows so `npx` finds `npx.cmd`
        match &self.search_path {
            Some(path) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(program, Some(path), cwd).ok()
            }
            None => which::which(program).ok(),
        }
    }
}

impl ProcessProvider for LiveProcessProvider {
    fn execute(&self, command: &str, args: &[&str], working_dir: &Path) -> Result<ProcessOutput> {
        use std::process::Command;

        let program = self.resolve(command).unwrap_or_else(|| PathBuf::from(command));

        tracing::debug!(command, ?args, dir = %working_dir.display(), "spawning");
        let mut child = Command::new(&program);
        child.args(args).current_dir(working_dir);
        if let Some(path) = &self.search_path {
            child.env("PATH", path);
        }
        let output = child
            .output()
            .with_context(|| format!("Failed to execute command: {}", command))?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }

    fn find_program(&self, program: &str) -> Option<PathBuf> {
        self.resolve(program)
    }
}

/// Live implementation of ConfigProvider
pub struct LiveConfigProvider {
    app_config: AppConfig,
}

impl LiveConfigProvider {
    pub fn new(app_config: AppConfig) -> Self {
        Self { app_config }
    }
}

impl ConfigProvider for LiveConfigProvider {
    fn app_config(&self) -> &AppConfig {
        &self.app_config
    }
}

/// Live implementation of InteractiveProvider
pub struct LiveInteractiveProvider {
    yes_mode: bool,
}

impl LiveInteractiveProvider {
    pub fn new(yes_mode: bool) -> Self {
        Self { yes_mode }
    }

    /// Check if we're in a TTY environment suitable for interactive prompts
    fn is_tty() -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
    }

    fn non_interactive(&self) -> bool {
        self.yes_mode || !Self::is_tty()
    }
}

impl InteractiveProvider for LiveInteractiveProvider {
    fn text_input(&self, prompt: &str, default: String) -> Result<String> {
        if self.non_interactive() {
            return Ok(default);
        }

        use dialoguer::Input;

        Input::new()
            .with_prompt(prompt)
            .default(default)
            .interact_text()
            .context("Failed to read text input")
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive() {
            return Ok(default);
        }

        use dialoguer::Confirm;

        let answer = Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact_opt()
            .context("Failed to read confirmation")?;
        answer.ok_or_else(|| PromptCancelled.into())
    }

    fn select(&self, prompt: &str, options: &[&str]) -> Result<usize> {
        if self.non_interactive() {
            return Ok(0);
        }

        use dialoguer::Select;

        let choice = Select::new()
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact_opt()
            .context("Failed to read selection")?;
        choice.ok_or_else(|| PromptCancelled.into())
    }

    fn fuzzy_select(&self, prompt: &str, options: &[String]) -> Result<Option<usize>> {
        if self.non_interactive() {
            return Ok(Some(0));
        }

        use dialoguer::FuzzySelect;

        FuzzySelect::new()
            .with_prompt(prompt)
            .items(options)
            .max_length(8)
            .interact_opt() // ESC cancels
            .context("Failed to read fuzzy selection")
    }
}

/// CommandSession owns all ephemeral state for a single command execution
pub struct CommandSession<P, C, I>
where
    P: ProcessProvider + 'static,
    C: ConfigProvider,
    I: InteractiveProvider,
{
    /// Keeps spinners of this session on one draw target
    #[allow(dead_code)]
    multi_progress: MultiProgress,
    display_provider: LiveDisplayProvider,
    process_provider: Arc<P>,
    config_provider: C,
    interactive_provider: I,
    toolchain: Toolchain,
    settings: SettingsContext,
}

impl CommandSession<LiveProcessProvider, LiveConfigProvider, LiveInteractiveProvider> {
    /// Create a new command session with owned state (production composition)
    ///
    /// `app_config` must already be validated so the settings root is known.
    pub fn new(app_config: AppConfig) -> Result<Self> {
        let terminal_caps = crate::terminal::TerminalCapabilities::detect_from_config(&app_config);
        let _ = crate::display::Display::init(terminal_caps.clone());
        let logger_config = app_config.to_logger_config(&terminal_caps);
        let _ = crate::logger::Logger::init(logger_config);

        let settings_root = match &app_config.settings_root {
            Some(root) => root.clone(),
            None => app_config.workdir_or_current()?,
        };
        let settings = SettingsContext::load(&settings_root)?;

        let process_provider = Arc::new(LiveProcessProvider::new());
        let toolchain = Toolchain::live(process_provider.clone());

        let multi_progress = MultiProgress::new();
        let display_provider =
            LiveDisplayProvider::new_with_multi_progress(&multi_progress, app_config.json);

        Ok(Self {
            multi_progress,
            display_provider,
            process_provider,
            interactive_provider: LiveInteractiveProvider::new(app_config.yes),
            config_provider: LiveConfigProvider::new(app_config),
            toolchain,
            settings,
        })
    }
}

impl<P, C, I> CommandSession<P, C, I>
where
    P: ProcessProvider + 'static,
    C: ConfigProvider,
    I: InteractiveProvider,
{
    /// Compose a session from custom providers (for testing)
    ///
    /// The toolchain runs its external programs through `process_provider`.
    #[cfg(feature = "test-utils")]
    pub fn new_with_providers(
        process_provider: P,
        config_provider: C,
        interactive_provider: I,
        settings: SettingsContext,
    ) -> Self {
        let process_provider = Arc::new(process_provider);
        let toolchain = Toolchain::live(process_provider.clone());

        let multi_progress = MultiProgress::new();
        let display_provider = LiveDisplayProvider::new_with_multi_progress(
            &multi_progress,
            config_provider.app_config().json,
        );

        Self {
            multi_progress,
            display_provider,
            process_provider,
            config_provider,
            interactive_provider,
            toolchain,
            settings,
        }
    }
}

impl<P, C, I> Session for CommandSession<P, C, I>
where
    P: ProcessProvider + 'static,
    C: ConfigProvider,
    I: InteractiveProvider,
{
    fn display(&self) -> &dyn DisplayProvider {
        &self.display_provider
    }

    fn process(&self) -> &dyn ProcessProvider {
        self.process_provider.as_ref()
    }

    fn config(&self) -> &dyn ConfigProvider {
        &self.config_provider
    }

    fn interactive(&self) -> &dyn InteractiveProvider {
        &self.interactive_provider
    }

    fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    fn settings(&self) -> &SettingsContext {
        &self.settings
    }
}
