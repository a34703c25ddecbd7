//! Terminal display system
//!
//! Semantic APIs for user-facing communication that adapt to terminal
//! capabilities. Logging goes through tracing; this module only covers what
//! the user is meant to read (status lines, spinners, the JSON report).

use crate::primitives::ConfigError;
use crate::terminal::TerminalCapabilities;
use std::sync::OnceLock;

pub mod live;
pub mod mock;
pub mod providers;
pub mod report;
pub mod status;
pub mod styling;

pub use live::LiveDisplayProvider;
pub use mock::{DisplayCall, MockDisplayProvider};
pub use providers::{DisplayProvider, ProgressProvider, ProgressTracker, StatusProvider};
pub use report::{CommandReport, ReportEntry};

static GLOBAL_DISPLAY: OnceLock<Display> = OnceLock::new();

/// Main display manager that coordinates all user-facing communication
pub struct Display {
    capabilities: TerminalCapabilities,
    styling: styling::StyleManager,
}

impl Display {
    fn new(capabilities: TerminalCapabilities) -> Self {
        let styling = styling::StyleManager::new(&capabilities);
        Self {
            capabilities,
            styling,
        }
    }

    /// Initialize global display system with terminal capabilities
    pub fn init(capabilities: TerminalCapabilities) -> Result<&'static Self, ConfigError> {
        if GLOBAL_DISPLAY.get().is_some() {
            return Err(ConfigError::AlreadyInitialized);
        }

        GLOBAL_DISPLAY
            .set(Display::new(capabilities))
            .map_err(|_| ConfigError::AlreadyInitialized)?;

        Ok(Self::global())
    }

    /// Global display; falls back to plain output when `init` was never called
    pub fn global() -> &'static Self {
        GLOBAL_DISPLAY.get_or_init(|| Display::new(TerminalCapabilities::plain()))
    }

    pub fn status() -> status::StatusDisplay<'static> {
        status::StatusDisplay::new(&Self::global().styling)
    }

    pub fn capabilities() -> &'static TerminalCapabilities {
        &Self::global().capabilities
    }

    pub fn styling() -> &'static styling::StyleManager {
        &Self::global().styling
    }
}
