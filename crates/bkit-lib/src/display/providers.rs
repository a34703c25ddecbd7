//! Display provider traits for dependency injection
//!
//! All user communication from command handlers goes through these traits so
//! the handlers can run against a recording mock in tests.

use super::report::CommandReport;

/// Provider trait for all user-facing communication
pub trait DisplayProvider {
    /// Status lines with semantic meaning
    fn status(&self) -> Box<dyn StatusProvider>;

    /// Spinners for long-running steps
    fn progress(&self) -> Box<dyn ProgressProvider>;

    /// Final machine-readable result of a command
    ///
    /// Only rendered in `--json` mode; human mode has already printed status lines.
    fn report(&self, report: &CommandReport);
}

/// Provider trait for status updates and user feedback
pub trait StatusProvider {
    fn working(&self, task: &str);

    fn success(&self, item: &str, details: &str);

    fn error(&self, item: &str, details: &str);

    fn warning(&self, message: &str);

    fn info(&self, message: &str);

    /// A plain line without status symbols
    fn message(&self, text: &str);

    fn subtle(&self, text: &str);

    fn list(&self, items: &[&str]);

    fn section(&self, title: &str);
}

/// Provider trait for progress tracking
pub trait ProgressProvider {
    /// Create a spinner for operations with unknown duration
    fn spinner(&self, message: &str) -> Box<dyn ProgressTracker>;
}

/// Individual progress tracker interface
pub trait ProgressTracker {
    fn set_message(&self, message: &str);

    fn finish(&self, message: &str);

    fn abandon(&self, message: &str);

    fn finish_clear(&self);
}
