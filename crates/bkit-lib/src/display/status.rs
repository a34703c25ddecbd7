//! Status display for user feedback
//!
//! Semantic status lines in place of raw println! in command handlers.

use super::styling::StyleManager;
use std::io::{self, Write};

/// Status display manager for semantic user feedback
pub struct StatusDisplay<'a> {
    styling: &'a StyleManager,
}

impl<'a> StatusDisplay<'a> {
    pub(crate) fn new(styling: &'a StyleManager) -> Self {
        Self { styling }
    }

    /// Display a working status
    ///
    /// Example: `Display::status().working("bundling scripts")`
    /// Output: `→ bundling scripts...`
    pub fn working(&self, task: &str) {
        println!("{}", self.styling.format_working(&format!("{task}...")));
        io::stdout().flush().unwrap_or(());
    }

    /// Display a success status with optional details
    ///
    /// Example: `Display::status().success("behavior", "dist/packs/behavior")`
    /// Output: `✓ behavior: dist/packs/behavior`
    pub fn success(&self, item: &str, details: &str) {
        println!("{}", self.styling.format_success(&join_detail(item, details)));
    }

    /// Display an error status with details
    pub fn error(&self, item: &str, details: &str) {
        eprintln!("{}", self.styling.format_error(&join_detail(item, details)));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.styling.format_warning(message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.styling.format_info(message));
    }

    /// Display a plain message without status symbols
    pub fn message(&self, text: &str) {
        println!("{text}");
    }

    pub fn subtle(&self, text: &str) {
        println!("{}", self.styling.style_subtle(text));
    }

    /// Display a list of items with bullets
    pub fn list(&self, items: &[&str]) {
        for item in items {
            println!("  {} {}", self.styling.bullet(), item);
        }
    }

    /// Display a header for a section of work
    pub fn section(&self, title: &str) {
        println!();
        println!("{}", self.styling.style_emphasis(title));
    }
}

pub(crate) fn join_detail(item: &str, details: &str) -> String {
    if details.is_empty() {
        item.to_string()
    } else {
        format!("{item}: {details}")
    }
}

#[cfg(test)]
mod tests {
    include!("status.test.rs");
}
