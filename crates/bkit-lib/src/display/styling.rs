//! Terminal-aware styling
//!
//! Semantic colors and symbols, degraded to ASCII and plain text when the
//! terminal cannot render them.

use crate::primitives::TerminalColorCaps;
use crate::terminal::TerminalCapabilities;
use console::Style;

/// Status symbols for one rendering mode
#[derive(Debug, Clone, Copy)]
pub struct Symbols {
    pub checkmark: &'static str,
    pub cross: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub bullet: &'static str,
}

const UNICODE_SYMBOLS: Symbols = Symbols {
    checkmark: "✓",
    cross: "✗",
    warning: "⚠",
    info: "ℹ",
    arrow: "→",
    bullet: "•",
};

const ASCII_SYMBOLS: Symbols = Symbols {
    checkmark: "+",
    cross: "x",
    warning: "!",
    info: "-",
    arrow: ">",
    bullet: "*",
};

pub struct StyleManager {
    symbols: Symbols,
    success: Style,
    error: Style,
    warning: Style,
    info: Style,
    emphasis: Style,
    subtle: Style,
}

impl StyleManager {
    pub fn new(capabilities: &TerminalCapabilities) -> Self {
        let symbols = if capabilities.unicode {
            UNICODE_SYMBOLS
        } else {
            ASCII_SYMBOLS
        };

        let colored = capabilities.color != TerminalColorCaps::None;
        let style = |s: Style| if colored { s.force_styling(true) } else { Style::new().force_styling(false) };

        Self {
            symbols,
            success: style(Style::new().green()),
            error: style(Style::new().red().bold()),
            warning: style(Style::new().yellow()),
            info: style(Style::new().cyan()),
            emphasis: style(Style::new().bold()),
            subtle: style(Style::new().dim()),
        }
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn style_emphasis(&self, text: &str) -> String {
        self.emphasis.apply_to(text).to_string()
    }

    pub fn style_subtle(&self, text: &str) -> String {
        self.subtle.apply_to(text).to_string()
    }

    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.success.apply_to(self.symbols.checkmark), message)
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.error.apply_to(self.symbols.cross), message)
    }

    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.warning.apply_to(self.symbols.warning), message)
    }

    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.info.apply_to(self.symbols.info), message)
    }

    /// Working/progress line (info color with arrow)
    pub fn format_working(&self, message: &str) -> String {
        format!("{} {}", self.info.apply_to(self.symbols.arrow), message)
    }

    pub fn bullet(&self) -> &'static str {
        self.symbols.bullet
    }
}
