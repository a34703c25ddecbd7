use crate::application::AppConfig;
use crate::primitives::{TerminalCapsDetectIntent, TerminalColorCaps};
use std::io::{self, IsTerminal};

/// What the attached terminal can render
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalCapabilities {
    pub color: TerminalColorCaps,
    pub unicode: bool,
    pub is_tty: bool,
    pub cols: u16,
}

impl Default for TerminalCapabilities {
    fn default() -> Self {
        Self {
            color: TerminalColorCaps::None,
            unicode: false,
            is_tty: false,
            cols: 80,
        }
    }
}

impl TerminalCapabilities {
    /// Detect capabilities, honouring the resolved `--color` intent
    pub fn detect_from_config(config: &AppConfig) -> Self {
        let term = console::Term::stdout();
        let is_tty = io::stdout().is_terminal();

        let color = match config.color {
            TerminalCapsDetectIntent::Never => TerminalColorCaps::None,
            TerminalCapsDetectIntent::Always => detect_color_depth(),
            TerminalCapsDetectIntent::Auto if is_tty && console::colors_enabled() => {
                detect_color_depth()
            }
            TerminalCapsDetectIntent::Auto => TerminalColorCaps::None,
        };

        // Keep console's own styling in sync with our decision
        console::set_colors_enabled(color != TerminalColorCaps::None);

        let cols = term.size_checked().map(|(_, cols)| cols).unwrap_or(80);

        Self {
            color,
            unicode: is_tty && detect_unicode(),
            is_tty,
            cols,
        }
    }

    /// Plain capabilities for machine output and tests
    pub fn plain() -> Self {
        Self::default()
    }
}

fn detect_color_depth() -> TerminalColorCaps {
    let colorterm = std::env::var("COLORTERM").unwrap_or_default();
    if colorterm.eq_ignore_ascii_case("truecolor") || colorterm.eq_ignore_ascii_case("24bit") {
        return TerminalColorCaps::TrueColor;
    }

    let term = std::env::var("TERM").unwrap_or_default();
    if term.contains("256color") {
        TerminalColorCaps::Ansi256
    } else {
        TerminalColorCaps::Ansi16
    }
}

fn detect_unicode() -> bool {
    if cfg!(windows) {
        // Windows Terminal and VS Code render unicode; legacy conhost does not
        return std::env::var_os("WT_SESSION").is_some()
            || std::env::var("TERM_PROGRAM").is_ok_and(|p| p == "vscode");
    }

    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty())
        .is_none_or(|value| value.to_uppercase().contains("UTF-8") || value.to_uppercase().contains("UTF8"))
}

#[cfg(test)]
mod tests {
    include!("capabilities.test.rs");
}
