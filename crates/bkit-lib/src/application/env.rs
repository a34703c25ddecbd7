//! Standard environment variables that shape terminal behaviour
//!
//! `NO_COLOR`, `FORCE_COLOR`, `CLICOLOR` and `CI` are read through envy and
//! folded into the color intent and the interactivity decision.

use crate::primitives::{ConfigError, TerminalCapsDetectIntent};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentConfig {
    /// Any non-empty value disables color
    pub no_color: Option<String>,
    /// `0`/`false` disables, `1`/`2`/`3`/`true` forces color
    pub force_color: Option<String>,
    /// `0` disables color
    pub clicolor: Option<String>,
    /// Present on CI runners
    pub ci: Option<String>,
}

impl EnvironmentConfig {
    pub fn load() -> Result<Self, ConfigError> {
        envy::from_env().map_err(|e| ConfigError::EnvironmentParsingFailed { source: e })
    }

    pub fn is_ci(&self) -> bool {
        self.ci.is_some()
    }

    /// Resolve the color intent
    ///
    /// CI always wins. Otherwise FORCE_COLOR beats NO_COLOR, which beats CLICOLOR.
    pub fn apply_color_config(&self, color: TerminalCapsDetectIntent) -> TerminalCapsDetectIntent {
        if self.is_ci() {
            return TerminalCapsDetectIntent::Never;
        }

        match self.force_color.as_deref() {
            Some("0" | "false") => return TerminalCapsDetectIntent::Never,
            Some("1" | "2" | "3" | "true") => return TerminalCapsDetectIntent::Always,
            _ => {}
        }

        let no_color = self.no_color.as_deref().is_some_and(|v| !v.is_empty());
        let clicolor_off = self.clicolor.as_deref() == Some("0");
        if no_color || clicolor_off {
            TerminalCapsDetectIntent::Never
        } else {
            color
        }
    }
}

#[cfg(test)]
mod tests {
    include!("env.test.rs");
}
