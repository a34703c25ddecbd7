//! Machine-readable command results for `--json` mode
//!
//! Every command emits exactly one object on stdout: `{"ok": bool, ...}` with
//! whichever of `issues`, `artifacts`, `synced`, `linked`, `projects` apply.

use serde::Serialize;
use std::path::Path;

/// One entry of a sync or link report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub pack: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced: Option<Vec<ReportEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked: Option<Vec<ReportEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandReport {
    pub fn success(command: &str) -> Self {
        Self {
            ok: true,
            command: Some(command.to_string()),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn for_command(mut self, command: &str) -> Self {
        self.command = Some(command.to_string());
        self
    }

    /// Issues make a report unsuccessful
    pub fn with_issues(mut self, issues: Vec<String>) -> Self {
        self.ok = self.ok && issues.is_empty();
        self.issues = Some(issues);
        self
    }

    pub fn with_artifacts<P: AsRef<Path>>(mut self, artifacts: &[P]) -> Self {
        self.artifacts = Some(
            artifacts
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect(),
        );
        self
    }

    pub fn with_synced(mut self, entries: Vec<ReportEntry>) -> Self {
        self.synced = Some(entries);
        self
    }

    pub fn with_linked(mut self, entries: Vec<ReportEntry>) -> Self {
        self.linked = Some(entries);
        self
    }

    pub fn with_projects(mut self, projects: Vec<serde_json::Value>) -> Self {
        self.projects = Some(projects);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<serde_json::Value>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!("{{\"ok\":false,\"error\":\"failed to serialize report: {e}\"}}")
        })
    }
}

#[cfg(test)]
mod tests {
    include!("report.test.rs");
}
