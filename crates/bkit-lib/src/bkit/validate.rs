//! Config and manifest consistency checks
//!
//! Every check runs; issues are collected as human-readable strings and never
//! raised as errors. Exit-code policy belongs to the command layer.

use super::config::{Project, ProjectConfig};
use super::manifest::{Manifest, is_bundled_package};
use crate::primitives::{PackKind, VersionTuple};

/// Structural checks on the config alone
pub fn validate_config(config: &ProjectConfig) -> Vec<String> {
    let mut issues = Vec::new();

    if config.name().is_none() {
        issues.push("project.name is required".to_string());
    }
    match config.project.version.as_deref().map(str::trim) {
        None | Some("") => issues.push("project.version is required".to_string()),
        Some(version) => {
            if VersionTuple::parse(version).is_err() {
                issues.push(format!("project.version '{version}' is not a major.minor.patch version"));
            }
        }
    }

    for kind in PackKind::ALL {
        if config.pack_selection.is_enabled(kind) && config.packs.get(kind).is_none() {
            issues.push(format!("packs.{kind} is required while the {kind} pack is enabled"));
        }
    }

    if config.build.out_dir.trim().is_empty() {
        issues.push("build.outDir is required".to_string());
    }

    let sync = &config.sync;
    match sync.default_target.as_deref().filter(|t| !t.trim().is_empty()) {
        None => issues.push("sync.defaultTarget is required".to_string()),
        Some(name) if !sync.targets.is_empty() && !sync.targets.contains_key(name) => {
            issues.push(format!("sync.defaultTarget '{name}' is not one of sync.targets"));
        }
        Some(_) => {}
    }

    for (name, target) in &sync.targets {
        match &target.product {
            Some(_) => {
                if let Err(reason) = target.resolve() {
                    issues.push(format!("sync.targets.{name}: {reason}"));
                }
                if target.has_paths() {
                    issues.push(format!(
                        "sync.targets.{name}: set either product or behavior/resource paths, not both"
                    ));
                }
            }
            None => {
                for kind in PackKind::ALL {
                    if config.pack_selection.is_enabled(kind) && target.path(kind).is_none() {
                        issues.push(format!(
                            "sync.targets.{name}.{kind} is required while the {kind} pack is enabled"
                        ));
                    }
                }
            }
        }
    }

    if let Some(script) = &config.script {
        if script.entry.as_deref().is_none_or(|e| e.trim().is_empty()) {
            issues.push("script.entry is required".to_string());
        }
        if script.language.is_none() {
            issues.push("script.language is required".to_string());
        }
        if script.dependencies.is_empty() {
            issues.push("script.dependencies must not be empty".to_string());
        }
        if let Some(api_version) = &script.api_version
            && !api_version.is_string()
        {
            issues.push("script.apiVersion must be a string".to_string());
        }
    }

    issues
}

/// Cross-checks between the config and the two manifests
///
/// A `None` manifest means the pack is disabled or could not be loaded; checks
/// that need it are skipped.
pub fn validate_manifests(
    config: &ProjectConfig,
    behavior: Option<&Manifest>,
    resource: Option<&Manifest>,
    strict: bool,
) -> Vec<String> {
    let mut issues = Vec::new();

    if let (Some(bp), Some(rp)) = (behavior, resource) {
        if let (Some(bp_uuid), Some(rp_uuid)) = (bp.pack_uuid(), rp.pack_uuid()) {
            if !bp.depends_on_pack(rp_uuid) {
                issues.push(format!(
                    "behavior manifest does not depend on the resource pack ({rp_uuid})"
                ));
            }
            if !rp.depends_on_pack(bp_uuid) {
                issues.push(format!(
                    "resource manifest does not depend on the behavior pack ({bp_uuid})"
                ));
            }
        }
    }

    if let (Some(script), Some(bp)) = (&config.script, behavior) {
        if !bp.has_script_module() {
            issues.push("behavior manifest has no script module but config.script is set".to_string());
        }

        for dependency in &script.dependencies {
            if is_bundled_package(&dependency.module_name) {
                continue;
            }
            if bp.script_dependency(&dependency.module_name).is_none() {
                issues.push(format!(
                    "behavior manifest is missing script dependency {}",
                    dependency.module_name
                ));
            }
        }
    }

    for (kind, manifest) in [(PackKind::Behavior, behavior), (PackKind::Resource, resource)] {
        let Some(manifest) = manifest else { continue };
        let Some(header) = &manifest.header else {
            issues.push(format!("{kind} manifest has no header"));
            continue;
        };
        if strict {
            if header.min_engine_version.is_none() {
                issues.push(format!("{kind} manifest header.min_engine_version is required"));
            }
            if header.description.trim().is_empty() {
                issues.push(format!("{kind} manifest header.description is required"));
            }
        }
    }

    issues
}

/// Full validation of a project on disk
pub fn validate_project(project: &Project, strict: bool) -> Vec<String> {
    let mut issues = validate_config(&project.config);

    let mut load = |kind: PackKind| -> Option<Manifest> {
        if !project.is_enabled(kind) {
            return None;
        }
        project.pack_dir(kind)?;
        match project.load_manifest(kind) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                issues.push(format!("{kind} manifest: {e}"));
                None
            }
        }
    };

    let behavior = load(PackKind::Behavior);
    let resource = load(PackKind::Resource);

    issues.extend(validate_manifests(
        &project.config,
        behavior.as_ref(),
        resource.as_ref(),
        strict,
    ));

    tracing::debug!(project = %project.name(), issues = issues.len(), "Validated project");
    issues
}

#[cfg(test)]
mod tests {
    include!("validate.test.rs");
}
