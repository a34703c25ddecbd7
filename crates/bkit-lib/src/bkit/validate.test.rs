use super::*;
use crate::bkit::config::{ScriptConfig, ScriptDependency, SyncTargetConfig};
use crate::bkit::manifest::{GenerateOptions, ScriptOptions, ScriptSelection, link_packs};
use crate::primitives::ScriptLanguage;

fn well_formed_config() -> ProjectConfig {
    let mut config = ProjectConfig::default();
    config.project.name = Some("addon".to_string());
    config.project.version = Some("1.0.0".to_string());
    config.packs.behavior = Some("packs/behavior".to_string());
    config.packs.resource = Some("packs/resource".to_string());
    config.sync.default_target = Some("dev".to_string());
    config.sync.targets.insert(
        "dev".to_string(),
        SyncTargetConfig {
            product: Some("BedrockUWP".to_string()),
            project_name: Some("addon".to_string()),
            ..SyncTargetConfig::default()
        },
    );
    config.script = Some(ScriptConfig {
        entry: Some("scripts/main.ts".to_string()),
        language: Some(ScriptLanguage::Typescript),
        dependencies: vec![
            ScriptDependency::new("@minecraft/server", "1.16.0"),
            ScriptDependency::new("@minecraft/math", "2.0.0"),
        ],
        api_version: None,
    });
    config
}

fn linked_manifests(with_script: bool) -> (Manifest, Manifest) {
    let options = GenerateOptions {
        description: "An add-on".to_string(),
        script: with_script.then(|| ScriptOptions {
            language: ScriptLanguage::Typescript,
            entry: "scripts/main.ts".to_string(),
            selection: ScriptSelection::default(),
        }),
        ..GenerateOptions::default()
    };
    let mut bp = Manifest::generate(PackKind::Behavior, "addon", &options);
    let mut rp = Manifest::generate(PackKind::Resource, "addon", &options);
    link_packs(&mut bp, &mut rp).unwrap();
    (bp, rp)
}

#[test]
fn well_formed_project_has_no_issues() {
    let config = well_formed_config();
    let (bp, rp) = linked_manifests(true);

    assert_eq!(validate_config(&config), Vec::<String>::new());
    assert_eq!(
        validate_manifests(&config, Some(&bp), Some(&rp), true),
        Vec::<String>::new()
    );
}

#[test]
fn missing_script_module_is_the_only_issue() {
    let config = well_formed_config();
    let (mut bp, rp) = linked_manifests(true);
    bp.modules.retain(|m| m.module_type != crate::primitives::ModuleType::Script);

    let issues = validate_manifests(&config, Some(&bp), Some(&rp), false);
    assert_eq!(
        issues,
        vec!["behavior manifest has no script module but config.script is set".to_string()]
    );
}

#[test]
fn all_config_issues_are_collected() {
    let mut config = ProjectConfig::default();
    config.build.out_dir = String::new();
    config.script = Some(ScriptConfig {
        api_version: Some(serde_json::json!(12)),
        ..ScriptConfig::default()
    });

    let issues = validate_config(&config);
    for expected in [
        "project.name is required",
        "project.version is required",
        "packs.behavior is required while the behavior pack is enabled",
        "packs.resource is required while the resource pack is enabled",
        "build.outDir is required",
        "sync.defaultTarget is required",
        "script.entry is required",
        "script.language is required",
        "script.dependencies must not be empty",
        "script.apiVersion must be a string",
    ] {
        assert!(issues.iter().any(|i| i == expected), "missing: {expected}\n{issues:#?}");
    }
    assert_eq!(issues.len(), 10);
}

#[test]
fn disabled_pack_needs_no_path() {
    let mut config = well_formed_config();
    config.packs.resource = None;
    config.pack_selection.resource = Some(false);
    config.sync.targets.insert(
        "local".to_string(),
        SyncTargetConfig {
            behavior: Some("/tmp/b".to_string()),
            ..SyncTargetConfig::default()
        },
    );

    assert_eq!(validate_config(&config), Vec::<String>::new());
}

#[test]
fn sync_target_checks() {
    let mut config = well_formed_config();
    config.sync.default_target = Some("nowhere".to_string());
    config.sync.targets.insert(
        "bad-product".to_string(),
        SyncTargetConfig {
            product: Some("Java".to_string()),
            ..SyncTargetConfig::default()
        },
    );
    config.sync.targets.insert(
        "half".to_string(),
        SyncTargetConfig {
            behavior: Some("/tmp/b".to_string()),
            ..SyncTargetConfig::default()
        },
    );

    let issues = validate_config(&config);
    assert!(issues.contains(&"sync.defaultTarget 'nowhere' is not one of sync.targets".to_string()));
    assert!(issues.iter().any(|i| i.starts_with("sync.targets.bad-product: Invalid product 'Java'")));
    assert!(issues.contains(&"sync.targets.half.resource is required while the resource pack is enabled".to_string()));
    assert_eq!(issues.len(), 3);
}

#[test]
fn cross_pack_dependencies_are_checked_both_ways() {
    let config = well_formed_config();
    let (mut bp, mut rp) = linked_manifests(true);
    bp.dependencies.retain(|d| !matches!(d, crate::bkit::manifest::PackDependency::Pack(_)));
    rp.dependencies.clear();

    let issues = validate_manifests(&config, Some(&bp), Some(&rp), false);
    assert_eq!(issues.len(), 2);
    assert!(issues[0].starts_with("behavior manifest does not depend on the resource pack"));
    assert!(issues[1].starts_with("resource manifest does not depend on the behavior pack"));
}

#[test]
fn undeclared_script_dependency_is_reported_but_bundled_ones_are_exempt() {
    let mut config = well_formed_config();
    if let Some(script) = config.script.as_mut() {
        script
            .dependencies
            .push(ScriptDependency::new("@minecraft/server-ui", "1.3.0"));
        script
            .dependencies
            .push(ScriptDependency::new("@minecraft/vanilla-data", "1.21.0"));
    }
    let (bp, rp) = linked_manifests(true);

    let issues = validate_manifests(&config, Some(&bp), Some(&rp), false);
    assert_eq!(
        issues,
        vec!["behavior manifest is missing script dependency @minecraft/server-ui".to_string()]
    );
}

#[test]
fn strict_mode_requires_description_and_min_engine() {
    let config = well_formed_config();
    let (mut bp, rp) = linked_manifests(true);
    if let Some(header) = bp.header.as_mut() {
        header.description.clear();
        header.min_engine_version = None;
    }

    assert!(validate_manifests(&config, Some(&bp), Some(&rp), false).is_empty());
    let strict = validate_manifests(&config, Some(&bp), Some(&rp), true);
    assert_eq!(strict.len(), 2);
}
