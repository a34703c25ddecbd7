use super::*;
use tempfile::TempDir;

fn script_options() -> ScriptOptions {
    ScriptOptions {
        language: ScriptLanguage::Typescript,
        entry: "scripts/main.ts".to_string(),
        selection: ScriptSelection::default()
            .with_enabled("@minecraft/server-ui", true)
            .with_enabled("@minecraft/math", true)
            .with_override("@minecraft/server-ui", "1.3.0"),
    }
}

#[test]
fn generated_manifests_get_distinct_uuids() {
    let a = Manifest::generate(PackKind::Behavior, "Addon", &GenerateOptions::default());
    let b = Manifest::generate(PackKind::Behavior, "Addon", &GenerateOptions::default());

    assert_ne!(a.pack_uuid(), b.pack_uuid());
    assert_ne!(a.pack_uuid(), Some(a.modules[0].uuid));

    let header = a.header().unwrap();
    assert_eq!(header.version, VersionTuple::new(1, 0, 0));
    assert_eq!(header.min_engine_version, Some(VersionTuple::new(1, 21, 2)));
    assert_eq!(a.format_version, FORMAT_VERSION);
}

#[test]
fn resource_pack_gets_resources_module_and_no_script() {
    let options = GenerateOptions {
        script: Some(script_options()),
        ..GenerateOptions::default()
    };
    let manifest = Manifest::generate(PackKind::Resource, "Addon", &options);

    assert_eq!(manifest.modules.len(), 1);
    assert_eq!(manifest.modules[0].module_type, ModuleType::Resources);
    assert!(manifest.dependencies.is_empty());
}

#[test]
fn behavior_script_module_declares_selected_packages() {
    let options = GenerateOptions {
        script: Some(script_options()),
        ..GenerateOptions::default()
    };
    let manifest = Manifest::generate(PackKind::Behavior, "Addon", &options);

    let script = manifest
        .modules
        .iter()
        .find(|m| m.module_type == ModuleType::Script)
        .unwrap();
    assert_eq!(script.entry.as_deref(), Some("scripts/main.js"));
    assert_eq!(script.language.as_deref(), Some("javascript"));

    assert_eq!(
        manifest.script_dependency("@minecraft/server").unwrap().version,
        DEFAULT_SCRIPT_API_VERSION
    );
    assert_eq!(
        manifest.script_dependency("@minecraft/server-ui").unwrap().version,
        "1.3.0"
    );
    // Bundled helpers are never declared
    assert!(manifest.script_dependency("@minecraft/math").is_none());
    assert_eq!(manifest.dependencies.len(), 2);
}

#[test]
fn min_engine_override_is_honoured() {
    let options = GenerateOptions {
        min_engine_version: VersionTuple::new(1, 20, 80),
        ..GenerateOptions::default()
    };
    let manifest = Manifest::generate(PackKind::Resource, "Addon", &options);
    assert_eq!(
        manifest.header().unwrap().min_engine_version,
        Some(VersionTuple::new(1, 20, 80))
    );
}

#[test]
fn link_packs_cross_references_headers() {
    let mut bp = Manifest::generate(PackKind::Behavior, "Addon", &GenerateOptions::default());
    let mut rp = Manifest::generate(PackKind::Resource, "Addon", &GenerateOptions::default());

    link_packs(&mut bp, &mut rp).unwrap();
    link_packs(&mut bp, &mut rp).unwrap();

    assert!(bp.depends_on_pack(rp.pack_uuid().unwrap()));
    assert!(rp.depends_on_pack(bp.pack_uuid().unwrap()));
    assert_eq!(bp.dependencies.len(), 1);
}

#[test]
fn bump_touches_header_modules_and_pack_refs_only() {
    let options = GenerateOptions {
        script: Some(script_options()),
        ..GenerateOptions::default()
    };
    let mut bp = Manifest::generate(PackKind::Behavior, "Addon", &options);
    let mut rp = Manifest::generate(PackKind::Resource, "Addon", &GenerateOptions::default());
    link_packs(&mut bp, &mut rp).unwrap();

    let next = VersionTuple::new(1, 0, 1);
    bp.bump_version(next).unwrap();

    assert_eq!(bp.header().unwrap().version, next);
    for module in &bp.modules {
        match module.module_type {
            ModuleType::Script => assert_eq!(module.version, Some(VersionTuple::INITIAL)),
            _ => assert_eq!(module.version, Some(next)),
        }
    }
    for dependency in &bp.dependencies {
        match dependency {
            PackDependency::Pack(pack) => assert_eq!(pack.version, next),
            PackDependency::Script(script) => {
                assert_ne!(script.version, next.to_string())
            }
        }
    }
}

#[test]
fn operations_on_headerless_manifest_are_structural_errors() {
    let mut manifest: Manifest =
        serde_json::from_str(r#"{"format_version": 2, "modules": []}"#).unwrap();

    assert!(matches!(
        manifest.bump_version(VersionTuple::new(2, 0, 0)),
        Err(ManifestError::Structural { .. })
    ));
    assert!(matches!(
        manifest.merge_script_dependencies(&[]),
        Err(ManifestError::Structural { .. })
    ));
    assert!(matches!(
        manifest.set_min_engine_version(VersionTuple::new(1, 21, 0)),
        Err(ManifestError::Structural { .. })
    ));
}

#[test]
fn merge_replaces_known_script_deps_and_keeps_pack_refs() {
    let mut bp = Manifest::generate(PackKind::Behavior, "Addon", &GenerateOptions {
        script: Some(script_options()),
        ..GenerateOptions::default()
    });
    let mut rp = Manifest::generate(PackKind::Resource, "Addon", &GenerateOptions::default());
    link_packs(&mut bp, &mut rp).unwrap();
    bp.dependencies.push(PackDependency::Script(ScriptDependencyRef {
        module_name: "custom-module".to_string(),
        version: "0.1.0".to_string(),
    }));

    let desired = vec![
        ScriptPackage {
            module_name: "@minecraft/server".to_string(),
            version: "2.0.0".to_string(),
        },
        ScriptPackage {
            module_name: "@minecraft/vanilla-data".to_string(),
            version: "1.21.0".to_string(),
        },
    ];
    bp.merge_script_dependencies(&desired).unwrap();

    assert!(bp.depends_on_pack(rp.pack_uuid().unwrap()));
    assert_eq!(bp.script_dependency("@minecraft/server").unwrap().version, "2.0.0");
    assert!(bp.script_dependency("@minecraft/server-ui").is_none());
    assert!(bp.script_dependency("@minecraft/vanilla-data").is_none());
    assert!(bp.script_dependency("custom-module").is_some());
}

#[test]
fn merge_deduplicates_by_module_name() {
    let mut bp = Manifest::generate(PackKind::Behavior, "Addon", &GenerateOptions::default());
    let twice = vec![
        ScriptPackage {
            module_name: "@minecraft/server".to_string(),
            version: "1.0.0".to_string(),
        },
        ScriptPackage {
            module_name: "@minecraft/server".to_string(),
            version: "1.1.0".to_string(),
        },
    ];
    bp.merge_script_dependencies(&twice).unwrap();
    assert_eq!(bp.dependencies.len(), 1);
}

#[test]
fn dependency_variants_deserialize_by_shape() {
    let json = r#"{
        "format_version": 2,
        "header": {"name": "x", "uuid": "5f2a4c1e-9d0b-4a55-8b8e-2f3c1d0e7a11", "version": [1, 2, 3]},
        "modules": [],
        "dependencies": [
            {"uuid": "0b6f2d41-4f4e-4a3b-9a51-4c0f6c2b1e20", "version": [1, 2, 3]},
            {"module_name": "@minecraft/server", "version": "1.16.0"}
        ],
        "metadata": {"authors": ["someone"]}
    }"#;
    let manifest: Manifest = serde_json::from_str(json).unwrap();

    assert!(matches!(manifest.dependencies[0], PackDependency::Pack(_)));
    assert!(matches!(manifest.dependencies[1], PackDependency::Script(_)));
    assert!(manifest.extra.contains_key("metadata"));
    assert_eq!(manifest.header().unwrap().min_engine_version, None);
}

#[test]
fn save_and_load_preserve_manifest() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(MANIFEST_FILE);
    let manifest = Manifest::generate(PackKind::Behavior, "Addon", &GenerateOptions {
        script: Some(script_options()),
        ..GenerateOptions::default()
    });

    manifest.save(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.ends_with("}\n"));
    assert_eq!(Manifest::load(&path).unwrap(), manifest);
}

#[test]
fn load_distinguishes_missing_and_malformed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(MANIFEST_FILE);
    assert!(matches!(Manifest::load(&path), Err(ManifestError::NotFound { .. })));

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(Manifest::load(&path), Err(ManifestError::Parse { .. })));
}

#[test]
fn runtime_entry_swaps_typescript_extension() {
    assert_eq!(runtime_entry("scripts/main.ts"), "scripts/main.js");
    assert_eq!(runtime_entry("scripts/main.js"), "scripts/main.js");
    assert_eq!(runtime_entry("scripts/main"), "scripts/main");
}

#[test]
fn remove_script_dependency_leaves_pack_refs() {
    let mut bp = Manifest::generate(PackKind::Behavior, "Addon", &GenerateOptions {
        script: Some(script_options()),
        ..GenerateOptions::default()
    });
    let mut rp = Manifest::generate(PackKind::Resource, "Addon", &GenerateOptions::default());
    link_packs(&mut bp, &mut rp).unwrap();

    assert!(bp.remove_script_dependency("@minecraft/server"));
    assert!(!bp.remove_script_dependency("@minecraft/server"));
    assert!(bp.script_dependency("@minecraft/server").is_none());
    assert!(bp.depends_on_pack(rp.pack_uuid().unwrap()));
}

#[test]
fn regenerated_manifest_keeps_earlier_identity() {
    let earlier = Manifest::generate(PackKind::Behavior, "Addon", &GenerateOptions::default());
    let with_script = GenerateOptions {
        script: Some(script_options()),
        ..GenerateOptions::default()
    };
    let mut regenerated = Manifest::generate(PackKind::Behavior, "Addon", &with_script);

    regenerated.keep_identity_of(&earlier).unwrap();

    assert_eq!(regenerated.pack_uuid(), earlier.pack_uuid());
    assert_eq!(regenerated.modules[0].uuid, earlier.modules[0].uuid);
    let script = regenerated
        .modules
        .iter()
        .find(|m| m.module_type == ModuleType::Script)
        .unwrap();
    assert_ne!(script.uuid, earlier.modules[0].uuid);
    assert!(regenerated.has_script_module());
}

#[test]
fn keeping_identity_of_headerless_manifest_fails() {
    let mut manifest = Manifest::generate(PackKind::Resource, "Addon", &GenerateOptions::default());
    let mut broken = manifest.clone();
    broken.header = None;

    assert!(matches!(
        manifest.keep_identity_of(&broken),
        Err(ManifestError::Structural { .. })
    ));
}
