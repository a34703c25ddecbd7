use super::*;
use tempfile::TempDir;

const SAMPLE: &str = r#"{
  "project": {"name": "sample", "version": "1.2.3"},
  "packs": {"behavior": "packs/behavior", "resource": "packs/resource"},
  "packSelection": {"resource": false},
  "build": {"outDir": "out"},
  "script": {
    "entry": "scripts/main.ts",
    "language": "typescript",
    "dependencies": [{"moduleName": "@minecraft/server", "version": "1.16.0"}]
  },
  "sync": {
    "defaultTarget": "local",
    "targets": {
      "local": {"behavior": "/tmp/b", "resource": "/tmp/r"},
      "game": {"product": "BedrockUWP", "projectName": "sample-dev"}
    }
  }
}"#;

fn write_project(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn parses_camel_case_config() {
    let config = ProjectConfig::from_json(SAMPLE, Path::new(CONFIG_FILE)).unwrap();

    assert_eq!(config.name(), Some("sample"));
    assert_eq!(config.build.out_dir, "out");
    assert!(config.pack_selection.is_enabled(PackKind::Behavior));
    assert!(!config.pack_selection.is_enabled(PackKind::Resource));

    let script = config.script.as_ref().unwrap();
    assert_eq!(script.language, Some(ScriptLanguage::Typescript));
    assert_eq!(script.dependencies[0].module_name, "@minecraft/server");
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let config = ProjectConfig::from_json("{}", Path::new(CONFIG_FILE)).unwrap();
    assert_eq!(config.build.out_dir, DEFAULT_OUT_DIR);
    assert!(config.pack_selection.is_enabled(PackKind::Behavior));
    assert!(config.script.is_none());
    assert!(config.sync.targets.is_empty());
}

#[test]
fn sync_targets_resolve_to_typed_shapes() {
    let config = ProjectConfig::from_json(SAMPLE, Path::new(CONFIG_FILE)).unwrap();

    assert_eq!(
        config.sync.targets["local"].resolve().unwrap(),
        SyncTarget::Paths {
            behavior: Some(PathBuf::from("/tmp/b")),
            resource: Some(PathBuf::from("/tmp/r")),
        }
    );
    assert_eq!(
        config.sync.targets["game"].resolve().unwrap(),
        SyncTarget::Product {
            product: Product::BedrockUWP,
            project_name: Some("sample-dev".to_string()),
        }
    );

    let bad = SyncTargetConfig {
        product: Some("JavaEdition".to_string()),
        ..SyncTargetConfig::default()
    };
    assert!(bad.resolve().is_err());
}

#[test]
fn project_paths_resolve_against_root_override() {
    let temp = TempDir::new().unwrap();
    let text = SAMPLE.replace("\"build\"", "\"root\": \"addon\", \"build\"");
    let path = write_project(temp.path(), &text);

    let project = Project::load(&path).unwrap();
    let root = temp.path().canonicalize().unwrap().join("addon");

    assert_eq!(project.root(), root);
    assert_eq!(project.pack_dir(PackKind::Behavior), Some(root.join("packs/behavior")));
    assert_eq!(project.pack_output_dir(PackKind::Behavior), root.join("out/packs/behavior"));
    assert_eq!(project.enabled_kinds(), vec![PackKind::Behavior]);
}

#[test]
fn load_accepts_directory_and_reports_missing_config() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
        Project::load(temp.path()),
        Err(ConfigError::NotFound { .. })
    ));

    write_project(temp.path(), SAMPLE);
    assert_eq!(Project::load(temp.path()).unwrap().name(), "sample");

    write_project(temp.path(), "{\"project\": 5}");
    assert!(matches!(
        Project::load(temp.path()),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn save_round_trips_through_disk() {
    let temp = TempDir::new().unwrap();
    let path = write_project(temp.path(), SAMPLE);
    let mut project = Project::load(&path).unwrap();

    project.config.project.version = Some("2.0.0".to_string());
    project.save().unwrap();

    let reloaded = Project::load(&path).unwrap();
    assert_eq!(reloaded.version(), Some("2.0.0"));
    assert_eq!(reloaded.config, project.config);
    assert!(std::fs::read_to_string(&path).unwrap().ends_with('\n'));
}

#[test]
fn dependency_specs_parse_scoped_names() {
    assert_eq!(
        ScriptDependency::parse_spec("@minecraft/server-ui@1.3.0", "1.0.0"),
        ScriptDependency::new("@minecraft/server-ui", "1.3.0")
    );
    assert_eq!(
        ScriptDependency::parse_spec("@minecraft/server", "1.16.0"),
        ScriptDependency::new("@minecraft/server", "1.16.0")
    );
    assert_eq!(
        ScriptDependency::new("@minecraft/math", "2.0.0").install_spec(),
        "@minecraft/math@2.0.0"
    );
}

#[test]
fn upsert_keeps_module_names_unique() {
    let mut script = ScriptConfig::default();
    script.upsert_dependency(ScriptDependency::new("@minecraft/server", "1.0.0"));
    script.upsert_dependency(ScriptDependency::new("@minecraft/server", "1.1.0"));
    assert_eq!(script.dependencies.len(), 1);
    assert_eq!(script.dependencies[0].version, "1.1.0");

    assert!(script.remove_dependency("@minecraft/server"));
    assert!(!script.remove_dependency("@minecraft/server"));
}
