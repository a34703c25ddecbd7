use super::*;
use crate::application::session_mocks::MockInstaller;
use crate::bkit::ignore::IgnoreFilter;
use crate::bkit::validate::validate_project;
use crate::testing::TempDirFixture;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn options(language: Option<ScriptLanguage>) -> ScaffoldOptions {
    ScaffoldOptions {
        name: "Sky Islands".to_string(),
        description: "Floating islands".to_string(),
        language,
        force: false,
    }
}

#[test]
fn scaffolded_typescript_project_validates_clean() -> TestResult {
    let fixture = TempDirFixture::new()?;
    let dir = fixture.path().join("sky");

    let scaffolded = scaffold(&dir, &options(Some(ScriptLanguage::Typescript)))?;

    assert_eq!(scaffolded.files[0], dir.join(CONFIG_FILE));
    assert!(dir.join("packs/behavior/scripts/main.ts").is_file());
    assert!(dir.join("tsconfig.json").is_file());
    assert!(validate_project(&scaffolded.project, true).is_empty());

    let entry = std::fs::read_to_string(dir.join("packs/behavior/scripts/main.ts"))?;
    assert!(entry.contains("Sky Islands loaded"));
    Ok(())
}

#[test]
fn manifests_are_cross_linked() -> TestResult {
    let fixture = TempDirFixture::new()?;
    let scaffolded = scaffold(fixture.path(), &options(Some(ScriptLanguage::Javascript)))?;
    let project = scaffolded.project;

    let behavior = project.load_manifest(PackKind::Behavior)?;
    let resource = project.load_manifest(PackKind::Resource)?;
    assert!(behavior.depends_on_pack(resource.pack_uuid().unwrap()));
    assert!(resource.depends_on_pack(behavior.pack_uuid().unwrap()));
    assert!(behavior.has_script_module());
    assert_eq!(behavior.header()?.description, "Floating islands");
    Ok(())
}

#[test]
fn project_without_script_has_no_script_module() -> TestResult {
    let fixture = TempDirFixture::new()?;
    let scaffolded = scaffold(fixture.path(), &options(None))?;

    assert!(scaffolded.project.script().is_none());
    assert!(!scaffolded.project.load_manifest(PackKind::Behavior)?.has_script_module());
    assert!(!fixture.file_exists("packs/behavior/scripts"));
    assert!(!fixture.file_exists("tsconfig.json"));
    assert!(validate_project(&scaffolded.project, false).is_empty());
    Ok(())
}

#[test]
fn default_ignore_file_and_package_json() -> TestResult {
    let fixture = TempDirFixture::new()?;
    scaffold(fixture.path(), &options(None))?;

    let filter = IgnoreFilter::load(fixture.path())?;
    assert!(filter.is_ignored_relative("node_modules/pkg/index.js"));
    assert!(filter.is_ignored_relative("debug.log"));
    assert!(filter.is_ignored_relative(".DS_Store"));
    assert!(!filter.is_ignored_relative("packs/behavior/manifest.json"));

    let package: serde_json::Value = serde_json::from_str(&fixture.read_file("package.json")?)?;
    assert_eq!(package["name"], "sky-islands");
    assert_eq!(package["private"], true);
    Ok(())
}

#[test]
fn existing_project_needs_force() -> TestResult {
    let fixture = TempDirFixture::new()?;
    let first = scaffold(fixture.path(), &options(Some(ScriptLanguage::Typescript)))?;
    fixture.write_file("packs/behavior/scripts/main.ts", "// mine\n")?;
    let behavior_before = first.project.load_manifest(PackKind::Behavior)?;
    let resource_before = first.project.load_manifest(PackKind::Resource)?;

    let err = scaffold(fixture.path(), &options(None)).unwrap_err();
    assert!(matches!(err, ScaffoldError::AlreadyExists { .. }));

    let forced = ScaffoldOptions {
        force: true,
        ..options(Some(ScriptLanguage::Typescript))
    };
    let second = scaffold(fixture.path(), &forced)?;
    assert_eq!(fixture.read_file("packs/behavior/scripts/main.ts")?, "// mine\n");

    let behavior_after = second.project.load_manifest(PackKind::Behavior)?;
    let resource_after = second.project.load_manifest(PackKind::Resource)?;
    assert_eq!(behavior_after.pack_uuid(), behavior_before.pack_uuid());
    assert_eq!(resource_after.pack_uuid(), resource_before.pack_uuid());
    let module_uuids = |m: &Manifest| m.modules.iter().map(|m| m.uuid).collect::<Vec<_>>();
    assert_eq!(module_uuids(&behavior_after), module_uuids(&behavior_before));
    assert!(validate_project(&second.project, true).is_empty());
    Ok(())
}

#[test]
fn force_replaces_an_unreadable_manifest() -> TestResult {
    let fixture = TempDirFixture::new()?;
    scaffold(fixture.path(), &options(None))?;
    fixture.write_file("packs/resource/manifest.json", "{ not json")?;

    let forced = ScaffoldOptions {
        force: true,
        ..options(None)
    };
    let scaffolded = scaffold(fixture.path(), &forced)?;

    assert!(scaffolded.project.load_manifest(PackKind::Resource)?.pack_uuid().is_some());
    assert!(validate_project(&scaffolded.project, false).is_empty());
    Ok(())
}

#[test]
fn quotes_in_the_name_stay_inside_the_message_literal() -> TestResult {
    let fixture = TempDirFixture::new()?;
    let quoted = ScaffoldOptions {
        name: r#"My "Addon""#.to_string(),
        ..options(Some(ScriptLanguage::Javascript))
    };

    scaffold(fixture.path(), &quoted)?;

    let entry = fixture.read_file("packs/behavior/scripts/main.js")?;
    assert!(entry.contains(r#"world.sendMessage("My \"Addon\" loaded");"#));
    Ok(())
}

#[test]
fn rejects_unusable_names() {
    assert!(check_name("addon").is_ok());
    assert!(check_name("  ").is_err());
    assert!(check_name("a/b").is_err());
    assert!(check_name(".hidden").is_err());
}

#[test]
fn package_names_are_slugged() {
    assert_eq!(package_name("Sky Islands"), "sky-islands");
    assert_eq!(package_name("  --Mob_Pack 2  "), "mob-pack-2");
    assert_eq!(package_name("!!!"), "bkit-addon");
}

#[test]
fn installs_declared_script_dependencies() -> TestResult {
    let fixture = TempDirFixture::new()?;
    let scaffolded = scaffold(fixture.path(), &options(Some(ScriptLanguage::Javascript)))?;
    let installer = MockInstaller::default();

    let specs = install_dependencies(&scaffolded.project, &installer)?;

    assert_eq!(specs, vec![format!("@minecraft/server@{DEFAULT_SCRIPT_API_VERSION}")]);
    assert_eq!(installer.get_installs().len(), 1);

    let plain = scaffold(&fixture.path().join("plain"), &options(None))?;
    assert!(install_dependencies(&plain.project, &installer)?.is_empty());
    assert_eq!(installer.get_installs().len(), 1);
    Ok(())
}
