use super::*;

#[test]
fn test_temp_dir_isolation() -> Result<(), Box<dyn std::error::Error>> {
    let fixture1 = TempDirFixture::new()?;
    let fixture2 = TempDirFixture::new()?;
    assert_ne!(fixture1.path(), fixture2.path());

    fixture1.write_file("deep/nested/test1.txt", "content1")?;
    fixture2.write_file("test2.txt", "content2")?;

    assert!(fixture1.file_exists("deep/nested/test1.txt"));
    assert!(!fixture1.file_exists("test2.txt"));
    assert_eq!(fixture2.read_file("test2.txt")?, "content2");
    Ok(())
}

#[test]
fn test_project_fixture_is_loadable_and_linked() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = ProjectFixture::new("addon")?;
    let project = fixture.project()?;

    assert_eq!(project.name(), "addon");
    assert_eq!(project.version(), Some("1.0.0"));
    assert_eq!(
        project.pack_dir(PackKind::Behavior),
        Some(fixture.pack_dir(PackKind::Behavior).canonicalize()?)
    );

    let behavior = fixture.manifest(PackKind::Behavior)?;
    let resource = fixture.manifest(PackKind::Resource)?;
    assert!(behavior.depends_on_pack(resource.pack_uuid().unwrap()));
    assert!(resource.depends_on_pack(behavior.pack_uuid().unwrap()));
    assert!(!behavior.has_script_module());
    Ok(())
}

#[test]
fn test_project_fixture_with_typescript() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = ProjectFixture::new("scripted")?.with_script(ScriptLanguage::Typescript)?;

    assert!(fixture.pack_dir(PackKind::Behavior).join("scripts/main.ts").is_file());
    assert!(fixture.manifest(PackKind::Behavior)?.has_script_module());

    fixture.update_config(|config| config.project.version = Some("2.0.0".to_string()))?;
    assert_eq!(fixture.config()?.project.version.as_deref(), Some("2.0.0"));
    Ok(())
}
