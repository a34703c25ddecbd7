use super::*;
use crate::testing::ProjectFixture;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn patch_bump_updates_config_and_both_manifests() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.update_config(|config| config.project.version = Some("1.2.3".to_string()))?;
    let mut project = fixture.project()?;

    let outcome = bump(&mut project, BumpSpec::Level(BumpLevel::Patch), None)?;

    assert_eq!(outcome.previous, VersionTuple::new(1, 2, 3));
    assert_eq!(outcome.version, VersionTuple::new(1, 2, 4));
    assert_eq!(outcome.files.len(), 3);
    assert_eq!(fixture.config()?.project.version.as_deref(), Some("1.2.4"));
    assert_eq!(project.version(), Some("1.2.4"));
    for kind in PackKind::ALL {
        let manifest = fixture.manifest(kind)?;
        assert_eq!(manifest.header()?.version, VersionTuple::new(1, 2, 4));
    }
    Ok(())
}

#[test]
fn pack_dependencies_follow_the_new_version() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let mut project = fixture.project()?;

    bump(&mut project, BumpSpec::Level(BumpLevel::Minor), None)?;

    let behavior = fixture.manifest(PackKind::Behavior)?;
    let resource = fixture.manifest(PackKind::Resource)?;
    assert!(behavior.depends_on_pack(resource.pack_uuid().unwrap()));
    assert_eq!(behavior.header()?.version, VersionTuple::new(1, 1, 0));
    Ok(())
}

#[test]
fn explicit_version_and_min_engine() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let mut project = fixture.project()?;

    let outcome = bump(
        &mut project,
        BumpSpec::Explicit(VersionTuple::new(0, 9, 0)),
        Some(VersionTuple::new(1, 21, 50)),
    )?;

    assert_eq!(outcome.version, VersionTuple::new(0, 9, 0));
    for kind in PackKind::ALL {
        let manifest = fixture.manifest(kind)?;
        assert_eq!(
            manifest.header()?.min_engine_version,
            Some(VersionTuple::new(1, 21, 50))
        );
    }
    Ok(())
}

#[test]
fn missing_manifest_aborts_before_any_write() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let config_before = std::fs::read_to_string(fixture.config_path())?;
    let behavior_before =
        std::fs::read_to_string(fixture.pack_dir(PackKind::Behavior).join("manifest.json"))?;
    std::fs::remove_file(fixture.pack_dir(PackKind::Resource).join("manifest.json"))?;
    let mut project = fixture.project()?;

    let err = bump(&mut project, BumpSpec::Level(BumpLevel::Major), None).unwrap_err();

    assert!(matches!(err, BumpError::Manifest(ManifestError::NotFound { .. })));
    assert_eq!(std::fs::read_to_string(fixture.config_path())?, config_before);
    assert_eq!(
        std::fs::read_to_string(fixture.pack_dir(PackKind::Behavior).join("manifest.json"))?,
        behavior_before
    );
    assert_eq!(project.version(), Some("1.0.0"));
    Ok(())
}

#[test]
fn invalid_current_version_is_reported() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.update_config(|config| config.project.version = Some("one".to_string()))?;
    let mut project = fixture.project()?;

    let err = bump(&mut project, BumpSpec::Level(BumpLevel::Patch), None).unwrap_err();
    assert!(matches!(err, BumpError::InvalidVersion(_)));
    Ok(())
}

#[test]
fn bump_strictly_increases() {
    let start = VersionTuple::new(3, 7, 9);
    for level in [BumpLevel::Patch, BumpLevel::Minor, BumpLevel::Major] {
        assert!(next_version(start, BumpSpec::Level(level)) > start);
    }
}
