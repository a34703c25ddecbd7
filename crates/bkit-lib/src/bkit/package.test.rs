use super::*;
use crate::application::session_mocks::MockToolchain;
use crate::bkit::materialize::{Materializer, Strategy};
use crate::testing::ProjectFixture;
use std::fs::File;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn copy_build(fixture: &ProjectFixture, tools: &MockToolchain) -> TestResult {
    let project = fixture.project()?;
    let toolchain = tools.toolchain();
    Materializer::new(&project, &toolchain)?.build(Strategy::Copy)?;
    Ok(())
}

fn entries(path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    Ok(names)
}

#[test]
fn packages_each_pack_and_the_addon() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.write("packs/resource/textures/stone.png", "png")?;
    let tools = MockToolchain::new();
    copy_build(&fixture, &tools)?;

    let project = fixture.project()?;
    let artifacts = package(&project, &tools.toolchain())?;

    let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "addon-v1.0.0-behavior.mcpack",
            "addon-v1.0.0-resource.mcpack",
            "addon-v1.0.0.mcaddon"
        ]
    );
    assert!(artifacts.iter().all(|a| a.size > 0));

    let resource = entries(&pack_archive_path(&project, PackKind::Resource))?;
    assert!(resource.contains(&"manifest.json".to_string()));
    assert!(resource.contains(&"textures/stone.png".to_string()));

    let addon = entries(&addon_archive_path(&project))?;
    assert!(addon.contains(&"behavior_pack/manifest.json".to_string()));
    assert!(addon.contains(&"resource_pack/textures/stone.png".to_string()));
    Ok(())
}

#[test]
fn single_pack_projects_get_no_addon() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let tools = MockToolchain::new();
    copy_build(&fixture, &tools)?;
    package(&fixture.project()?, &tools.toolchain())?;

    fixture.update_config(|config| config.pack_selection.resource = Some(false))?;
    let project = fixture.project()?;
    let artifacts = package(&project, &tools.toolchain())?;

    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].path, pack_archive_path(&project, PackKind::Behavior));
    assert!(!addon_archive_path(&project).exists());
    Ok(())
}

#[test]
fn repackaging_replaces_archives() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let stale = fixture.write("packs/behavior/old.json", "{}")?;
    let tools = MockToolchain::new();
    copy_build(&fixture, &tools)?;
    package(&fixture.project()?, &tools.toolchain())?;

    std::fs::remove_file(stale)?;
    copy_build(&fixture, &tools)?;
    let project = fixture.project()?;
    package(&project, &tools.toolchain())?;

    let behavior = entries(&pack_archive_path(&project, PackKind::Behavior))?;
    assert!(!behavior.contains(&"old.json".to_string()));
    assert_eq!(tools.archiver.get_calls().len(), 6);
    Ok(())
}

#[test]
fn unbuilt_packs_are_reported() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let err = package(&fixture.project()?, &MockToolchain::new().toolchain()).unwrap_err();
    assert!(matches!(
        err,
        PackageError::NotBuilt {
            kind: PackKind::Behavior,
            ..
        }
    ));
    Ok(())
}

#[test]
fn archive_names_without_version() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.update_config(|config| config.project.version = None)?;
    let project = fixture.project()?;
    assert!(
        pack_archive_path(&project, PackKind::Behavior).ends_with("dist/addon-behavior.mcpack")
    );
    assert!(addon_archive_path(&project).ends_with("dist/addon.mcaddon"));
    Ok(())
}
