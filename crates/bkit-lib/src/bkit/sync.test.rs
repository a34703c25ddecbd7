use super::*;
use crate::application::session_mocks::{MockDeploymentRoots, MockToolchain};
use crate::bkit::config::SyncTargetConfig;
use crate::testing::ProjectFixture;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn copy_build(fixture: &ProjectFixture) -> TestResult {
    let project = fixture.project()?;
    let toolchain = MockToolchain::new().toolchain();
    Materializer::new(&project, &toolchain)?.build(Strategy::Copy)?;
    Ok(())
}

fn local_target(fixture: &ProjectFixture) -> Result<ResolvedTarget, Box<dyn std::error::Error>> {
    Ok(resolve_target(
        &fixture.project()?,
        Some("local"),
        &MockDeploymentRoots::default(),
    )?)
}

#[test]
fn resolves_default_path_target() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let target = resolve_target(&fixture.project()?, None, &MockDeploymentRoots::default())?;

    assert_eq!(target.name, "local");
    assert_eq!(target.behavior, Some(fixture.deploy_dir(PackKind::Behavior)));
    assert_eq!(target.resource, Some(fixture.deploy_dir(PackKind::Resource)));
    Ok(())
}

#[test]
fn resolves_product_target_through_root_lookup() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.update_config(|config| {
        config.sync.targets.insert(
            "preview".to_string(),
            SyncTargetConfig {
                product: Some("PreviewGDK".to_string()),
                ..SyncTargetConfig::default()
            },
        );
    })?;
    let game_root = fixture.temp_path().join("com.mojang");
    let roots = MockDeploymentRoots::default().with_root(Product::PreviewGDK, game_root.clone());

    let target = resolve_target(&fixture.project()?, Some("preview"), &roots)?;
    assert_eq!(
        target.behavior,
        Some(game_root.join("development_behavior_packs/addon"))
    );
    assert_eq!(
        target.resource,
        Some(game_root.join("development_resource_packs/addon"))
    );

    let err = resolve_target(&fixture.project()?, Some("preview"), &MockDeploymentRoots::default())
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::UnresolvedRoot {
            product: Product::PreviewGDK,
            ..
        }
    ));
    Ok(())
}

#[test]
fn unknown_target_lists_available_names() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let err = resolve_target(&fixture.project()?, Some("prod"), &MockDeploymentRoots::default())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unknown sync target 'prod' (available: local)"
    );

    fixture.update_config(|config| config.sync.default_target = None)?;
    let err = resolve_target(&fixture.project()?, None, &MockDeploymentRoots::default()).unwrap_err();
    assert!(matches!(err, SyncError::NoTarget));
    Ok(())
}

#[test]
fn copy_sync_replaces_destination() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    copy_build(&fixture)?;
    let stale = fixture.deploy_dir(PackKind::Behavior).join("stale.json");
    std::fs::create_dir_all(fixture.deploy_dir(PackKind::Behavior))?;
    std::fs::write(&stale, "{}")?;

    let entries = sync(&fixture.project()?, &local_target(&fixture)?, SyncMode::Copy, false)?;

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.action == SyncAction::Copy));
    assert!(!stale.exists());
    assert!(fixture.deploy_dir(PackKind::Behavior).join("manifest.json").is_file());
    assert!(fixture.deploy_dir(PackKind::Resource).join("manifest.json").is_file());
    Ok(())
}

#[test]
fn dry_run_touches_nothing() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;

    let entries = sync(&fixture.project()?, &local_target(&fixture)?, SyncMode::Copy, true)?;

    assert!(entries.iter().all(|e| e.dry_run));
    assert!(!fixture.deploy_dir(PackKind::Behavior).exists());
    assert!(!fixture.root().join("dist").exists());
    let report = entries[0].to_report_entry();
    assert_eq!(report.pack, "behavior");
    assert_eq!(report.action, "would copy");
    Ok(())
}

#[test]
fn real_sync_requires_a_build() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let err = sync(&fixture.project()?, &local_target(&fixture)?, SyncMode::Copy, false).unwrap_err();
    assert!(matches!(
        err,
        SyncError::SourceNotFound {
            kind: PackKind::Behavior,
            ..
        }
    ));
    Ok(())
}

#[test]
fn disabled_pack_is_not_applicable() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.update_config(|config| config.pack_selection.resource = Some(false))?;
    copy_build(&fixture)?;

    let entries = sync(&fixture.project()?, &local_target(&fixture)?, SyncMode::Copy, false)?;

    assert_eq!(entries[0].action, SyncAction::Copy);
    assert!(!entries[1].is_applied());
    assert_eq!(
        entries[1].to_report_entry().action,
        "not applicable (pack disabled)"
    );
    assert!(!fixture.deploy_dir(PackKind::Resource).exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn link_sync_then_finalize_leaves_plain_copies() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    copy_build(&fixture)?;
    let project = fixture.project()?;
    let target = local_target(&fixture)?;

    sync(&project, &target, SyncMode::Link, false)?;
    let behavior = fixture.deploy_dir(PackKind::Behavior);
    assert!(behavior.symlink_metadata()?.file_type().is_symlink());
    assert_eq!(std::fs::read_link(&behavior)?, project.pack_output_dir(PackKind::Behavior));

    let entries = finalize_link(&project, &MockToolchain::new().toolchain(), &target)?;

    assert!(entries.iter().all(|e| e.action == SyncAction::Copy));
    assert!(!behavior.symlink_metadata()?.file_type().is_symlink());
    assert!(behavior.join("manifest.json").is_file());
    Ok(())
}

#[cfg(unix)]
#[test]
fn remove_target_links_only_touches_links() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    copy_build(&fixture)?;
    let project = fixture.project()?;
    let target = local_target(&fixture)?;
    sync(&project, &target, SyncMode::Link, false)?;

    let removed = remove_target_links(&target)?;

    assert_eq!(removed.len(), 2);
    assert!(!fixture.deploy_dir(PackKind::Behavior).exists());
    assert!(project.pack_output_dir(PackKind::Behavior).join("manifest.json").is_file());
    assert!(remove_target_links(&target)?.is_empty());
    Ok(())
}
