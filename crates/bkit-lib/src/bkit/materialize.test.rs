use super::*;
use crate::application::session_mocks::{MockBundler, MockToolchain};
use crate::primitives::ScriptLanguage;
use crate::testing::ProjectFixture;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn build(fixture: &ProjectFixture, tools: &MockToolchain, strategy: Strategy) -> Result<Vec<PackOutcome>, Box<dyn std::error::Error>> {
    let project = fixture.project()?;
    let toolchain = tools.toolchain();
    let materializer = Materializer::new(&project, &toolchain)?;
    Ok(materializer.build(strategy)?)
}

fn out(fixture: &ProjectFixture, kind: PackKind) -> PathBuf {
    fixture.root().join("dist/packs").join(kind.to_string())
}

#[test]
fn copy_build_mirrors_both_packs() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.write("packs/resource/textures/blocks/stone.png", "png")?;
    let tools = MockToolchain::new();

    let outcomes = build(&fixture, &tools, Strategy::Copy)?;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].kind(), PackKind::Behavior);
    assert!(matches!(
        outcomes[1],
        PackOutcome::Done { strategy: Strategy::Copy, bundled: false, .. }
    ));
    assert!(out(&fixture, PackKind::Behavior).join("manifest.json").is_file());
    assert!(
        out(&fixture, PackKind::Resource)
            .join("textures/blocks/stone.png")
            .is_file()
    );
    assert!(tools.bundler.get_requests().is_empty());
    Ok(())
}

#[test]
fn copy_build_honours_ignore_file() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.write(".bkitignore", "dist/\n*.log\n")?;
    fixture.write("packs/behavior/debug.log", "noise")?;
    fixture.write("packs/behavior/items/sword.json", "{}")?;
    fixture.write("packs/behavior/items/dist/old.json", "{}")?;

    build(&fixture, &MockToolchain::new(), Strategy::Copy)?;

    let dest = out(&fixture, PackKind::Behavior);
    assert!(dest.join("items/sword.json").is_file());
    assert!(!dest.join("debug.log").exists());
    assert!(!dest.join("items/dist").exists());
    Ok(())
}

#[test]
fn rebuild_drops_entries_removed_from_source() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let stale = fixture.write("packs/behavior/functions/tick.mcfunction", "say hi")?;
    let tools = MockToolchain::new();

    build(&fixture, &tools, Strategy::Copy)?;
    let dest = out(&fixture, PackKind::Behavior).join("functions/tick.mcfunction");
    assert!(dest.is_file());

    std::fs::remove_file(stale)?;
    build(&fixture, &tools, Strategy::Copy)?;
    assert!(!dest.exists());
    assert!(out(&fixture, PackKind::Behavior).join("manifest.json").is_file());
    Ok(())
}

#[test]
fn typescript_copy_bundles_and_skips_sources() -> TestResult {
    let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Typescript)?;
    fixture.write("packs/behavior/scripts/util.ts", "export {}")?;
    fixture.write("packs/behavior/scripts/data.json", "{}")?;
    let tools = MockToolchain::new();

    let outcomes = build(&fixture, &tools, Strategy::Copy)?;

    let dest = out(&fixture, PackKind::Behavior);
    assert!(matches!(outcomes[0], PackOutcome::Done { bundled: true, .. }));
    assert_eq!(std::fs::read_to_string(dest.join("scripts/main.js"))?, "// bundled\n");
    assert!(!dest.join("scripts/main.ts").exists());
    assert!(!dest.join("scripts/util.ts").exists());
    assert!(dest.join("scripts/data.json").is_file());

    let requests = tools.bundler.get_requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].sourcemap);
    assert!(requests[0].entry.ends_with("packs/behavior/scripts/main.ts"));
    assert!(requests[0].externals.contains(&"@minecraft/server".to_string()));
    assert_eq!(requests[0].working_dir, fixture.project()?.config_dir());
    Ok(())
}

#[test]
fn copy_ships_the_bundle_over_stale_compiled_output() -> TestResult {
    let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Typescript)?;
    fixture.write("packs/behavior/scripts/main.js", "// old tsc output\n")?;
    fixture.write("packs/behavior/scripts/main.js.map", "{}")?;
    let tools = MockToolchain::new();

    build(&fixture, &tools, Strategy::Copy)?;

    let scripts = out(&fixture, PackKind::Behavior).join("scripts");
    assert_eq!(std::fs::read_to_string(scripts.join("main.js"))?, "// bundled\n");
    assert!(!scripts.join("main.js.map").exists());
    Ok(())
}

#[test]
fn javascript_scripts_are_copied_verbatim() -> TestResult {
    let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Javascript)?;
    let tools = MockToolchain::new();

    build(&fixture, &tools, Strategy::Copy)?;

    let copied = std::fs::read_to_string(out(&fixture, PackKind::Behavior).join("scripts/main.js"))?;
    assert!(copied.contains("@minecraft/server"));
    assert!(tools.bundler.get_requests().is_empty());
    Ok(())
}

#[test]
fn typescript_is_detected_without_language() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.write("packs/behavior/scripts/main.ts", "export {}")?;
    let tools = MockToolchain::new();

    let outcomes = build(&fixture, &tools, Strategy::Copy)?;

    assert!(matches!(outcomes[0], PackOutcome::Done { bundled: true, .. }));
    assert!(out(&fixture, PackKind::Behavior).join("scripts/main.js").is_file());
    Ok(())
}

#[test]
fn disabled_and_unconfigured_packs_are_skipped() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.update_config(|config| config.pack_selection.resource = Some(false))?;

    let outcomes = build(&fixture, &MockToolchain::new(), Strategy::Copy)?;
    assert_eq!(
        outcomes[1],
        PackOutcome::Skipped {
            kind: PackKind::Resource,
            reason: SkipReason::Disabled
        }
    );
    assert!(!out(&fixture, PackKind::Resource).exists());

    fixture.update_config(|config| {
        config.pack_selection.resource = None;
        config.packs.resource = None;
    })?;
    let outcomes = build(&fixture, &MockToolchain::new(), Strategy::Copy)?;
    assert_eq!(
        outcomes[1],
        PackOutcome::Skipped {
            kind: PackKind::Resource,
            reason: SkipReason::NotConfigured
        }
    );
    Ok(())
}

#[test]
fn missing_source_directory_is_an_error() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    std::fs::remove_dir_all(fixture.pack_dir(PackKind::Resource))?;

    let project = fixture.project()?;
    let toolchain = MockToolchain::new().toolchain();
    let err = Materializer::new(&project, &toolchain)?
        .materialize(PackKind::Resource, Strategy::Copy)
        .unwrap_err();
    assert!(matches!(
        err,
        MaterializeError::SourceNotFound { kind: PackKind::Resource, .. }
    ));
    Ok(())
}

#[test]
fn bundler_failure_is_a_tool_error() -> TestResult {
    let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Typescript)?;
    let tools = MockToolchain::new().with_bundler(MockBundler::failing());

    let project = fixture.project()?;
    let toolchain = tools.toolchain();
    let err = Materializer::new(&project, &toolchain)?
        .build(Strategy::Copy)
        .unwrap_err();
    assert!(matches!(err, MaterializeError::Tool(ExternalToolError::Failed { .. })));
    Ok(())
}

#[test]
fn externals_always_include_bundled_helpers() -> TestResult {
    let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Typescript)?;
    fixture.update_config(|config| {
        if let Some(script) = config.script.as_mut() {
            script.upsert_dependency(crate::bkit::config::ScriptDependency::new(
                "@minecraft/math",
                "1.0.0",
            ));
        }
    })?;

    let externals = bundle_externals(&fixture.project()?);
    assert_eq!(
        externals,
        vec!["@minecraft/server", "@minecraft/math", "@minecraft/vanilla-data"]
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn link_build_links_children_of_the_pack() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.write("packs/resource/textures/stone.png", "png")?;

    let outcomes = build(&fixture, &MockToolchain::new(), Strategy::Link)?;

    let dest = out(&fixture, PackKind::Resource);
    assert!(matches!(outcomes[1], PackOutcome::Done { strategy: Strategy::Link, .. }));
    assert!(dest.is_dir());
    assert!(dest.join("manifest.json").symlink_metadata()?.file_type().is_symlink());
    assert!(dest.join("textures").symlink_metadata()?.file_type().is_symlink());
    assert!(dest.join("textures/stone.png").is_file());
    Ok(())
}

#[cfg(unix)]
#[test]
fn link_build_descends_into_directories_with_ignored_entries() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.write(".bkitignore", "*.log\n")?;
    fixture.write("packs/resource/textures/stone.png", "png")?;
    fixture.write("packs/resource/textures/build.log", "noise")?;

    build(&fixture, &MockToolchain::new(), Strategy::Link)?;

    let textures = out(&fixture, PackKind::Resource).join("textures");
    assert!(!textures.symlink_metadata()?.file_type().is_symlink());
    assert!(textures.join("stone.png").symlink_metadata()?.file_type().is_symlink());
    assert!(!textures.join("build.log").exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn link_rebuild_hides_ignored_file_created_in_linked_directory() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    fixture.write(".bkitignore", "*.log\n")?;
    fixture.write("packs/behavior/items/ruby.json", "{}")?;
    let tools = MockToolchain::new();
    build(&fixture, &tools, Strategy::Link)?;
    let items = out(&fixture, PackKind::Behavior).join("items");
    assert!(items.symlink_metadata()?.file_type().is_symlink());

    fixture.write("packs/behavior/items/late.log", "noise")?;
    build(&fixture, &tools, Strategy::Link)?;

    assert!(!items.symlink_metadata()?.file_type().is_symlink());
    assert!(items.join("ruby.json").is_file());
    assert!(!items.join("late.log").exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn link_build_copies_bundled_scripts() -> TestResult {
    let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Typescript)?;
    let tools = MockToolchain::new();

    build(&fixture, &tools, Strategy::Link)?;

    let scripts = out(&fixture, PackKind::Behavior).join("scripts");
    assert!(!scripts.symlink_metadata()?.file_type().is_symlink());
    assert!(scripts.join("main.js").is_file());
    assert!(!scripts.join("main.ts").exists());

    let requests = tools.bundler.get_requests();
    assert!(requests[0].sourcemap);
    assert!(requests[0].out_file.ends_with("dist/.bundle/behavior/scripts/main.js"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn copy_after_link_replaces_links_with_files() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let tools = MockToolchain::new();

    build(&fixture, &tools, Strategy::Link)?;
    build(&fixture, &tools, Strategy::Copy)?;

    let manifest = out(&fixture, PackKind::Behavior).join("manifest.json");
    assert!(!manifest.symlink_metadata()?.file_type().is_symlink());
    assert!(manifest.is_file());
    assert!(fixture.pack_dir(PackKind::Behavior).join("manifest.json").is_file());
    Ok(())
}
