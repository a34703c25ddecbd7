//! E2E tests for packaging and version bumps

use anyhow::Result;
use bkit_lib::application::cli::{Commands, ProjectArgs};
use bkit_lib::application::commands::execute_command_with_session;
use bkit_lib::bkit::Project;
use bkit_lib::primitives::{BumpLevel, PackKind, VersionTuple};
use bkit_tests::{HermeticSessionBuilder, archive_entries, write_pack_content};

fn package(no_build: bool) -> Commands {
    Commands::Package {
        project: ProjectArgs::default(),
        no_build,
    }
}

#[tokio::test]
async fn package_writes_pack_and_addon_archives() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;
    let project_dir = env.work_path.join("demo");
    write_pack_content(&project_dir)?;

    execute_command_with_session(package(false), &session).await?;

    let dist = project_dir.join("dist");
    let resource = archive_entries(&dist.join("demo-v1.0.0-resource.mcpack"))?;
    assert!(resource.contains(&"manifest.json".to_string()));
    assert!(resource.contains(&"textures/items/ruby.png".to_string()));

    let behavior = archive_entries(&dist.join("demo-v1.0.0-behavior.mcpack"))?;
    assert!(behavior.contains(&"items/ruby.json".to_string()));
    assert!(!behavior.iter().any(|e| e.ends_with(".log")));

    let addon = archive_entries(&dist.join("demo-v1.0.0.mcaddon"))?;
    assert!(addon.contains(&"behavior_pack/manifest.json".to_string()));
    assert!(addon.contains(&"resource_pack/texts/en_US.lang".to_string()));
    Ok(())
}

#[tokio::test]
async fn package_without_build_requires_output() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;

    let result = execute_command_with_session(package(true), &session).await;

    assert!(result.is_err());
    assert!(!env.work_path.join("demo/dist").exists());
    Ok(())
}

#[tokio::test]
async fn bump_then_package_uses_the_new_version() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;
    let project_dir = env.work_path.join("demo");

    execute_command_with_session(
        Commands::Bump {
            project: ProjectArgs::default(),
            level: Some(BumpLevel::Minor),
            set: None,
            min_engine: Some("1.21.50".to_string()),
        },
        &session,
    )
    .await?;
    execute_command_with_session(package(false), &session).await?;

    let project = Project::load(&project_dir)?;
    assert_eq!(project.version(), Some("1.1.0"));
    for kind in PackKind::ALL {
        let manifest = project.load_manifest(kind)?;
        let header = manifest.header()?;
        assert_eq!(header.version, VersionTuple::new(1, 1, 0));
        assert_eq!(header.min_engine_version, Some(VersionTuple::new(1, 21, 50)));
    }
    assert!(project_dir.join("dist/demo-v1.1.0.mcaddon").is_file());
    Ok(())
}

#[tokio::test]
async fn explicit_version_wins_over_level() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;

    execute_command_with_session(
        Commands::Bump {
            project: ProjectArgs::default(),
            level: Some(BumpLevel::Major),
            set: Some("3.4.5".to_string()),
            min_engine: None,
        },
        &session,
    )
    .await?;

    let project = Project::load(&env.work_path.join("demo"))?;
    assert_eq!(project.version(), Some("3.4.5"));
    Ok(())
}
