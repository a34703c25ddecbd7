//! E2E tests for deploying packs to sync targets

use anyhow::Result;
use bkit_lib::application::cli::{Commands, MultiProjectArgs, ProjectArgs};
use bkit_lib::application::commands::execute_command_with_session;
use bkit_lib::application::session::Session;
use bkit_tests::{HermeticSessionBuilder, write_pack_content};

fn sync(dry_run: bool, target: Option<&str>) -> Commands {
    Commands::Sync {
        project: ProjectArgs::default(),
        target: target.map(str::to_string),
        dry_run,
        no_build: false,
    }
}

#[tokio::test]
async fn dry_run_writes_nothing() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;

    execute_command_with_session(sync(true, None), &session).await?;

    assert!(!env.deploy_path("demo").exists());
    assert!(!env.work_path.join("demo/dist").exists());
    Ok(())
}

#[tokio::test]
async fn sync_deploys_and_replaces_stale_files() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;
    write_pack_content(&env.work_path.join("demo"))?;
    let stale = env.deploy_path("demo").join("behavior/old.json");
    std::fs::create_dir_all(stale.parent().unwrap())?;
    std::fs::write(&stale, "{}")?;

    execute_command_with_session(sync(false, None), &session).await?;

    let deploy = env.deploy_path("demo");
    assert!(deploy.join("behavior/items/ruby.json").is_file());
    assert!(deploy.join("resource/texts/en_US.lang").is_file());
    assert!(!stale.exists());
    Ok(())
}

#[cfg(not(windows))]
#[tokio::test]
async fn product_target_without_installation_fails() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;

    let err = execute_command_with_session(sync(false, Some("preview")), &session)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("preview"));
    assert!(!env.deploy_path("demo").exists());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn link_then_unlink_leaves_real_copies() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;
    let behavior = env.deploy_path("demo").join("behavior");

    execute_command_with_session(
        Commands::Link {
            project: ProjectArgs::default(),
            target: None,
        },
        &session,
    )
    .await?;
    assert!(behavior.symlink_metadata()?.file_type().is_symlink());

    execute_command_with_session(
        Commands::Unlink {
            project: ProjectArgs::default(),
            target: None,
        },
        &session,
    )
    .await?;
    assert!(!behavior.symlink_metadata()?.file_type().is_symlink());
    assert!(behavior.join("manifest.json").is_file());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn interrupted_watch_is_finalized_by_the_next_command() -> Result<()> {
    use bkit_lib::bkit::sync::resolve_target;
    use bkit_lib::bkit::watch::{WatchState, WatchedProject};
    use bkit_lib::bkit::Project;

    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;
    let project_dir = env.work_path.join("demo");
    execute_command_with_session(
        Commands::Link {
            project: ProjectArgs::default(),
            target: None,
        },
        &session,
    )
    .await?;

    // What a killed `bkit watch` leaves behind
    let project = Project::load(&project_dir)?;
    let target = resolve_target(&project, None, session.toolchain().roots.as_ref())?;
    let state_path = WatchState::path_in(&session.settings().state_dir());
    WatchState::new(&[WatchedProject { project, target }], None).write(&state_path)?;

    execute_command_with_session(
        Commands::Validate {
            projects: MultiProjectArgs::default(),
            strict: false,
        },
        &session,
    )
    .await?;
    let behavior = env.deploy_path("demo").join("behavior");
    assert!(behavior.symlink_metadata()?.file_type().is_symlink(), "validate does not recover");

    execute_command_with_session(
        Commands::Build {
            projects: MultiProjectArgs::default(),
        },
        &session,
    )
    .await?;

    assert!(!state_path.exists());
    assert!(!behavior.symlink_metadata()?.file_type().is_symlink());
    assert!(behavior.join("manifest.json").is_file());
    Ok(())
}
