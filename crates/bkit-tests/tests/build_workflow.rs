//! E2E tests for building packs
//!
//! Real filesystems and the live toolchain; `npx` is a mock script so
//! TypeScript bundling runs without node.

use anyhow::Result;
use bkit_lib::application::cli::{Commands, MultiProjectArgs, ProjectArgs};
use bkit_lib::application::commands::execute_command_with_session;
use bkit_lib::primitives::ScriptLanguage;
use bkit_tests::{HermeticSessionBuilder, MockBehavior, write_pack_content};

fn build_here() -> Commands {
    Commands::Build {
        projects: MultiProjectArgs::default(),
    }
}

#[tokio::test]
async fn build_copies_packs_without_ignored_files() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_project("demo", None)?
        .build()?;
    let project_dir = env.work_path.join("demo");
    write_pack_content(&project_dir)?;

    execute_command_with_session(build_here(), &session).await?;

    let out = project_dir.join("dist/packs");
    assert!(out.join("behavior/manifest.json").is_file());
    assert!(out.join("behavior/items/ruby.json").is_file());
    assert!(out.join("resource/textures/items/ruby.png").is_file());
    assert!(!out.join("behavior/notes.log").exists(), "ignored by .bkitignore");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn typescript_is_bundled_through_esbuild() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_node_tools()?
        .with_project("demo", Some(ScriptLanguage::Typescript))?
        .build()?;
    let project_dir = env.work_path.join("demo");

    execute_command_with_session(build_here(), &session).await?;

    let calls = env.get_mock_calls("npx")?;
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("esbuild "));
    assert!(calls[0].contains("--bundle"));
    assert!(calls[0].contains("--external:@minecraft/server"));

    let scripts = project_dir.join("dist/packs/behavior/scripts");
    assert!(scripts.join("main.js").is_file());
    assert!(!scripts.join("main.ts").exists());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn failing_bundler_fails_the_build() -> Result<()> {
    let (session, _env) = HermeticSessionBuilder::new()?
        .with_mock_executable(
            "npx",
            MockBehavior::AlwaysFail {
                error: "Could not resolve \"./missing\"".to_string(),
            },
        )?
        .with_project("demo", Some(ScriptLanguage::Typescript))?
        .build()?;

    let err = execute_command_with_session(build_here(), &session)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("Could not resolve"));
    Ok(())
}

#[tokio::test]
async fn build_all_covers_every_project() -> Result<()> {
    let builder = HermeticSessionBuilder::new()?;
    let work = builder.test_env().work_path.clone();
    builder.test_env().init_project("alpha", None)?;
    builder.test_env().init_project("beta", None)?;
    let (session, _env) = builder.with_workdir(work.clone()).build()?;

    execute_command_with_session(
        Commands::Build {
            projects: MultiProjectArgs {
                selection: ProjectArgs::default(),
                all: true,
            },
        },
        &session,
    )
    .await?;

    for name in ["alpha", "beta"] {
        assert!(work.join(name).join("dist/packs/resource/manifest.json").is_file());
    }
    Ok(())
}

#[tokio::test]
async fn named_project_is_found_from_the_workspace_root() -> Result<()> {
    let builder = HermeticSessionBuilder::new()?;
    let work = builder.test_env().work_path.clone();
    builder.test_env().init_project("alpha", None)?;
    builder.test_env().init_project("beta", None)?;
    let (session, _env) = builder.with_workdir(work.clone()).build()?;

    execute_command_with_session(
        Commands::Build {
            projects: MultiProjectArgs {
                selection: ProjectArgs {
                    project: Some("beta".to_string()),
                },
                all: false,
            },
        },
        &session,
    )
    .await?;

    assert!(work.join("beta/dist").is_dir());
    assert!(!work.join("alpha/dist").exists());
    Ok(())
}
