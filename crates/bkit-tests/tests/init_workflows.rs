//! E2E tests for project creation and script dependencies

use anyhow::Result;
use bkit_lib::application::cli::{Commands, DepsAction, MultiProjectArgs, ProjectArgs};
use bkit_lib::application::commands::execute_command_with_session;
use bkit_lib::bkit::{CONFIG_FILE, Project};
use bkit_lib::primitives::{PackKind, ScriptLanguage};
use bkit_tests::{HermeticSessionBuilder, MockBehavior};

fn init(language: Option<ScriptLanguage>, force: bool) -> Commands {
    Commands::Init {
        dir: Some("demo".into()),
        name: Some("demo".to_string()),
        description: Some("A test add-on".to_string()),
        language,
        no_script: language.is_none(),
        force,
        skip_install: false,
    }
}

fn validate(strict: bool) -> Commands {
    Commands::Validate {
        projects: MultiProjectArgs::default(),
        strict,
    }
}

#[cfg(unix)]
#[tokio::test]
async fn typescript_init_installs_the_script_api() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?.with_node_tools()?.build()?;

    execute_command_with_session(init(Some(ScriptLanguage::Typescript), false), &session).await?;

    let project_dir = env.work_path.join("demo");
    assert!(project_dir.join(CONFIG_FILE).is_file());
    assert!(project_dir.join("packs/behavior/scripts/main.ts").is_file());
    assert!(project_dir.join("tsconfig.json").is_file());

    let calls = env.get_mock_calls("npm")?;
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("install --save-dev @minecraft/server@"));
    Ok(())
}

#[tokio::test]
async fn fresh_project_passes_strict_validation() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?.build()?;
    execute_command_with_session(init(None, false), &session).await?;

    let (session, _env) = HermeticSessionBuilder::new()?
        .with_workdir(env.work_path.join("demo"))
        .build()?;
    execute_command_with_session(validate(true), &session).await?;
    Ok(())
}

#[tokio::test]
async fn init_refuses_to_overwrite_without_force() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?.build()?;
    execute_command_with_session(init(None, false), &session).await?;
    let config = std::fs::read_to_string(env.work_path.join("demo").join(CONFIG_FILE))?;

    let err = execute_command_with_session(init(None, false), &session)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("already"));
    let unchanged = std::fs::read_to_string(env.work_path.join("demo").join(CONFIG_FILE))?;
    assert_eq!(config, unchanged);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn force_regenerates_manifests_but_keeps_identity_and_entry_script() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?.with_node_tools()?.build()?;
    execute_command_with_session(init(Some(ScriptLanguage::Javascript), false), &session).await?;
    let project_dir = env.work_path.join("demo");
    let entry = project_dir.join("packs/behavior/scripts/main.js");
    std::fs::write(&entry, "// my code\n")?;
    let before = Project::load(&project_dir)?
        .load_manifest(PackKind::Behavior)?
        .pack_uuid();

    execute_command_with_session(init(Some(ScriptLanguage::Javascript), true), &session).await?;

    assert_eq!(std::fs::read_to_string(&entry)?, "// my code\n");
    let after = Project::load(&project_dir)?
        .load_manifest(PackKind::Behavior)?
        .pack_uuid();
    assert_eq!(before, after);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn failed_install_is_reported_after_scaffolding() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_mock_executable(
            "npm",
            MockBehavior::AlwaysFail {
                error: "npm ERR! network".to_string(),
            },
        )?
        .build()?;

    let err = execute_command_with_session(init(Some(ScriptLanguage::Javascript), false), &session)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("npm ERR! network"));
    assert!(env.work_path.join("demo").join(CONFIG_FILE).is_file());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn deps_add_and_remove_round_through_npm_and_the_manifest() -> Result<()> {
    let (session, env) = HermeticSessionBuilder::new()?
        .with_node_tools()?
        .with_project("demo", Some(ScriptLanguage::Javascript))?
        .build()?;
    let project_dir = env.work_path.join("demo");

    execute_command_with_session(
        Commands::Deps {
            project: ProjectArgs::default(),
            action: DepsAction::Add {
                spec: "@minecraft/server-ui@1.3.0".to_string(),
            },
        },
        &session,
    )
    .await?;

    let manifest = Project::load(&project_dir)?.load_manifest(PackKind::Behavior)?;
    assert_eq!(
        manifest
            .script_dependency("@minecraft/server-ui")
            .map(|d| d.version.clone()),
        Some("1.3.0".to_string())
    );

    execute_command_with_session(
        Commands::Deps {
            project: ProjectArgs::default(),
            action: DepsAction::Remove {
                module_name: "@minecraft/server-ui".to_string(),
            },
        },
        &session,
    )
    .await?;

    let project = Project::load(&project_dir)?;
    assert!(
        project
            .load_manifest(PackKind::Behavior)?
            .script_dependency("@minecraft/server-ui")
            .is_none()
    );
    assert!(env.verify_mock_call("npm", &["install", "--save-dev", "@minecraft/server-ui@1.3.0"])?);
    assert!(env.verify_mock_call("npm", &["uninstall", "@minecraft/server-ui"])?);

    execute_command_with_session(validate(false), &session).await?;
    Ok(())
}
