use super::*;
use crate::application::session_mocks::*;
use crate::bkit::manifest::Manifest;
use crate::bkit::CONFIG_FILE;
use crate::display::DisplayCall;
use crate::testing::{ProjectFixture, TempDirFixture};

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Session rooted in the fixture's project, with settings beside it
fn session_for(fixture: &ProjectFixture) -> MockCommandSession {
    MockCommandSession::new()
        .with_config(MockConfigProvider::for_workdir(&fixture.root()))
        .with_settings_root(fixture.temp_path())
}

fn here() -> ProjectArgs {
    ProjectArgs::default()
}

fn here_all() -> MultiProjectArgs {
    MultiProjectArgs::default()
}

mod version_tests {
    use super::*;

    #[tokio::test]
    async fn reports_the_crate_version() -> TestResult {
        let session = MockCommandSession::new();
        execute_command_with_session(Commands::Version, &session).await?;

        let report = session.mock_display().last_report().ok_or("no report")?;
        assert!(report.ok);
        assert_eq!(report.version.as_deref(), Some(env!("CARGO_PKG_VERSION")));
        Ok(())
    }
}

mod build_tests {
    use super::*;

    #[tokio::test]
    async fn build_materializes_both_packs() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        execute_command_with_session(Commands::Build { projects: here_all() }, &session).await?;

        let project = fixture.project()?;
        for kind in PackKind::ALL {
            assert!(project.pack_output_dir(kind).join("manifest.json").is_file());
        }
        let report = session.mock_display().last_report().ok_or("no report")?;
        assert_eq!(report.command.as_deref(), Some("build"));
        assert_eq!(report.artifacts.map(|a| a.len()), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn ambiguous_selection_prompts_for_a_project() -> TestResult {
        let root = TempDirFixture::new()?;
        for name in ["alpha", "beta"] {
            root.write_file(
                &format!("{name}/{CONFIG_FILE}"),
                &format!("{{\"project\":{{\"name\":\"{name}\"}}}}"),
            )?;
        }
        let session = MockCommandSession::new()
            .with_config(MockConfigProvider::for_workdir(root.path()))
            .with_interactive(MockInteractiveProvider::new().with_fuzzy_select(1));

        execute_command_with_session(Commands::Build { projects: here_all() }, &session).await?;

        let calls = session.interactive_provider.get_fuzzy_select_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.len(), 2);
        assert!(calls[0].1[1].starts_with("beta"));
        Ok(())
    }

    #[tokio::test]
    async fn dismissed_selection_is_reported_as_cancelled() -> TestResult {
        let root = TempDirFixture::new()?;
        for name in ["alpha", "beta"] {
            root.write_file(
                &format!("{name}/{CONFIG_FILE}"),
                &format!("{{\"project\":{{\"name\":\"{name}\"}}}}"),
            )?;
        }
        let session = MockCommandSession::new()
            .with_config(MockConfigProvider::for_workdir(root.path()))
            .with_interactive(MockInteractiveProvider::new().with_cancel());

        let err = execute_command_with_session(Commands::Build { projects: here_all() }, &session)
            .await
            .unwrap_err();

        assert!(err.is::<PromptCancelled>());
        let report = session.mock_display().last_report().ok_or("no report")?;
        assert!(!report.ok);
        assert_eq!(report.error.as_deref(), Some("cancelled"));
        Ok(())
    }

    #[tokio::test]
    async fn stale_watch_state_is_discarded_before_building() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);
        let state = WatchState::path_in(&session.settings().state_dir());
        std::fs::create_dir_all(state.parent().ok_or("no parent")?)?;
        std::fs::write(&state, "not json")?;

        execute_command_with_session(Commands::Build { projects: here_all() }, &session).await?;

        assert!(!state.exists());
        assert!(
            session
                .mock_display()
                .texts()
                .iter()
                .any(|t| t.starts_with("Discarded stale watch state"))
        );
        Ok(())
    }
}

mod sync_tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_plans_without_building_or_writing() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        execute_command_with_session(
            Commands::Sync {
                project: here(),
                target: None,
                dry_run: true,
                no_build: false,
            },
            &session,
        )
        .await?;

        assert!(!fixture.root().join("dist").exists());
        assert!(!fixture.deploy_dir(PackKind::Behavior).exists());
        let synced = session
            .mock_display()
            .last_report()
            .and_then(|r| r.synced)
            .ok_or("no synced entries")?;
        assert_eq!(synced.len(), 2);
        assert!(synced.iter().all(|e| e.action == "would copy"));
        Ok(())
    }

    #[tokio::test]
    async fn dry_run_leaves_an_interrupted_watch_alone() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);
        let project = fixture.project()?;
        let target = sync::resolve_target(&project, None, session.toolchain().roots.as_ref())?;
        let state = WatchState::path_in(&session.settings().state_dir());
        WatchState::new(&[WatchedProject { project, target }], None).write(&state)?;

        execute_command_with_session(
            Commands::Sync {
                project: here(),
                target: None,
                dry_run: true,
                no_build: false,
            },
            &session,
        )
        .await?;

        assert!(state.exists());
        assert!(!fixture.root().join("dist").exists());
        assert!(!fixture.deploy_dir(PackKind::Behavior).exists());
        assert!(
            session
                .mock_display()
                .texts()
                .iter()
                .any(|t| t.contains("not shut down cleanly"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn sync_builds_then_copies_to_the_default_target() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        execute_command_with_session(
            Commands::Sync {
                project: here(),
                target: None,
                dry_run: false,
                no_build: false,
            },
            &session,
        )
        .await?;

        for kind in PackKind::ALL {
            assert!(fixture.deploy_dir(kind).join("manifest.json").is_file());
        }
        Ok(())
    }

    #[tokio::test]
    async fn unknown_target_fails_with_a_report() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        let result = execute_command_with_session(
            Commands::Sync {
                project: here(),
                target: Some("nowhere".to_string()),
                dry_run: true,
                no_build: false,
            },
            &session,
        )
        .await;

        assert!(result.is_err());
        let report = session.mock_display().last_report().ok_or("no report")?;
        assert!(!report.ok);
        assert_eq!(report.command.as_deref(), Some("sync"));
        assert!(report.error.is_some_and(|e| e.contains("nowhere")));
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unlink_replaces_links_with_copies() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        execute_command_with_session(
            Commands::Link {
                project: here(),
                target: None,
            },
            &session,
        )
        .await?;
        let behavior = fixture.deploy_dir(PackKind::Behavior);
        assert!(behavior.symlink_metadata()?.file_type().is_symlink());
        let linked = session
            .mock_display()
            .last_report()
            .and_then(|r| r.linked)
            .ok_or("no linked entries")?;
        assert!(linked.iter().all(|e| e.action == "link"));

        execute_command_with_session(
            Commands::Unlink {
                project: here(),
                target: None,
            },
            &session,
        )
        .await?;

        assert!(!behavior.symlink_metadata()?.file_type().is_symlink());
        assert!(behavior.join("manifest.json").is_file());
        let synced = session
            .mock_display()
            .last_report()
            .and_then(|r| r.synced)
            .ok_or("no synced entries")?;
        assert_eq!(synced.iter().filter(|e| e.action == "unlink").count(), 2);
        assert_eq!(synced.iter().filter(|e| e.action == "copy").count(), 2);
        Ok(())
    }
}

mod package_tests {
    use super::*;

    #[tokio::test]
    async fn package_builds_and_reports_archives() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        execute_command_with_session(
            Commands::Package {
                project: here(),
                no_build: false,
            },
            &session,
        )
        .await?;

        let artifacts = session
            .mock_display()
            .last_report()
            .and_then(|r| r.artifacts)
            .ok_or("no artifacts")?;
        assert_eq!(artifacts.len(), 3);
        assert!(artifacts.iter().any(|a| a.ends_with("addon-v1.0.0.mcaddon")));
        Ok(())
    }

    #[tokio::test]
    async fn package_without_build_needs_earlier_output() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        let result = execute_command_with_session(
            Commands::Package {
                project: here(),
                no_build: true,
            },
            &session,
        )
        .await;

        assert!(result.is_err());
        assert!(session.mock_toolchain.archiver.get_calls().is_empty());
        Ok(())
    }
}

mod bump_tests {
    use super::*;

    #[tokio::test]
    async fn patch_bump_updates_config_and_manifests() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        execute_command_with_session(
            Commands::Bump {
                project: here(),
                level: Some(BumpLevel::Patch),
                set: None,
                min_engine: None,
            },
            &session,
        )
        .await?;

        assert_eq!(fixture.config()?.project.version.as_deref(), Some("1.0.1"));
        let header = fixture.manifest(PackKind::Resource)?.header.ok_or("no header")?;
        assert_eq!(header.version, VersionTuple::new(1, 0, 1));
        let report = session.mock_display().last_report().ok_or("no report")?;
        assert_eq!(report.version.as_deref(), Some("1.0.1"));
        Ok(())
    }

    #[tokio::test]
    async fn bump_needs_a_level_or_a_version() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        let result = execute_command_with_session(
            Commands::Bump {
                project: here(),
                level: None,
                set: None,
                min_engine: None,
            },
            &session,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(fixture.config()?.project.version.as_deref(), Some("1.0.0"));
        Ok(())
    }
}

mod deps_tests {
    use super::*;

    #[tokio::test]
    async fn add_installs_records_and_declares_in_manifest() -> TestResult {
        let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Javascript)?;
        let session = session_for(&fixture);

        execute_command_with_session(
            Commands::Deps {
                project: here(),
                action: DepsAction::Add {
                    spec: "@minecraft/server-ui@1.3.0".to_string(),
                },
            },
            &session,
        )
        .await?;

        let installs = session.mock_toolchain.installer.get_installs();
        assert_eq!(installs.len(), 1);
        assert_eq!(installs[0].0, fixture.root().canonicalize()?);
        assert_eq!(installs[0].1, vec!["@minecraft/server-ui@1.3.0".to_string()]);

        let script = fixture.config()?.script.ok_or("no script config")?;
        assert!(script.dependencies.iter().any(|d| d.module_name == "@minecraft/server-ui"));
        let manifest = fixture.manifest(PackKind::Behavior)?;
        assert_eq!(
            manifest
                .script_dependency("@minecraft/server-ui")
                .map(|d| d.version.as_str()),
            Some("1.3.0")
        );
        Ok(())
    }

    #[tokio::test]
    async fn remove_drops_the_dependency_everywhere() -> TestResult {
        let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Javascript)?;
        let session = session_for(&fixture);
        execute_command_with_session(
            Commands::Deps {
                project: here(),
                action: DepsAction::Add {
                    spec: "@minecraft/server-ui@1.3.0".to_string(),
                },
            },
            &session,
        )
        .await?;

        execute_command_with_session(
            Commands::Deps {
                project: here(),
                action: DepsAction::Remove {
                    module_name: "@minecraft/server-ui".to_string(),
                },
            },
            &session,
        )
        .await?;

        assert_eq!(session.mock_toolchain.installer.get_uninstalls().len(), 1);
        let script = fixture.config()?.script.ok_or("no script")?;
        assert_eq!(script.dependencies.len(), 1);
        assert_eq!(script.dependencies[0].module_name, "@minecraft/server");
        let manifest: Manifest = fixture.manifest(PackKind::Behavior)?;
        assert!(manifest.script_dependency("@minecraft/server-ui").is_none());
        assert!(manifest.script_dependency("@minecraft/server").is_some());
        assert!(manifest.has_script_module());
        Ok(())
    }

    #[tokio::test]
    async fn remove_refuses_the_last_dependency() -> TestResult {
        let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Javascript)?;
        let session = session_for(&fixture);

        let err = execute_command_with_session(
            Commands::Deps {
                project: here(),
                action: DepsAction::Remove {
                    module_name: "@minecraft/server".to_string(),
                },
            },
            &session,
        )
        .await
        .unwrap_err();

        assert!(format!("{err:#}").contains("remove the `script` section"));
        assert!(session.mock_toolchain.installer.get_uninstalls().is_empty());
        assert_eq!(fixture.config()?.script.ok_or("no script")?.dependencies.len(), 1);
        assert!(validate_project(&fixture.project()?, false).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn removing_an_undeclared_dependency_fails() -> TestResult {
        let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Javascript)?;
        let session = session_for(&fixture);

        let result = execute_command_with_session(
            Commands::Deps {
                project: here(),
                action: DepsAction::Remove {
                    module_name: "left-pad".to_string(),
                },
            },
            &session,
        )
        .await;

        assert!(result.is_err());
        assert!(session.mock_toolchain.installer.get_uninstalls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn list_reports_declared_dependencies() -> TestResult {
        let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Javascript)?;
        let session = session_for(&fixture);

        execute_command_with_session(
            Commands::Deps {
                project: here(),
                action: DepsAction::List,
            },
            &session,
        )
        .await?;

        let deps = session
            .mock_display()
            .last_report()
            .and_then(|r| r.dependencies)
            .ok_or("no dependencies")?;
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0]["moduleName"], "@minecraft/server");
        assert!(session.mock_toolchain.installer.get_installs().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn projects_without_scripts_have_no_dependencies() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        let result = execute_command_with_session(
            Commands::Deps {
                project: here(),
                action: DepsAction::List,
            },
            &session,
        )
        .await;

        assert!(result.is_err());
        Ok(())
    }
}

mod validate_tests {
    use super::*;

    #[tokio::test]
    async fn clean_project_validates() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        let session = session_for(&fixture);

        execute_command_with_session(
            Commands::Validate {
                projects: here_all(),
                strict: false,
            },
            &session,
        )
        .await?;

        let report = session.mock_display().last_report().ok_or("no report")?;
        assert!(report.ok);
        assert_eq!(report.issues, Some(Vec::new()));
        Ok(())
    }

    #[tokio::test]
    async fn issues_fail_the_command_and_are_reported() -> TestResult {
        let fixture = ProjectFixture::new("addon")?;
        fixture.update_config(|config| {
            config.sync.default_target = Some("nowhere".to_string());
        })?;
        let session = session_for(&fixture);

        let err = execute_command_with_session(
            Commands::Validate {
                projects: here_all(),
                strict: false,
            },
            &session,
        )
        .await
        .unwrap_err();

        let issues_found = err.downcast_ref::<IssuesFound>().ok_or("wrong error")?;
        assert_eq!(issues_found.count, 1);
        let report = session.mock_display().last_report().ok_or("no report")?;
        assert!(!report.ok);
        assert_eq!(
            report.issues,
            Some(vec![
                "sync.defaultTarget 'nowhere' is not one of sync.targets".to_string()
            ])
        );
        Ok(())
    }
}

mod init_tests {
    use super::*;

    fn init(dir: &str) -> Commands {
        Commands::Init {
            dir: Some(dir.into()),
            name: Some("demo".to_string()),
            description: None,
            language: Some(ScriptLanguage::Javascript),
            no_script: false,
            force: false,
            skip_install: false,
        }
    }

    #[tokio::test]
    async fn init_scaffolds_and_installs_script_packages() -> TestResult {
        let root = TempDirFixture::new()?;
        let session = MockCommandSession::new()
            .with_config(MockConfigProvider::for_workdir(root.path()));

        execute_command_with_session(init("demo"), &session).await?;

        let project_dir = root.path().join("demo");
        assert!(project_dir.join(CONFIG_FILE).is_file());
        let installs = session.mock_toolchain.installer.get_installs();
        assert_eq!(installs.len(), 1);
        assert_eq!(installs[0].0, project_dir.canonicalize()?);

        let prompts = session.interactive_provider.get_text_input_calls();
        assert_eq!(
            prompts,
            vec![("Description".to_string(), "demo add-on".to_string())]
        );
        let report = session.mock_display().last_report().ok_or("no report")?;
        let artifacts = report.artifacts.ok_or("no artifacts")?;
        assert!(artifacts[0].ends_with(CONFIG_FILE));
        Ok(())
    }

    #[tokio::test]
    async fn init_refuses_an_existing_project() -> TestResult {
        let root = TempDirFixture::new()?;
        let session = MockCommandSession::new()
            .with_config(MockConfigProvider::for_workdir(root.path()));
        execute_command_with_session(init("demo"), &session).await?;

        let result = execute_command_with_session(init("demo"), &session).await;

        assert!(result.is_err());
        assert_eq!(session.mock_toolchain.installer.get_installs().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_install_keeps_the_scaffold() -> TestResult {
        let root = TempDirFixture::new()?;
        let session = MockCommandSession::new()
            .with_config(MockConfigProvider::for_workdir(root.path()))
            .with_toolchain(MockToolchain::new().with_installer(MockInstaller::failing()));

        let result = execute_command_with_session(init("demo"), &session).await;

        assert!(result.is_err());
        assert!(root.path().join("demo").join(CONFIG_FILE).is_file());
        assert!(session.mock_display().has_call(&DisplayCall::SpinnerAbandon {
            message: "Installing script dependencies failed".to_string()
        }));
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_prompt_writes_nothing() -> TestResult {
        let root = TempDirFixture::new()?;
        let session = MockCommandSession::new()
            .with_config(MockConfigProvider::for_workdir(root.path()))
            .with_interactive(MockInteractiveProvider::new().with_cancel());

        let err = execute_command_with_session(
            Commands::Init {
                dir: Some("demo".into()),
                name: None,
                description: None,
                language: None,
                no_script: false,
                force: false,
                skip_install: true,
            },
            &session,
        )
        .await
        .unwrap_err();

        assert!(err.is::<PromptCancelled>());
        assert!(!root.path().join("demo").exists());
        Ok(())
    }
}

mod list_and_settings_tests {
    use super::*;

    #[tokio::test]
    async fn list_reports_every_discovered_project() -> TestResult {
        let root = TempDirFixture::new()?;
        for name in ["alpha", "nested/beta"] {
            root.write_file(
                &format!("{name}/{CONFIG_FILE}"),
                "{\"project\":{\"name\":\"x\"}}",
            )?;
        }
        let session = MockCommandSession::new()
            .with_config(MockConfigProvider::for_workdir(root.path()));

        execute_command_with_session(Commands::List, &session).await?;

        let projects = session
            .mock_display()
            .last_report()
            .and_then(|r| r.projects)
            .ok_or("no projects")?;
        assert_eq!(projects.len(), 2);
        assert!(projects.iter().all(|p| p["name"] == "x"));
        Ok(())
    }

    #[tokio::test]
    async fn settings_are_saved_under_the_state_dir() -> TestResult {
        let root = TempDirFixture::new()?;
        let projects = root.create_dir("projects")?;
        let session = MockCommandSession::new()
            .with_config(MockConfigProvider::for_workdir(root.path()))
            .with_settings_root(root.path());

        execute_command_with_session(
            Commands::Settings {
                language: Some("de_DE".to_string()),
                project_root: Some("projects".into()),
                clear_project_root: false,
            },
            &session,
        )
        .await?;

        let saved = crate::application::settings::SettingsContext::load(root.path())?;
        assert_eq!(saved.settings.language, "de_DE");
        assert_eq!(saved.settings.project_root, Some(projects));
        Ok(())
    }

    #[tokio::test]
    async fn project_root_must_exist() -> TestResult {
        let root = TempDirFixture::new()?;
        let session = MockCommandSession::new()
            .with_config(MockConfigProvider::for_workdir(root.path()))
            .with_settings_root(root.path());

        let result = execute_command_with_session(
            Commands::Settings {
                language: None,
                project_root: Some("missing".into()),
                clear_project_root: false,
            },
            &session,
        )
        .await;

        assert!(result.is_err());
        assert!(!session.settings().settings_path().exists());
        Ok(())
    }
}

#[test]
fn sizes_are_human_readable() {
    assert_eq!(format_size(512), "512 B");
    assert_eq!(format_size(2048), "2.0 KiB");
    assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
}
