use super::*;
use clap::CommandFactory;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("bkit").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["build", "--all", "--json", "--yes"]);
    assert!(cli.config.json);
    assert!(cli.config.yes);
    match cli.command {
        Some(Commands::Build { projects }) => assert!(projects.all),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_link_with_target_and_project() {
    let cli = parse(&["link", "--target", "local", "-p", "addon"]);
    match cli.command {
        Some(Commands::Link { project, target }) => {
            assert_eq!(project.project.as_deref(), Some("addon"));
            assert_eq!(target.as_deref(), Some("local"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_bump_needs_level_or_explicit_version() {
    assert!(Cli::try_parse_from(["bkit", "bump"]).is_err());

    match parse(&["bump", "patch"]).command {
        Some(Commands::Bump { level, set, .. }) => {
            assert_eq!(level, Some(BumpLevel::Patch));
            assert_eq!(set, None);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    match parse(&["bump", "--set", "2.0.0", "--min-engine", "1.21.50"]).command {
        Some(Commands::Bump { level, set, min_engine, .. }) => {
            assert_eq!(level, None);
            assert_eq!(set.as_deref(), Some("2.0.0"));
            assert_eq!(min_engine.as_deref(), Some("1.21.50"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_deps_subcommands() {
    match parse(&["deps", "add", "@minecraft/server-ui@1.3.0"]).command {
        Some(Commands::Deps { action, .. }) => assert_eq!(
            action,
            DepsAction::Add {
                spec: "@minecraft/server-ui@1.3.0".to_string()
            }
        ),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_all_conflicts_with_project() {
    assert!(Cli::try_parse_from(["bkit", "validate", "--all", "--project", "x"]).is_err());
}

#[test]
fn test_requires_project() {
    assert!(!Commands::Version.requires_project());
    assert!(!Commands::List.requires_project());
    assert!(
        Commands::Validate {
            projects: MultiProjectArgs::default(),
            strict: false
        }
        .requires_project()
    );
    assert!(
        Commands::Sync {
            project: ProjectArgs::default(),
            target: None,
            dry_run: false,
            no_build: false
        }
        .recovers_watch_state()
    );
    assert!(
        !Commands::Sync {
            project: ProjectArgs::default(),
            target: None,
            dry_run: true,
            no_build: false
        }
        .recovers_watch_state()
    );
}
