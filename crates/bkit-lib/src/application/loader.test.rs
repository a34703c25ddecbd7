use super::*;
use crate::primitives::TerminalCapsDetectIntent;
use std::path::PathBuf;

#[test]
fn test_config_loading_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.log_level, 0);
    assert!(!config.yes);
    assert!(!config.json);
    assert_eq!(config.color, TerminalCapsDetectIntent::Auto);
}

#[test]
fn test_config_merging() {
    let base = AppConfig::default();
    let override_config = AppConfig {
        log_level: 4,
        color: TerminalCapsDetectIntent::Always,
        json: true,
        workdir: Some(PathBuf::from("/work")),
        ..AppConfig::default()
    };

    let merged = base.merge_with(override_config);
    assert_eq!(merged.log_level, 4);
    assert_eq!(merged.color, TerminalCapsDetectIntent::Always);
    assert!(merged.json);
    assert_eq!(merged.workdir, Some(PathBuf::from("/work")));
    assert!(merged.settings_root.is_none());
}

#[test]
fn test_resolve_fills_paths_and_keeps_cli_values() {
    let cli = AppConfig {
        workdir: Some(PathBuf::from("/work")),
        settings_root: Some(PathBuf::from("/settings")),
        ..AppConfig::default()
    };

    let resolved = AppConfig::resolve_with_env(cli, &EnvironmentConfig::default()).unwrap();
    assert_eq!(resolved.workdir, Some(PathBuf::from("/work")));
    assert_eq!(resolved.settings_root, Some(PathBuf::from("/settings")));
}

#[test]
fn test_resolve_cli_color_beats_no_color() {
    let env = EnvironmentConfig {
        no_color: Some("1".to_string()),
        ..EnvironmentConfig::default()
    };
    let cli = AppConfig {
        color: TerminalCapsDetectIntent::Always,
        workdir: Some(PathBuf::from("/work")),
        settings_root: Some(PathBuf::from("/settings")),
        ..AppConfig::default()
    };

    let resolved = AppConfig::resolve_with_env(cli, &env).unwrap();
    assert_eq!(resolved.color, TerminalCapsDetectIntent::Always);

    let resolved = AppConfig::resolve_with_env(
        AppConfig {
            workdir: Some(PathBuf::from("/work")),
            settings_root: Some(PathBuf::from("/settings")),
            ..AppConfig::default()
        },
        &env,
    )
    .unwrap();
    assert_eq!(resolved.color, TerminalCapsDetectIntent::Never);
}
