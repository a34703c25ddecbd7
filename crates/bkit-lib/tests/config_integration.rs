use bkit_lib::application::config::AppConfig;
use bkit_lib::application::env::EnvironmentConfig;
use bkit_lib::primitives::TerminalCapsDetectIntent;
use std::path::PathBuf;

#[test]
fn test_config_default_creation() {
    let config = AppConfig::default();

    assert!(config.log_level <= 4);
    assert!(!config.json);
    assert!(!config.yes);
    assert_eq!(config.color, TerminalCapsDetectIntent::Auto);
}

#[test]
fn test_config_merging_integration() {
    let base_config = AppConfig::default();
    let override_config = AppConfig {
        log_level: 3,
        json: true,
        workdir: Some(PathBuf::from("/work/addons")),
        color: TerminalCapsDetectIntent::Never,
        ..AppConfig::default()
    };

    let merged = base_config.merge_with(override_config);

    assert_eq!(merged.log_level, 3);
    assert!(merged.json);
    assert_eq!(merged.workdir, Some(PathBuf::from("/work/addons")));
    assert_eq!(merged.color, TerminalCapsDetectIntent::Never);
    assert!(merged.settings_root.is_none());
}

#[test]
fn test_resolved_config_has_workdir_and_settings_root() {
    let cli = AppConfig {
        workdir: Some(PathBuf::from("/work/addons")),
        settings_root: Some(PathBuf::from("/state")),
        ..AppConfig::default()
    };

    let resolved = AppConfig::resolve_with_env(cli, &EnvironmentConfig::default()).unwrap();

    assert_eq!(resolved.workdir, Some(PathBuf::from("/work/addons")));
    assert_eq!(resolved.settings_root, Some(PathBuf::from("/state")));
}
