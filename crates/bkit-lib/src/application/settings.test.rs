use super::*;
use tempfile::TempDir;

#[test]
fn test_missing_file_gives_defaults() {
    let temp = TempDir::new().unwrap();
    let context = SettingsContext::load(temp.path()).unwrap();

    assert_eq!(context.settings, Settings::default());
    assert_eq!(context.settings.language, DEFAULT_LANGUAGE);
    assert_eq!(context.state_dir(), temp.path().join(".bkit"));
    assert_eq!(context.search_root(Path::new("/work")), PathBuf::from("/work"));
}

#[test]
fn test_save_and_reload() {
    let temp = TempDir::new().unwrap();
    let mut context = SettingsContext::load(temp.path()).unwrap();
    context.settings.language = "de_DE".to_string();
    context.settings.project_root = Some(PathBuf::from("/addons"));
    context.save().unwrap();

    let text = std::fs::read_to_string(context.settings_path()).unwrap();
    assert!(text.contains("\"projectRoot\""));

    let reloaded = SettingsContext::load(temp.path()).unwrap();
    assert_eq!(reloaded, context);
    assert_eq!(reloaded.search_root(Path::new("/work")), PathBuf::from("/addons"));
}

#[test]
fn test_corrupt_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join(STATE_DIR)).unwrap();
    std::fs::write(temp.path().join(STATE_DIR).join(SETTINGS_FILE), "{not json").unwrap();

    assert!(matches!(
        SettingsContext::load(temp.path()),
        Err(SettingsError::Parse { .. })
    ));
}
