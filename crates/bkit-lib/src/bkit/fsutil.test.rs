use super::*;
use tempfile::TempDir;

#[test]
fn probe_reports_tri_state() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("a.txt");
    fs::write(&file, "x").unwrap();

    assert!(matches!(probe(&file), PathState::Present(EntryKind::File)));
    assert!(matches!(probe(temp.path()), PathState::Present(EntryKind::Dir)));
    assert!(matches!(probe(&temp.path().join("missing")), PathState::Absent));
}

#[test]
fn require_dir_rejects_files() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("a.txt");
    fs::write(&file, "x").unwrap();

    assert!(require_dir(temp.path()).unwrap());
    assert!(!require_dir(&temp.path().join("nope")).unwrap());
    assert!(require_dir(&file).is_err());
}

#[test]
fn remove_any_handles_files_and_trees() {
    let temp = TempDir::new().unwrap();
    let tree = temp.path().join("tree");
    fs::create_dir_all(tree.join("nested")).unwrap();
    fs::write(tree.join("nested/file"), "x").unwrap();

    assert!(remove_any(&tree).unwrap());
    assert!(!tree.exists());
    assert!(!remove_any(&tree).unwrap());
}

#[cfg(unix)]
#[test]
fn replace_with_link_is_idempotent_and_never_follows_links() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("keep.txt"), "keep").unwrap();
    let dest = temp.path().join("out/link");

    replace_with_link(&source, &dest).unwrap();
    replace_with_link(&source, &dest).unwrap();
    assert_eq!(fs::read_link(&dest).unwrap(), source);

    // Removing the link must leave the target's contents alone
    assert!(remove_any(&dest).unwrap());
    assert!(source.join("keep.txt").exists());
}

#[cfg(unix)]
#[test]
fn replace_with_link_overwrites_a_real_directory() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    fs::create_dir_all(&source).unwrap();
    let dest = temp.path().join("dest");
    fs::create_dir_all(dest.join("stale")).unwrap();

    replace_with_link(&source, &dest).unwrap();
    assert!(matches!(probe(&dest), PathState::Present(EntryKind::Symlink)));
    assert!(!source.join("stale").exists());
}

#[test]
fn relative_slash_normalizes_separators() {
    let root = Path::new("/project");
    let path = root.join("packs").join("behavior").join("a.json");
    assert_eq!(
        relative_slash(&path, root).as_deref(),
        Some("packs/behavior/a.json")
    );
    assert_eq!(relative_slash(Path::new("/elsewhere/x"), root), None);
}

#[test]
fn json_files_end_with_newline() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("deep/config.json");
    write_json(&target, &serde_json::json!({"a": 1})).unwrap();

    let text = fs::read_to_string(&target).unwrap();
    assert_eq!(text, "{\n  \"a\": 1\n}\n");
}

#[test]
fn dropped_stage_leaves_target_untouched() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("file.json");
    fs::write(&target, "old").unwrap();

    let staged = stage_write(&target, b"new").unwrap();
    drop(staged);

    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    let leftovers = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn committed_stage_replaces_target() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("file.json");
    fs::write(&target, "old").unwrap();

    stage_write(&target, b"new").unwrap().commit().unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "new");
}
