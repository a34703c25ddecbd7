use super::*;
use std::fs;
use tempfile::TempDir;

fn tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("a/deep")).unwrap();
    fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
    fs::write(root.join("a/one.ts"), "").unwrap();
    fs::write(root.join("a/deep/two.js"), "").unwrap();
    fs::write(root.join("node_modules/pkg/index.ts"), "").unwrap();
    fs::write(root.join("top.json"), "").unwrap();
    temp
}

#[test]
fn skip_prunes_whole_subtree() {
    let temp = tree();
    let found = walk(temp.path(), &WalkOptions::default(), |entry| {
        if entry.is_dir() && entry.file_name() == "node_modules" {
            Visit::Skip
        } else if entry.is_dir() {
            Visit::Descend
        } else {
            Visit::Collect
        }
    })
    .unwrap();

    let names: Vec<_> = found.iter().map(|e| e.relative.clone()).collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("a/deep/two.js"),
            PathBuf::from("a/one.ts"),
            PathBuf::from("top.json"),
        ]
    );
}

#[test]
fn halt_stops_at_first_hit() {
    let temp = tree();
    let mut visited = 0;
    walk(temp.path(), &WalkOptions::default(), |entry| {
        visited += 1;
        if entry.file_name().ends_with(".ts") {
            Visit::Halt
        } else {
            Visit::Descend
        }
    })
    .unwrap();
    // a, a/deep, a/deep/two.js, a/one.ts
    assert_eq!(visited, 4);
}

#[test]
fn any_file_detects_extension() {
    let temp = tree();
    assert!(any_file(temp.path(), &WalkOptions::default(), |e| e.file_name().ends_with(".js")).unwrap());
    assert!(!any_file(temp.path(), &WalkOptions::default(), |e| e.file_name().ends_with(".py")).unwrap());
}

#[test]
fn max_depth_limits_walk() {
    let temp = tree();
    let found = walk(temp.path(), &WalkOptions::default().max_depth(1), |_| Visit::Collect).unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|e| e.depth == 1));
}

#[test]
fn missing_root_is_an_error() {
    let temp = TempDir::new().unwrap();
    let result = walk(&temp.path().join("missing"), &WalkOptions::default(), |_| Visit::Collect);
    assert!(result.is_err());
}

#[cfg(unix)]
#[test]
fn symlink_cycles_are_not_fatal() {
    let temp = tree();
    std::os::unix::fs::symlink(temp.path(), temp.path().join("a/deep/loop")).unwrap();

    let found = walk(temp.path(), &WalkOptions::following_links(), |entry| {
        if entry.is_dir() { Visit::Descend } else { Visit::Collect }
    })
    .unwrap();
    assert_eq!(found.len(), 4);
}

#[cfg(unix)]
#[test]
fn collect_symlinks_does_not_follow() {
    let temp = tree();
    std::os::unix::fs::symlink(temp.path().join("a"), temp.path().join("link-a")).unwrap();

    let links = collect_symlinks(temp.path()).unwrap();
    assert_eq!(links, vec![temp.path().join("link-a")]);
}
