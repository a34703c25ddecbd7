use super::*;
use tempfile::TempDir;

#[test]
fn comments_and_blank_lines_are_not_rules() {
    let filter = IgnoreFilter::compile("# build output\n\n   \ndist/\n");
    assert_eq!(filter.rules().len(), 1);
    assert_eq!(filter.rules()[0].pattern, "dist/");
}

#[test]
fn directory_and_extension_patterns() {
    let filter = IgnoreFilter::compile("dist/\n*.log\n");

    assert!(filter.is_ignored_relative("dist"));
    assert!(filter.is_ignored_relative("dist/x"));
    assert!(filter.is_ignored_relative("a.log"));
    assert!(filter.is_ignored_relative("nested/deeper/b.log"));
    assert!(!filter.is_ignored_relative("src/a.log.keep"));
    assert!(!filter.is_ignored_relative("distribution/x"));
}

#[test]
fn leading_slash_anchors_to_root() {
    let filter = IgnoreFilter::compile("/build\n");
    assert!(filter.is_ignored_relative("build/out.js"));
    assert!(!filter.is_ignored_relative("packs/build/out.js"));

    let floating = IgnoreFilter::compile("build\n");
    assert!(floating.is_ignored_relative("packs/build/out.js"));
}

#[test]
fn star_stays_within_one_segment() {
    let filter = IgnoreFilter::compile("/textures/*.psd\n");
    assert!(filter.is_ignored_relative("textures/a.psd"));
    assert!(!filter.is_ignored_relative("textures/blocks/a.psd"));

    let deep = IgnoreFilter::compile("/textures/**/*.psd\n");
    assert!(deep.is_ignored_relative("textures/a.psd"));
    assert!(deep.is_ignored_relative("textures/blocks/stone/a.psd"));
}

#[test]
fn question_mark_matches_single_character() {
    let filter = IgnoreFilter::compile("tmp?.txt\n");
    assert!(filter.is_ignored_relative("tmp1.txt"));
    assert!(!filter.is_ignored_relative("tmp12.txt"));
}

#[test]
fn regex_metacharacters_are_literal() {
    let filter = IgnoreFilter::compile("notes(1).md\n");
    assert!(filter.is_ignored_relative("notes(1).md"));
    assert!(!filter.is_ignored_relative("notes1.md"));
}

#[test]
fn pathological_patterns_are_skipped_not_fatal() {
    let long = "a".repeat(MAX_PATTERN_LEN + 1);
    let source = format!("{long}\n*****.x\n?*?*?.y\nkeep.me\n");
    let filter = IgnoreFilter::compile(&source);

    assert_eq!(filter.rules().len(), 1);
    assert!(filter.is_ignored_relative("keep.me"));
}

#[test]
fn four_wildcards_are_still_allowed() {
    let filter = IgnoreFilter::compile("****.x\n");
    assert_eq!(filter.rules().len(), 1);
}

#[test]
fn rule_count_is_capped() {
    let source: String = (0..MAX_RULES + 50).map(|i| format!("file{i}\n")).collect();
    let filter = IgnoreFilter::compile(&source);
    assert_eq!(filter.rules().len(), MAX_RULES);
    assert!(!filter.is_ignored_relative(&format!("file{}", MAX_RULES + 10)));
}

#[test]
fn oversized_ignore_file_yields_no_rules() {
    let temp = TempDir::new().unwrap();
    let mut big = String::from("*.log\n");
    while (big.len() as u64) <= MAX_FILE_BYTES {
        big.push_str("# padding padding padding padding padding padding\n");
    }
    fs::write(temp.path().join(IGNORE_FILE), big).unwrap();

    let filter = IgnoreFilter::load(temp.path()).unwrap();
    assert!(filter.is_empty());
}

#[test]
fn missing_ignore_file_yields_no_rules() {
    let temp = TempDir::new().unwrap();
    assert!(IgnoreFilter::load(temp.path()).unwrap().is_empty());
}

#[test]
fn absolute_paths_are_matched_relative_to_root() {
    let filter = IgnoreFilter::compile("*.log\n");
    let root = Path::new("/project");
    assert!(filter.is_ignored(&root.join("a.log"), root));
    assert!(!filter.is_ignored(&root.join("src").join("a.log.keep"), root));
    assert!(!filter.is_ignored(Path::new("/other/a.log"), root));
    assert!(!filter.is_ignored(root, root));
}
