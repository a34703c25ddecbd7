use super::*;

#[test]
fn success_report_omits_unset_sections() {
    let json: serde_json::Value =
        serde_json::from_str(&CommandReport::success("build").to_json()).unwrap();
    assert_eq!(json, serde_json::json!({"ok": true, "command": "build"}));
}

#[test]
fn any_issue_flips_ok() {
    let report = CommandReport::success("validate").with_issues(vec!["missing name".into()]);
    assert!(!report.ok);

    let clean = CommandReport::success("validate").with_issues(vec![]);
    assert!(clean.ok);
    assert!(clean.to_json().contains("\"issues\":[]"));
}

#[test]
fn failure_carries_error_message() {
    let json: serde_json::Value =
        serde_json::from_str(&CommandReport::failure("no config").to_json()).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"], "no config");
}

#[test]
fn linked_entries_skip_missing_paths() {
    let report = CommandReport::success("link").with_linked(vec![ReportEntry {
        pack: "resource".into(),
        action: "not-applicable".into(),
        source: None,
        dest: None,
    }]);
    let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
    assert_eq!(
        json["linked"][0],
        serde_json::json!({"pack": "resource", "action": "not-applicable"})
    );
}
