use super::*;

#[test]
fn default_directive_scopes_level_and_quiets_dependencies() {
    let directive = default_filter_directive(LogLevel::Debug);
    assert!(directive.starts_with("bkit=debug,bkit_lib=debug"));
    assert!(directive.contains("notify=warn"));
    assert!(directive.ends_with(",debug"));
    // Must be something EnvFilter accepts
    assert!(EnvFilter::try_new(&directive).is_ok());
}
