use super::*;

#[test]
fn never_intent_disables_color() {
    let config = AppConfig {
        color: TerminalCapsDetectIntent::Never,
        ..AppConfig::default()
    };
    let caps = TerminalCapabilities::detect_from_config(&config);
    assert_eq!(caps.color, TerminalColorCaps::None);
}

#[test]
fn plain_capabilities_are_conservative() {
    let caps = TerminalCapabilities::plain();
    assert_eq!(caps.color, TerminalColorCaps::None);
    assert!(!caps.unicode);
    assert!(!caps.is_tty);
    assert_eq!(caps.cols, 80);
}
