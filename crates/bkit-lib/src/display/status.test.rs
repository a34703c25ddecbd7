use super::*;
use crate::display::styling::StyleManager;
use crate::terminal::TerminalCapabilities;

#[test]
fn detail_is_appended_only_when_present() {
    assert_eq!(join_detail("behavior", ""), "behavior");
    assert_eq!(join_detail("behavior", "skipped"), "behavior: skipped");
}

#[test]
fn plain_terminal_uses_ascii_symbols_without_escapes() {
    let styling = StyleManager::new(&TerminalCapabilities::plain());
    assert_eq!(styling.format_success("done"), "+ done");
    assert_eq!(styling.format_error("boom"), "x boom");
    assert_eq!(styling.style_emphasis("title"), "title");
    assert_eq!(styling.bullet(), "*");
}

#[test]
fn unicode_terminal_uses_unicode_symbols() {
    let caps = TerminalCapabilities {
        unicode: true,
        ..TerminalCapabilities::plain()
    };
    let styling = StyleManager::new(&caps);
    assert_eq!(styling.format_warning("careful"), "⚠ careful");
}
