use super::*;
use serde_json::json;

#[test]
fn every_embedded_template_is_registered() {
    let engine = TemplateEngine::new();
    for name in [BKITIGNORE, MAIN_TS, MAIN_JS, TSCONFIG] {
        assert!(engine.has_template(name), "{name} missing");
    }
}

#[test]
fn entry_stub_quotes_the_message() {
    let engine = TemplateEngine::new();
    let context = json!({ "message": string_literal(r#"My "Addon" loaded"#) });

    let rendered = engine.render(MAIN_TS, &context).unwrap();

    assert!(rendered.contains(r#"world.sendMessage("My \"Addon\" loaded");"#));
}

#[test]
fn string_literal_escapes_backslashes_and_newlines() {
    assert_eq!(string_literal("a\\b"), r#""a\\b""#);
    assert_eq!(string_literal("line\nbreak"), r#""line\nbreak""#);
    assert_eq!(string_literal("plain"), r#""plain""#);
}

#[test]
fn tsconfig_includes_the_behavior_scripts() {
    let engine = TemplateEngine::new();
    let rendered = engine
        .render(TSCONFIG, &json!({ "behavior_dir": "packs/behavior" }))
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed["include"][0], "packs/behavior/scripts/**/*");
}

#[test]
fn missing_variables_and_templates_are_errors() {
    let engine = TemplateEngine::new();

    assert!(matches!(
        engine.render(MAIN_JS, &json!({})),
        Err(TemplateError::Render { .. })
    ));
    assert!(matches!(
        engine.render("nope", &json!({})),
        Err(TemplateError::TemplateNotFound { .. })
    ));
}
