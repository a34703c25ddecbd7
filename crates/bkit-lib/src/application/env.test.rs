use super::*;

fn env(pairs: &[(&str, &str)]) -> EnvironmentConfig {
    let mut config = EnvironmentConfig::default();
    for (key, value) in pairs {
        let value = Some(value.to_string());
        match *key {
            "NO_COLOR" => config.no_color = value,
            "FORCE_COLOR" => config.force_color = value,
            "CLICOLOR" => config.clicolor = value,
            "CI" => config.ci = value,
            other => panic!("unknown variable {other}"),
        }
    }
    config
}

#[test]
fn test_no_color_disables() {
    let color = env(&[("NO_COLOR", "1")]).apply_color_config(TerminalCapsDetectIntent::Auto);
    assert_eq!(color, TerminalCapsDetectIntent::Never);
}

#[test]
fn test_empty_no_color_is_ignored() {
    let color = env(&[("NO_COLOR", "")]).apply_color_config(TerminalCapsDetectIntent::Auto);
    assert_eq!(color, TerminalCapsDetectIntent::Auto);
}

#[test]
fn test_force_color_beats_no_color_and_clicolor() {
    let config = env(&[("CLICOLOR", "0"), ("NO_COLOR", "1"), ("FORCE_COLOR", "1")]);
    assert_eq!(
        config.apply_color_config(TerminalCapsDetectIntent::Auto),
        TerminalCapsDetectIntent::Always
    );
}

#[test]
fn test_ci_wins_over_everything() {
    let config = env(&[("CI", "true"), ("FORCE_COLOR", "1")]);
    assert!(config.is_ci());
    assert_eq!(
        config.apply_color_config(TerminalCapsDetectIntent::Always),
        TerminalCapsDetectIntent::Never
    );
}

#[test]
fn test_invalid_force_color_values_ignored() {
    let color = env(&[("FORCE_COLOR", "invalid")]).apply_color_config(TerminalCapsDetectIntent::Auto);
    assert_eq!(color, TerminalCapsDetectIntent::Auto);
}

#[test]
fn test_clicolor_zero_disables() {
    let color = env(&[("CLICOLOR", "0")]).apply_color_config(TerminalCapsDetectIntent::Always);
    assert_eq!(color, TerminalCapsDetectIntent::Never);
}
