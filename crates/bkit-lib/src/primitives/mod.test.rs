use super::*;

macro_rules! test_enum_completeness {
    ($enum_type:ty, $test_name:ident) => {
        #[test]
        fn $test_name() {
            for variant in <$enum_type>::value_variants() {
                let possible_value = variant
                    .to_possible_value()
                    .expect("PossibleValue should exist for all variants");
                let parsed: $enum_type = possible_value
                    .get_name()
                    .parse()
                    .expect("primary name should parse");
                assert_eq!(parsed, *variant, "Round-trip should preserve variant");
            }
        }
    };
}

test_enum_completeness!(LogLevel, log_level_round_trips);
test_enum_completeness!(LogFormat, log_format_round_trips);
test_enum_completeness!(LogOutput, log_output_round_trips);
test_enum_completeness!(TerminalCapsDetectIntent, color_intent_round_trips);

#[test]
fn log_format_aliases_parse() {
    for (input, expected) in [
        ("txt", LogFormat::Text),
        ("plain", LogFormat::Text),
        ("yml", LogFormat::Yaml),
        ("JSON", LogFormat::Json),
    ] {
        assert_eq!(input.parse::<LogFormat>().unwrap(), expected, "{}", input);
    }
}

#[test]
fn unknown_value_reports_parse_error() {
    let err = "loud".parse::<LogLevel>().unwrap_err();
    match err {
        ConfigError::ParseError { value, reason } => {
            assert_eq!(value, "loud");
            assert_eq!(reason, "invalid log level");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn verbosity_maps_to_levels() {
    assert_eq!(LogLevel::from_verbosity(0), LogLevel::Error);
    assert_eq!(LogLevel::from_verbosity(2), LogLevel::Info);
    assert_eq!(LogLevel::from_verbosity(9), LogLevel::Trace);
    assert_eq!(LogLevel::from_verbosity(1).as_filter(), "warn");
}
