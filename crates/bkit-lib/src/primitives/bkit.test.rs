#[test]
fn patch_bump_increments_last_component() {
    let version = VersionTuple::parse("1.2.3").unwrap();
    assert_eq!(version.bump(BumpLevel::Patch), VersionTuple::new(1, 2, 4));
}

#[test]
fn minor_and_major_reset_subordinates() {
    let version = VersionTuple::new(3, 7, 9);
    assert_eq!(version.bump(BumpLevel::Minor), VersionTuple::new(3, 8, 0));
    assert_eq!(version.bump(BumpLevel::Major), VersionTuple::new(4, 0, 0));
}

#[test]
fn every_bump_strictly_increases() {
    let starts = [
        VersionTuple::new(0, 0, 0),
        VersionTuple::new(0, 9, 99),
        VersionTuple::new(1, 0, 0),
        VersionTuple::new(12, 0, 7),
        VersionTuple::new(2, 31, 0),
    ];

    for start in starts {
        for level in [BumpLevel::Patch, BumpLevel::Minor, BumpLevel::Major] {
            let next = start.bump(level);
            assert!(next > start, "{start} -> {next} ({level:?})");

            let changed: Vec<usize> = (0..3).filter(|i| next.0[*i] != start.0[*i]).collect();
            let bumped = match level {
                BumpLevel::Major => 0,
                BumpLevel::Minor => 1,
                BumpLevel::Patch => 2,
            };
            assert_eq!(next.0[bumped], start.0[bumped] + 1);
            assert!(changed.iter().all(|i| *i >= bumped));
            for i in bumped + 1..3 {
                assert_eq!(next.0[i], 0);
            }
        }
    }
}

#[test]
fn version_tuple_parsing_tolerates_prefix_and_prerelease() {
    assert_eq!(VersionTuple::parse("v2.0.1").unwrap(), VersionTuple::new(2, 0, 1));
    assert_eq!(
        VersionTuple::parse("1.16.0-beta.1").unwrap(),
        VersionTuple::new(1, 16, 0)
    );
    assert!(VersionTuple::parse("1.2").is_err());
    assert!(VersionTuple::parse("one.two.three").is_err());
}

#[test]
fn version_tuple_serializes_as_array() {
    let json = serde_json::to_string(&VersionTuple::new(1, 21, 2)).unwrap();
    assert_eq!(json, "[1,21,2]");
    let back: VersionTuple = serde_json::from_str("[4,5,6]").unwrap();
    assert_eq!(back.to_string(), "4.5.6");
}

#[test]
fn product_parsing_is_case_insensitive() {
    assert_eq!("bedrockgdk".parse::<Product>().unwrap(), Product::BedrockGDK);
    assert_eq!("PreviewUWP".parse::<Product>().unwrap(), Product::PreviewUWP);
    let err = "Java".parse::<Product>().unwrap_err();
    assert!(err.contains("BedrockUWP"));
}

#[test]
fn pack_kind_conventions() {
    assert_eq!(PackKind::Behavior.to_string(), "behavior");
    assert_eq!(PackKind::Resource.module_type(), ModuleType::Resources);
    assert_eq!(PackKind::Behavior.development_dir(), "development_behavior_packs");
    assert_eq!(PackKind::Resource.archive_dir(), "resource_pack");
    assert_eq!(PackKind::Behavior.other(), PackKind::Resource);
}

#[test]
fn only_typescript_requires_compilation() {
    assert!(ScriptLanguage::Typescript.requires_compilation());
    assert!(!ScriptLanguage::Javascript.requires_compilation());
}
