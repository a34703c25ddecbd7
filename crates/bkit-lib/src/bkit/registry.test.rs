use super::*;
use crate::testing::{ProjectFixture, TempDirFixture};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_config(fixture: &TempDirFixture, dir: &str, name: &str) -> TestResult {
    fixture.write_file(
        &format!("{dir}/{CONFIG_FILE}"),
        &format!(r#"{{ "project": {{ "name": "{name}" }} }}"#),
    )?;
    Ok(())
}

#[test]
fn discovers_nested_projects_and_skips_ignored_dirs() -> TestResult {
    let fixture = TempDirFixture::new()?;
    write_config(&fixture, "alpha", "alpha")?;
    write_config(&fixture, "group/beta", "beta")?;
    write_config(&fixture, "alpha/node_modules/pkg", "vendored")?;
    write_config(&fixture, ".cache/gamma", "hidden")?;
    fixture.write_file(&format!("broken/{CONFIG_FILE}"), "{ not json")?;

    let found = discover(fixture.path())?;

    let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    Ok(())
}

#[test]
fn config_at_search_root_is_discovered() -> TestResult {
    let fixture = TempDirFixture::new()?;
    write_config(&fixture, ".", "top")?;

    let found = discover(fixture.path())?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "top");
    Ok(())
}

#[test]
fn workdir_config_wins_over_discovery() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let other = TempDirFixture::new()?;
    write_config(&other, "one", "one")?;
    write_config(&other, "two", "two")?;

    let selection = select(None, &fixture.root(), other.path())?;
    match selection {
        Selection::One(project) => assert_eq!(project.name(), "addon"),
        Selection::Ambiguous(_) => panic!("expected the working directory project"),
    }
    Ok(())
}

#[test]
fn single_discovered_project_is_selected() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;

    let selection = select(None, fixture.temp_path(), fixture.temp_path())?;
    assert!(matches!(selection, Selection::One(p) if p.name() == "addon"));
    Ok(())
}

#[test]
fn several_projects_are_ambiguous() -> TestResult {
    let fixture = TempDirFixture::new()?;
    write_config(&fixture, "one", "one")?;
    write_config(&fixture, "two", "two")?;

    match select(None, fixture.path(), fixture.path())? {
        Selection::Ambiguous(candidates) => {
            assert_eq!(candidates.len(), 2);
            assert!(candidates[0].label().starts_with("one ("));
        }
        Selection::One(_) => panic!("expected ambiguity"),
    }
    Ok(())
}

#[test]
fn query_matches_path_then_name() -> TestResult {
    let fixture = TempDirFixture::new()?;
    write_config(&fixture, "one", "first")?;
    write_config(&fixture, "two", "second")?;

    let by_path = select(Some("one"), fixture.path(), fixture.path())?;
    assert!(matches!(by_path, Selection::One(p) if p.name() == "first"));

    let by_name = select(Some("second"), fixture.path(), fixture.path())?;
    assert!(matches!(by_name, Selection::One(p) if p.name() == "second"));
    Ok(())
}

#[test]
fn unknown_query_lists_what_was_found() -> TestResult {
    let fixture = TempDirFixture::new()?;
    write_config(&fixture, "one", "first")?;

    let err = select(Some("missing"), fixture.path(), fixture.path()).unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { .. }));
    assert!(err.to_string().ends_with("(found: first)"));
    Ok(())
}

#[test]
fn empty_search_root_has_no_projects() -> TestResult {
    let fixture = TempDirFixture::new()?;

    assert!(matches!(
        select(None, fixture.path(), fixture.path()),
        Err(RegistryError::NoProjects { .. })
    ));
    assert!(matches!(
        load_all(fixture.path()),
        Err(RegistryError::NoProjects { .. })
    ));
    Ok(())
}

#[test]
fn load_all_returns_every_project() -> TestResult {
    let fixture = TempDirFixture::new()?;
    write_config(&fixture, "one", "first")?;
    write_config(&fixture, "two", "second")?;

    let projects = load_all(fixture.path())?;
    assert_eq!(projects.len(), 2);
    Ok(())
}
