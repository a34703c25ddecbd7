use super::*;
use crate::application::session_mocks::{MockDeploymentRoots, MockToolchain};
use crate::bkit::externals::{BundleRequest, Bundler, ExternalToolError};
use crate::primitives::{PackKind, ScriptLanguage};
use crate::testing::ProjectFixture;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn watched(fixture: &ProjectFixture) -> Result<WatchedProject, Box<dyn std::error::Error>> {
    let project = fixture.project()?;
    let target = sync::resolve_target(&project, None, &MockDeploymentRoots::default())?;
    Ok(WatchedProject { project, target })
}

fn state_path(fixture: &ProjectFixture) -> PathBuf {
    WatchState::path_in(&fixture.temp_path().join(".bkit"))
}

#[test]
fn state_serializes_with_camel_case_keys() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let state = WatchState::new(&[watched(&fixture)?], Some("local".to_string()));

    let value = serde_json::to_value(&state)?;
    assert_eq!(value["mode"], "link");
    assert!(value.get("outputDir").is_some());
    assert!(value.get("startedAt").is_some());
    assert_eq!(value["projects"][0]["name"], "addon");
    assert!(value["projects"][0].get("configPath").is_some());
    assert_eq!(value["pid"], std::process::id());
    Ok(())
}

#[test]
fn no_record_means_nothing_to_recover() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let recovery = recover(&state_path(&fixture), &MockToolchain::new().toolchain());
    assert_eq!(recovery, Recovery::NoRecord);
    Ok(())
}

#[test]
fn unparsable_record_is_discarded() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let path = state_path(&fixture);
    std::fs::create_dir_all(path.parent().unwrap())?;
    std::fs::write(&path, "{ \"mode\": ")?;

    let recovery = recover(&path, &MockToolchain::new().toolchain());

    assert!(matches!(recovery, Recovery::Discarded { .. }));
    assert!(!path.exists());
    Ok(())
}

#[test]
fn foreign_mode_is_discarded() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let path = state_path(&fixture);
    let mut state = WatchState::new(&[watched(&fixture)?], None);
    state.mode = "copy".to_string();
    state.write(&path)?;

    let recovery = recover(&path, &MockToolchain::new().toolchain());
    assert_eq!(
        recovery,
        Recovery::Discarded {
            reason: "unsupported mode 'copy'".to_string()
        }
    );
    assert!(!path.exists());
    Ok(())
}

#[test]
fn failed_recovery_is_reported_and_record_deleted() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let path = state_path(&fixture);
    let state = WatchState::new(&[watched(&fixture)?], None);
    state.write(&path)?;
    std::fs::remove_file(fixture.config_path())?;

    let recovery = recover(&path, &MockToolchain::new().toolchain());

    match recovery {
        Recovery::Finalized {
            projects, failed, ..
        } => {
            assert!(projects.is_empty());
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].0, "addon");
        }
        other => panic!("unexpected recovery {other:?}"),
    }
    assert!(!path.exists());
    assert!(recover(&path, &MockToolchain::new().toolchain()) == Recovery::NoRecord);
    Ok(())
}

#[test]
fn changes_in_output_or_ignored_paths_are_not_relevant() {
    let root = Path::new("/work/addon");
    let output = root.join("dist");
    let ignore = IgnoreFilter::compile("*.log\n");

    let item = root.join("packs/behavior/items/a.json");
    let built = root.join("dist/behavior/manifest.json");
    let log = root.join("packs/behavior/debug.log");

    assert!(is_relevant_change(&item, root, &output, &ignore, false));
    assert!(!is_relevant_change(&built, root, &output, &ignore, false));
    assert!(!is_relevant_change(&built, root, &output, &ignore, true));
    assert!(!is_relevant_change(&log, root, &output, &ignore, false));
    assert!(is_relevant_change(&log, root, &output, &ignore, true));
}

#[cfg(unix)]
#[test]
fn interrupted_link_session_is_finalized() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let toolchain = MockToolchain::new().toolchain();
    let w = watched(&fixture)?;
    Materializer::new(&w.project, &toolchain)?.build(Strategy::Link)?;
    sync::sync(&w.project, &w.target, SyncMode::Link, false)?;
    let path = state_path(&fixture);
    WatchState::new(std::slice::from_ref(&w), None).write(&path)?;

    let recovery = recover(&path, &toolchain);

    assert_eq!(
        recovery,
        Recovery::Finalized {
            pid: std::process::id(),
            projects: vec!["addon".to_string()],
            failed: Vec::new(),
        }
    );
    let behavior = fixture.deploy_dir(PackKind::Behavior);
    assert!(!behavior.symlink_metadata()?.file_type().is_symlink());
    assert!(behavior.join("manifest.json").is_file());
    assert!(!path.exists());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn watch_links_then_finalizes_on_shutdown() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    let path = state_path(&fixture);

    let summary = run(
        vec![watched(&fixture)?],
        MockToolchain::new().toolchain(),
        path.clone(),
        None,
        async {},
    )
    .await?;

    assert_eq!(summary.finalized.len(), 2);
    assert!(summary.finalized.iter().all(|e| e.action == sync::SyncAction::Copy));
    for kind in PackKind::ALL {
        let dest = fixture.deploy_dir(kind);
        assert!(!dest.symlink_metadata()?.file_type().is_symlink());
        assert!(dest.join("manifest.json").is_file());
    }
    assert!(!path.exists());
    Ok(())
}

/// Records which thread each bundle ran on
#[derive(Default)]
struct ThreadRecordingBundler {
    calls: std::sync::Mutex<Vec<(bool, std::thread::ThreadId)>>,
}

impl Bundler for ThreadRecordingBundler {
    fn bundle(&self, request: &BundleRequest) -> Result<(), ExternalToolError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((request.sourcemap, std::thread::current().id()));
        }
        let write = || -> io::Result<()> {
            if let Some(parent) = request.out_file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&request.out_file, "// bundled\n")
        };
        write().map_err(|source| ExternalToolError::Io {
            tool: "esbuild".to_string(),
            source,
        })
    }
}

#[cfg(unix)]
#[tokio::test(flavor = "current_thread")]
async fn finalization_builds_off_the_async_thread() -> TestResult {
    let fixture = ProjectFixture::new("addon")?.with_script(ScriptLanguage::Typescript)?;
    let bundler = Arc::new(ThreadRecordingBundler::default());
    let tools = MockToolchain::new();
    let toolchain = Toolchain {
        bundler: bundler.clone(),
        archiver: tools.archiver.clone(),
        roots: tools.roots.clone(),
        installer: tools.installer.clone(),
    };

    run(vec![watched(&fixture)?], toolchain, state_path(&fixture), None, async {}).await?;

    let calls = bundler.calls.lock().map(|c| c.clone()).unwrap_or_default();
    let async_thread = std::thread::current().id();
    let (sourcemap, thread) = calls.last().copied().ok_or("no bundle during finalization")?;
    assert!(!sourcemap, "finalization uses the COPY build");
    assert_ne!(thread, async_thread);
    Ok(())
}

#[tokio::test]
async fn failed_start_still_finalizes_and_reports() -> TestResult {
    let fixture = ProjectFixture::new("addon")?;
    std::fs::remove_dir_all(fixture.pack_dir(PackKind::Resource))?;
    let path = state_path(&fixture);

    let err = run(
        vec![watched(&fixture)?],
        MockToolchain::new().toolchain(),
        path.clone(),
        None,
        std::future::pending::<()>(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        WatchError::Materialize(MaterializeError::SourceNotFound {
            kind: PackKind::Resource,
            ..
        })
    ));
    Ok(())
}
