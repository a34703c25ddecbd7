use super::*;
use crate::application::session::ProcessOutput;
use crate::application::session_mocks::MockProcessProvider;
use std::io::Read;
use tempfile::TempDir;

fn request(root: &Path) -> BundleRequest {
    BundleRequest {
        working_dir: root.to_path_buf(),
        entry: root.join("packs/behavior/scripts/main.ts"),
        out_file: root.join("dist/packs/behavior/scripts/main.js"),
        sourcemap: false,
        externals: vec!["@minecraft/server".to_string(), "@minecraft/math".to_string()],
    }
}

#[test]
fn esbuild_arguments_mark_externals() {
    let args = EsbuildBundler::arguments(&request(Path::new("/p")));

    assert_eq!(args[0], "esbuild");
    assert!(args.contains(&"--bundle".to_string()));
    assert!(args.contains(&"--external:@minecraft/server".to_string()));
    assert!(args.contains(&"--external:@minecraft/math".to_string()));
    assert!(!args.contains(&"--sourcemap".to_string()));
}

#[test]
fn bundler_runs_npx_in_the_project() {
    let temp = TempDir::new().unwrap();
    let process = Arc::new(MockProcessProvider::new());
    let bundler = EsbuildBundler::new(process.clone());

    bundler.bundle(&request(temp.path())).unwrap();

    let calls = process.get_calls_for_command("npx");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].working_dir, temp.path());
    assert!(temp.path().join("dist/packs/behavior/scripts").is_dir());
}

#[test]
fn bundler_failure_carries_exit_code_and_stderr() {
    let temp = TempDir::new().unwrap();
    let req = request(temp.path());
    let process = Arc::new(MockProcessProvider::new().with_result(
        "npx".to_string(),
        EsbuildBundler::arguments(&req),
        Ok(ProcessOutput {
            stdout: String::new(),
            stderr: "syntax error\n".to_string(),
            success: false,
            code: Some(1),
        }),
    ));

    let err = EsbuildBundler::new(process).bundle(&req).unwrap_err();
    match err {
        ExternalToolError::Failed { tool, code, stderr } => {
            assert_eq!(tool, "esbuild");
            assert_eq!(code, Some(1));
            assert_eq!(stderr, "syntax error");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_program_is_not_found() {
    let temp = TempDir::new().unwrap();
    let process = Arc::new(MockProcessProvider::new().with_missing_program("npm"));
    let installer = NpmInstaller::new(process.clone());

    let err = installer
        .install(temp.path(), &["@minecraft/server@1.16.0".to_string()])
        .unwrap_err();
    assert!(matches!(err, ExternalToolError::NotFound { .. }));
    assert!(process.get_calls().is_empty());
}

#[test]
fn installer_passes_specs_through() {
    let temp = TempDir::new().unwrap();
    let process = Arc::new(MockProcessProvider::new());
    let installer = NpmInstaller::new(process.clone());

    installer
        .install(temp.path(), &["@minecraft/server@1.16.0".to_string()])
        .unwrap();
    installer.uninstall(temp.path(), &[]).unwrap();
    installer
        .uninstall(temp.path(), &["@minecraft/server-ui".to_string()])
        .unwrap();

    let calls = process.get_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].args, vec!["install", "--save-dev", "@minecraft/server@1.16.0"]);
    assert_eq!(calls[1].args, vec!["uninstall", "@minecraft/server-ui"]);
}

#[test]
fn zip_archiver_remaps_groups_and_sorts_entries() {
    let temp = TempDir::new().unwrap();
    let bp = temp.path().join("bp");
    fs::create_dir_all(bp.join("scripts")).unwrap();
    fs::write(bp.join("manifest.json"), "{}").unwrap();
    fs::write(bp.join("scripts/main.js"), "export {};").unwrap();
    let rp = temp.path().join("rp");
    fs::create_dir_all(&rp).unwrap();
    fs::write(rp.join("manifest.json"), "{}").unwrap();

    let out = temp.path().join("out/addon.mcaddon");
    ZipArchiver
        .zip(
            &out,
            &[
                ArchiveGroup {
                    contents: vec![rp.clone()],
                    target: "resource_pack".to_string(),
                },
                ArchiveGroup {
                    contents: vec![bp.clone()],
                    target: "behavior_pack".to_string(),
                },
            ],
        )
        .unwrap();

    let mut archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(sorted.len(), 3);
    assert!(sorted.contains(&"behavior_pack/scripts/main.js".to_string()));
    assert!(sorted.contains(&"resource_pack/manifest.json".to_string()));

    let mut text = String::new();
    archive
        .by_name("behavior_pack/scripts/main.js")
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(text, "export {};");
}

#[test]
fn zip_archives_are_reproducible() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("pack");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.json"), "{\"a\":1}").unwrap();
    fs::write(src.join("b.json"), "{\"b\":2}").unwrap();
    let groups = [ArchiveGroup {
        contents: vec![src],
        target: String::new(),
    }];

    let first = temp.path().join("first.mcpack");
    let second = temp.path().join("second.mcpack");
    ZipArchiver.zip(&first, &groups).unwrap();
    ZipArchiver.zip(&second, &groups).unwrap();

    assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
}

#[test]
fn deployment_roots_exist_only_when_installed() {
    let temp = TempDir::new().unwrap();
    let local = temp.path().join("Local");
    let roaming = temp.path().join("Roaming");
    let roots = WindowsDeploymentRoots::with_dirs(Some(local.clone()), Some(roaming.clone()));

    let uwp = roots.candidate(Product::BedrockUWP).unwrap();
    assert!(uwp.starts_with(local.join("Packages").join(UWP_PACKAGE)));
    assert!(uwp.ends_with("games/com.mojang"));
    assert_eq!(roots.lookup(Product::BedrockUWP), None);

    fs::create_dir_all(&uwp).unwrap();
    assert_eq!(roots.lookup(Product::BedrockUWP), Some(uwp));

    let gdk = roots.candidate(Product::PreviewGDK).unwrap();
    assert!(gdk.starts_with(roaming.join("Minecraft Bedrock Preview")));
    assert_eq!(
        WindowsDeploymentRoots::with_dirs(None, None).lookup(Product::BedrockGDK),
        None
    );
}
