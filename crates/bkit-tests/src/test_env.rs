//! Hermetic test environment for E2E testing
//!
//! A [`TestEnvironment`] is a temp directory with a `bin/` of mock executables
//! (`npx`, `npm`) and a `work/` directory for projects. Sessions built by
//! [`HermeticSessionBuilder`] resolve programs through that `bin/` first, so
//! the live toolchain runs end to end without node installed.

use anyhow::Result;
use bkit_lib::application::config::AppConfig;
use bkit_lib::application::session::{CommandSession, LiveConfigProvider, LiveProcessProvider};
use bkit_lib::application::session_mocks::MockInteractiveProvider;
use bkit_lib::application::settings::{Settings, SettingsContext};
use bkit_lib::bkit::config::{Project, SyncTargetConfig};
use bkit_lib::bkit::scaffold::{self, ScaffoldOptions};
use bkit_lib::primitives::ScriptLanguage;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Hermetic test environment with mock executables
pub struct TestEnvironment {
    /// Keeps the directory alive for the environment's lifetime
    pub temp_dir: TempDir,
    pub root_path: PathBuf,
    /// Mock executables, searched before the real PATH
    pub bin_path: PathBuf,
    /// Projects live here
    pub work_path: PathBuf,
    mock_executables: HashMap<String, MockExecutable>,
}

#[derive(Debug, Clone)]
pub struct MockExecutable {
    pub name: String,
    pub behavior: MockBehavior,
    /// One line per call: the arguments, space separated
    pub log_path: PathBuf,
}

/// What a mock executable does after logging its arguments
#[derive(Debug, Clone)]
pub enum MockBehavior {
    AlwaysSucceed,
    AlwaysFail { error: String },
    /// Write a placeholder to the `--outfile=` argument, like esbuild
    EmitOutfile,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root_path = temp_dir.path().to_path_buf();
        let bin_path = root_path.join("bin");
        let work_path = root_path.join("work");

        fs::create_dir_all(&bin_path)?;
        fs::create_dir_all(&work_path)?;

        Ok(Self {
            temp_dir,
            root_path,
            bin_path,
            work_path,
            mock_executables: HashMap::new(),
        })
    }

    /// Add a mock executable to `bin/`
    pub fn add_mock_executable(&mut self, name: &str, behavior: MockBehavior) -> Result<()> {
        let log_path = self.root_path.join(format!("{name}.log"));
        let executable_path = self.bin_path.join(name);

        let script = Self::generate_mock_script(name, &behavior, &log_path);
        fs::write(&executable_path, script)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&executable_path)?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&executable_path, perms)?;
        }

        self.mock_executables.insert(
            name.to_string(),
            MockExecutable {
                name: name.to_string(),
                behavior,
                log_path,
            },
        );
        Ok(())
    }

    fn generate_mock_script(name: &str, behavior: &MockBehavior, log_path: &Path) -> String {
        let behavior_code = match behavior {
            MockBehavior::AlwaysSucceed => "exit 0".to_string(),
            MockBehavior::AlwaysFail { error } => format!("echo '{error}' >&2\nexit 1"),
            MockBehavior::EmitOutfile => r#"for arg in "$@"; do
  case "$arg" in
    --outfile=*)
      out="${arg#--outfile=}"
      mkdir -p "$(dirname "$out")"
      echo '// bundled' > "$out"
      ;;
  esac
done
exit 0"#
                .to_string(),
        };

        format!(
            "#!/bin/sh\n# Mock executable: {name}\necho \"$*\" >> \"{}\"\n{behavior_code}\n",
            log_path.display()
        )
    }

    /// Argument lines of every call to `name`, oldest first
    pub fn get_mock_calls(&self, name: &str) -> Result<Vec<String>> {
        let Some(mock) = self.mock_executables.get(name) else {
            anyhow::bail!("No mock executable named {name}");
        };
        if !mock.log_path.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(&mock.log_path)?
            .lines()
            .map(str::to_string)
            .collect())
    }

    pub fn verify_mock_call(&self, name: &str, args: &[&str]) -> Result<bool> {
        let expected = args.join(" ");
        Ok(self.get_mock_calls(name)?.iter().any(|call| *call == expected))
    }

    /// Scaffold a project under `work/<name>`
    pub fn init_project(&self, name: &str, language: Option<ScriptLanguage>) -> Result<PathBuf> {
        let dir = self.work_path.join(name);
        scaffold::scaffold(
            &dir,
            &ScaffoldOptions {
                name: name.to_string(),
                description: format!("{name} test add-on"),
                language,
                force: false,
            },
        )?;
        Ok(dir)
    }

    /// Deploy directory of the `local` target added by [`add_local_target`](Self::add_local_target)
    pub fn deploy_path(&self, project: &str) -> PathBuf {
        self.root_path.join("deploy").join(project)
    }

    /// Give the project a path target named `local` and make it the default
    ///
    /// Scaffolded projects only carry product targets, which need a Windows
    /// installation of the game to resolve.
    pub fn add_local_target(&self, project_dir: &Path) -> Result<()> {
        let mut project = Project::load(project_dir)?;
        let deploy = self.deploy_path(&project.name());
        project.config.sync.targets.insert(
            "local".to_string(),
            SyncTargetConfig {
                behavior: Some(deploy.join("behavior").display().to_string()),
                resource: Some(deploy.join("resource").display().to_string()),
                ..SyncTargetConfig::default()
            },
        );
        project.config.sync.default_target = Some("local".to_string());
        project.save()?;
        Ok(())
    }
}

/// Live session over a [`TestEnvironment`]
pub type HermeticSession =
    CommandSession<LiveProcessProvider, LiveConfigProvider, MockInteractiveProvider>;

/// Builder for hermetic sessions: live toolchain, mock executables, no prompts
pub struct HermeticSessionBuilder {
    test_env: TestEnvironment,
    app_config: AppConfig,
    interactive: MockInteractiveProvider,
}

impl HermeticSessionBuilder {
    pub fn new() -> Result<Self> {
        let test_env = TestEnvironment::new()?;
        let app_config = AppConfig {
            workdir: Some(test_env.work_path.clone()),
            yes: true,
            ..AppConfig::default()
        };

        Ok(Self {
            test_env,
            app_config,
            interactive: MockInteractiveProvider::new().with_yes_mode(true),
        })
    }

    pub fn with_mock_executable(mut self, name: &str, behavior: MockBehavior) -> Result<Self> {
        self.test_env.add_mock_executable(name, behavior)?;
        Ok(self)
    }

    /// Mock `npx` (esbuild) and `npm` that both succeed
    pub fn with_node_tools(self) -> Result<Self> {
        self.with_mock_executable("npx", MockBehavior::EmitOutfile)?
            .with_mock_executable("npm", MockBehavior::AlwaysSucceed)
    }

    /// Scaffold `work/<name>` with a local path target and run commands from it
    pub fn with_project(mut self, name: &str, language: Option<ScriptLanguage>) -> Result<Self> {
        let dir = self.test_env.init_project(name, language)?;
        self.test_env.add_local_target(&dir)?;
        self.app_config.workdir = Some(dir);
        Ok(self)
    }

    pub fn with_workdir(mut self, workdir: PathBuf) -> Self {
        self.app_config.workdir = Some(workdir);
        self
    }

    pub fn with_interactive(mut self, interactive: MockInteractiveProvider) -> Self {
        self.interactive = interactive;
        self
    }

    /// Settings (and watch state) live in the environment root
    pub fn build(self) -> Result<(HermeticSession, TestEnvironment)> {
        let settings = SettingsContext::new(self.test_env.root_path.clone(), Settings::default());
        let session = CommandSession::new_with_providers(
            LiveProcessProvider::with_bin_dir(&self.test_env.bin_path),
            LiveConfigProvider::new(self.app_config),
            self.interactive,
            settings,
        );
        Ok((session, self.test_env))
    }

    pub fn test_env(&self) -> &TestEnvironment {
        &self.test_env
    }

    pub fn test_env_mut(&mut self) -> &mut TestEnvironment {
        &mut self.test_env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_has_bin_and_work_dirs() -> Result<()> {
        let env = TestEnvironment::new()?;
        assert!(env.bin_path.is_dir());
        assert!(env.work_path.is_dir());
        Ok(())
    }

    #[test]
    fn unknown_mock_has_no_calls() -> Result<()> {
        let env = TestEnvironment::new()?;
        assert!(env.get_mock_calls("npm").is_err());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn mock_executable_logs_its_arguments() -> Result<()> {
        let mut env = TestEnvironment::new()?;
        env.add_mock_executable("npm", MockBehavior::AlwaysSucceed)?;

        let status = std::process::Command::new(env.bin_path.join("npm"))
            .args(["install", "--save-dev", "x@1"])
            .status()?;

        assert!(status.success());
        assert!(env.verify_mock_call("npm", &["install", "--save-dev", "x@1"])?);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn emit_outfile_writes_the_bundle() -> Result<()> {
        let mut env = TestEnvironment::new()?;
        env.add_mock_executable("npx", MockBehavior::EmitOutfile)?;
        let out = env.root_path.join("out/main.js");

        let status = std::process::Command::new(env.bin_path.join("npx"))
            .args(["esbuild", "main.ts", &format!("--outfile={}", out.display())])
            .status()?;

        assert!(status.success());
        assert!(out.is_file());
        Ok(())
    }

    #[test]
    fn local_target_becomes_the_default() -> Result<()> {
        let env = TestEnvironment::new()?;
        let dir = env.init_project("demo", None)?;

        env.add_local_target(&dir)?;

        let project = Project::load(&dir)?;
        assert_eq!(project.config.sync.default_target.as_deref(), Some("local"));
        assert!(project.config.sync.targets.contains_key("stable"));
        Ok(())
    }
}
