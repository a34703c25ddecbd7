//! Mock implementations of session providers for testing
//!
//! These mocks let command handlers run against real project directories
//! while every external tool (esbuild, npm, game installs) is simulated and
//! recorded.

use crate::application::config::AppConfig;
use crate::application::session::*;
use crate::application::settings::{Settings, SettingsContext};
use crate::bkit::externals::{
    ArchiveGroup, Archiver, BundleRequest, Bundler, DependencyInstaller, DeploymentRootLookup,
    ExternalToolError, Toolchain, ZipArchiver,
};
use crate::display::{DisplayProvider, MockDisplayProvider};
use crate::primitives::Product;
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Process call record for spy pattern
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCall {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

/// Mock process provider for testing with spy pattern
#[derive(Default)]
pub struct MockProcessProvider {
    pub calls: Mutex<Vec<ProcessCall>>,
    pub results: HashMap<(String, Vec<String>), std::result::Result<ProcessOutput, String>>,
    pub missing_programs: HashSet<String>,
}

impl MockProcessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(
        mut self,
        command: String,
        args: Vec<String>,
        result: std::result::Result<ProcessOutput, String>,
    ) -> Self {
        self.results.insert((command, args), result);
        self
    }

    /// Make `find_program` report `program` as absent
    pub fn with_missing_program(mut self, program: &str) -> Self {
        self.missing_programs.insert(program.to_string());
        self
    }

    /// Get all recorded process calls for verification
    pub fn get_calls(&self) -> Vec<ProcessCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Get calls for a specific command
    pub fn get_calls_for_command(&self, command: &str) -> Vec<ProcessCall> {
        self.get_calls()
            .into_iter()
            .filter(|call| call.command == command)
            .collect()
    }

    /// Verify that a specific command was called with expected arguments
    pub fn verify_call(&self, command: &str, args: &[&str], working_dir: &Path) -> bool {
        let expected_call = ProcessCall {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            working_dir: working_dir.to_path_buf(),
        };

        self.get_calls().contains(&expected_call)
    }
}

impl ProcessProvider for MockProcessProvider {
    fn execute(&self, command: &str, args: &[&str], working_dir: &Path) -> Result<ProcessOutput> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ProcessCall {
                command: command.to_string(),
                args: args.clone(),
                working_dir: working_dir.to_path_buf(),
            });
        }

        match self.results.get(&(command.to_string(), args)) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(e)) => Err(anyhow::anyhow!("{}", e)),
            // Default behavior: succeed with empty output
            None => Ok(ProcessOutput {
                success: true,
                code: Some(0),
                ..ProcessOutput::default()
            }),
        }
    }

    fn find_program(&self, program: &str) -> Option<PathBuf> {
        if self.missing_programs.contains(program) {
            None
        } else {
            Some(PathBuf::from("/mock/bin").join(program))
        }
    }
}

/// Mock config provider for testing
pub struct MockConfigProvider {
    pub app_config: AppConfig,
}

impl MockConfigProvider {
    pub fn new(app_config: AppConfig) -> Self {
        Self { app_config }
    }

    /// Config pointing at `workdir` with prompts answered by defaults
    pub fn for_workdir(workdir: &Path) -> Self {
        Self::new(AppConfig {
            workdir: Some(workdir.to_path_buf()),
            yes: true,
            ..AppConfig::default()
        })
    }
}

impl ConfigProvider for MockConfigProvider {
    fn app_config(&self) -> &AppConfig {
        &self.app_config
    }
}

/// Mock interactive provider for testing
#[derive(Default)]
pub struct MockInteractiveProvider {
    yes_mode: bool,
    cancel: bool,
    pub text_input_calls: Arc<Mutex<Vec<(String, String)>>>, // (prompt, default)
    pub confirm_calls: Arc<Mutex<Vec<(String, bool)>>>,      // (prompt, default)
    pub select_calls: Arc<Mutex<Vec<String>>>,               // prompt
    pub fuzzy_select_calls: Arc<Mutex<Vec<(String, Vec<String>)>>>, // (prompt, options)
    pub text_input_response: Arc<Mutex<Option<String>>>,
    pub confirm_response: Arc<Mutex<Option<bool>>>,
    pub select_response: Arc<Mutex<Option<usize>>>,
    pub fuzzy_select_response: Arc<Mutex<Option<usize>>>,
}

impl MockInteractiveProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_yes_mode(mut self, yes_mode: bool) -> Self {
        self.yes_mode = yes_mode;
        self
    }

    /// Every prompt behaves as if the user pressed ESC
    pub fn with_cancel(mut self) -> Self {
        self.cancel = true;
        self
    }

    pub fn with_text_input(self, response: String) -> Self {
        *self.text_input_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_confirm(self, response: bool) -> Self {
        *self.confirm_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_select(self, response: usize) -> Self {
        *self.select_response.lock().unwrap() = Some(response);
        self
    }

    pub fn with_fuzzy_select(self, response: usize) -> Self {
        *self.fuzzy_select_response.lock().unwrap() = Some(response);
        self
    }

    pub fn get_text_input_calls(&self) -> Vec<(String, String)> {
        self.text_input_calls.lock().unwrap().clone()
    }

    pub fn get_confirm_calls(&self) -> Vec<(String, bool)> {
        self.confirm_calls.lock().unwrap().clone()
    }

    pub fn get_select_calls(&self) -> Vec<String> {
        self.select_calls.lock().unwrap().clone()
    }

    pub fn get_fuzzy_select_calls(&self) -> Vec<(String, Vec<String>)> {
        self.fuzzy_select_calls.lock().unwrap().clone()
    }
}

impl InteractiveProvider for MockInteractiveProvider {
    fn text_input(&self, prompt: &str, default: String) -> Result<String> {
        self.text_input_calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), default.clone()));

        if self.yes_mode {
            return Ok(default);
        }
        if self.cancel {
            return Err(PromptCancelled.into());
        }

        Ok(self
            .text_input_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(default))
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        self.confirm_calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), default));

        if self.yes_mode {
            return Ok(default);
        }
        if self.cancel {
            return Err(PromptCancelled.into());
        }

        Ok(self.confirm_response.lock().unwrap().unwrap_or(default))
    }

    fn select(&self, prompt: &str, _options: &[&str]) -> Result<usize> {
        self.select_calls.lock().unwrap().push(prompt.to_string());

        if self.yes_mode {
            return Ok(0);
        }
        if self.cancel {
            return Err(PromptCancelled.into());
        }

        Ok(self.select_response.lock().unwrap().unwrap_or(0))
    }

    fn fuzzy_select(&self, prompt: &str, options: &[String]) -> Result<Option<usize>> {
        self.fuzzy_select_calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), options.to_vec()));

        if self.yes_mode {
            return Ok(Some(0));
        }
        if self.cancel {
            return Ok(None);
        }

        Ok(Some(self.fuzzy_select_response.lock().unwrap().unwrap_or(0)))
    }
}

/// Bundler that writes a placeholder instead of running esbuild
#[derive(Default)]
pub struct MockBundler {
    pub requests: Mutex<Vec<BundleRequest>>,
    fail: bool,
}

impl MockBundler {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get_requests(&self) -> Vec<BundleRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Bundler for MockBundler {
    fn bundle(&self, request: &BundleRequest) -> std::result::Result<(), ExternalToolError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.fail {
            return Err(ExternalToolError::Failed {
                tool: "esbuild".to_string(),
                code: Some(1),
                stderr: "mock bundle failure".to_string(),
            });
        }

        let io_err = |source| ExternalToolError::Io {
            tool: "esbuild".to_string(),
            source,
        };
        if let Some(parent) = request.out_file.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&request.out_file, "// bundled\n").map_err(io_err)
    }
}

/// Archiver that records calls and writes real zips
#[derive(Default)]
pub struct MockArchiver {
    pub calls: Mutex<Vec<(PathBuf, Vec<ArchiveGroup>)>>,
}

impl MockArchiver {
    pub fn get_calls(&self) -> Vec<(PathBuf, Vec<ArchiveGroup>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Archiver for MockArchiver {
    fn zip(&self, out_file: &Path, groups: &[ArchiveGroup]) -> std::result::Result<(), ExternalToolError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((out_file.to_path_buf(), groups.to_vec()));
        }
        ZipArchiver.zip(out_file, groups)
    }
}

/// Deployment roots served from a fixed table
#[derive(Default)]
pub struct MockDeploymentRoots {
    roots: HashMap<Product, PathBuf>,
}

impl MockDeploymentRoots {
    pub fn with_root(mut self, product: Product, root: PathBuf) -> Self {
        self.roots.insert(product, root);
        self
    }
}

impl DeploymentRootLookup for MockDeploymentRoots {
    fn lookup(&self, product: Product) -> Option<PathBuf> {
        self.roots.get(&product).cloned()
    }
}

/// Installer that records package operations without touching npm
#[derive(Default)]
pub struct MockInstaller {
    pub installs: Mutex<Vec<(PathBuf, Vec<String>)>>,
    pub uninstalls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    fail: bool,
}

impl MockInstaller {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get_installs(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.installs.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn get_uninstalls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.uninstalls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn outcome(&self) -> std::result::Result<(), ExternalToolError> {
        if self.fail {
            Err(ExternalToolError::Failed {
                tool: "npm".to_string(),
                code: Some(1),
                stderr: "mock install failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl DependencyInstaller for MockInstaller {
    fn install(&self, project_dir: &Path, specs: &[String]) -> std::result::Result<(), ExternalToolError> {
        if let Ok(mut installs) = self.installs.lock() {
            installs.push((project_dir.to_path_buf(), specs.to_vec()));
        }
        self.outcome()
    }

    fn uninstall(&self, project_dir: &Path, names: &[String]) -> std::result::Result<(), ExternalToolError> {
        if let Ok(mut uninstalls) = self.uninstalls.lock() {
            uninstalls.push((project_dir.to_path_buf(), names.to_vec()));
        }
        self.outcome()
    }
}

/// Typed handles to the mock tools behind a [`Toolchain`]
#[derive(Clone, Default)]
pub struct MockToolchain {
    pub bundler: Arc<MockBundler>,
    pub archiver: Arc<MockArchiver>,
    pub roots: Arc<MockDeploymentRoots>,
    pub installer: Arc<MockInstaller>,
}

impl MockToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundler(mut self, bundler: MockBundler) -> Self {
        self.bundler = Arc::new(bundler);
        self
    }

    pub fn with_roots(mut self, roots: MockDeploymentRoots) -> Self {
        self.roots = Arc::new(roots);
        self
    }

    pub fn with_installer(mut self, installer: MockInstaller) -> Self {
        self.installer = Arc::new(installer);
        self
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            bundler: self.bundler.clone(),
            archiver: self.archiver.clone(),
            roots: self.roots.clone(),
            installer: self.installer.clone(),
        }
    }
}

/// Mock command session for testing
///
/// Settings live in a private temp directory unless
/// [`with_settings_root`](Self::with_settings_root) points elsewhere.
pub struct MockCommandSession {
    pub display_provider: MockDisplayProvider,
    pub process_provider: Arc<MockProcessProvider>,
    pub config_provider: MockConfigProvider,
    pub interactive_provider: MockInteractiveProvider,
    pub mock_toolchain: MockToolchain,
    toolchain: Toolchain,
    settings: SettingsContext,
    _settings_dir: Option<tempfile::TempDir>,
}

impl MockCommandSession {
    pub fn new() -> Self {
        let settings_dir = tempfile::tempdir().ok();
        let root = settings_dir
            .as_ref()
            .map(|dir| dir.path().to_path_buf())
            .unwrap_or_else(std::env::temp_dir);
        let mock_toolchain = MockToolchain::new();

        Self {
            display_provider: MockDisplayProvider::new(),
            process_provider: Arc::new(MockProcessProvider::new()),
            config_provider: MockConfigProvider::new(AppConfig {
                yes: true,
                ..AppConfig::default()
            }),
            interactive_provider: MockInteractiveProvider::new(),
            toolchain: mock_toolchain.toolchain(),
            mock_toolchain,
            settings: SettingsContext::new(root, Settings::default()),
            _settings_dir: settings_dir,
        }
    }

    pub fn with_process(mut self, process: MockProcessProvider) -> Self {
        self.process_provider = Arc::new(process);
        self
    }

    pub fn with_config(mut self, config: MockConfigProvider) -> Self {
        self.config_provider = config;
        self
    }

    pub fn with_interactive(mut self, interactive: MockInteractiveProvider) -> Self {
        self.interactive_provider = interactive;
        self
    }

    pub fn with_toolchain(mut self, toolchain: MockToolchain) -> Self {
        self.toolchain = toolchain.toolchain();
        self.mock_toolchain = toolchain;
        self
    }

    /// Load settings (and watch state) from `root` instead of the private temp dir
    pub fn with_settings_root(mut self, root: &Path) -> Self {
        self.settings = SettingsContext::load(root)
            .unwrap_or_else(|_| SettingsContext::new(root.to_path_buf(), Settings::default()));
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings.settings = settings;
        self
    }

    pub fn mock_display(&self) -> &MockDisplayProvider {
        &self.display_provider
    }
}

impl Default for MockCommandSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MockCommandSession {
    fn display(&self) -> &dyn DisplayProvider {
        &self.display_provider
    }

    fn process(&self) -> &dyn ProcessProvider {
        self.process_provider.as_ref()
    }

    fn config(&self) -> &dyn ConfigProvider {
        &self.config_provider
    }

    fn interactive(&self) -> &dyn InteractiveProvider {
        &self.interactive_provider
    }

    fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    fn settings(&self) -> &SettingsContext {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_process_provider() {
        let working_dir = PathBuf::from("/test/workdir");
        let provider = MockProcessProvider::new().with_result(
            "npm".to_string(),
            vec!["install".to_string()],
            Err("Mock error".to_string()),
        );

        let result = provider.execute("npx", &["esbuild"], &working_dir);
        assert!(result.unwrap().success);

        let result = provider.execute("npm", &["install"], &working_dir);
        assert!(result.is_err());

        let calls = provider.get_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].command, "npx");
        assert_eq!(calls[1].args, vec!["install"]);

        assert!(provider.verify_call("npx", &["esbuild"], &working_dir));
        assert!(!provider.verify_call("npx", &["tsc"], &working_dir));
    }

    #[test]
    fn test_missing_program() {
        let provider = MockProcessProvider::new().with_missing_program("npm");
        assert!(provider.find_program("npm").is_none());
        assert!(provider.find_program("npx").is_some());
    }

    #[test]
    fn test_mock_bundler_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let out_file = dir.path().join("nested/main.js");
        let bundler = MockBundler::default();

        bundler
            .bundle(&BundleRequest {
                working_dir: dir.path().to_path_buf(),
                entry: dir.path().join("main.ts"),
                out_file: out_file.clone(),
                sourcemap: false,
                externals: vec![],
            })
            .unwrap();

        assert!(out_file.is_file());
        assert_eq!(bundler.get_requests().len(), 1);
    }

    #[test]
    fn test_mock_interactive_cancel() {
        let interactive = MockInteractiveProvider::new().with_cancel();
        assert_eq!(
            interactive
                .fuzzy_select("Pick", &["a".to_string()])
                .unwrap(),
            None
        );
        let err = interactive.confirm("Sure?", true).unwrap_err();
        assert!(err.downcast_ref::<PromptCancelled>().is_some());
    }

    #[test]
    fn test_mock_command_session() {
        let session = MockCommandSession::new().with_toolchain(
            MockToolchain::new()
                .with_roots(MockDeploymentRoots::default().with_root(Product::PreviewUWP, "/games".into())),
        );

        assert_eq!(
            session.toolchain().roots.lookup(Product::PreviewUWP),
            Some(PathBuf::from("/games"))
        );
        assert!(session.toolchain().roots.lookup(Product::BedrockUWP).is_none());
        assert!(session.settings().root().is_dir());
    }
}
