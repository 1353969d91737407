//! Provisioning orchestrator
//!
//! Runs the steps in order and decides every failure by its `ErrorKind`:
//! fatal kinds (binding, download, missing artifact, install) abort the run,
//! the rest only produce warnings because the engine is already usable.

use std::sync::Arc;

use crate::config::ProvisionConfig;
use crate::error::{ProvisionError, ProvisionResult};
use crate::setup::binding::{BindingInstaller, PipBinding};
use crate::setup::downloader::{Downloader, HttpDownloader};
use crate::setup::environment::{ConfigStore, EnvironmentConfigurer};
use crate::setup::installer::{EngineInstaller, SilentInstaller};
use crate::setup::language_data::LanguageDataProvisioner;
use crate::setup::paths::{data_dir_entry, install_dir_entry, InstallStatus};
use crate::setup::registry::RegistryStore;

/// How a run ended
#[derive(Debug)]
pub enum Outcome {
    Completed,
    /// Engine installed, but later steps reported problems
    CompletedWithWarnings(Vec<ProvisionError>),
    Aborted(ProvisionError),
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Completed | Outcome::CompletedWithWarnings(_) => 0,
            Outcome::Aborted(e) => e.kind.exit_code(),
        }
    }
}

/// Services the provisioner drives
pub struct Components {
    pub binding: Box<dyn BindingInstaller>,
    pub downloader: Arc<dyn Downloader>,
    pub installer: Box<dyn EngineInstaller>,
    pub store: Arc<dyn ConfigStore>,
}

impl Components {
    /// pip, reqwest, the real installer and the machine registry
    pub fn system(config: &ProvisionConfig) -> ProvisionResult<Self> {
        Ok(Self {
            binding: Box::new(PipBinding::new(&config.python, &config.binding_package)),
            downloader: Arc::new(HttpDownloader::new(config.http_timeout)?),
            installer: Box::new(SilentInstaller::new(&config.silent_flag)),
            store: Arc::new(RegistryStore::machine()),
        })
    }
}

pub struct Provisioner {
    config: ProvisionConfig,
    binding: Box<dyn BindingInstaller>,
    downloader: Arc<dyn Downloader>,
    installer: Box<dyn EngineInstaller>,
    environment: EnvironmentConfigurer,
    language_data: LanguageDataProvisioner,
}

impl Provisioner {
    pub fn new(config: ProvisionConfig, components: Components) -> Self {
        let environment = EnvironmentConfigurer::new(
            components.store,
            install_dir_entry(&config),
            data_dir_entry(&config),
        );
        let language_data = LanguageDataProvisioner::new(
            components.downloader.clone(),
            config.data_dir(),
            config.language_data_url.clone(),
        );

        Self {
            binding: components.binding,
            downloader: components.downloader,
            installer: components.installer,
            environment,
            language_data,
            config,
        }
    }

    pub async fn run(&self) -> Outcome {
        let status = InstallStatus::check(&self.config);
        tracing::info!(
            engine = status.engine_ok,
            language_data = status.language_data_ok,
            complete = status.is_complete(),
            "Existing installation"
        );

        match self.run_steps().await {
            Ok(warnings) if warnings.is_empty() => Outcome::Completed,
            Ok(warnings) => Outcome::CompletedWithWarnings(warnings),
            Err(e) => Outcome::Aborted(e),
        }
    }

    /// Runs every step; fatal errors end the run, the rest are collected
    async fn run_steps(&self) -> Result<Vec<ProvisionError>, ProvisionError> {
        let mut warnings = Vec::new();

        // Install failures are logged by the installer itself
        settle(self.ensure_binding().await, &mut warnings)?;

        if let Err(e) = settle(self.install_engine().await, &mut warnings) {
            tracing::error!("Could not complete the engine installation");
            return Err(e);
        }

        tracing::info!("Configuring environment variables...");
        let environment_ok = settle(self.environment.configure(), &mut warnings)?;
        if !environment_ok {
            tracing::warn!("Engine installed, but environment variables could not be configured");
        }

        let language_result = self
            .language_data
            .ensure(&self.config.language_code)
            .await
            .map(|_| ());
        if !settle(language_result, &mut warnings)? {
            tracing::warn!(
                language = %self.config.language_code,
                "Engine installed, but language data could not be provisioned"
            );
        }

        if warnings.is_empty() {
            tracing::info!("Installation and configuration complete. Restart your computer to apply the changes.");
        } else {
            if environment_ok {
                tracing::info!("Restart your computer to apply the environment changes.");
            }
            tracing::warn!(warnings = warnings.len(), "Installation completed with warnings");
        }
        Ok(warnings)
    }

    async fn ensure_binding(&self) -> ProvisionResult<()> {
        if self.binding.is_installed().await {
            tracing::info!(binding = self.binding.name(), "Binding already installed");
            return Ok(());
        }

        tracing::info!(binding = self.binding.name(), "Installing binding...");
        self.binding.install().await
    }

    async fn install_engine(&self) -> ProvisionResult<()> {
        let artifact = &self.config.working_artifact_path;

        tracing::info!("Downloading engine...");
        self.downloader
            .download(&self.config.engine_install_url, artifact)
            .await?;

        self.installer.install(artifact).await
    }
}

/// Decide a step result by its error kind.
///
/// Returns `Ok(true)` on success, `Ok(false)` after recording a non-fatal
/// error in `warnings`, and the error itself when it is fatal.
fn settle(
    result: ProvisionResult<()>,
    warnings: &mut Vec<ProvisionError>,
) -> Result<bool, ProvisionError> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warnings.push(e);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::setup::environment::{ConfigStore, MemoryStore, DATA_PREFIX_KEY, PATH_KEY};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};

    type Events = Arc<Mutex<Vec<String>>>;

    struct FakeBinding {
        events: Events,
        installed: bool,
        install_ok: bool,
    }

    #[async_trait]
    impl BindingInstaller for FakeBinding {
        async fn is_installed(&self) -> bool {
            self.installed
        }

        async fn install(&self) -> ProvisionResult<()> {
            self.events.lock().push("binding".into());
            if self.install_ok {
                Ok(())
            } else {
                Err(ProvisionError::binding_install("pip exited with 1"))
            }
        }

        fn name(&self) -> &str {
            "pytesseract"
        }
    }

    struct FakeDownloader {
        events: Events,
        fail_engine: bool,
        fail_language: bool,
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        async fn download(&self, url: &str, dest: &Path) -> ProvisionResult<()> {
            self.events.lock().push(format!("download {}", url));
            let is_language = url.ends_with(".traineddata");
            if (is_language && self.fail_language) || (!is_language && self.fail_engine) {
                return Err(ProvisionError::download("connection refused"));
            }
            std::fs::write(dest, b"payload").map_err(|e| ProvisionError::download(e.to_string()))
        }
    }

    struct FakeInstaller {
        events: Events,
        ok: bool,
    }

    #[async_trait]
    impl EngineInstaller for FakeInstaller {
        async fn install(&self, artifact: &Path) -> ProvisionResult<()> {
            self.events.lock().push("install".into());
            if !self.ok {
                return Err(ProvisionError::install("installer exited with 2"));
            }
            std::fs::remove_file(artifact).map_err(|e| ProvisionError::install(e.to_string()))
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        config: ProvisionConfig,
        events: Events,
        store: Arc<MemoryStore>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = ProvisionConfig {
                engine_install_url: "https://engine.test/setup.exe".into(),
                language_data_url: "https://data.test/{lang}.traineddata".into(),
                install_root_path: dir.path().join("Tesseract-OCR"),
                working_artifact_path: dir.path().join("tesseract-setup.exe"),
                ..ProvisionConfig::default()
            };
            Self {
                _dir: dir,
                config,
                events: Arc::new(Mutex::new(Vec::new())),
                store: Arc::new(MemoryStore::with_values([(PATH_KEY, "C:\\Windows")])),
            }
        }

        fn provisioner(&self, binding_installed: bool, tweak: impl FnOnce(&mut Components)) -> Provisioner {
            let mut components = Components {
                binding: Box::new(FakeBinding {
                    events: self.events.clone(),
                    installed: binding_installed,
                    install_ok: true,
                }),
                downloader: Arc::new(FakeDownloader {
                    events: self.events.clone(),
                    fail_engine: false,
                    fail_language: false,
                }),
                installer: Box::new(FakeInstaller {
                    events: self.events.clone(),
                    ok: true,
                }),
                store: self.store.clone(),
            };
            tweak(&mut components);
            Provisioner::new(self.config.clone(), components)
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }

        fn language_file(&self) -> PathBuf {
            self.config.language_data_path("spa")
        }
    }

    #[tokio::test]
    async fn test_full_run_completes() {
        let h = Harness::new();
        let outcome = h.provisioner(false, |_| {}).run().await;

        assert!(matches!(outcome, Outcome::Completed));
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            h.events(),
            vec![
                "binding".to_string(),
                "download https://engine.test/setup.exe".to_string(),
                "install".to_string(),
                "download https://data.test/spa.traineddata".to_string(),
            ]
        );
        assert!(!h.config.working_artifact_path.exists());
        assert!(h.language_file().exists());
        assert_eq!(
            h.store.value(PATH_KEY),
            Some(format!("C:\\Windows;{}", install_dir_entry(&h.config)))
        );
        assert_eq!(h.store.value(DATA_PREFIX_KEY), Some(data_dir_entry(&h.config)));
    }

    #[tokio::test]
    async fn test_installed_binding_is_not_reinstalled() {
        let h = Harness::new();
        h.provisioner(true, |_| {}).run().await;
        assert!(!h.events().contains(&"binding".to_string()));
    }

    #[tokio::test]
    async fn test_binding_failure_aborts_before_download() {
        let h = Harness::new();
        let events = h.events.clone();
        let outcome = h
            .provisioner(false, |c| {
                c.binding = Box::new(FakeBinding {
                    events,
                    installed: false,
                    install_ok: false,
                })
            })
            .run()
            .await;

        match outcome {
            Outcome::Aborted(e) => assert_eq!(e.kind, ErrorKind::BindingInstall),
            other => panic!("expected abort, got {:?}", other),
        }
        assert_eq!(h.events(), vec!["binding".to_string()]);
    }

    #[tokio::test]
    async fn test_download_failure_skips_installer() {
        let h = Harness::new();
        let events = h.events.clone();
        let outcome = h
            .provisioner(true, |c| {
                c.downloader = Arc::new(FakeDownloader {
                    events,
                    fail_engine: true,
                    fail_language: false,
                })
            })
            .run()
            .await;

        assert_eq!(outcome.exit_code(), ErrorKind::Download.exit_code());
        assert!(!h.events().contains(&"install".to_string()));
        assert_eq!(h.store.value(DATA_PREFIX_KEY), None);
    }

    #[tokio::test]
    async fn test_install_failure_aborts_and_keeps_artifact() {
        let h = Harness::new();
        let events = h.events.clone();
        let outcome = h
            .provisioner(true, |c| c.installer = Box::new(FakeInstaller { events, ok: false }))
            .run()
            .await;

        assert_eq!(outcome.exit_code(), ErrorKind::Install.exit_code());
        assert!(h.config.working_artifact_path.exists());
        assert!(!h.language_file().exists());
    }

    #[tokio::test]
    async fn test_environment_failure_continues_to_language_data() {
        let h = Harness::new();
        let outcome = h
            .provisioner(true, |c| {
                c.store = Arc::new(MemoryStore::with_values([(PATH_KEY, "C:\\Windows")]).read_only())
            })
            .run()
            .await;

        match &outcome {
            Outcome::CompletedWithWarnings(warnings) => {
                assert_eq!(warnings.len(), 1);
                assert_eq!(warnings[0].kind, ErrorKind::Environment);
            }
            other => panic!("expected warnings, got {:?}", other),
        }
        assert_eq!(outcome.exit_code(), 0);
        assert!(h.language_file().exists());
    }

    #[tokio::test]
    async fn test_language_data_failure_is_warning() {
        let h = Harness::new();
        let events = h.events.clone();
        let outcome = h
            .provisioner(true, |c| {
                c.downloader = Arc::new(FakeDownloader {
                    events,
                    fail_engine: false,
                    fail_language: true,
                })
            })
            .run()
            .await;

        match outcome {
            Outcome::CompletedWithWarnings(warnings) => {
                assert_eq!(warnings.len(), 1);
                assert_eq!(warnings[0].kind, ErrorKind::LanguageData);
            }
            other => panic!("expected warnings, got {:?}", other),
        }
        assert!(h.store.value(DATA_PREFIX_KEY).is_some());
    }

    #[tokio::test]
    async fn test_second_run_skips_language_download() {
        let h = Harness::new();
        h.provisioner(true, |_| {}).run().await;
        let path_after_first = h.store.value(PATH_KEY);
        h.events.lock().clear();

        h.provisioner(true, |_| {}).run().await;

        assert!(!h
            .events()
            .iter()
            .any(|e| e.ends_with(".traineddata")));
        assert_eq!(h.store.value(PATH_KEY), path_after_first);
    }

    /// Store whose writes fail with a chosen error kind
    struct FailingStore {
        kind: ErrorKind,
    }

    impl ConfigStore for FailingStore {
        fn get(&self, _key: &str) -> ProvisionResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> ProvisionResult<()> {
            Err(ProvisionError::new(self.kind, format!("cannot write {}", key)))
        }
    }

    #[test]
    fn test_settle_branches_on_kind() {
        let mut warnings = Vec::new();

        assert!(settle(Ok(()), &mut warnings).unwrap());
        assert!(!settle(Err(ProvisionError::environment("denied")), &mut warnings).unwrap());
        let fatal = settle(Err(ProvisionError::download("refused")), &mut warnings).unwrap_err();

        assert_eq!(fatal.kind, ErrorKind::Download);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, ErrorKind::Environment);
    }

    #[tokio::test]
    async fn test_fatal_kind_from_late_step_aborts() {
        let h = Harness::new();
        let outcome = h
            .provisioner(true, |c| {
                c.store = Arc::new(FailingStore {
                    kind: ErrorKind::Install,
                })
            })
            .run()
            .await;

        assert_eq!(outcome.exit_code(), ErrorKind::Install.exit_code());
        assert!(!h.language_file().exists());
    }

    #[tokio::test]
    async fn test_non_fatal_kind_from_installer_continues() {
        struct WarningInstaller;

        #[async_trait]
        impl EngineInstaller for WarningInstaller {
            async fn install(&self, _artifact: &Path) -> ProvisionResult<()> {
                Err(ProvisionError::environment("installer could not update PATH"))
            }
        }

        let h = Harness::new();
        let outcome = h
            .provisioner(true, |c| c.installer = Box::new(WarningInstaller))
            .run()
            .await;

        match outcome {
            Outcome::CompletedWithWarnings(warnings) => {
                assert_eq!(warnings.len(), 1);
                assert_eq!(warnings[0].kind, ErrorKind::Environment);
            }
            other => panic!("expected warnings, got {:?}", other),
        }
        assert!(h.language_file().exists());
    }
}
