//! Provisioning configuration
//!
//! All URLs and filesystem locations used by the provisioner live here so
//! tests can point them at local servers and scratch directories.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ProvisionError, ProvisionResult};

pub const DEFAULT_ENGINE_URL: &str = "https://github.com/UB-Mannheim/tesseract/releases/download/v5.4.0.20240606/tesseract-ocr-w64-setup-5.4.0.20240606.exe";
pub const DEFAULT_LANGUAGE_DATA_URL: &str =
    "https://github.com/tesseract-ocr/tessdata/raw/main/{lang}.traineddata";
pub const DEFAULT_INSTALL_ROOT: &str = r"C:\Program Files\Tesseract-OCR";
pub const DEFAULT_ARTIFACT_PATH: &str = "tesseract-setup.exe";

/// Placeholder substituted with the language code in `language_data_url`
const LANG_PLACEHOLDER: &str = "{lang}";

#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Engine installer download URL
    pub engine_install_url: String,
    /// Language data URL template containing `{lang}`
    pub language_data_url: String,
    /// Directory the engine installer installs into
    pub install_root_path: PathBuf,
    /// Where the downloaded installer is written
    pub working_artifact_path: PathBuf,
    /// Extra language to fetch trained data for
    pub language_code: String,
    /// Interpreter used to load and install the binding
    pub python: String,
    pub binding_package: String,
    pub silent_flag: String,
    pub http_timeout: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            engine_install_url: DEFAULT_ENGINE_URL.to_string(),
            language_data_url: DEFAULT_LANGUAGE_DATA_URL.to_string(),
            install_root_path: PathBuf::from(DEFAULT_INSTALL_ROOT),
            working_artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            language_code: "spa".to_string(),
            python: "python".to_string(),
            binding_package: "pytesseract".to_string(),
            silent_flag: "/SILENT".to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl ProvisionConfig {
    /// Load configuration, applying `OCR_PROVISION_*` overrides from the process environment
    pub fn from_env() -> ProvisionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from defaults plus overrides returned by `lookup`
    pub fn from_lookup<F>(lookup: F) -> ProvisionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("OCR_PROVISION_ENGINE_URL") {
            config.engine_install_url = url;
        }
        if let Some(url) = get("OCR_PROVISION_LANGUAGE_DATA_URL") {
            config.language_data_url = url;
        }
        if let Some(root) = get("OCR_PROVISION_INSTALL_ROOT") {
            config.install_root_path = PathBuf::from(root);
        }
        if let Some(artifact) = get("OCR_PROVISION_ARTIFACT_PATH") {
            config.working_artifact_path = PathBuf::from(artifact);
        }
        if let Some(lang) = get("OCR_PROVISION_LANGUAGE") {
            config.language_code = lang;
        }
        if let Some(python) = get("OCR_PROVISION_PYTHON") {
            config.python = python;
        }
        if let Some(secs) = get("OCR_PROVISION_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ProvisionError::config(format!(
                    "OCR_PROVISION_HTTP_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                    secs
                ))
            })?;
            config.http_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Trained data directory: <install_root>/tessdata
    pub fn data_dir(&self) -> PathBuf {
        self.install_root_path.join("tessdata")
    }

    pub fn language_data_path(&self, code: &str) -> PathBuf {
        language_data_path(&self.data_dir(), code)
    }

    /// Path of the engine executable once installed
    pub fn engine_executable(&self) -> PathBuf {
        self.install_root_path.join("tesseract.exe")
    }
}

/// Substitute `code` into a language data URL template
pub fn language_data_url(template: &str, code: &str) -> String {
    template.replace(LANG_PLACEHOLDER, code)
}

/// <data_dir>/<code>.traineddata
pub fn language_data_path(data_dir: &Path, code: &str) -> PathBuf {
    data_dir.join(format!("{}.traineddata", code))
}
