//! Path utilities for install locations
//!
//! Everything is derived from `ProvisionConfig`, so nothing here touches
//! hardcoded machine paths directly.

use std::path::PathBuf;

use crate::config::ProvisionConfig;

/// Directory appended to the machine PATH, rendered the way the installer lays it out
pub fn install_dir_entry(config: &ProvisionConfig) -> String {
    with_trailing_separator(config.install_root_path.to_string_lossy().into_owned())
}

/// Value written to TESSDATA_PREFIX
pub fn data_dir_entry(config: &ProvisionConfig) -> String {
    with_trailing_separator(config.data_dir().to_string_lossy().into_owned())
}

fn with_trailing_separator(mut dir: String) -> String {
    if !dir.ends_with(['\\', '/']) {
        dir.push(if dir.contains('\\') { '\\' } else { std::path::MAIN_SEPARATOR });
    }
    dir
}

/// Resolve the artifact against the working directory if it is relative
pub fn resolve_artifact(path: &std::path::Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Snapshot of what is already on disk before a run
pub struct InstallStatus {
    pub engine_ok: bool,
    pub language_data_ok: bool,
}

impl InstallStatus {
    pub fn check(config: &ProvisionConfig) -> Self {
        let engine_ok = config.engine_executable().is_file();

        // Language data must be present and non-empty
        let language_data_ok = std::fs::metadata(config.language_data_path(&config.language_code))
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);

        InstallStatus {
            engine_ok,
            language_data_ok,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.engine_ok && self.language_data_ok
    }
}
