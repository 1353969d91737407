//! Engine installer runner
//!
//! Runs the downloaded installer unattended and removes it once it succeeds.
//! A failed install keeps the artifact on disk for inspection.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use super::paths::resolve_artifact;
use crate::error::{ProvisionError, ProvisionResult};

#[async_trait]
pub trait EngineInstaller: Send + Sync {
    async fn install(&self, artifact: &Path) -> ProvisionResult<()>;
}

/// Runs `<artifact> <silent_flag>` and waits for it to exit
pub struct SilentInstaller {
    silent_flag: String,
}

impl SilentInstaller {
    pub fn new(silent_flag: impl Into<String>) -> Self {
        Self {
            silent_flag: silent_flag.into(),
        }
    }

    async fn run(&self, artifact: &Path) -> ProvisionResult<()> {
        let program = resolve_artifact(artifact)
            .map_err(|e| ProvisionError::install(format!("Cannot resolve {}: {}", artifact.display(), e)))?;

        make_executable(&program)?;

        let status = Command::new(&program)
            .arg(&self.silent_flag)
            .status()
            .await
            .map_err(|e| ProvisionError::install(format!("Failed to start {}: {}", program.display(), e)))?;

        if !status.success() {
            return Err(ProvisionError::install(format!(
                "{} exited with {}",
                program.display(),
                status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EngineInstaller for SilentInstaller {
    async fn install(&self, artifact: &Path) -> ProvisionResult<()> {
        if !artifact.exists() {
            let err = ProvisionError::missing_artifact(format!(
                "installer not found: {}",
                artifact.display()
            ));
            tracing::error!("{}", err.message);
            return Err(err);
        }

        tracing::info!(artifact = %artifact.display(), flag = %self.silent_flag, "Running installer");

        if let Err(e) = self.run(artifact).await {
            tracing::error!("Engine install failed: {}", e.message);
            return Err(e);
        }

        tracing::info!("Engine installed");

        // Installed engine is usable even if the artifact lingers
        if let Err(e) = tokio::fs::remove_file(artifact).await {
            tracing::warn!(artifact = %artifact.display(), "Could not remove installer: {}", e);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> ProvisionResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| ProvisionError::install(format!("Cannot stat {}: {}", path.display(), e)))?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    std::fs::set_permissions(path, permissions)
        .map_err(|e| ProvisionError::install(format!("Cannot chmod {}: {}", path.display(), e)))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> ProvisionResult<()> {
    Ok(())
}
