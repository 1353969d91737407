//! Language binding installer
//!
//! The binding is a Python package; presence is checked by importing it and
//! installation goes through pip.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{ProvisionError, ProvisionResult};

#[async_trait]
pub trait BindingInstaller: Send + Sync {
    /// True when the binding loads. Any failure counts as not installed.
    async fn is_installed(&self) -> bool;

    async fn install(&self) -> ProvisionResult<()>;

    fn name(&self) -> &str;
}

/// Binding installed with `<python> -m pip install <package>`
pub struct PipBinding {
    python: String,
    package: String,
}

impl PipBinding {
    pub fn new(python: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            package: package.into(),
        }
    }
}

#[async_trait]
impl BindingInstaller for PipBinding {
    async fn is_installed(&self) -> bool {
        let status = Command::new(&self.python)
            .arg("-c")
            .arg(format!("import {}", self.package))
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!(python = %self.python, "Could not check binding: {}", e);
                false
            }
        }
    }

    async fn install(&self) -> ProvisionResult<()> {
        tracing::info!(package = %self.package, "Installing binding with pip");

        let status = Command::new(&self.python)
            .args(["-m", "pip", "install"])
            .arg(&self.package)
            .status()
            .await
            .map_err(|e| {
                let err = ProvisionError::binding_install(format!(
                    "Failed to run {} -m pip: {}",
                    self.python, e
                ));
                tracing::error!("Error installing {}: {}", self.package, err.message);
                err
            })?;

        if !status.success() {
            let err = ProvisionError::binding_install(format!(
                "pip install {} exited with {}",
                self.package, status
            ));
            tracing::error!("Error installing {}: {}", self.package, err.message);
            return Err(err);
        }

        tracing::info!(package = %self.package, "Binding installed");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.package
    }
}
