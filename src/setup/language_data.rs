//! Trained language data
//!
//! Fetches `<code>.traineddata` into the engine's data directory unless it is
//! already there.

use std::path::PathBuf;
use std::sync::Arc;

use super::downloader::Downloader;
use crate::config::{language_data_path, language_data_url};
use crate::error::{ProvisionError, ProvisionResult};

pub struct LanguageDataProvisioner {
    downloader: Arc<dyn Downloader>,
    data_dir: PathBuf,
    url_template: String,
}

impl LanguageDataProvisioner {
    /// `url_template` must contain `{lang}`
    pub fn new(
        downloader: Arc<dyn Downloader>,
        data_dir: impl Into<PathBuf>,
        url_template: impl Into<String>,
    ) -> Self {
        Self {
            downloader,
            data_dir: data_dir.into(),
            url_template: url_template.into(),
        }
    }

    pub fn target_path(&self, language_code: &str) -> PathBuf {
        language_data_path(&self.data_dir, language_code)
    }

    /// Make sure trained data for `language_code` is on disk
    pub async fn ensure(&self, language_code: &str) -> ProvisionResult<PathBuf> {
        let target = self.target_path(language_code);

        if target.exists() {
            tracing::info!(language = language_code, path = %target.display(), "Language data already present");
            return Ok(target);
        }

        tokio::fs::create_dir_all(&self.data_dir).await.map_err(|e| {
            let err = ProvisionError::language_data(format!(
                "Failed to create {}: {}",
                self.data_dir.display(),
                e
            ));
            tracing::error!("{}", err.message);
            err
        })?;

        let url = language_data_url(&self.url_template, language_code);
        tracing::info!(language = language_code, "Downloading language data");

        self.downloader
            .download(&url, &target)
            .await
            .map_err(|e| ProvisionError::language_data(e.message))?;

        tracing::info!(language = language_code, path = %target.display(), "Language data installed");
        Ok(target)
    }
}
