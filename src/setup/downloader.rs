//! File Downloader
//!
//! Buffered HTTPS GET to a local file:
//! - fixed request timeout
//! - non-2xx responses are errors
//! - the destination is overwritten, never resumed

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::{ProvisionError, ProvisionResult};

/// Fetches a URL into a file
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> ProvisionResult<()>;
}

/// Downloader backed by reqwest
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> ProvisionResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ocr-provision/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(client_build_error)?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> ProvisionResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProvisionError::download(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProvisionError::download(format!(
                "GET {} returned HTTP {}: {}",
                url,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProvisionError::download(format!("Reading body of {} failed: {}", url, e)))?;
        Ok(body.to_vec())
    }

    /// Fetch `url` and write the whole body to `dest`, returning the byte count
    async fn fetch_to(&self, url: &str, dest: &Path) -> ProvisionResult<usize> {
        let body = self.fetch(url).await?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ProvisionError::download(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        tokio::fs::write(dest, &body).await.map_err(|e| {
            ProvisionError::download(format!("Failed to write {}: {}", dest.display(), e))
        })?;
        Ok(body.len())
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> ProvisionResult<()> {
        tracing::info!(url = %url, dest = %dest.display(), "Starting download");
        let start_time = Instant::now();

        let result = self.fetch_to(url, dest).await;

        match result {
            Ok(bytes) => {
                tracing::info!(
                    bytes = bytes,
                    duration_ms = start_time.elapsed().as_millis() as u64,
                    "Download complete"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Download failed: {}", e.message);
                Err(e)
            }
        }
    }
}

/// A client that cannot be built is a setup problem, not a failed transfer
fn client_build_error(e: impl std::fmt::Display) -> ProvisionError {
    ProvisionError::config(format!("Failed to build HTTP client: {}", e))
}
