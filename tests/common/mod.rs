//! Local HTTP fixture serving an installer and trained data

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use ocr_provision::setup::downloader::HttpDownloader;
use tokio::net::TcpListener;

pub const TRAINED_DATA: &[u8] = b"spa traineddata fixture";

pub struct Fixture {
    pub addr: SocketAddr,
    pub installer_hits: Arc<AtomicUsize>,
    pub language_hits: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn installer_hits(&self) -> usize {
        self.installer_hits.load(Ordering::SeqCst)
    }

    pub fn language_hits(&self) -> usize {
        self.language_hits.load(Ordering::SeqCst)
    }
}

/// Serves `installer` at /setup.exe and TRAINED_DATA at /tessdata/spa.traineddata
pub async fn start_server(installer: Vec<u8>) -> Fixture {
    let installer_hits = Arc::new(AtomicUsize::new(0));
    let language_hits = Arc::new(AtomicUsize::new(0));

    let hits = installer_hits.clone();
    let installer_route = get(move || {
        let hits = hits.clone();
        let body = installer.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            body
        }
    });

    let hits = language_hits.clone();
    let language_route = get(move || {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            TRAINED_DATA.to_vec()
        }
    });

    let app = Router::new()
        .route("/setup.exe", installer_route)
        .route("/tessdata/spa.traineddata", language_route)
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Fixture {
        addr,
        installer_hits,
        language_hits,
    }
}

/// Shell script standing in for the engine installer.
///
/// Records its arguments next to itself and exits with `code`.
pub fn installer_script(record: &std::path::Path, code: i32) -> Vec<u8> {
    format!(
        "#!/bin/sh\necho \"$@\" > '{}'\nexit {}\n",
        record.display(),
        code
    )
    .into_bytes()
}

/// Downloader that talks to the fixture directly, ignoring proxy settings
pub fn downloader() -> HttpDownloader {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap();
    HttpDownloader::from_client(client)
}
