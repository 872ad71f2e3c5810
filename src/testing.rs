//! Fakes shared by the unit tests.

use crate::{configs::GlobalConfig, system::SystemOps};
use async_trait::async_trait;
use axum::{http::StatusCode, routing::get, Router};
use std::{
    io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult},
    net::Ipv4Addr,
    path::Path,
    sync::Mutex,
    time::Duration,
};
use tokio::net::TcpListener;

pub const SAMPLE_BUNDLE: &str = "\
-----BEGIN CERTIFICATE-----
MIIBfakeRootOne
-----END CERTIFICATE-----
-----BEGIN CERTIFICATE-----
MIIBfakeRootTwo
-----END CERTIFICATE-----
";

#[derive(Debug, Default)]
pub struct FakeSystem {
    pub privileged: bool,
    pub rehash_succeeds: bool,
    pub subject_hash: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSystem {
    pub fn root() -> Self {
        Self {
            privileged: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SystemOps for FakeSystem {
    fn is_privileged(&self) -> bool {
        self.privileged
    }

    async fn rehash(&self, certs_dir: &Path) -> IoResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("rehash {}", certs_dir.display()));
        if self.rehash_succeeds {
            Ok(())
        } else {
            Err(IoError::new(IoErrorKind::NotFound, "c_rehash not found"))
        }
    }

    async fn subject_hash(&self, cert_file: &Path) -> IoResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("hash {}", cert_file.display()));
        self.subject_hash
            .clone()
            .ok_or_else(|| IoError::new(IoErrorKind::Other, "unable to load certificate"))
    }
}

/// Points every path into `dir` and every URL at `url`.
pub fn scratch_config(dir: &Path, url: &str) -> GlobalConfig {
    GlobalConfig {
        bundle_url: url.to_owned(),
        bundle_path: dir.join("ca-certificates.crt"),
        backup_path: dir.join("ca-certificates.crt.backup"),
        certs_dir: dir.to_path_buf(),
        os_release_path: dir.join("os-release"),
        probe_url: url.to_owned(),
        download_timeout: Duration::from_secs(5),
        probe_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

/// Serves `body` with `status` on a loopback port and returns its URL.
pub async fn serve_bundle(status: StatusCode, body: &'static str) -> String {
    let router = Router::new().route("/ca/cacert.pem", get(move || async move { (status, body) }));
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/ca/cacert.pem", addr)
}

/// Like [`serve_bundle`], but every answer is held back for `delay`.
pub async fn serve_bundle_after(delay: Duration, body: &'static str) -> String {
    let router = Router::new().route(
        "/ca/cacert.pem",
        get(move || async move {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, body)
        }),
    );
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/ca/cacert.pem", addr)
}

/// A loopback URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

pub fn read(path: impl AsRef<Path>) -> Vec<u8> {
    std::fs::read(path).unwrap()
}
