use crate::{
    components::prober::ConnectivityProbe,
    configs::GlobalConfig,
    error::{AppResult, IoResultExt},
};
use chrono::{DateTime, Local};
use std::{
    fmt::{Display, Formatter},
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
};

pub const PEM_CERTIFICATE_MARKER: &[u8] = b"-----BEGIN CERTIFICATE-----";

/// Placeholder for one PEM begin marker. Nothing past the marker is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CertificateMarker {
    pub offset: usize,
}

/// Every occurrence of the begin marker, overlapping ones included.
pub fn locate_certificates(data: &[u8]) -> Vec<CertificateMarker> {
    data.windows(PEM_CERTIFICATE_MARKER.len())
        .enumerate()
        .filter(|(_, window)| *window == PEM_CERTIFICATE_MARKER)
        .map(|(offset, _)| CertificateMarker { offset })
        .collect()
}

#[derive(Clone, Debug)]
pub struct BundleStatus {
    pub path: PathBuf,
    pub modified: DateTime<Local>,
    pub size: u64,
    pub certificates: Vec<CertificateMarker>,
}

impl BundleStatus {
    /// `None` when the bundle does not exist.
    pub async fn inspect(path: &Path) -> AppResult<Option<Self>> {
        let metadata = match tokio::fs::metadata(path).await {
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            result => result.io_context("failed to check file")?,
        };
        let modified = metadata
            .modified()
            .io_context("failed to read modification time")?;
        let data = tokio::fs::read(path)
            .await
            .io_context("failed to read file")?;

        Ok(Some(Self {
            path: path.to_path_buf(),
            modified: modified.into(),
            size: metadata.len(),
            certificates: locate_certificates(&data),
        }))
    }
}

impl Display for BundleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "File: {}", self.path.display())?;
        writeln!(f, "Modified: {}", self.modified.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Size: {} bytes", self.size)?;
        write!(f, "Certificates count: {}", self.certificates.len())
    }
}

/// Read-only report for `--check`. Problems are printed, never returned.
pub async fn check(config: &GlobalConfig) {
    println!("Checking current CA certificates...");

    match BundleStatus::inspect(&config.bundle_path).await {
        Ok(Some(status)) => println!("{}", status),
        Ok(None) => {
            println!(
                "CA certificates file not found: {}",
                config.bundle_path.display()
            );
            return;
        }
        Err(e) => {
            error!("Error checking {}: {}", config.bundle_path.display(), e.report());
            return;
        }
    }

    println!();
    info!("Testing SSL connection...");
    ConnectivityProbe::new(config).report().await;
}
