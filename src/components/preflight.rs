use crate::{
    configs::GlobalConfig,
    error::{AppResult, ErrorReason},
    system::SystemOps,
};
use std::path::Path;

/// `/etc/os-release` fragments identifying Raspbian and Raspberry Pi OS.
const PLATFORM_MARKERS: [&str; 4] = [
    "ID=raspbian",
    "ID_LIKE=raspbian",
    "PRETTY_NAME=\"Raspbian",
    "PRETTY_NAME=\"Raspberry Pi OS",
];

pub fn requires_root<S: SystemOps + ?Sized>(system: &S) -> AppResult<()> {
    if !system.is_privileged() {
        return Err(ErrorReason::NotPrivileged.into());
    }
    Ok(())
}

/// An unreadable identification file counts as unsupported.
pub async fn is_supported_platform(os_release: &Path) -> bool {
    match tokio::fs::read(os_release).await {
        Ok(data) => {
            let content = String::from_utf8_lossy(&data);
            PLATFORM_MARKERS
                .iter()
                .any(|marker| content.contains(marker))
        }
        Err(e) => {
            debug!("Cannot read {}: {}", os_release.display(), e);
            false
        }
    }
}

pub async fn is_bundle_path_valid(bundle: &Path) -> bool {
    tokio::fs::metadata(bundle)
        .await
        .map(|meta| !meta.is_dir())
        .unwrap_or(false)
}

/// Gates the mutating update. `force` skips the platform and path checks,
/// never the privilege check.
pub async fn run<S: SystemOps + ?Sized>(
    config: &GlobalConfig,
    system: &S,
    force: bool,
) -> AppResult<()> {
    requires_root(system)?;

    if force {
        warn!("Skipping platform and certificate path checks (--force)");
        return Ok(());
    }
    if !is_supported_platform(&config.os_release_path).await {
        return Err(ErrorReason::UnsupportedPlatform.into());
    }
    if !is_bundle_path_valid(&config.bundle_path).await {
        return Err(ErrorReason::InvalidBundlePath(config.bundle_path.clone()).into());
    }
    Ok(())
}
