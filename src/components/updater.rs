use crate::{
    components::HashLinkBuilder,
    configs::{GlobalConfig, HttpParameters},
    error::{AppResult, ErrorReason, IoResultExt},
    system::SystemOps,
};
use std::{fs::Permissions, io::ErrorKind as IoErrorKind, os::unix::fs::PermissionsExt};
use tokio::{fs::File, io::AsyncWriteExt};

const BUNDLE_MODE: u32 = 0o644;

pub struct Updater<'a, S: SystemOps + ?Sized> {
    config: &'a GlobalConfig,
    system: &'a S,
    insecure_skip_verify: bool,
}

impl<'a, S: SystemOps + ?Sized> Updater<'a, S> {
    pub fn new(config: &'a GlobalConfig, system: &'a S, insecure_skip_verify: bool) -> Self {
        Self {
            config,
            system,
            insecure_skip_verify,
        }
    }

    pub fn download_parameters(&self) -> HttpParameters {
        self.config.download_parameters(self.insecure_skip_verify)
    }

    /// Backup, download, chmod, rehash. The first three stop the update on
    /// failure; a failed rehash only leaves a warning behind.
    pub async fn update(&self) -> AppResult<()> {
        info!("Starting CA certificates update...");

        self.create_backup().await?;
        self.download().await?;
        self.fix_permissions().await?;

        if let Err(e) = self.rehash().await {
            warn!("Rehash failed: {}", e.report());
            warn!(
                "You may need to run manually: sudo c_rehash {}/",
                self.config.certs_dir.display()
            );
        }

        Ok(())
    }

    /// Returns whether a backup was written.
    pub async fn create_backup(&self) -> AppResult<bool> {
        info!("Creating backup...");
        let bundle = &self.config.bundle_path;
        let backup = &self.config.backup_path;

        if let Err(e) = tokio::fs::metadata(bundle).await {
            if e.kind() == IoErrorKind::NotFound {
                info!("Original CA file not found, skipping backup");
                return Ok(false);
            }
        }

        let mut source = File::open(bundle)
            .await
            .io_context("backup failed: failed to open source file")?;
        let mut destination = File::create(backup)
            .await
            .io_context("backup failed: failed to create backup file")?;
        tokio::io::copy(&mut source, &mut destination)
            .await
            .io_context("backup failed: failed to copy file")?;
        destination
            .flush()
            .await
            .io_context("backup failed: failed to copy file")?;

        info!("Backup created: {}", backup.display());
        Ok(true)
    }

    /// Streams the fresh bundle over the old one. The bundle is only
    /// truncated once the server has answered with a 2xx status.
    pub async fn download(&self) -> AppResult<()> {
        info!("Downloading CA certificates from {}...", self.config.bundle_url);

        let client = self.download_parameters().build_client()?;
        let mut response = client.get(&self.config.bundle_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ErrorReason::HttpStatus(status).into());
        }

        let mut file = File::create(&self.config.bundle_path)
            .await
            .io_context("download failed: failed to create certificate file")?;
        let mut written = 0usize;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .io_context("download failed: failed to write certificate file")?;
            written += chunk.len();
        }
        file.flush()
            .await
            .io_context("download failed: failed to write certificate file")?;

        debug!("Wrote {} bytes to {}", written, self.config.bundle_path.display());
        info!("CA certificates downloaded successfully");
        Ok(())
    }

    pub async fn fix_permissions(&self) -> AppResult<()> {
        tokio::fs::set_permissions(
            &self.config.bundle_path,
            Permissions::from_mode(BUNDLE_MODE),
        )
        .await
        .io_context("chmod failed")
    }

    /// `c_rehash` first, the manual builder when it is missing or fails.
    pub async fn rehash(&self) -> AppResult<()> {
        info!("Rebuilding certificate hash links...");

        match self.system.rehash(&self.config.certs_dir).await {
            Ok(()) => {
                info!("Certificate hash links rebuilt");
                Ok(())
            }
            Err(e) => {
                debug!("c_rehash unusable, falling back: {}", e);
                HashLinkBuilder::new(
                    &self.config.certs_dir,
                    vec![self.config.bundle_path.clone()],
                    self.system,
                )
                .rebuild()
                .await
                .map(|_| ())
            }
        }
    }
}
