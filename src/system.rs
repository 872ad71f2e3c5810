use crate::configs::GlobalConfig;
use async_trait::async_trait;
use nix::unistd::geteuid;
use std::{
    io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult},
    path::Path,
    process::Stdio,
};
use tokio::process::Command;

/// Host capabilities the updater needs beyond plain file I/O.
#[async_trait]
pub trait SystemOps: Send + Sync {
    /// Whether the process runs with an effective uid of 0.
    fn is_privileged(&self) -> bool;

    /// Rebuilds the hash links of `certs_dir` with the external rehash utility.
    async fn rehash(&self, certs_dir: &Path) -> IoResult<()>;

    /// Raw output of the subject-hash utility for a single certificate file.
    async fn subject_hash(&self, cert_file: &Path) -> IoResult<String>;
}

#[derive(Clone, Debug)]
pub struct HostSystem {
    rehash_command: String,
    hash_command: String,
}

impl HostSystem {
    pub fn new(config: &GlobalConfig) -> Self {
        Self {
            rehash_command: config.rehash_command.clone(),
            hash_command: config.hash_command.clone(),
        }
    }
}

#[async_trait]
impl SystemOps for HostSystem {
    fn is_privileged(&self) -> bool {
        geteuid().is_root()
    }

    async fn rehash(&self, certs_dir: &Path) -> IoResult<()> {
        let status = Command::new(&self.rehash_command)
            .arg(certs_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if !status.success() {
            return Err(IoError::new(
                IoErrorKind::Other,
                format!("{} exited with {}", self.rehash_command, status),
            ));
        }
        Ok(())
    }

    async fn subject_hash(&self, cert_file: &Path) -> IoResult<String> {
        let output = Command::new(&self.hash_command)
            .args(["x509", "-hash", "-noout", "-in"])
            .arg(cert_file)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(IoError::new(
                IoErrorKind::Other,
                format!(
                    "{} exited with {}: {}",
                    self.hash_command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
