use crate::error::AppResult;
use config::{Config, File as ConfigFile};
use duration_str::deserialize_duration;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    path::{Path, PathBuf},
    time::Duration,
};

mod parameters;

pub use parameters::*;

/// Extension-less; `config` picks up `config.toml`, `config.yaml` or `config.json`.
pub const CONFIG_FILE: &str = "/etc/raspbian-ca-update/config";

pub const DEFAULT_BUNDLE_URL: &str = "https://curl.se/ca/cacert.pem";
pub const DEFAULT_BUNDLE_PATH: &str = "/etc/ssl/certs/ca-certificates.crt";
pub const DEFAULT_BACKUP_PATH: &str = "/etc/ssl/certs/ca-certificates.crt.backup";
pub const DEFAULT_CERTS_DIR: &str = "/etc/ssl/certs";
pub const DEFAULT_OS_RELEASE_PATH: &str = "/etc/os-release";
pub const DEFAULT_PROBE_URL: &str = "https://www.google.com";
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GlobalConfig {
    #[serde(default = "default_bundle_url")]
    pub bundle_url: String,

    #[serde(default = "default_bundle_path")]
    pub bundle_path: PathBuf,

    #[serde(default = "default_backup_path")]
    pub backup_path: PathBuf,

    #[serde(default = "default_certs_dir")]
    pub certs_dir: PathBuf,

    #[serde(default = "default_os_release_path")]
    pub os_release_path: PathBuf,

    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    #[serde(
        default = "default_download_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub download_timeout: Duration,

    #[serde(
        default = "default_probe_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub probe_timeout: Duration,

    #[serde(default = "default_rehash_command")]
    pub rehash_command: String,

    #[serde(default = "default_hash_command")]
    pub hash_command: String,
}

impl GlobalConfig {
    /// Built-in defaults, overridden only by the root-owned file under `/etc`.
    /// The process environment is never consulted: it decides which files
    /// get overwritten and which programs run as root.
    pub fn load_config() -> AppResult<Self> {
        Self::load_from_file(Path::new(CONFIG_FILE))
    }

    pub fn load_from_file(path: &Path) -> AppResult<Self> {
        let cfg = Config::builder()
            .add_source(ConfigFile::from(path).required(false))
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }

    pub fn download_parameters(&self, insecure_skip_verify: bool) -> HttpParameters {
        HttpParameters {
            timeout: self.download_timeout,
            insecure_skip_verify,
        }
    }

    pub fn probe_parameters(&self) -> HttpParameters {
        HttpParameters {
            timeout: self.probe_timeout,
            insecure_skip_verify: false,
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            bundle_url: default_bundle_url(),
            bundle_path: default_bundle_path(),
            backup_path: default_backup_path(),
            certs_dir: default_certs_dir(),
            os_release_path: default_os_release_path(),
            probe_url: default_probe_url(),
            download_timeout: default_download_timeout(),
            probe_timeout: default_probe_timeout(),
            rehash_command: default_rehash_command(),
            hash_command: default_hash_command(),
        }
    }
}

fn default_bundle_url() -> String {
    DEFAULT_BUNDLE_URL.to_owned()
}

fn default_bundle_path() -> PathBuf {
    PathBuf::from(DEFAULT_BUNDLE_PATH)
}

fn default_backup_path() -> PathBuf {
    PathBuf::from(DEFAULT_BACKUP_PATH)
}

fn default_certs_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CERTS_DIR)
}

fn default_os_release_path() -> PathBuf {
    PathBuf::from(DEFAULT_OS_RELEASE_PATH)
}

fn default_probe_url() -> String {
    DEFAULT_PROBE_URL.to_owned()
}

const fn default_download_timeout() -> Duration {
    DEFAULT_DOWNLOAD_TIMEOUT
}

const fn default_probe_timeout() -> Duration {
    DEFAULT_PROBE_TIMEOUT
}

fn default_rehash_command() -> String {
    "c_rehash".to_owned()
}

fn default_hash_command() -> String {
    "openssl".to_owned()
}
