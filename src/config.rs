//! Host defaults loaded from `~/.config/anypath/config.toml`.
//!
//! Every section is optional; a missing file or section means built-in
//! defaults. Settings only shape hosts built from URLs by the scheme
//! registry. Hosts constructed directly take their parameters from the
//! caller.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const APP_PREFIX: &str = "anypath";
const CONFIG_FILE: &str = "config.toml";

/// `file://` URLs without a hostname resolve below `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalSettings {
    pub root: PathBuf,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Client parameters shared by `http`, `https` and `hdfs` hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    /// Verify TLS certificates for `https` URLs.
    pub verify_tls: bool,
    /// Whole-request timeout in seconds (None = no timeout).
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout_secs: Some(30),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SftpSettings {
    /// Accept server keys that are missing from `known_hosts`.
    pub auto_add_host_key: bool,
    /// Defaults to `~/.ssh/known_hosts`.
    pub known_hosts: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct S3Settings {
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, Ceph, ...).
    pub endpoint: Option<String>,
    /// Static keys; when absent the environment and profile chain is used.
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
        }
    }
}

/// HDFS is reached through the namenode's WebHDFS REST endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HdfsSettings {
    pub port: u16,
    /// Sent as `user.name` for clusters with simple authentication.
    pub user: Option<String>,
}

impl Default for HdfsSettings {
    fn default() -> Self {
        Self {
            port: 9870,
            user: None,
        }
    }
}

/// Where `package://<name>/...` resources live.
///
/// Explicit `roots` win; otherwise each of `search_dirs` is tried as
/// `<dir>/<name>`, then the XDG data directories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSettings {
    pub roots: BTreeMap<String, PathBuf>,
    pub search_dirs: Vec<PathBuf>,
}

/// All host defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub local: LocalSettings,
    pub http: HttpSettings,
    pub sftp: SftpSettings,
    pub s3: S3Settings,
    pub hdfs: HdfsSettings,
    pub package: PackageSettings,
}

impl Settings {
    pub fn from_toml_str(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }
}

/// Location of the user's config file (the file may not exist).
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
    Ok(xdg_dirs.get_config_file(CONFIG_FILE))
}

/// Load settings from `path`.
pub fn load(path: &Path) -> Result<Settings> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let settings = Settings::from_toml_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(settings)
}

/// Load the user's config file, falling back to defaults when it is absent.
pub fn load_default() -> Result<Settings> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    load(&path)
}
