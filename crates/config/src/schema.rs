//! Persisted configuration schema.
//!
//! Every section defaults, so an empty or missing file is a valid config.

use std::path::PathBuf;

use {secrecy::Secret, serde::Deserialize};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_OWNER: &str = "ui5-community";
pub const DEFAULT_PREFIX: &str = "generator-ui5-";
pub const DEFAULT_MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HatchConfig {
    pub github: GithubConfig,
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub install: InstallConfig,
    pub rate_limit: RateLimitConfig,
}

/// Remote hosting service access.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Personal access token; raises the API quota when set.
    pub token: Option<Secret<String>>,
    /// API base URL. Override for enterprise hosts.
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.into(),
        }
    }
}

/// Which repositories count as plugins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub owner: String,
    pub prefix: String,
    /// Secondary owner merged into the catalog.
    pub additional_owner: Option<String>,
    /// Prefix for the secondary owner; falls back to `prefix`.
    pub additional_prefix: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.into(),
            prefix: DEFAULT_PREFIX.into(),
            additional_owner: None,
            additional_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root. Defaults to the platform cache directory.
    pub dir: Option<PathBuf>,
}

/// External dependency installer run inside a freshly populated plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Program and arguments. Empty disables the installer.
    pub command: Vec<String>,
    /// The installer only runs when this file exists in the plugin root.
    pub manifest_file: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            command: vec!["npm".into(), "install".into(), "--no-progress".into()],
            manifest_file: DEFAULT_MANIFEST_FILE.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Longest host-requested backoff honoured before giving up. Unset means
    /// the single retry always waits as long as the host asks.
    pub max_wait_secs: Option<u64>,
}
