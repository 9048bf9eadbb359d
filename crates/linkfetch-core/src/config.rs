use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::fetch::{FetchOptions, TlsPolicy};

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_OUTPUT_DIR: &str = "output_folder";
pub const DEFAULT_LINKS_FILE: &str = "links.txt";

/// Errors in user-supplied settings that must stop a run before it starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid concurrency {value:?}: {reason}")]
    InvalidConcurrency { value: String, reason: String },
}

/// Number of workers allowed to run download tasks at once. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency(usize);

impl Concurrency {
    pub fn new(n: usize) -> Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::InvalidConcurrency {
                value: n.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self(n))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self(DEFAULT_CONCURRENCY)
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Concurrency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidConcurrency {
                value: s.to_string(),
                reason: e.to_string(),
            })?;
        Concurrency::new(n).map_err(|_| ConfigError::InvalidConcurrency {
            value: s.to_string(),
            reason: "must be at least 1".to_string(),
        })
    }
}

/// HTTP transport settings (`[fetch]` section in config.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Verify the TLS certificate hostname. Off by default: the legacy tool trusted any hostname.
    #[serde(default)]
    pub verify_hostname: bool,
    /// Connect timeout in milliseconds (None or 0 = no limit of our own).
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    /// Abort a transfer when no data arrives for this many milliseconds (None or 0 = wait indefinitely).
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
    /// Treat HTTP status >= 400 as a failed item instead of saving the error body.
    #[serde(default)]
    pub fail_on_http_error: bool,
}

impl FetchConfig {
    pub fn to_options(&self) -> FetchOptions {
        FetchOptions {
            tls: if self.verify_hostname {
                TlsPolicy::Strict
            } else {
                TlsPolicy::TrustAllHostnames
            },
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            read_timeout: self.read_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Global configuration loaded from `~/.config/linkfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkfetchConfig {
    /// Worker count used when none is given on the command line.
    pub concurrency: usize,
    /// Directory downloads are written to.
    pub output_dir: String,
    /// Link list read when none is given on the command line.
    pub links_file: String,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Default for LinkfetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            links_file: DEFAULT_LINKS_FILE.to_string(),
            fetch: FetchConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("linkfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<LinkfetchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: LinkfetchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LinkfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LinkfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}
