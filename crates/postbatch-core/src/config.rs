use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default host used to expand relative post paths (`/explore/<id>`).
pub const DEFAULT_BASE_DOMAIN: &str = "https://www.xiaohongshu.com";

/// Retry policy parameters for the HTTP fetcher (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per fetch (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
        }
    }
}

impl RetryConfig {
    /// Fails when `base_delay_secs` is not a representable duration (inf or too large).
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        let base_delay = Duration::try_from_secs_f64(self.base_delay_secs.max(0.0))
            .with_context(|| format!("invalid retry.base_delay_secs: {}", self.base_delay_secs))?;
        Ok(RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(self.max_delay_secs),
        })
    }
}

/// Global configuration loaded from `~/.config/postbatch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Concurrent fetches per run (1-5).
    pub concurrency: u8,
    /// Base domain prefixed to relative input lines.
    pub base_domain: String,
    /// Default URL list read by `postbatch run`.
    pub input_file: PathBuf,
    /// Where the retry ledger of failed URLs is written.
    pub ledger_file: PathBuf,
    /// Total timeout for one HTTP fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Optional per-item ceiling enforced by the worker pool (None = rely on the fetcher).
    #[serde(default)]
    pub item_timeout_secs: Option<u64>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional User-Agent override for the HTTP fetcher.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Optional raw `Cookie` header sent with every fetch.
    #[serde(default)]
    pub cookie: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            base_domain: DEFAULT_BASE_DOMAIN.to_string(),
            input_file: PathBuf::from("bulk_urls.txt"),
            ledger_file: PathBuf::from("failed_urls.txt"),
            fetch_timeout_secs: 15,
            item_timeout_secs: None,
            retry: None,
            user_agent: None,
            cookie: None,
        }
    }
}

impl BatchConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        self.retry.clone().unwrap_or_default().to_policy()
    }

    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_secs.map(Duration::from_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("postbatch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)
            .with_context(|| format!("write default config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: BatchConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.retry_policy()
        .with_context(|| format!("check config: {}", path.display()))?;
    Ok(cfg)
}
