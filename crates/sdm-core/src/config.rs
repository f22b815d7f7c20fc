use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the delay between chunk attempts evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Same delay before every retry.
    #[default]
    Fixed,
    /// Delay doubles per retry, capped at `max_backoff_secs`.
    Exponential,
}

/// Retry policy parameters (`[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts per chunk after the first one.
    pub max_retries: u32,
    pub backoff: BackoffKind,
    /// Delay before the first retry, in seconds.
    pub backoff_secs: f64,
    /// Upper bound for exponential backoff, in seconds.
    pub max_backoff_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffKind::Fixed,
            backoff_secs: 2.0,
            max_backoff_secs: 30.0,
        }
    }
}

/// HTTP client knobs applied to every curl handle (`[http]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Abort a transfer whose speed stays below this many bytes/sec ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Hard wall-clock limit for a single request.
    pub timeout_secs: u64,
    pub max_redirections: u32,
    /// Receive buffer size handed to libcurl; bounds each streamed write.
    pub buffer_size: usize,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            timeout_secs: 3600,
            max_redirections: 10,
            buffer_size: 32 * 1024,
            user_agent: concat!("sdm/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Capability detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStrategy {
    /// One `Range: bytes=0-1` GET answers both size and range support.
    #[default]
    Combined,
    /// HEAD for metadata, then a separate range test request.
    Head,
}

/// Global configuration loaded from `~/.config/sdm/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SdmConfig {
    pub probe: ProbeStrategy,
    /// Stop sibling chunks once any chunk has exhausted its retries.
    pub abort_on_chunk_failure: bool,
    pub retry: RetryConfig,
    pub http: HttpConfig,
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        secs_to_duration(self.backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        secs_to_duration(self.max_backoff_secs)
    }

    /// Rejects delays that are negative, NaN, infinite or too large for a `Duration`.
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("retry.backoff_secs", self.backoff_secs),
            ("retry.max_backoff_secs", self.max_backoff_secs),
        ] {
            if secs < 0.0 || Duration::try_from_secs_f64(secs).is_err() {
                anyhow::bail!("{name} must be a non-negative number of seconds, got {secs}");
            }
        }
        Ok(())
    }
}

/// Negative and NaN map to zero, out-of-range values saturate.
fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

impl SdmConfig {
    pub fn validate(&self) -> Result<()> {
        self.retry.validate()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SdmConfig::default();
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

/// Load configuration from an explicit file. Missing keys take their defaults.
pub fn load_from_path(path: &Path) -> Result<SdmConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SdmConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
