//! HTTP transfer primitives built on libcurl easy handles.
//!
//! `chunk` performs one ranged GET into its slice of the destination file;
//! `single` streams a whole body when ranges are not usable. Both are
//! blocking and run on tokio's blocking pool.

mod chunk;
mod single;

use std::time::Duration;

use crate::config::HttpConfig;

pub use chunk::fetch_chunk;
pub use single::{download_single, SingleStreamError};

/// Options applied to every curl handle.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub timeout: Duration,
    pub max_redirections: u32,
    pub buffer_size: usize,
    pub user_agent: String,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for CurlOptions {
    fn from(cfg: &HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            low_speed_limit: cfg.low_speed_limit,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            max_redirections: cfg.max_redirections,
            buffer_size: cfg.buffer_size,
            user_agent: cfg.user_agent.clone(),
        }
    }
}

impl CurlOptions {
    /// Applies redirects, timeouts, buffer size and user agent to `easy`.
    pub fn configure(&self, easy: &mut curl::easy::Easy) -> Result<(), curl::Error> {
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirections)?;
        easy.connect_timeout(self.connect_timeout)?;
        // Prefer the low-speed timeout so large chunks on slow links are not
        // killed by the wall-clock limit; the hard timeout is a safety net.
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;
        easy.timeout(self.timeout)?;
        easy.buffer_size(self.buffer_size)?;
        easy.useragent(&self.user_agent)?;
        Ok(())
    }
}
