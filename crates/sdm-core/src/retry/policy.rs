use std::time::Duration;

use crate::config::{BackoffKind, RetryConfig};

/// Classification of an error, shared by chunk and transfer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, DNS, TLS or timeout failure, or a body that ended early.
    Transport,
    /// Unexpected status code, or missing/invalid size and range headers.
    ProtocolMismatch,
    /// File create, pre-size, write or sync failure.
    Io,
    /// One or more chunks failed every attempt.
    ExhaustedRetries,
    /// Stopped on purpose after a sibling failed.
    Aborted,
    /// A worker task panicked.
    Internal,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Bounded retry: at most `max_retries + 1` attempts per chunk.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    pub backoff: BackoffKind,
    /// Delay before the first retry (every retry, when fixed).
    pub base_delay: Duration,
    /// Upper bound on exponential delays.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            backoff: cfg.backoff,
            base_delay: cfg.backoff(),
            max_delay: cfg.max_backoff(),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries immediately; used in tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffKind::Fixed,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts() || kind == ErrorKind::Aborted {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.delay(attempt))
    }

    fn delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.base_delay,
            BackoffKind::Exponential => {
                let exp = 1u32 << attempt.saturating_sub(1).min(16);
                self.base_delay
                    .saturating_mul(exp)
                    .min(self.max_delay.max(self.base_delay))
            }
        }
    }
}
