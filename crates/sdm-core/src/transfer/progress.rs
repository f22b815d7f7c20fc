//! Progress shared by all chunk tasks.
//!
//! The byte counter is the only state chunk tasks mutate together; it is a
//! single `AtomicU64` updated with `fetch_add`/`fetch_sub`. Renderers poll
//! [`Progress::snapshot`] at their own pace.

use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::state::TransferState;
use super::TransferMode;

const UNKNOWN_TOTAL: u64 = u64::MAX;
const MODE_UNSET: usize = 0;
const MODE_SINGLE_STREAM: usize = usize::MAX;

struct Inner {
    bytes_done: AtomicU64,
    total: AtomicU64,
    state: AtomicU8,
    /// Chunk count once planned; see `MODE_*` for the other values.
    mode: AtomicUsize,
    started: Instant,
}

/// Cloneable handle to the progress of one transfer.
#[derive(Clone)]
pub struct Progress {
    inner: Arc<Inner>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                bytes_done: AtomicU64::new(0),
                total: AtomicU64::new(UNKNOWN_TOTAL),
                state: AtomicU8::new(TransferState::Idle as u8),
                mode: AtomicUsize::new(MODE_UNSET),
                started: Instant::now(),
            }),
        }
    }

    pub fn add(&self, n: u64) {
        self.inner.bytes_done.fetch_add(n, Ordering::Relaxed);
    }

    /// Take back bytes counted by an attempt that failed.
    pub fn sub(&self, n: u64) {
        if n > 0 {
            self.inner.bytes_done.fetch_sub(n, Ordering::Relaxed);
        }
    }

    pub fn bytes_done(&self) -> u64 {
        self.inner.bytes_done.load(Ordering::Relaxed)
    }

    pub fn set_total(&self, total: Option<u64>) {
        self.inner
            .total
            .store(total.unwrap_or(UNKNOWN_TOTAL), Ordering::Relaxed);
    }

    pub fn total(&self) -> Option<u64> {
        match self.inner.total.load(Ordering::Relaxed) {
            UNKNOWN_TOTAL => None,
            n => Some(n),
        }
    }

    pub fn state(&self) -> TransferState {
        TransferState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, next: TransferState) {
        let prev = TransferState::from_u8(self.inner.state.swap(next as u8, Ordering::AcqRel));
        tracing::debug!(from = %prev, to = %next, "transfer state");
    }

    /// How the body is being fetched; `None` until planning is done.
    pub fn mode(&self) -> Option<TransferMode> {
        match self.inner.mode.load(Ordering::Acquire) {
            MODE_UNSET => None,
            MODE_SINGLE_STREAM => Some(TransferMode::SingleStream),
            chunks => Some(TransferMode::Ranged { chunks }),
        }
    }

    pub(crate) fn set_mode(&self, mode: TransferMode) {
        let raw = match mode {
            TransferMode::Ranged { chunks } => chunks.clamp(1, MODE_SINGLE_STREAM - 1),
            TransferMode::SingleStream => MODE_SINGLE_STREAM,
        };
        self.inner.mode.store(raw, Ordering::Release);
    }

    pub fn snapshot(&self) -> ProgressStats {
        ProgressStats {
            bytes_done: self.bytes_done(),
            total_bytes: self.total(),
            elapsed_secs: self.inner.started.elapsed().as_secs_f64(),
            state: self.state(),
            mode: self.mode(),
        }
    }
}

/// Snapshot of transfer progress (CLI-friendly).
#[derive(Debug, Clone, Copy)]
pub struct ProgressStats {
    /// Bytes written so far.
    pub bytes_done: u64,
    /// Total size, if known.
    pub total_bytes: Option<u64>,
    /// Seconds since the progress handle was created.
    pub elapsed_secs: f64,
    pub state: TransferState,
    pub mode: Option<TransferMode>,
}

impl ProgressStats {
    /// Average rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if total is unknown or rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes?.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0]; None when the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes? {
            0 => Some(1.0),
            t => Some((self.bytes_done as f64 / t as f64).min(1.0)),
        }
    }
}
