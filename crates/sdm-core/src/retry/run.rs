//! Retry loop: run a chunk attempt until success or the policy says stop.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::segmenter::ChunkRange;

use super::error::ChunkError;
use super::outcome::ChunkOutcome;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `attempt_fn` for `range` until it succeeds or the policy gives up.
///
/// `attempt_fn` receives the 1-based attempt number and returns the bytes
/// written. Between attempts the calling thread sleeps for the backoff delay.
/// When `abort` is raised the loop stops before the next attempt.
pub fn run_with_retry<F>(
    policy: &RetryPolicy,
    range: ChunkRange,
    abort: Option<&AtomicBool>,
    mut attempt_fn: F,
) -> ChunkOutcome
where
    F: FnMut(u32) -> Result<u64, ChunkError>,
{
    let aborted = || abort.is_some_and(|a| a.load(Ordering::Relaxed));
    let mut attempt = 1u32;
    loop {
        if aborted() {
            return ChunkOutcome {
                range,
                bytes_written: 0,
                attempts: attempt - 1,
                error: Some(ChunkError::Aborted),
            };
        }
        match attempt_fn(attempt) {
            Ok(bytes_written) => {
                tracing::debug!(chunk = %range, attempt, bytes_written, "chunk complete");
                return ChunkOutcome {
                    range,
                    bytes_written,
                    attempts: attempt,
                    error: None,
                };
            }
            Err(e) => match policy.decide(attempt, e.kind()) {
                RetryDecision::NoRetry => {
                    tracing::warn!(chunk = %range, attempts = attempt, error = %e, "chunk failed");
                    return ChunkOutcome {
                        range,
                        bytes_written: 0,
                        attempts: attempt,
                        error: Some(e),
                    };
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        chunk = %range,
                        attempt,
                        error = %e,
                        "chunk attempt failed, retrying in {:?}",
                        delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            },
        }
    }
}
