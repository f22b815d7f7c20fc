//! Ranged execution: one supervised blocking task per chunk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::SdmConfig;
use crate::downloader::{fetch_chunk, CurlOptions};
use crate::retry::{run_with_retry, ChunkError, ChunkOutcome, RetryPolicy};
use crate::segmenter::plan_chunks;

use super::{
    create_destination, Progress, TransferError, TransferMode, TransferSpec, TransferState,
};

/// Plans, pre-sizes and downloads every chunk. Returns (chunk count, outcomes
/// ordered by index, bytes written). Fails with `ExhaustedRetries` when any
/// chunk failed; all tasks are awaited first either way.
pub(super) async fn run_ranged(
    spec: &TransferSpec,
    requested_workers: usize,
    cfg: &SdmConfig,
    curl: &CurlOptions,
    progress: &Progress,
) -> Result<(usize, Vec<ChunkOutcome>, u64), TransferError> {
    let total_size = spec.total_size.unwrap_or(0);

    progress.set_state(TransferState::RangedPlanning);
    let plan = plan_chunks(total_size, requested_workers);
    let chunk_count = plan.len();
    tracing::info!(total_size, chunk_count, requested_workers, "chunk plan ready");
    progress.set_mode(TransferMode::Ranged {
        chunks: chunk_count,
    });

    let dest = create_destination(&spec.destination, Some(total_size))?;

    progress.set_state(TransferState::RangedExecuting);
    let policy = RetryPolicy::from(&cfg.retry);
    let abort = Arc::new(AtomicBool::new(false));
    let abort_on_failure = cfg.abort_on_chunk_failure;

    let mut outcomes = Vec::with_capacity(chunk_count);
    let mut handles = Vec::with_capacity(chunk_count);
    for range in plan.iter().copied() {
        if range.is_empty() {
            outcomes.push(ChunkOutcome::empty(range));
            continue;
        }
        let url = spec.url.clone();
        let dest = dest.clone();
        let progress = progress.clone();
        let curl = curl.clone();
        let abort = Arc::clone(&abort);
        handles.push(tokio::task::spawn_blocking(move || {
            let abort: &AtomicBool = &abort;
            let outcome = run_with_retry(&policy, range, Some(abort), |attempt| {
                tracing::debug!(chunk = %range, attempt, "fetching chunk");
                fetch_chunk(
                    &url,
                    &range,
                    total_size,
                    &dest,
                    &progress,
                    Some(abort),
                    &curl,
                )
            });
            let doomed = matches!(&outcome.error, Some(e) if !matches!(e, ChunkError::Aborted));
            if doomed && abort_on_failure {
                abort.store(true, Ordering::Relaxed);
            }
            outcome
        }));
    }

    let mut join_error = None;
    for handle in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                tracing::error!(error = %e, "chunk task did not finish");
                join_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = join_error {
        return Err(TransferError::Task(e));
    }
    outcomes.sort_by_key(|o| o.index());

    let failed_count = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed_count > 0 {
        let (failed, _ok): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(|o| !o.is_success());
        return Err(TransferError::ExhaustedRetries {
            failed,
            chunk_count,
        });
    }

    dest.sync()
        .map_err(|e| TransferError::io("sync", &spec.destination, e))?;
    let bytes_written = outcomes.iter().map(|o| o.bytes_written).sum();
    Ok((chunk_count, outcomes, bytes_written))
}
