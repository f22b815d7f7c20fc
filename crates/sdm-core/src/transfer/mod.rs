//! Transfer coordinator: probe, plan, pre-size, fetch chunks concurrently,
//! aggregate.
//!
//! Each chunk runs on tokio's blocking pool as one task wrapping the retry
//! supervisor around a ranged GET. The coordinator awaits every task before
//! deciding the outcome; completion order is irrelevant because each task
//! only ever writes its own byte range. When the probe finds ranges unusable
//! the whole body is streamed by the single-stream fallback instead.

mod error;
mod fallback;
mod progress;
mod run;
mod state;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::SdmConfig;
use crate::downloader::CurlOptions;
use crate::probe::{self, ProbeResult};
use crate::retry::ChunkOutcome;
use crate::storage::{DestinationFile, DestinationFileBuilder};

pub use error::TransferError;
pub use progress::{Progress, ProgressStats};
pub use state::TransferState;

/// What the caller asks for.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub url: String,
    pub destination: PathBuf,
    /// Explicit worker count; 0 selects the size heuristic.
    pub workers: usize,
}

/// Facts fixed after probing; immutable for the rest of the transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSpec {
    pub url: String,
    pub destination: PathBuf,
    pub total_size: Option<u64>,
    pub supports_ranges: bool,
}

impl TransferSpec {
    fn new(request: &TransferRequest, probed: ProbeResult) -> Self {
        Self {
            url: request.url.clone(),
            destination: request.destination.clone(),
            total_size: probed.total_size,
            supports_ranges: probed.supports_ranges,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Ranged { chunks: usize },
    SingleStream,
}

/// Result of a completed transfer.
#[derive(Debug)]
pub struct TransferReport {
    pub spec: TransferSpec,
    pub mode: TransferMode,
    pub bytes_written: u64,
    /// Per-chunk outcomes ordered by index (empty for single-stream).
    pub outcomes: Vec<ChunkOutcome>,
    pub elapsed: Duration,
}

/// Downloads `request.url` into `request.destination`.
///
/// Probe failures abort before the destination is created. On any later
/// failure the destination is left on disk as written so far.
pub async fn download(
    request: &TransferRequest,
    cfg: &SdmConfig,
    progress: &Progress,
) -> Result<TransferReport, TransferError> {
    let started = Instant::now();
    let curl = CurlOptions::from(&cfg.http);

    progress.set_state(TransferState::Probing);
    let probed = match probe_blocking(&request.url, cfg, &curl).await {
        Ok(p) => p,
        Err(e) => {
            progress.set_state(TransferState::Failed);
            tracing::error!(url = %request.url, error = %e, "probe failed");
            return Err(e);
        }
    };
    let spec = TransferSpec::new(request, probed);
    progress.set_total(spec.total_size);

    let result = if spec.supports_ranges {
        run::run_ranged(&spec, request.workers, cfg, &curl, progress)
            .await
            .map(|(chunks, outcomes, bytes)| (TransferMode::Ranged { chunks }, outcomes, bytes))
    } else {
        tracing::info!(url = %spec.url, "ranges not usable, falling back to single stream");
        fallback::run_single_stream(&spec, &curl, progress)
            .await
            .map(|bytes| (TransferMode::SingleStream, Vec::new(), bytes))
    };

    match result {
        Ok((mode, outcomes, bytes_written)) => {
            progress.set_state(TransferState::Completed);
            let elapsed = started.elapsed();
            tracing::info!(
                path = %spec.destination.display(),
                bytes_written,
                ?mode,
                ?elapsed,
                "transfer completed"
            );
            Ok(TransferReport {
                spec,
                mode,
                bytes_written,
                outcomes,
                elapsed,
            })
        }
        Err(e) => {
            progress.set_state(TransferState::Failed);
            tracing::error!(path = %spec.destination.display(), error = %e, "transfer failed");
            Err(e)
        }
    }
}

async fn probe_blocking(
    url: &str,
    cfg: &SdmConfig,
    curl: &CurlOptions,
) -> Result<ProbeResult, TransferError> {
    let url = url.to_string();
    let strategy = cfg.probe;
    let curl = curl.clone();
    let probed = tokio::task::spawn_blocking(move || probe::probe(&url, strategy, &curl)).await??;
    Ok(probed)
}

/// Creates (truncating) the destination and pre-sizes it when the size is known.
fn create_destination(path: &Path, size: Option<u64>) -> Result<DestinationFile, TransferError> {
    let mut builder = DestinationFileBuilder::create(path)
        .map_err(|e| TransferError::io("create", path, e))?;
    if let Some(n) = size {
        builder
            .presize(n)
            .map_err(|e| TransferError::io("pre-size", path, e))?;
    }
    Ok(builder.build())
}
