//! Single-stream execution for servers without usable ranges.

use crate::downloader::{download_single, CurlOptions};

use super::{Progress, TransferError, TransferMode, TransferSpec, TransferState};

/// Streams the whole body into a fresh destination. Any error is final; the
/// destination is only touched once the server has answered with 2xx.
pub(super) async fn run_single_stream(
    spec: &TransferSpec,
    curl: &CurlOptions,
    progress: &Progress,
) -> Result<u64, TransferError> {
    progress.set_mode(TransferMode::SingleStream);
    progress.set_state(TransferState::FallbackExecuting);

    let bytes_written = tokio::task::spawn_blocking({
        let url = spec.url.clone();
        let path = spec.destination.clone();
        let expected_len = spec.total_size;
        let progress = progress.clone();
        let curl = curl.clone();
        move || download_single(&url, &path, expected_len, &progress, &curl)
    })
    .await??;

    Ok(bytes_written)
}
