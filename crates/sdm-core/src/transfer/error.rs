//! Transfer-level errors surfaced to the caller.

use std::path::PathBuf;

use thiserror::Error;

use crate::downloader::SingleStreamError;
use crate::probe::ProbeError;
use crate::retry::{ChunkOutcome, ErrorKind};

#[derive(Debug, Error)]
pub enum TransferError {
    /// Probe failed; nothing was written.
    #[error(transparent)]
    Probe(#[from] ProbeError),
    /// Destination create, pre-size or sync failed.
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// One or more chunks failed every attempt. The destination keeps the
    /// chunks that succeeded; failed ranges are left as pre-sized (zeros).
    #[error(
        "{} of {chunk_count} chunks failed after retries: {}",
        .failed.len(),
        describe_failures(.failed)
    )]
    ExhaustedRetries {
        failed: Vec<ChunkOutcome>,
        chunk_count: usize,
    },
    /// Single-stream fallback failed (no retry on this path).
    #[error(transparent)]
    Fallback(#[from] SingleStreamError),
    /// A transfer task panicked or was cancelled by the runtime.
    #[error("transfer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::Probe(e) => e.kind(),
            TransferError::Io { .. } => ErrorKind::Io,
            TransferError::ExhaustedRetries { .. } => ErrorKind::ExhaustedRetries,
            TransferError::Fallback(e) => e.kind(),
            TransferError::Task(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn io(op: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        TransferError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

fn describe_failures(failed: &[ChunkOutcome]) -> String {
    failed
        .iter()
        .map(|o| {
            let reason = o
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();
            format!("chunk {} after {} attempt(s): {}", o.range, o.attempts, reason)
        })
        .collect::<Vec<_>>()
        .join("; ")
}
