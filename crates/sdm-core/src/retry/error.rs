//! Error returned by a single chunk attempt.

use thiserror::Error;

use super::policy::ErrorKind;

/// Failure of one ranged GET attempt. Every variant except `Aborted` is retried.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Curl reported an error (connect, DNS, TLS, timeout, reset).
    #[error("transport: {0}")]
    Transport(#[from] curl::Error),
    /// The response status was not 206 Partial Content.
    #[error("expected HTTP 206 Partial Content, got HTTP {0}")]
    UnexpectedStatus(u32),
    /// The Content-Range header does not describe the requested range.
    #[error("Content-Range mismatch: expected `{expected}`, got `{actual}`")]
    ContentRange { expected: String, actual: String },
    /// The server sent more bytes than the requested range holds.
    #[error("server sent more than the {expected} bytes requested")]
    Overrun { expected: u64 },
    /// The body ended before the whole range arrived.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    Truncated { expected: u64, received: u64 },
    /// Positioned write into the destination failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// Stopped because a sibling chunk exhausted its retries.
    #[error("aborted after another chunk failed")]
    Aborted,
}

impl ChunkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChunkError::Transport(_) | ChunkError::Truncated { .. } => ErrorKind::Transport,
            ChunkError::UnexpectedStatus(_)
            | ChunkError::ContentRange { .. }
            | ChunkError::Overrun { .. } => ErrorKind::ProtocolMismatch,
            ChunkError::Storage(_) => ErrorKind::Io,
            ChunkError::Aborted => ErrorKind::Aborted,
        }
    }
}
