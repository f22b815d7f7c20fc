use crate::segmenter::ChunkRange;

use super::error::ChunkError;

/// Final result of a supervised chunk.
#[derive(Debug)]
pub struct ChunkOutcome {
    pub range: ChunkRange,
    /// Bytes written by the successful attempt (0 on failure).
    pub bytes_written: u64,
    /// Attempts actually made, including the first.
    pub attempts: u32,
    /// Last error once attempts are exhausted; `None` on success.
    pub error: Option<ChunkError>,
}

impl ChunkOutcome {
    pub fn index(&self) -> usize {
        self.range.index
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Outcome of a zero-length chunk: complete without any request.
    pub fn empty(range: ChunkRange) -> Self {
        Self {
            range,
            bytes_written: 0,
            attempts: 0,
            error: None,
        }
    }
}
