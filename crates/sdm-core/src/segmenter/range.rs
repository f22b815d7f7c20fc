//! Chunk type and range planning.

use super::workers::resolve_worker_count;

/// One chunk of the resource: byte range [start, end) (half-open).
///
/// The wire format uses inclusive bounds; see [`ChunkRange::first`] and
/// [`ChunkRange::last`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Position in the plan, 0-based.
    pub index: usize,
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl ChunkRange {
    /// Length of this chunk in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First byte offset (inclusive).
    pub fn first(&self) -> u64 {
        self.start
    }

    /// Last byte offset (inclusive), `None` for the zero-length chunk.
    pub fn last(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - 1)
        }
    }

    /// libcurl range string: `first-last`.
    pub fn curl_range(&self) -> Option<String> {
        self.last().map(|last| format!("{}-{}", self.start, last))
    }

    /// HTTP Range header value: `bytes=first-last`.
    pub fn range_header_value(&self) -> Option<String> {
        self.curl_range().map(|r| format!("bytes={}", r))
    }
}

impl std::fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.last() {
            Some(last) => write!(f, "#{} [{}-{}]", self.index, self.start, last),
            None => write!(f, "#{} [empty]", self.index),
        }
    }
}

/// Ordered, gap-free partition of `[0, total_size)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub total_size: u64,
    pub chunks: Vec<ChunkRange>,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChunkRange> {
        self.chunks.iter()
    }
}

/// Builds the chunk plan for `total_size` bytes.
///
/// `requested_workers == 0` selects the size heuristic. Every chunk but the
/// last spans `total_size / workers` bytes; the last absorbs the remainder,
/// so it is at most `workers - 1` bytes longer than the others. An empty
/// resource yields a single zero-length chunk.
pub fn plan_chunks(total_size: u64, requested_workers: usize) -> ChunkPlan {
    let workers = resolve_worker_count(total_size, requested_workers);
    if total_size == 0 {
        return ChunkPlan {
            total_size,
            chunks: vec![ChunkRange {
                index: 0,
                start: 0,
                end: 0,
            }],
        };
    }

    let base = total_size / workers as u64;
    let mut chunks = Vec::with_capacity(workers);
    for i in 0..workers {
        let start = i as u64 * base;
        let end = if i + 1 == workers {
            total_size
        } else {
            start + base
        };
        chunks.push(ChunkRange {
            index: i,
            start,
            end,
        });
    }

    ChunkPlan { total_size, chunks }
}
