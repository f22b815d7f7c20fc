//! One ranged GET streamed into its slice of the destination file.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::probe::{parse_content_range, ContentRange, ResponseHead};
use crate::retry::ChunkError;
use crate::segmenter::ChunkRange;
use crate::storage::DestinationFile;
use crate::transfer::Progress;

use super::CurlOptions;

/// Downloads `range` of `url` and writes it at its absolute offset in `dest`.
///
/// Bytes are written as libcurl delivers them (bounded by the configured
/// buffer size), never buffered for the whole chunk. Progress counted by a
/// failed attempt is taken back before returning the error, so a retry starts
/// from a clean count. Returns the number of bytes written.
pub fn fetch_chunk(
    url: &str,
    range: &ChunkRange,
    total_size: u64,
    dest: &DestinationFile,
    progress: &Progress,
    abort: Option<&AtomicBool>,
    curl: &CurlOptions,
) -> Result<u64, ChunkError> {
    let written = Cell::new(0u64);
    let result = perform_ranged_get(url, range, total_size, dest, progress, abort, curl, &written);
    if result.is_err() {
        progress.sub(written.get());
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn perform_ranged_get(
    url: &str,
    range: &ChunkRange,
    total_size: u64,
    dest: &DestinationFile,
    progress: &Progress,
    abort: Option<&AtomicBool>,
    curl: &CurlOptions,
    written: &Cell<u64>,
) -> Result<u64, ChunkError> {
    let Some(curl_range) = range.curl_range() else {
        return Ok(0);
    };
    let expected_len = range.len();
    let head = RefCell::new(ResponseHead::default());
    let verified = Cell::new(false);
    let failure: RefCell<Option<ChunkError>> = RefCell::new(None);

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    curl.configure(&mut easy)?;
    easy.range(&curl_range)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            head.borrow_mut().push_line(data);
            true
        })?;
        transfer.write_function(|data| {
            let stop = |e: ChunkError| -> Result<usize, curl::easy::WriteError> {
                *failure.borrow_mut() = Some(e);
                // Short count aborts the transfer with a write error.
                Ok(0)
            };
            if abort.is_some_and(|a| a.load(Ordering::Relaxed)) {
                return stop(ChunkError::Aborted);
            }
            if !verified.get() {
                if let Err(e) = check_partial_response(&head.borrow(), range, total_size) {
                    return stop(e);
                }
                verified.set(true);
            }
            let off = written.get();
            let n = data.len() as u64;
            if off + n > expected_len {
                return stop(ChunkError::Overrun {
                    expected: expected_len,
                });
            }
            if let Err(e) = dest.write_at(range.start + off, data) {
                return stop(ChunkError::Storage(e));
            }
            written.set(off + n);
            progress.add(n);
            Ok(data.len())
        })?;
        transfer.perform()
    };

    if let Err(e) = performed {
        if let Some(f) = failure.borrow_mut().take() {
            return Err(f);
        }
        return Err(ChunkError::Transport(e));
    }

    let mut head = head.into_inner();
    if head.status == 0 {
        head.status = easy.response_code()?;
    }
    check_partial_response(&head, range, total_size)?;

    let received = written.get();
    if received != expected_len {
        return Err(ChunkError::Truncated {
            expected: expected_len,
            received,
        });
    }
    Ok(received)
}

/// The response must be 206 and its Content-Range must name exactly the
/// requested bytes; a complete length, when given, must match the probed size.
fn check_partial_response(
    head: &ResponseHead,
    range: &ChunkRange,
    total_size: u64,
) -> Result<(), ChunkError> {
    if head.status != 206 {
        return Err(ChunkError::UnexpectedStatus(head.status));
    }
    let last = range.last().unwrap_or(range.start);
    let expected = format!("bytes {}-{}/{}", range.start, last, total_size);
    let Some(raw) = head.content_range() else {
        return Err(ChunkError::ContentRange {
            expected,
            actual: String::new(),
        });
    };
    let matches = match parse_content_range(raw) {
        Some(ContentRange {
            range: Some((first, l)),
            complete_length,
        }) => first == range.start && l == last && complete_length.map_or(true, |t| t == total_size),
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(ChunkError::ContentRange {
            expected,
            actual: raw.to_string(),
        })
    }
}
