//! Capability probe: object size and real byte-range support.
//!
//! Uses the curl crate (libcurl). A server counts as range-capable only when it
//! advertises ranges *and* answers a real `bytes=0-1` request with 206 and a
//! matching `Content-Range`. The default strategy lets that single ranged GET
//! answer both questions; the HEAD strategy asks HEAD first and then runs the
//! same test request.

mod parse;

use std::cell::{Cell, RefCell};
use std::time::Duration;

use thiserror::Error;

use crate::config::ProbeStrategy;
use crate::downloader::CurlOptions;
use crate::retry::ErrorKind;

pub use parse::{parse_content_range, AcceptRanges, ContentRange};
pub(crate) use parse::ResponseHead;

/// Test range requested by the probe (libcurl form of `bytes=0-1`).
const PROBE_RANGE: &str = "0-1";
/// Probe bodies are tiny; anything beyond this is cut off.
const PROBE_BODY_LIMIT: u64 = 2;
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// What the probe learned about the remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    /// Total size in bytes. Always `Some` when `supports_ranges` is true.
    pub total_size: Option<u64>,
    /// Server advertised ranges and honored the test range correctly.
    pub supports_ranges: bool,
}

/// Fatal probe failure. No destination file exists yet when this is returned.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe request failed: {0}")]
    Transport(#[from] curl::Error),
    #[error("probe returned HTTP {0}")]
    Status(u32),
    #[error("server did not report the object size")]
    MissingLength,
    #[error("invalid Content-Range `{0}`")]
    InvalidContentRange(String),
}

impl ProbeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::Transport(_) => ErrorKind::Transport,
            ProbeError::Status(_)
            | ProbeError::MissingLength
            | ProbeError::InvalidContentRange(_) => ErrorKind::ProtocolMismatch,
        }
    }
}

/// Probes `url` with the given strategy.
///
/// Blocking; call from `spawn_blocking` when used from async code.
pub fn probe(
    url: &str,
    strategy: ProbeStrategy,
    curl: &CurlOptions,
) -> Result<ProbeResult, ProbeError> {
    let result = match strategy {
        ProbeStrategy::Combined => evaluate_range_response(&range_request(url, curl)?),
        ProbeStrategy::Head => probe_head(url, curl),
    }?;
    tracing::info!(
        url,
        total_size = ?result.total_size,
        supports_ranges = result.supports_ranges,
        "probe complete"
    );
    Ok(result)
}

/// HEAD for metadata, then the test range request when ranges are advertised.
fn probe_head(url: &str, curl: &CurlOptions) -> Result<ProbeResult, ProbeError> {
    let head = head_request(url, curl)?;
    if !(200..300).contains(&head.status) {
        return Err(ProbeError::Status(head.status));
    }
    let length = head.content_length();
    if head.accept_ranges() != AcceptRanges::Bytes {
        tracing::debug!(url, "HEAD does not advertise byte ranges");
        return Ok(ProbeResult {
            total_size: length,
            supports_ranges: false,
        });
    }
    let total = length.ok_or(ProbeError::MissingLength)?;

    let test = range_request(url, curl)?;
    let supports_ranges = match evaluate_range_response(&test) {
        Ok(r) if r.supports_ranges && r.total_size == Some(total) => true,
        Ok(r) => {
            tracing::warn!(
                url,
                head_length = total,
                range_length = ?r.total_size,
                "advertised ranges not honored by test request, downgrading"
            );
            false
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "range test request failed, downgrading");
            false
        }
    };
    Ok(ProbeResult {
        total_size: Some(total),
        supports_ranges,
    })
}

/// Classifies the response to the `bytes=0-1` test request.
///
/// Only a malformed 206 is fatal here. Any other status means "no ranges";
/// error statuses are left to the single-stream GET to report.
fn evaluate_range_response(head: &ResponseHead) -> Result<ProbeResult, ProbeError> {
    match head.status {
        206 => {
            let raw = head.content_range().ok_or(ProbeError::MissingLength)?;
            let cr = parse_content_range(raw)
                .ok_or_else(|| ProbeError::InvalidContentRange(raw.to_string()))?;
            let total = cr.complete_length.ok_or(ProbeError::MissingLength)?;
            let advertised = head.accept_ranges() != AcceptRanges::Denied;
            let expected = (total > 0).then(|| (0, total.min(PROBE_BODY_LIMIT) - 1));
            let honored = cr.range.is_some() && cr.range == expected;
            if !(advertised && honored) {
                tracing::warn!(
                    content_range = raw,
                    advertised,
                    "partial content response unusable, downgrading"
                );
            }
            Ok(ProbeResult {
                total_size: Some(total),
                supports_ranges: advertised && honored,
            })
        }
        416 => {
            // An empty object cannot satisfy bytes=0-1; anything else is a
            // server refusing ranges.
            let cr = head.content_range().and_then(parse_content_range);
            if let Some(ContentRange {
                range: None,
                complete_length: Some(0),
            }) = cr
            {
                return Ok(ProbeResult {
                    total_size: Some(0),
                    supports_ranges: true,
                });
            }
            tracing::debug!("ranged probe refused with 416");
            Ok(ProbeResult {
                total_size: None,
                supports_ranges: false,
            })
        }
        s => {
            // The unranged GET decides whether the object is reachable at all.
            let success = (200..300).contains(&s);
            tracing::debug!(status = s, "ranged probe answered without partial content");
            Ok(ProbeResult {
                total_size: head.content_length().filter(|_| success),
                supports_ranges: false,
            })
        }
    }
}

/// Wall-clock limit for one probe request, never above the configured one.
fn probe_timeout(curl: &CurlOptions) -> Duration {
    curl.timeout.min(PROBE_TIMEOUT)
}

/// GET with `Range: bytes=0-1`. Bodies other than a small 206 are not downloaded.
fn range_request(url: &str, curl: &CurlOptions) -> Result<ResponseHead, ProbeError> {
    let head = RefCell::new(ResponseHead::default());
    let received = Cell::new(0u64);
    let cut_short = Cell::new(false);

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    curl.configure(&mut easy)?;
    easy.timeout(probe_timeout(curl))?;
    easy.range(PROBE_RANGE)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            head.borrow_mut().push_line(data);
            true
        })?;
        transfer.write_function(|data| {
            let total = received.get() + data.len() as u64;
            received.set(total);
            if head.borrow().status != 206 || total > PROBE_BODY_LIMIT {
                // Returning less than `data.len()` makes libcurl stop the transfer.
                cut_short.set(true);
                return Ok(0);
            }
            Ok(data.len())
        })?;
        transfer.perform()
    };
    match performed {
        Err(e) if e.is_write_error() && cut_short.get() => {}
        Err(e) => return Err(ProbeError::Transport(e)),
        Ok(()) => {}
    }

    let mut head = head.into_inner();
    if head.status == 0 {
        head.status = easy.response_code()?;
    }
    Ok(head)
}

fn head_request(url: &str, curl: &CurlOptions) -> Result<ResponseHead, ProbeError> {
    let head = RefCell::new(ResponseHead::default());

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    curl.configure(&mut easy)?;
    easy.timeout(probe_timeout(curl))?;
    easy.nobody(true)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            head.borrow_mut().push_line(data);
            true
        })?;
        transfer.perform()?;
    }

    let mut head = head.into_inner();
    if head.status == 0 {
        head.status = easy.response_code()?;
    }
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(lines: &[&str]) -> ResponseHead {
        let mut h = ResponseHead::default();
        for l in lines {
            h.push_line(l.as_bytes());
        }
        h
    }

    #[test]
    fn partial_content_is_range_capable() {
        let h = head(&[
            "HTTP/1.1 206 Partial Content",
            "Content-Range: bytes 0-1/10485760",
            "Accept-Ranges: bytes",
        ]);
        let r = evaluate_range_response(&h).unwrap();
        assert_eq!(r.total_size, Some(10_485_760));
        assert!(r.supports_ranges);
    }

    #[test]
    fn partial_content_without_accept_ranges_header_counts() {
        let h = head(&["HTTP/1.1 206 Partial Content", "Content-Range: bytes 0-1/500"]);
        assert!(evaluate_range_response(&h).unwrap().supports_ranges);
    }

    #[test]
    fn one_byte_object() {
        let h = head(&["HTTP/1.1 206 Partial Content", "Content-Range: bytes 0-0/1"]);
        let r = evaluate_range_response(&h).unwrap();
        assert_eq!(r.total_size, Some(1));
        assert!(r.supports_ranges);
    }

    #[test]
    fn wrong_range_is_downgraded() {
        let h = head(&[
            "HTTP/1.1 206 Partial Content",
            "Content-Range: bytes 0-499/500",
            "Accept-Ranges: bytes",
        ]);
        let r = evaluate_range_response(&h).unwrap();
        assert_eq!(r.total_size, Some(500));
        assert!(!r.supports_ranges);
    }

    #[test]
    fn explicit_denial_is_downgraded() {
        let h = head(&[
            "HTTP/1.1 206 Partial Content",
            "Content-Range: bytes 0-1/500",
            "Accept-Ranges: none",
        ]);
        assert!(!evaluate_range_response(&h).unwrap().supports_ranges);
    }

    #[test]
    fn full_body_means_fallback() {
        let h = head(&[
            "HTTP/1.1 200 OK",
            "Content-Length: 4096",
            "Accept-Ranges: bytes",
        ]);
        let r = evaluate_range_response(&h).unwrap();
        assert_eq!(r.total_size, Some(4096));
        assert!(!r.supports_ranges);
    }

    #[test]
    fn unknown_total_is_fatal() {
        let h = head(&["HTTP/1.1 206 Partial Content", "Content-Range: bytes 0-1/*"]);
        assert!(matches!(
            evaluate_range_response(&h),
            Err(ProbeError::MissingLength)
        ));
        let h = head(&["HTTP/1.1 206 Partial Content"]);
        assert!(matches!(
            evaluate_range_response(&h),
            Err(ProbeError::MissingLength)
        ));
        let h = head(&["HTTP/1.1 206 Partial Content", "Content-Range: garbage"]);
        assert!(matches!(
            evaluate_range_response(&h),
            Err(ProbeError::InvalidContentRange(_))
        ));
    }

    #[test]
    fn empty_object_unsatisfiable_range() {
        let h = head(&["HTTP/1.1 416 Range Not Satisfiable", "Content-Range: bytes */0"]);
        let r = evaluate_range_response(&h).unwrap();
        assert_eq!(r.total_size, Some(0));
        assert!(r.supports_ranges);

        let h = head(&["HTTP/1.1 416 Range Not Satisfiable", "Content-Range: bytes */10"]);
        let r = evaluate_range_response(&h).unwrap();
        assert_eq!(r.total_size, None);
        assert!(!r.supports_ranges);
    }

    #[test]
    fn error_statuses_downgrade_without_size() {
        for status in ["400 Bad Request", "404 Not Found", "501 Not Implemented"] {
            let status_line = format!("HTTP/1.1 {status}");
            let h = head(&[status_line.as_str(), "Content-Length: 120"]);
            let r = evaluate_range_response(&h).unwrap();
            assert_eq!(r.total_size, None, "{status}");
            assert!(!r.supports_ranges, "{status}");
        }
    }

    #[test]
    fn request_timeout_is_capped_by_config() {
        let mut curl = CurlOptions::default();
        assert_eq!(probe_timeout(&curl), PROBE_TIMEOUT);
        curl.timeout = Duration::from_secs(5);
        assert_eq!(probe_timeout(&curl), Duration::from_secs(5));
    }
}
