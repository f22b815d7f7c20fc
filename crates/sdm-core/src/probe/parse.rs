//! Parse HTTP response header lines collected from curl callbacks.

/// Status and headers of the final response (redirect hops are discarded).
#[derive(Debug, Clone, Default)]
pub(crate) struct ResponseHead {
    /// Status code from the last status line seen, 0 if none.
    pub status: u32,
    headers: Vec<(String, String)>,
}

/// What the `Accept-Ranges` header said.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptRanges {
    Bytes,
    /// `Accept-Ranges: none` (or another unit we cannot use).
    Denied,
    Absent,
}

/// Parsed `Content-Range` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// Inclusive `first-last`, `None` for the unsatisfied form `*/len`.
    pub range: Option<(u64, u64)>,
    /// Complete length, `None` when the server sent `*`.
    pub complete_length: Option<u64>,
}

impl ResponseHead {
    /// Feed one raw header line. A status line starts a new response, which
    /// drops headers of any previous (redirect) response.
    pub fn push_line(&mut self, data: &[u8]) {
        let Ok(line) = std::str::from_utf8(data) else {
            return;
        };
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            self.status = parse_status_line(line).unwrap_or(0);
            self.headers.clear();
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            self.headers
                .push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    /// Last value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")?.parse().ok()
    }

    pub fn accept_ranges(&self) -> AcceptRanges {
        match self.header("accept-ranges") {
            None => AcceptRanges::Absent,
            Some(v) if v.split(',').any(|u| u.trim().eq_ignore_ascii_case("bytes")) => {
                AcceptRanges::Bytes
            }
            Some(_) => AcceptRanges::Denied,
        }
    }

    pub fn content_range(&self) -> Option<&str> {
        self.header("content-range")
    }
}

/// `HTTP/1.1 206 Partial Content` → 206.
fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Parses `bytes first-last/len`, `bytes first-last/*` and `bytes */len`.
pub fn parse_content_range(value: &str) -> Option<ContentRange> {
    let value = value.trim();
    let (unit, rest) = value.split_once(char::is_whitespace)?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    let (range, complete) = rest.trim().split_once('/')?;
    let complete_length = match complete.trim() {
        "*" => None,
        n => Some(n.parse::<u64>().ok()?),
    };
    let range = match range.trim() {
        "*" => None,
        r => {
            let (first, last) = r.split_once('-')?;
            let first = first.trim().parse::<u64>().ok()?;
            let last = last.trim().parse::<u64>().ok()?;
            if last < first {
                return None;
            }
            Some((first, last))
        }
    };
    if range.is_none() && complete_length.is_none() {
        return None;
    }
    Some(ContentRange {
        range,
        complete_length,
    })
}
