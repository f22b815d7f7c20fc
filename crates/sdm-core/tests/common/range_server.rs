//! Minimal HTTP/1.1 server for integration tests: HEAD and `Range` GET over a
//! single static body, with switches for misbehaving servers.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How a faulty chunk response misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// HTTP 500 with an empty body.
    ServerError,
    /// Correct 206 headers, but only half the bytes (Content-Length matches).
    ShortBody,
    /// Correct Content-Range, but extra bytes after the range.
    LongBody,
    /// Content-Range starts one byte late.
    WrongRange,
    /// Content-Range reports a complete length one larger than the body.
    WrongTotal,
    /// Ignores Range and answers 200 with the whole body.
    FullBody,
}

/// Makes ranged GETs starting at `start` misbehave the first `times` times
/// (`usize::MAX` = always).
#[derive(Debug, Clone, Copy)]
pub struct Fault {
    pub start: u64,
    pub times: usize,
    pub kind: FaultKind,
}

impl Fault {
    pub fn always(start: u64, kind: FaultKind) -> Self {
        Self {
            start,
            times: usize::MAX,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405.
    pub head_allowed: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// Send `Accept-Ranges: bytes` (independent of `support_ranges`).
    pub advertise_ranges: bool,
    /// Omit Content-Length on 200 responses; the body ends at connection close.
    pub hide_length: bool,
    /// Every request gets this status and an empty body.
    pub force_status: Option<u16>,
    /// Requests carrying Range get 416 `bytes */N`; plain GETs are served.
    pub reject_ranges: bool,
    pub fault: Option<Fault>,
    /// Sleep before answering ranged GETs that do not start at 0.
    pub chunk_delay: Option<Duration>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            support_ranges: true,
            advertise_ranges: true,
            hide_length: false,
            force_status: None,
            reject_ranges: false,
            fault: None,
            chunk_delay: None,
        }
    }
}

/// Handle to a running server.
#[derive(Clone)]
pub struct TestServer {
    pub url: String,
    requests: Arc<AtomicUsize>,
    faults_served: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn url_for(&self, name: &str) -> String {
        format!("{}{}", self.url, name)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn faults_served(&self) -> usize {
        self.faults_served.load(Ordering::SeqCst)
    }
}

/// Starts a well-behaved server for `body`. Runs until the process exits.
pub fn start(body: Vec<u8>) -> TestServer {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let server = TestServer {
        url: format!("http://127.0.0.1:{}/", port),
        requests: Arc::new(AtomicUsize::new(0)),
        faults_served: Arc::new(AtomicUsize::new(0)),
    };
    let state = server.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let state = state.clone();
            thread::spawn(move || handle(stream, &body, opts, &state));
        }
    });
    server
}

fn handle(mut stream: TcpStream, body: &[u8], opts: RangeServerOptions, state: &TestServer) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    state.requests.fetch_add(1, Ordering::SeqCst);
    let (method, range) = parse_request(request);
    let total = body.len() as u64;
    let accept_ranges = if opts.advertise_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if let Some(status) = opts.force_status {
        respond(&mut stream, &format!("{} Forced", status), &[], &[]);
        return;
    }

    if method.eq_ignore_ascii_case("HEAD") {
        if !opts.head_allowed {
            respond(&mut stream, "405 Method Not Allowed", &[], &[]);
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
            total, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", &[], &[]);
        return;
    }

    let ranged = match range {
        Some(r) if opts.support_ranges => r,
        _ => {
            let mut headers = vec![accept_ranges.to_string()];
            if !opts.hide_length {
                headers.push(format!("Content-Length: {}\r\n", total));
            }
            respond(&mut stream, "200 OK", &headers, body);
            return;
        }
    };

    let (start, end_incl) = ranged;
    if opts.reject_ranges {
        let headers = vec![format!("Content-Range: bytes */{}\r\n", total)];
        respond(&mut stream, "416 Range Not Satisfiable", &headers, &[]);
        return;
    }
    let fault = opts
        .fault
        .filter(|f| f.start == start && state.faults_served.load(Ordering::SeqCst) < f.times);
    if let Some(fault) = fault {
        state.faults_served.fetch_add(1, Ordering::SeqCst);
        if fault.kind == FaultKind::ServerError {
            respond(&mut stream, "500 Internal Server Error", &[], &[]);
            return;
        }
    }
    if let Some(delay) = opts.chunk_delay {
        if start > 0 {
            thread::sleep(delay);
        }
    }

    if start >= total || start > end_incl {
        let headers = vec![format!("Content-Range: bytes */{}\r\n", total)];
        respond(&mut stream, "416 Range Not Satisfiable", &headers, &[]);
        return;
    }
    let end_incl = end_incl.min(total - 1);
    let slice = &body[start as usize..=end_incl as usize];
    let (first, last, complete, sent) = match fault.map(|f| f.kind) {
        None | Some(FaultKind::ServerError) => (start, end_incl, total, slice.to_vec()),
        Some(FaultKind::ShortBody) => (start, end_incl, total, slice[..slice.len() / 2].to_vec()),
        Some(FaultKind::LongBody) => {
            let mut longer = slice.to_vec();
            longer.extend_from_slice(&[0xAA; 64]);
            (start, end_incl, total, longer)
        }
        Some(FaultKind::WrongRange) => (start + 1, end_incl, total, slice.to_vec()),
        Some(FaultKind::WrongTotal) => (start, end_incl, total + 1, slice.to_vec()),
        Some(FaultKind::FullBody) => {
            let headers = vec![
                accept_ranges.to_string(),
                format!("Content-Length: {}\r\n", total),
            ];
            respond(&mut stream, "200 OK", &headers, body);
            return;
        }
    };
    let headers = vec![
        accept_ranges.to_string(),
        format!("Content-Range: bytes {}-{}/{}\r\n", first, last, complete),
        format!("Content-Length: {}\r\n", sent.len()),
    ];
    respond(&mut stream, "206 Partial Content", &headers, &sent);
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[String], body: &[u8]) {
    let mut head = format!("HTTP/1.1 {}\r\n", status);
    for h in headers {
        head.push_str(h);
    }
    if body.is_empty() && !headers.iter().any(|h| h.starts_with("Content-Length")) {
        head.push_str("Content-Length: 0\r\n");
    }
    head.push_str("Connection: close\r\n\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

/// Returns (method, optional (start, end_inclusive) for `Range: bytes=X-Y`).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or("");
    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("range") {
            continue;
        }
        let Some(bytes) = value.trim().strip_prefix("bytes=") else {
            continue;
        };
        if let Some((a, b)) = bytes.split_once('-') {
            let start = a.trim().parse::<u64>().unwrap_or(0);
            let end = b.trim();
            let end_incl = if end.is_empty() {
                u64::MAX
            } else {
                end.parse::<u64>().unwrap_or(0)
            };
            range = Some((start, end_incl));
        }
    }
    (method, range)
}
