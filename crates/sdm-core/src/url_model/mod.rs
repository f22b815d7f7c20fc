//! Default output filename derivation.
//!
//! A `filename` query parameter wins; otherwise the last URL path segment is
//! used. Either way the result is sanitized for Linux filesystems.

mod path;
mod sanitize;

pub use path::{filename_from_query, filename_from_url_path};
pub use sanitize::sanitize_filename_for_linux;

/// Used when the URL yields nothing usable.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Derives a safe local filename for `url`.
///
/// # Examples
///
/// - `derive_filename("https://example.com/archive.zip")` → `"archive.zip"`
/// - `derive_filename("https://example.com/get?filename=report.pdf")` → `"report.pdf"`
pub fn derive_filename(url: &str) -> String {
    let raw = match filename_from_query(url).or_else(|| filename_from_url_path(url)) {
        Some(c) => c,
        None => return DEFAULT_FILENAME.to_string(),
    };

    let sanitized = sanitize_filename_for_linux(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}
