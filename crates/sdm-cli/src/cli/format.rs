//! Human-readable sizes, rates and durations (1024-based units).

use std::time::Duration;

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * KB;
const GB: f64 = 1024.0 * MB;

/// Two decimals in the largest unit the value strictly exceeds.
pub fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec > GB {
        format!("{:.2} GB", bytes_per_sec / GB)
    } else if bytes_per_sec > MB {
        format!("{:.2} MB", bytes_per_sec / MB)
    } else if bytes_per_sec > KB {
        format!("{:.2} KB", bytes_per_sec / KB)
    } else {
        format!("{:.2} B", bytes_per_sec)
    }
}

pub fn format_bytes(bytes: u64) -> String {
    format_speed(bytes as f64)
}

/// Rounded to milliseconds, e.g. `1.234s`, `2m3.500s`.
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    let mins = ms / 60_000;
    let rest = ms % 60_000;
    let secs = rest as f64 / 1000.0;
    if mins > 0 {
        format!("{}m{:.3}s", mins, secs)
    } else {
        format!("{:.3}s", secs)
    }
}
