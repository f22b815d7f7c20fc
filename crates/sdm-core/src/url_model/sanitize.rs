//! Filename cleanup before a URL-derived name touches the filesystem.

/// Linux NAME_MAX, in bytes.
const NAME_MAX: usize = 255;

fn is_unsafe(c: char) -> bool {
    matches!(c, '\0' | '/' | '\\' | ' ' | '\t') || c.is_control()
}

/// Makes `name` safe to create in the output directory.
///
/// Separators, whitespace and control characters become `_` (runs collapse to
/// one), leading and trailing dots and underscores are dropped, and the
/// result is cut to NAME_MAX bytes on a char boundary. May return an empty
/// string; callers substitute a default.
pub fn sanitize_filename_for_linux(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if !is_unsafe(c) && c != '_' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
