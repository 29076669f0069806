//! Path formatting and parsing
//!
//! Tree paths are JSON-pointer formatted (`/rows/0`), with `~0` and `~1`
//! escaping for `~` and `/` inside a segment. The root of a tree is written
//! as `/`.
//!
//! References use relative pointers: a count of levels to climb from the
//! base node, then an ordinary pointer down (`1/boxes/a`, or `0` for the
//! base itself).

/// Unescapes a path segment.
pub fn unescape_segment(segment: &str) -> String {
    if !segment.contains('~') {
        return segment.to_string();
    }
    segment.replace("~1", "/").replace("~0", "~")
}

/// Escapes a path segment.
pub fn escape_segment(segment: &str) -> String {
    if !segment.contains('/') && !segment.contains('~') {
        return segment.to_string();
    }
    segment.replace('~', "~0").replace('/', "~1")
}

/// Format path segments into a pointer string; no segments is the root `/`.
pub fn format_pointer(parts: &[String]) -> String {
    if parts.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for part in parts {
        out.push('/');
        out.push_str(&escape_segment(part));
    }
    out
}

/// Parse a pointer string into path segments.
///
/// Both `""` and `"/"` denote the root. A leading `/` is optional.
pub fn parse_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() || pointer == "/" {
        return Vec::new();
    }
    let body = pointer.strip_prefix('/').unwrap_or(pointer);
    body.split('/').map(unescape_segment).collect()
}

/// Parse an array index segment. Leading zeros and signs are rejected.
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Format a relative pointer that climbs `ups` levels, then follows `parts`.
pub fn format_relative(ups: usize, parts: &[String]) -> String {
    let mut out = ups.to_string();
    for part in parts {
        out.push('/');
        out.push_str(&escape_segment(part));
    }
    out
}

/// Parse a relative pointer into its climb count and downward segments.
pub fn parse_relative(pointer: &str) -> Option<(usize, Vec<String>)> {
    let (head, rest) = match pointer.find('/') {
        Some(i) => pointer.split_at(i),
        None => (pointer, ""),
    };
    let ups = parse_index(head)?;
    if rest.is_empty() {
        return Some((ups, Vec::new()));
    }
    Some((ups, rest[1..].split('/').map(unescape_segment).collect()))
}
