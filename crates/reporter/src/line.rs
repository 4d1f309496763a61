//! Wavefront plaintext line-protocol rendering.

/// Render one metric observation as a line-protocol string.
///
/// `<name> <value> [<timestamp>] source="<source>" <tag_str>`
///
/// The timestamp segment is present only when a timestamp is supplied. The
/// newline terminator is a delivery concern and is not appended here. Inputs
/// are not validated; `name` must not contain embedded whitespace.
pub fn format_line(
    name: &str,
    value: f64,
    timestamp: Option<u64>,
    source: &str,
    tag_str: &str,
) -> String {
    match timestamp {
        Some(ts) => format!("{name} {value} {ts} source=\"{source}\" {tag_str}"),
        None => format!("{name} {value} source=\"{source}\" {tag_str}"),
    }
}
