//! Display formatting for cell values
//!
//! Every function here returns an HTML fragment that is safe to embed in a page.

use crate::schema::CellValue;

/// Marker shown for SQL NULL
pub const NULL_MARKER: &str = r#"<span class="muted">NULL</span>"#;

/// Marker shown for a zero-length string, distinct from NULL
pub const EMPTY_STRING_MARKER: &str = r#"<span class="muted">Empty string</span>"#;

/// Render a cell value for display
///
/// Booleans and numbers are checked before the text path: they are written as
/// their canonical text and never escaped. Text is HTML-escaped exactly once.
pub fn format_value(value: &CellValue) -> String {
    match value {
        CellValue::Null => NULL_MARKER.to_string(),
        CellValue::Boolean(value) => value.to_string(),
        CellValue::Integer(value) => value.to_string(),
        CellValue::Float(value) => value.to_string(),
        CellValue::Text(text) if text.is_empty() => EMPTY_STRING_MARKER.to_string(),
        CellValue::Text(text) => escape_html(text),
        CellValue::Blob(bytes) => format!(r#"<span class="muted">BLOB ({} bytes)</span>"#, bytes.len()),
    }
}

/// Render a cell value for a table cell, cutting text to `max_characters`
///
/// The cut happens before escaping so an entity is never split.
pub fn format_value_truncated(value: &CellValue, max_characters: usize) -> String {
    match value {
        CellValue::Text(text) if text.chars().count() > max_characters => {
            let truncated: String = text.chars().take(max_characters).collect();
            escape_html(&truncated)
        }
        _ => format_value(value),
    }
}

/// Escape HTML special characters so text can be embedded in markup or attributes
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Percent-encode a value for use inside a URL query string
pub fn encode_query_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
