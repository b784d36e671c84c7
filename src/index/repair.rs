//! Repair of the index response body
//!
//! The index answers with JSON objects written back to back, without an
//! enclosing array or separators between them. This turns such a body into a
//! JSON array that `serde_json` can decode.
//!
//! The scan is purely textual: a `}` inside a string value is treated as the
//! end of an object, which corrupts that value or the whole body.

/// Wraps concatenated JSON objects into a JSON array.
///
/// An empty (or whitespace-only) body becomes `[]`.
pub fn repair_concatenated_json(body: &str) -> String {
    if body.trim().is_empty() {
        return "[]".to_string();
    }

    let closers = body.matches('}').count();
    let mut repaired = String::with_capacity(body.len() + closers + 2);
    repaired.push('[');
    let mut seen = 0;
    for c in body.chars() {
        repaired.push(c);
        if c == '}' {
            seen += 1;
            if seen < closers {
                repaired.push(',');
            }
        }
    }
    repaired.push(']');
    repaired
}
