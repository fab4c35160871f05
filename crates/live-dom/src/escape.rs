//! Escaping of identifiers and strings for selector text.

/// Escape an identifier (id or class) for use after `#` / `.`, with CSSOM
/// `CSS.escape` semantics. `None` when the identifier cannot be expressed.
pub fn escape_identifier(ident: &str) -> Option<String> {
    if ident.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(ident.len());
    cssparser::serialize_identifier(ident, &mut out).ok()?;
    Some(out)
}

/// Quote a value for an attribute selector (`[name="value"]`).
pub fn escape_string(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len() + 2);
    cssparser::serialize_string(value, &mut out).ok()?;
    Some(out)
}
