//! PostgreSQL literal quoting.
//!
//! All untrusted text that ends up in a batch goes through [`quote_literal`];
//! statement text is never assembled from raw values.

/// Quote a value as a PostgreSQL string literal, or `NULL` for `None`.
///
/// Single quotes are doubled. Values containing a backslash are written as
/// escape-string literals (`E'...'`) with the backslashes doubled, so the
/// result is read the same regardless of `standard_conforming_strings`. NUL
/// characters cannot be stored in `text` columns and are dropped.
pub fn quote_literal(value: Option<&str>) -> String {
    let value = match value {
        Some(v) => v,
        None => return "NULL".to_string(),
    };

    let has_backslash = value.contains('\\');
    let mut quoted = String::with_capacity(value.len() + 3);
    if has_backslash {
        quoted.push('E');
    }
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("''"),
            '\\' => quoted.push_str("\\\\"),
            '\0' => {}
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Render an optional integer, `NULL` when absent
pub fn integer_literal(value: Option<i32>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "NULL".to_string(),
    }
}
