//! Literal encoders
//!
//! Query text is embedded by encoding it, never by splicing it into a raw
//! string, so nothing inside the query can terminate the literal early.

/// Encode `text` as a C++ string literal expression
///
/// Multi-line text becomes a sequence of adjacent literals, one per line,
/// which the compiler concatenates. `\`, `"` and control characters are
/// escaped; control characters use three-digit octal escapes so a following
/// digit can never extend them. Non-ASCII UTF-8 passes through unchanged.
pub fn cpp_string_literal(text: &str) -> String {
    if text.is_empty() {
        return "\"\"".to_string();
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut lines = text.split_inclusive('\n').peekable();

    while let Some(line) = lines.next() {
        out.push('"');
        for c in line.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                // `??x` trigraphs
                '?' => out.push_str("\\?"),
                c if c.is_ascii_control() => {
                    out.push_str(&format!("\\{:03o}", c as u32));
                }
                c => out.push(c),
            }
        }
        out.push('"');

        if lines.peek().is_some() {
            out.push_str("\n        ");
        }
    }

    out
}

/// Quote `text` as an SQL string literal (`'` doubled)
pub fn sql_string_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
