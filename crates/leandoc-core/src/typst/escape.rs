// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Escaping for the two Typst output contexts.

/// Escapes text for the Typst markup context.
///
/// A backslash is prefixed to every character Typst could read as markup:
/// `\ * _ ` # [ ] < >`.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '#' | '[' | ']' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escapes text for a Typst `"…"` string literal.
///
/// Backslashes and quotes are escaped, newlines become `\n`, and carriage
/// returns are dropped.
#[must_use]
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_escape_covers_markup_characters() {
        assert_eq!(escape_text("a*b_c"), "a\\*b\\_c");
        assert_eq!(escape_text("[x] <y>"), "\\[x\\] \\<y\\>");
        assert_eq!(escape_text("#1 `m` \\"), "\\#1 \\`m\\` \\\\");
        assert_eq!(escape_text("plain text."), "plain text.");
    }

    #[test]
    fn string_escape() {
        assert_eq!(escape_string("a\"b"), "a\\\"b");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
        assert_eq!(escape_string("line1\nline2"), "line1\\nline2");
        assert_eq!(escape_string("drop\rthis"), "dropthis");
    }
}
