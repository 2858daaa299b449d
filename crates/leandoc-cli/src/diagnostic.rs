// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Rich error diagnostics using miette.
//!
//! Core errors carry 1-based line/column positions; this module converts
//! them into miette diagnostics with the offending source line labelled,
//! so the terminal report shows the context and an arrow.

use leandoc_core::parse::ParseError;
use leandoc_core::typst::GenError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A parse error bound to its source file for rendering.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(leandoc::parse))]
pub struct ParseDiagnostic {
    /// Human-readable error message.
    pub message: String,
    /// Source file for context.
    #[source_code]
    pub src: NamedSource<String>,
    /// Location of the error.
    #[label("here")]
    pub span: SourceSpan,
}

impl ParseDiagnostic {
    /// Binds a core parse error to its source text.
    pub fn new(err: &ParseError, path: &str, source: &str) -> Self {
        Self {
            message: err.message.to_string(),
            src: NamedSource::new(path, source.to_string()),
            span: span_at(source, err.line, err.column),
        }
    }
}

/// A generation error bound to its source file for rendering.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(leandoc::typst))]
pub struct GenDiagnostic {
    /// Human-readable error message.
    pub message: String,
    /// Source file for context.
    #[source_code]
    pub src: NamedSource<String>,
    /// Location of the offending node.
    #[label("emitted from here")]
    pub span: SourceSpan,
}

impl GenDiagnostic {
    /// Binds a core generation error to its source text.
    pub fn new(err: &GenError, path: &str, source: &str) -> Self {
        Self {
            message: err.message.to_string(),
            src: NamedSource::new(path, source.to_string()),
            span: span_at(source, err.line, 1),
        }
    }
}

/// Computes the byte span of the given 1-based line/column position,
/// covering the rest of that line.
fn span_at(source: &str, line: u32, column: u32) -> SourceSpan {
    let line = usize::try_from(line.max(1)).unwrap_or(1);
    let column = usize::try_from(column.max(1)).unwrap_or(1);

    let mut offset = 0;
    for (i, text) in source.split('\n').enumerate() {
        if i + 1 == line {
            let col = (column - 1).min(text.len());
            return (offset + col, text.len() - col).into();
        }
        offset += text.len() + 1;
    }
    (source.len(), 0).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_covers_the_error_line() {
        let source = "line one\nline two\nline three\n";
        let span = span_at(source, 2, 1);
        assert_eq!(span.offset(), 9);
        assert_eq!(span.len(), 8);
    }

    #[test]
    fn span_honors_the_column() {
        let span = span_at("abcdef\n", 1, 3);
        assert_eq!(span.offset(), 2);
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn span_clamps_past_the_end() {
        let span = span_at("short\n", 99, 1);
        assert_eq!(span.offset(), 6);
        assert_eq!(span.len(), 0);
    }

    #[test]
    fn parse_diagnostic_carries_message() {
        let err = ParseError::at_line(2, "unexpected table line");
        let diag = ParseDiagnostic::new(&err, "doc.adoc", "text\n|cell\n");
        assert_eq!(diag.message, "unexpected table line");
        assert_eq!(diag.span.offset(), 5);
    }
}
