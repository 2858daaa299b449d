// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parse error type.
//!
//! Parsing is fail-fast: the first malformed structure aborts the document
//! parse and the partially built tree is dropped. Errors carry a 1-based
//! line and column for diagnostics.

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

/// A fatal parse error.
///
/// Raised for malformed structure: a missing close fence, a table line
/// outside a table, an inconsistent table row width, or a metadata run with
/// no block to attach to.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(leandoc::parse))]
pub struct ParseError {
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column.
    pub column: u32,
    /// Human-readable message.
    pub message: EcoString,
}

impl ParseError {
    /// Creates a parse error at the given line, column 1.
    #[must_use]
    pub fn at_line(line: u32, message: impl Into<EcoString>) -> Self {
        Self {
            line,
            column: 1,
            message: message.into(),
        }
    }
}
