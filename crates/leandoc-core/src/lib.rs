// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! LeanDoc translator core.
//!
//! LeanDoc is a line-oriented, LL(k) subset of AsciiDoc. This crate
//! contains the whole translation pipeline:
//!
//! - Line lexing (per-line classification into a closed token set)
//! - Parsing (typed document tree construction)
//! - Tree dumping (plain-text AST output)
//! - Typst generation (well-formed Typst source output)
//!
//! The pipeline is single-threaded, synchronous, and free of I/O: every
//! stage takes values in and returns values or typed errors out. File
//! handling and exit codes live in the CLI crate.
//!
//! # Example
//!
//! ```
//! use leandoc_core::parse::parse;
//! use leandoc_core::typst::{generate, Options};
//!
//! let doc = parse("== Greeting\nHello, *world*.\n")?;
//! let typst = generate(&doc, &Options::default())?;
//! assert!(typst.contains("== Greeting"));
//! assert!(typst.contains("*world*"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod dump;
pub mod parse;
pub mod typst;

/// Re-export of commonly used types.
pub mod prelude {
    pub use crate::ast::{Block, Document, Inline};
    pub use crate::dump::dump_document;
    pub use crate::parse::{parse, ParseError};
    pub use crate::typst::{generate, GenError, Options};
}
