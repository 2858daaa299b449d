// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Line tokens produced by the lexer.
//!
//! LeanDoc is line-oriented: the lexer classifies each physical line into
//! exactly one [`LineKind`] and the parser never looks below line
//! granularity (inline markup is scanned later, from the assembled text).

use ecow::EcoString;

/// The closed set of line kinds.
///
/// Classification is purely local to a single trimmed line; no cross-line
/// context is consulted. The order of the checks lives in the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Synthetic end-of-input marker.
    Eof,
    /// A line containing only whitespace.
    Blank,

    // Metadata lines.
    /// `[[id]]` / `[[id, text]]`
    BlockAnchor,
    /// `[attr, a=b]` — a bracketed attribute list.
    BlockAttrs,
    /// `.Title`
    BlockTitle,

    // Blocks.
    /// `=`–`======` heading.
    Section,
    /// `NOTE:` / `TIP:` / `IMPORTANT:` / `CAUTION:` / `WARNING:`
    Admonition,
    /// `// comment`
    LineComment,

    // Breaks.
    /// `'''`, `---`, or `***`
    ThematicBreak,
    /// `<<<`
    PageBreak,

    // Lists.
    /// `*`–`******` bullet item.
    UlItem,
    /// `.`–`......` ordered item.
    OlItem,
    /// `term::` description term.
    DescTerm,
    /// A lone `+` continuation line.
    ListCont,

    // Delimited blocks.
    /// `----`
    DelimListing,
    /// `....`
    DelimLiteral,
    /// `____`
    DelimQuote,
    /// `====`
    DelimExample,
    /// `****`
    DelimSidebar,
    /// `--`
    DelimOpen,
    /// `++++`
    DelimPassthrough,
    /// `////`
    DelimComment,

    // Tables.
    /// `|===`
    TableDelim,
    /// Any other line starting with `|`.
    TableLine,

    // Block macros and directives.
    /// `include::` or `name::target[…]`
    BlockMacro,
    /// `ifdef::` / `ifndef::` / `endif::`
    Directive,
    /// `[stem]` — opens a composite stem block.
    StemAttrLine,

    /// Anything else.
    Text,
}

impl LineKind {
    /// Returns the stable token-kind name used by the `--tokens` dump.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Blank => "BLANK",
            Self::BlockAnchor => "BLOCK_ANCHOR",
            Self::BlockAttrs => "BLOCK_ATTRS",
            Self::BlockTitle => "BLOCK_TITLE",
            Self::Section => "SECTION",
            Self::Admonition => "ADMONITION",
            Self::LineComment => "LINE_COMMENT",
            Self::ThematicBreak => "THEMATIC_BREAK",
            Self::PageBreak => "PAGE_BREAK",
            Self::UlItem => "UL_ITEM",
            Self::OlItem => "OL_ITEM",
            Self::DescTerm => "DESC_TERM",
            Self::ListCont => "LIST_CONT",
            Self::DelimListing => "DELIM_LISTING",
            Self::DelimLiteral => "DELIM_LITERAL",
            Self::DelimQuote => "DELIM_QUOTE",
            Self::DelimExample => "DELIM_EXAMPLE",
            Self::DelimSidebar => "DELIM_SIDEBAR",
            Self::DelimOpen => "DELIM_OPEN",
            Self::DelimPassthrough => "DELIM_PASSTHROUGH",
            Self::DelimComment => "DELIM_COMMENT",
            Self::TableDelim => "TABLE_DELIM",
            Self::TableLine => "TABLE_LINE",
            Self::BlockMacro => "BLOCK_MACRO",
            Self::Directive => "DIRECTIVE",
            Self::StemAttrLine => "STEM_ATTR_LINE",
            Self::Text => "TEXT",
        }
    }

    /// Returns `true` for any of the delimited-block fence kinds.
    #[must_use]
    pub const fn is_delimiter(self) -> bool {
        matches!(
            self,
            Self::DelimListing
                | Self::DelimLiteral
                | Self::DelimQuote
                | Self::DelimExample
                | Self::DelimSidebar
                | Self::DelimOpen
                | Self::DelimPassthrough
                | Self::DelimComment
        )
    }

    /// Returns `true` for the metadata line kinds.
    #[must_use]
    pub const fn is_metadata(self) -> bool {
        matches!(self, Self::BlockAnchor | Self::BlockAttrs | Self::BlockTitle)
    }
}

/// One classified input line.
///
/// `level` holds the marker run length for sections, list items, and
/// description terms; `head` carries the admonition label, the
/// macro/directive name, or — for description terms — the same-line
/// definition text; `rest` is the remainder after the marker. `raw` is the
/// untrimmed original line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineToken {
    /// The line kind.
    pub kind: LineKind,
    /// 1-based line number.
    pub line_no: u32,
    /// The original line without its trailing newline.
    pub raw: EcoString,
    /// Marker run length (1–6) where applicable, 0 otherwise.
    pub level: u8,
    /// Label, macro/directive name, or same-line description definition.
    pub head: EcoString,
    /// Remainder of the line after the marker.
    pub rest: EcoString,
}

impl LineToken {
    /// Creates a token of the given kind with empty payloads.
    #[must_use]
    pub fn new(kind: LineKind, line_no: u32) -> Self {
        Self {
            kind,
            line_no,
            raw: EcoString::new(),
            level: 0,
            head: EcoString::new(),
            rest: EcoString::new(),
        }
    }

    /// Creates the synthetic EOF token.
    #[must_use]
    pub fn eof(line_no: u32) -> Self {
        Self::new(LineKind::Eof, line_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(LineKind::Eof.name(), "EOF");
        assert_eq!(LineKind::DescTerm.name(), "DESC_TERM");
        assert_eq!(LineKind::DelimPassthrough.name(), "DELIM_PASSTHROUGH");
        assert_eq!(LineKind::StemAttrLine.name(), "STEM_ATTR_LINE");
    }

    #[test]
    fn delimiter_predicate() {
        assert!(LineKind::DelimListing.is_delimiter());
        assert!(LineKind::DelimOpen.is_delimiter());
        assert!(!LineKind::TableDelim.is_delimiter());
        assert!(!LineKind::Text.is_delimiter());
    }

    #[test]
    fn metadata_predicate() {
        assert!(LineKind::BlockAnchor.is_metadata());
        assert!(LineKind::BlockAttrs.is_metadata());
        assert!(LineKind::BlockTitle.is_metadata());
        assert!(!LineKind::StemAttrLine.is_metadata());
    }
}
