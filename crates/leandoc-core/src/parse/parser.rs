// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for LeanDoc.
//!
//! The parser consumes the line-token stream and builds the typed
//! [`Document`] tree. It is strictly LL(k): lookahead never exceeds two
//! line tokens and there is no rewind.
//!
//! # Design
//!
//! - **Fail fast** — every parse routine returns `Result` and the first
//!   malformed structure aborts the whole parse; the partial tree is
//!   dropped by ownership. No recovery is attempted.
//! - **Metadata scoping** — a run of metadata lines (`[[…]]`, `[…]`,
//!   `.Title`) attaches to the immediately *following* block. A single
//!   metadata line directly before a section that would terminate the
//!   current one is peeked at but not consumed, so it attaches to the
//!   sibling section instead of leaking into the current body.
//! - **Blank lines and bare comments** are skipped between blocks; a
//!   comment directly after a metadata run becomes a [`Block::LineComment`]
//!   node so the metadata has a carrier.

use ecow::{EcoString, eco_format};
use std::collections::BTreeMap;

use crate::ast::{
    Admonition, AdmonitionLabel, Block, BlockMacro, BlockMeta, CellSpec, Checklist, DelimitedBlock,
    DelimitedBody, DelimiterKind, Directive, DirectiveKind, Document, Header, Inline, List,
    ListItem, ListKind, LiteralParagraph, Paragraph, Pos, Section, Table, TableCell, TableRow,
};

use super::error::ParseError;
use super::inline::parse_inline;
use super::lexer::LineLexer;
use super::token::{LineKind, LineToken};

/// Result type for parse operations.
type Result<T> = std::result::Result<T, ParseError>;

/// Parses LeanDoc source text into a document tree.
///
/// # Errors
///
/// Returns [`ParseError`] on the first malformed structure: a missing
/// close fence, a table line outside a table, an inconsistent table row
/// width, or a metadata run with no block to attach to.
pub fn parse(input: &str) -> Result<Document> {
    Parser::new(input).parse_document()
}

/// The parser state: a lexer and nothing else.
struct Parser {
    lexer: LineLexer,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            lexer: LineLexer::new(input),
        }
    }

    // ------------------------------------------------------------------
    // Token management
    // ------------------------------------------------------------------

    /// Peeks `k` tokens ahead.
    fn la(&self, k: usize) -> &LineToken {
        self.lexer.peek(k)
    }

    /// Peeks at the kind `k` tokens ahead.
    fn kind(&self, k: usize) -> LineKind {
        self.lexer.peek(k).kind
    }

    /// Consumes and returns the current token.
    fn take(&mut self) -> LineToken {
        self.lexer.take()
    }

    /// Returns `true` once the EOF token is current.
    fn at_end(&self) -> bool {
        self.lexer.at_end()
    }

    /// Consumes a token of the given kind or fails with `Expected {what}`.
    fn expect(&mut self, kind: LineKind, what: &str) -> Result<LineToken> {
        if self.kind(0) == kind {
            Ok(self.take())
        } else {
            Err(self.error_here(eco_format!("Expected {what}")))
        }
    }

    /// Builds a parse error at the current token.
    fn error_here(&self, message: EcoString) -> ParseError {
        ParseError::at_line(self.la(0).line_no, message)
    }

    /// Skips blank lines and bare line comments between blocks.
    fn skip_blank_and_comments(&mut self) {
        while matches!(self.kind(0), LineKind::Blank | LineKind::LineComment) {
            self.take();
        }
    }

    // ------------------------------------------------------------------
    // Document and header
    // ------------------------------------------------------------------

    fn parse_document(&mut self) -> Result<Document> {
        let mut doc = Document::new();

        self.skip_blank_and_comments();
        self.parse_header(&mut doc.header);

        while !self.at_end() {
            self.skip_blank_and_comments();
            if self.at_end() {
                break;
            }
            let block = self.parse_block()?;
            doc.blocks.push(block);
        }

        Ok(doc)
    }

    /// Parses the optional document header: title, author line, revision
    /// line, and `:name: value` attribute entries.
    fn parse_header(&mut self, header: &mut Header) {
        if self.kind(0) == LineKind::Section && self.la(0).level == 1 {
            let tok = self.take();
            header.title = Some(tok.rest);
            self.skip_blank_and_comments();
        }

        // Author line: "Name <mail>" shape.
        if self.kind(0) == LineKind::Text {
            let line = self.la(0).raw.trim();
            if line.contains('<') && line.contains('>') {
                header.author_line = Some(EcoString::from(line));
                self.take();
                self.skip_blank_and_comments();
            }
        }

        // Revision line: starts with `v`.
        if self.kind(0) == LineKind::Text {
            let line = self.la(0).raw.trim();
            if line.starts_with('v') {
                header.revision_line = Some(EcoString::from(line));
                self.take();
                self.skip_blank_and_comments();
            }
        }

        // Attribute entries: `:name: value`.
        while self.kind(0) == LineKind::Text {
            let Some((name, value)) = parse_attribute_entry(self.la(0).raw.trim()) else {
                break;
            };
            header.attributes.insert(name, value);
            self.take();
        }
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Consumes an optional metadata run: a contiguous sequence of anchor,
    /// attribute-list, and title lines. Repeated attribute lines merge;
    /// for anchors and titles the last line wins.
    fn parse_block_meta_opt(&mut self) -> Option<BlockMeta> {
        if !self.kind(0).is_metadata() {
            return None;
        }
        let mut meta = BlockMeta::default();

        while self.kind(0).is_metadata() {
            let tok = self.take();
            match tok.kind {
                LineKind::BlockAnchor => {
                    let inner =
                        strip_outer(strip_outer(tok.rest.trim(), '[', ']'), '[', ']').to_owned();
                    match inner.find(',') {
                        None => meta.anchor_id = EcoString::from(inner.trim()),
                        Some(comma) => {
                            meta.anchor_id = EcoString::from(inner[..comma].trim());
                            meta.anchor_text = EcoString::from(inner[comma + 1..].trim());
                        }
                    }
                }
                LineKind::BlockAttrs => {
                    for (key, value) in parse_attr_list(&tok.rest) {
                        if let Some(role) = key.strip_prefix('.') {
                            meta.roles.push(EcoString::from(role));
                        }
                        meta.attrs.insert(key, value);
                    }
                }
                _ => meta.title = EcoString::from(tok.rest.trim()),
            }
        }

        Some(meta)
    }

    /// Parses one block: an optional metadata run, then content dispatched
    /// on the next token's kind.
    fn parse_block(&mut self) -> Result<Block> {
        let meta = self.parse_block_meta_opt();

        if meta.is_some() && matches!(self.kind(0), LineKind::Blank | LineKind::Eof) {
            return Err(self.error_here("metadata is not attached to a block".into()));
        }

        match self.kind(0) {
            LineKind::Section => self.parse_section(meta),
            LineKind::Admonition => self.parse_admonition(meta),
            LineKind::UlItem | LineKind::OlItem | LineKind::DescTerm => self.parse_list(meta),
            LineKind::TableDelim => self.parse_table(meta),
            LineKind::DelimListing
            | LineKind::DelimLiteral
            | LineKind::DelimQuote
            | LineKind::DelimExample
            | LineKind::DelimSidebar
            | LineKind::DelimOpen
            | LineKind::DelimPassthrough
            | LineKind::DelimComment
            | LineKind::StemAttrLine => self.parse_delimited(meta),
            LineKind::BlockMacro => Ok(self.parse_block_macro(meta)),
            LineKind::Directive => self.parse_directive(meta),
            LineKind::ThematicBreak | LineKind::PageBreak | LineKind::LineComment => {
                Ok(self.parse_break_or_comment(meta))
            }
            LineKind::Text => Ok(self.parse_paragraph_or_literal(meta)),
            LineKind::TableLine => Err(self.error_here("unexpected table line".into())),
            LineKind::ListCont => Err(self.error_here("unexpected list continuation".into())),
            LineKind::BlockAnchor | LineKind::BlockAttrs | LineKind::BlockTitle => {
                Err(self.error_here("metadata is not attached to a block".into()))
            }
            LineKind::Blank => Err(self.error_here("unexpected blank line".into())),
            LineKind::Eof => Err(self.error_here("unexpected end of input".into())),
        }
    }

    fn parse_section(&mut self, meta: Option<BlockMeta>) -> Result<Block> {
        let tok = self.take();
        let mut section = Section {
            pos: Pos::at_line(tok.line_no),
            meta,
            level: tok.level,
            title: tok.rest,
            blocks: Vec::new(),
        };

        loop {
            self.skip_blank_and_comments();
            if self.at_end() {
                break;
            }
            let (cur_kind, cur_level, cur_line) = {
                let cur = self.la(0);
                (cur.kind, cur.level, cur.line_no)
            };
            if cur_kind == LineKind::Section && cur_level <= section.level {
                break;
            }
            if cur_kind == LineKind::TableLine {
                return Err(ParseError::at_line(cur_line, "unexpected table line"));
            }

            // Metadata directly before a terminating sibling section is
            // peeked at and left unconsumed: it belongs to that section.
            let (next_kind, next_level) = {
                let next = self.la(1);
                (next.kind, next.level)
            };
            if cur_kind.is_metadata()
                && next_kind == LineKind::Section
                && next_level <= section.level
            {
                break;
            }

            let block = self.parse_block()?;
            section.blocks.push(block);
        }

        Ok(Block::Section(section))
    }

    fn parse_admonition(&mut self, meta: Option<BlockMeta>) -> Result<Block> {
        let tok = self.take();
        let Some(label) = AdmonitionLabel::from_head(&tok.head) else {
            return Err(ParseError::at_line(
                tok.line_no,
                eco_format!("unknown admonition label: {}", tok.head),
            ));
        };
        Ok(Block::Admonition(Admonition {
            pos: Pos::at_line(tok.line_no),
            meta,
            label,
            inlines: parse_inline(&tok.rest, tok.line_no),
        }))
    }

    /// Parses a normal or literal paragraph.
    ///
    /// A paragraph whose first raw line starts with whitespace is literal:
    /// its lines are kept verbatim (one leading space stripped) and joined
    /// with newlines. A normal paragraph joins its trimmed lines with
    /// single spaces and feeds the result to the inline scanner; a line
    /// ending in ` +` inserts a hard break at that point. Either form ends
    /// at the first non-text line.
    fn parse_paragraph_or_literal(&mut self, meta: Option<BlockMeta>) -> Block {
        let first_line = self.la(0).line_no;
        let pos = Pos::at_line(first_line);
        let literal = {
            let raw = &self.la(0).raw;
            raw.starts_with(|c: char| c.is_whitespace())
        };

        if literal {
            let mut text = String::new();
            let mut first = true;
            while self.kind(0) == LineKind::Text {
                let raw = &self.la(0).raw;
                if !raw.starts_with(|c: char| c.is_whitespace()) {
                    break;
                }
                if !first {
                    text.push('\n');
                }
                let mut chars = raw.chars();
                chars.next();
                text.push_str(chars.as_str());
                first = false;
                self.take();
            }
            return Block::LiteralParagraph(LiteralParagraph {
                pos,
                meta,
                text: EcoString::from(text),
            });
        }

        let mut inlines: Vec<Inline> = Vec::new();
        let mut segment = String::new();
        while self.kind(0) == LineKind::Text {
            let tok = self.take();
            let line = tok.raw.trim();
            if line.is_empty() {
                break;
            }
            if let Some(stripped) = line.strip_suffix(" +") {
                push_joined(&mut segment, stripped.trim_end());
                inlines.extend(parse_inline(&segment, first_line));
                inlines.push(Inline::LineBreak {
                    pos: Pos::at_line(tok.line_no),
                });
                segment.clear();
            } else {
                push_joined(&mut segment, line);
            }
        }
        if !segment.is_empty() {
            inlines.extend(parse_inline(&segment, first_line));
        }

        Block::Paragraph(Paragraph { pos, meta, inlines })
    }

    /// Parses a delimited block, including the `[stem]` composite.
    ///
    /// Listing, literal, passthrough, comment, and stem bodies are raw:
    /// lines accumulate verbatim until the matching fence. Quote, example,
    /// sidebar, and open bodies are parsed recursively.
    fn parse_delimited(&mut self, meta: Option<BlockMeta>) -> Result<Block> {
        let mut stem = false;
        if self.kind(0) == LineKind::StemAttrLine {
            self.take();
            stem = true;
            if !self.kind(0).is_delimiter() {
                return Err(self.error_here("Expected delimited block after [stem]".into()));
            }
        }

        let open = self.take();
        let fence = open.kind;
        let Some(kind) = delimiter_kind(fence) else {
            return Err(ParseError::at_line(open.line_no, "Expected delimited block"));
        };
        let pos = Pos::at_line(open.line_no);

        if kind.is_raw() || stem {
            let mut text = String::new();
            let mut first = true;
            while !self.at_end() && self.kind(0) != fence {
                if !first {
                    text.push('\n');
                }
                text.push_str(&self.take().raw);
                first = false;
            }
            self.expect(fence, "closing delimiter")?;
            return Ok(Block::Delimited(DelimitedBlock {
                pos,
                meta,
                kind,
                stem,
                body: DelimitedBody::Raw(EcoString::from(text)),
            }));
        }

        let mut blocks = Vec::new();
        while !self.at_end() && self.kind(0) != fence {
            self.skip_blank_and_comments();
            if self.at_end() || self.kind(0) == fence {
                break;
            }
            blocks.push(self.parse_block()?);
        }
        self.expect(fence, "closing delimiter")?;
        Ok(Block::Delimited(DelimitedBlock {
            pos,
            meta,
            kind,
            stem,
            body: DelimitedBody::Blocks(blocks),
        }))
    }

    /// Parses a list; the kind is fixed by the first marker.
    fn parse_list(&mut self, meta: Option<BlockMeta>) -> Result<Block> {
        let kind = match self.kind(0) {
            LineKind::DescTerm => ListKind::Description,
            LineKind::OlItem => ListKind::Ordered,
            _ => ListKind::Unordered,
        };
        let mut list = List {
            pos: Pos::at_line(self.la(0).line_no),
            meta,
            kind,
            items: Vec::new(),
        };

        loop {
            if kind == ListKind::Description {
                if self.kind(0) != LineKind::DescTerm {
                    break;
                }
                let item = self.parse_description_item()?;
                list.items.push(item);
                self.skip_blank_and_comments();
                continue;
            }

            let marker = if kind == ListKind::Ordered {
                LineKind::OlItem
            } else {
                LineKind::UlItem
            };
            if self.kind(0) != marker {
                break;
            }
            let item = self.parse_bullet_item()?;
            list.items.push(item);
            self.skip_blank_and_comments();
        }

        Ok(Block::List(list))
    }

    /// Parses one `term::` item: the term, an optional definition (same
    /// line or the next text line), and an optional `+` continuation.
    fn parse_description_item(&mut self) -> Result<ListItem> {
        let term_tok = self.take();
        let item_pos = Pos::at_line(term_tok.line_no);
        let mut item = ListItem {
            pos: item_pos,
            marker_level: term_tok.level,
            term: Some(term_tok.rest),
            check: None,
            blocks: Vec::new(),
        };

        if term_tok.head.is_empty() {
            // Definition on the next non-empty text line.
            if self.kind(0) == LineKind::Text && !self.la(0).raw.trim().is_empty() {
                let def_tok = self.take();
                item.blocks.push(Block::Paragraph(Paragraph {
                    pos: item_pos,
                    meta: None,
                    inlines: parse_inline(def_tok.raw.trim(), term_tok.line_no),
                }));
            }
        } else {
            item.blocks.push(Block::Paragraph(Paragraph {
                pos: item_pos,
                meta: None,
                inlines: parse_inline(&term_tok.head, term_tok.line_no),
            }));
        }

        self.skip_blank_and_comments();
        if self.kind(0) == LineKind::ListCont {
            self.take();
            self.skip_blank_and_comments();
            let cont = if self.kind(0).is_delimiter() || self.kind(0) == LineKind::StemAttrLine {
                self.parse_delimited(None)?
            } else {
                self.parse_paragraph_or_literal(None)
            };
            item.blocks.push(cont);
        }

        Ok(item)
    }

    /// Parses one bullet or ordered item: optional checklist prefix, the
    /// principal paragraph, and any number of `+` continuations.
    fn parse_bullet_item(&mut self) -> Result<ListItem> {
        let tok = self.take();
        let item_pos = Pos::at_line(tok.line_no);
        let mut item = ListItem {
            pos: item_pos,
            marker_level: tok.level,
            term: None,
            check: None,
            blocks: Vec::new(),
        };

        let mut payload = tok.rest.as_str();
        if payload.starts_with("[*]") || payload.starts_with("[x]") {
            item.check = Some(Checklist::Checked);
            payload = payload[3..].trim();
        } else if payload.starts_with("[ ]") {
            item.check = Some(Checklist::Unchecked);
            payload = payload[3..].trim();
        }

        item.blocks.push(Block::Paragraph(Paragraph {
            pos: item_pos,
            meta: None,
            inlines: parse_inline(payload, tok.line_no),
        }));

        self.skip_blank_and_comments();
        while self.kind(0) == LineKind::ListCont {
            self.take();
            self.skip_blank_and_comments();
            let cont = self.parse_block()?;
            item.blocks.push(cont);
            self.skip_blank_and_comments();
        }

        Ok(item)
    }

    /// Parses a `|===` table.
    ///
    /// Cells accumulate row-line by row-line; the first row fixes the
    /// width and the remaining cells are re-flowed into rows of that
    /// width. A leftover remainder is a fatal error.
    fn parse_table(&mut self, meta: Option<BlockMeta>) -> Result<Block> {
        let open_line = self.la(0).line_no;
        self.expect(LineKind::TableDelim, "table delimiter |===")?;

        let mut groups: Vec<Vec<TableCell>> = Vec::new();
        let mut closed = false;
        while !self.at_end() {
            match self.kind(0) {
                LineKind::TableDelim => {
                    self.take();
                    closed = true;
                    break;
                }
                LineKind::TableLine => {
                    let row_tok = self.take();
                    groups.push(read_cells(&row_tok));
                }
                _ => {
                    self.take();
                }
            }
        }
        if !closed {
            return Err(self.error_here("Expected closing table delimiter |===".into()));
        }

        let mut table = Table {
            pos: Pos::at_line(open_line),
            meta,
            rows: Vec::new(),
        };

        let mut iter = groups.into_iter();
        if let Some(first_cells) = iter.next() {
            if !first_cells.is_empty() {
                let width = first_cells.len();
                let first_pos = first_cells[0].pos;
                table.rows.push(TableRow {
                    pos: first_pos,
                    cells: first_cells,
                });

                let cells: Vec<TableCell> = iter.flatten().collect();
                if cells.len() % width != 0 {
                    return Err(ParseError {
                        line: first_pos.line,
                        column: first_pos.column,
                        message: "the number of cells is not compatible with the table size"
                            .into(),
                    });
                }
                let mut rest = cells.into_iter();
                loop {
                    let chunk: Vec<TableCell> = rest.by_ref().take(width).collect();
                    let Some(first) = chunk.first() else { break };
                    let row_pos = first.pos;
                    table.rows.push(TableRow {
                        pos: row_pos,
                        cells: chunk,
                    });
                }
            }
        }

        Ok(Block::Table(table))
    }

    fn parse_block_macro(&mut self, meta: Option<BlockMeta>) -> Block {
        let tok = self.take();
        Block::Macro(BlockMacro {
            pos: Pos::at_line(tok.line_no),
            meta,
            name: tok.head,
            target: tok.rest,
        })
    }

    /// Parses an `ifdef`/`ifndef` directive and its body up to the
    /// matching `endif::`, or a bare `endif::`.
    ///
    /// The condition tail is kept verbatim for a later semantic pass; the
    /// generator refuses directives outright.
    fn parse_directive(&mut self, meta: Option<BlockMeta>) -> Result<Block> {
        let tok = self.take();
        let kind = match tok.head.as_str() {
            "ifdef" => DirectiveKind::Ifdef,
            "ifndef" => DirectiveKind::Ifndef,
            _ => DirectiveKind::Endif,
        };
        let mut directive = Directive {
            pos: Pos::at_line(tok.line_no),
            meta,
            kind,
            condition: tok.rest,
            blocks: Vec::new(),
        };

        if matches!(kind, DirectiveKind::Ifdef | DirectiveKind::Ifndef) {
            loop {
                self.skip_blank_and_comments();
                if self.at_end() {
                    break;
                }
                if self.kind(0) == LineKind::Directive && self.la(0).head == "endif" {
                    self.take();
                    break;
                }
                let block = self.parse_block()?;
                directive.blocks.push(block);
            }
        }

        Ok(Block::Directive(directive))
    }

    /// Builds the break and comment block kinds. Only reached for
    /// thematic breaks, page breaks, and comments that follow a metadata
    /// run (bare comments are skipped between blocks).
    fn parse_break_or_comment(&mut self, meta: Option<BlockMeta>) -> Block {
        let tok = self.take();
        let pos = Pos::at_line(tok.line_no);
        match tok.kind {
            LineKind::LineComment => Block::LineComment {
                pos,
                meta,
                text: tok.rest,
            },
            LineKind::ThematicBreak => Block::ThematicBreak {
                pos,
                meta,
                marker: EcoString::from(tok.raw.trim()),
            },
            _ => Block::PageBreak { pos, meta },
        }
    }
}

// ----------------------------------------------------------------------
// Free helpers
// ----------------------------------------------------------------------

/// Appends a paragraph line to the running segment, space-separated.
fn push_joined(segment: &mut String, line: &str) {
    if !segment.is_empty() {
        segment.push(' ');
    }
    segment.push_str(line);
}

/// Maps a fence token kind to the delimiter kind.
fn delimiter_kind(kind: LineKind) -> Option<DelimiterKind> {
    match kind {
        LineKind::DelimListing => Some(DelimiterKind::Listing),
        LineKind::DelimLiteral => Some(DelimiterKind::Literal),
        LineKind::DelimQuote => Some(DelimiterKind::Quote),
        LineKind::DelimExample => Some(DelimiterKind::Example),
        LineKind::DelimSidebar => Some(DelimiterKind::Sidebar),
        LineKind::DelimOpen => Some(DelimiterKind::Open),
        LineKind::DelimPassthrough => Some(DelimiterKind::Passthrough),
        LineKind::DelimComment => Some(DelimiterKind::Comment),
        _ => None,
    }
}

/// Parses a `:name: value` document attribute entry.
fn parse_attribute_entry(line: &str) -> Option<(EcoString, EcoString)> {
    let stripped = line.strip_prefix(':')?;
    let second = stripped.find(':')?;
    if second == 0 {
        return None;
    }
    let name = stripped[..second].trim();
    let value = stripped[second + 1..].trim();
    Some((EcoString::from(name), EcoString::from(value)))
}

/// Strips one matching pair of outer delimiters, if present.
fn strip_outer(s: &str, open: char, close: char) -> &str {
    let t = s.trim();
    if t.len() >= 2 && t.starts_with(open) && t.ends_with(close) {
        &t[open.len_utf8()..t.len() - close.len_utf8()]
    } else {
        t
    }
}

/// Parses a bracketed attribute list: `[a=b, c, k="v"]` or its inner text.
/// Entries without `=` become boolean attributes with an empty value.
fn parse_attr_list(bracketed: &str) -> BTreeMap<EcoString, EcoString> {
    let inner = strip_outer(bracketed, '[', ']');
    let mut map = BTreeMap::new();
    for part in inner.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.find('=') {
            None => {
                map.insert(EcoString::from(part), EcoString::new());
            }
            Some(eq) => {
                let key = part[..eq].trim();
                let value = strip_outer(part[eq + 1..].trim(), '"', '"');
                map.insert(EcoString::from(key), EcoString::from(value));
            }
        }
    }
    map
}

/// Splits a table row line into cells on unescaped `|` separators.
///
/// The part before the first `|` is discarded (row lines have the shape
/// `|cell|cell|…`); each remaining part is trimmed and inline-parsed.
fn read_cells(tok: &LineToken) -> Vec<TableCell> {
    let parts = split_unescaped_pipes(&tok.raw);
    parts
        .into_iter()
        .skip(1)
        .map(|part| TableCell {
            pos: Pos::at_line(tok.line_no),
            spec: CellSpec::default(),
            inlines: parse_inline(part.trim(), tok.line_no),
        })
        .collect()
}

/// Splits on `|`, honoring backslash escapes: an even run of `\` before a
/// `|` keeps it a separator, an odd run escapes it (consuming one
/// backslash).
fn split_unescaped_pipes(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut backslash_run = 0_usize;

    for c in line.chars() {
        if c == '|' {
            if backslash_run % 2 == 0 {
                parts.push(std::mem::take(&mut cur));
            } else {
                cur.pop();
                cur.push('|');
            }
            backslash_run = 0;
        } else {
            cur.push(c);
            backslash_run = if c == '\\' { backslash_run + 1 } else { 0 };
        }
    }
    parts.push(cur);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Document {
        parse(input).expect("input should parse")
    }

    fn parse_err(input: &str) -> ParseError {
        parse(input).expect_err("input should fail to parse")
    }

    #[test]
    fn empty_input_is_empty_document() {
        let doc = parse_ok("");
        assert!(doc.blocks.is_empty());
        assert!(doc.header.is_empty());
    }

    #[test]
    fn document_header_fields() {
        let doc = parse_ok(
            "= The Manual\nJane Doe <jane@example.com>\nv1.2, 2026-05-01\n:toc: left\n:version: 1.2\n\nBody text.\n",
        );
        assert_eq!(doc.header.title.as_deref(), Some("The Manual"));
        assert_eq!(
            doc.header.author_line.as_deref(),
            Some("Jane Doe <jane@example.com>")
        );
        assert_eq!(doc.header.revision_line.as_deref(), Some("v1.2, 2026-05-01"));
        assert_eq!(
            doc.header.attributes.get("toc").map(EcoString::as_str),
            Some("left")
        );
        assert_eq!(doc.blocks.len(), 1);
        assert!(matches!(doc.blocks[0], Block::Paragraph(_)));
    }

    #[test]
    fn metadata_attaches_to_following_section() {
        // The anchor between the two sections belongs to the child, and
        // the parent ends up with no anchor at all.
        let doc = parse_ok("== Parent\nBody.\n\n[[child-id]]\n=== Child\n");
        assert_eq!(doc.blocks.len(), 1);
        let Block::Section(parent) = &doc.blocks[0] else {
            panic!("expected section")
        };
        assert_eq!(parent.level, 2);
        assert!(parent.meta.is_none());
        assert_eq!(parent.blocks.len(), 2);
        assert!(matches!(&parent.blocks[0], Block::Paragraph(_)));
        let Block::Section(child) = &parent.blocks[1] else {
            panic!("expected child section")
        };
        assert_eq!(child.level, 3);
        let meta = child.meta.as_ref().expect("child should carry the anchor");
        assert_eq!(meta.anchor_id, "child-id");
    }

    #[test]
    fn metadata_before_sibling_section_is_not_consumed() {
        let doc = parse_ok("== A\ntext\n\n[[b-id]]\n== B\n");
        assert_eq!(doc.blocks.len(), 2);
        let Block::Section(a) = &doc.blocks[0] else {
            panic!("expected section")
        };
        assert_eq!(a.blocks.len(), 1, "A must not swallow B's metadata");
        let Block::Section(b) = &doc.blocks[1] else {
            panic!("expected section")
        };
        assert_eq!(b.meta.as_ref().expect("anchor").anchor_id, "b-id");
    }

    #[test]
    fn section_nesting_is_strict() {
        let doc = parse_ok("== One\n=== Deeper\n==== Deepest\n== Two\n");
        assert_eq!(doc.blocks.len(), 2);
        let Block::Section(one) = &doc.blocks[0] else {
            panic!("expected section")
        };
        let Block::Section(deeper) = &one.blocks[0] else {
            panic!("expected nested section")
        };
        let Block::Section(deepest) = &deeper.blocks[0] else {
            panic!("expected nested section")
        };
        assert!(one.level < deeper.level && deeper.level < deepest.level);
    }

    #[test]
    fn literal_and_normal_paragraphs() {
        let doc = parse_ok(" indented line one\n indented line two\n\nnormal line one\nnormal line two\n");
        assert_eq!(doc.blocks.len(), 2);
        let Block::LiteralParagraph(lit) = &doc.blocks[0] else {
            panic!("expected literal paragraph")
        };
        assert_eq!(lit.text, "indented line one\nindented line two");
        let Block::Paragraph(para) = &doc.blocks[1] else {
            panic!("expected paragraph")
        };
        assert_eq!(para.inlines.len(), 1);
        assert!(
            matches!(&para.inlines[0], Inline::Text { text, .. } if text == "normal line one normal line two")
        );
    }

    #[test]
    fn paragraph_hard_break() {
        let doc = parse_ok("first line +\nsecond line\n");
        let Block::Paragraph(para) = &doc.blocks[0] else {
            panic!("expected paragraph")
        };
        assert!(matches!(&para.inlines[0], Inline::Text { text, .. } if text == "first line"));
        assert!(matches!(&para.inlines[1], Inline::LineBreak { .. }));
        assert!(matches!(&para.inlines[2], Inline::Text { text, .. } if text == "second line"));
    }

    #[test]
    fn admonition_paragraph() {
        let doc = parse_ok("NOTE: be careful\n");
        let Block::Admonition(adm) = &doc.blocks[0] else {
            panic!("expected admonition")
        };
        assert_eq!(adm.label, AdmonitionLabel::Note);
        assert!(matches!(&adm.inlines[0], Inline::Text { text, .. } if text == "be careful"));
    }

    #[test]
    fn unordered_list_with_checklist() {
        let doc = parse_ok("* [x] done\n* [ ] open\n* plain\n");
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list")
        };
        assert_eq!(list.kind, ListKind::Unordered);
        assert_eq!(list.items.len(), 3);
        assert_eq!(list.items[0].check, Some(Checklist::Checked));
        assert_eq!(list.items[1].check, Some(Checklist::Unchecked));
        assert_eq!(list.items[2].check, None);
    }

    #[test]
    fn ordered_list() {
        let doc = parse_ok(". first\n. second\n");
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list")
        };
        assert_eq!(list.kind, ListKind::Ordered);
        assert_eq!(list.items.len(), 2);
    }

    #[test]
    fn list_item_continuation() {
        let doc = parse_ok("* item\n+\nattached paragraph\n* next\n");
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list")
        };
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].blocks.len(), 2);
        assert!(matches!(&list.items[0].blocks[1], Block::Paragraph(_)));
    }

    #[test]
    fn description_list_with_inline_definitions() {
        let doc = parse_ok("CPU:: Central Processing Unit\nRAM:: Random Access Memory\n");
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list")
        };
        assert_eq!(list.kind, ListKind::Description);
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].term.as_deref(), Some("CPU"));
        let Block::Paragraph(def) = &list.items[0].blocks[0] else {
            panic!("expected definition paragraph")
        };
        assert!(
            matches!(&def.inlines[0], Inline::Text { text, .. } if text == "Central Processing Unit")
        );
        assert_eq!(list.items[1].term.as_deref(), Some("RAM"));
    }

    #[test]
    fn description_definition_on_next_line() {
        let doc = parse_ok("CPU::\nCentral Processing Unit\n");
        let Block::List(list) = &doc.blocks[0] else {
            panic!("expected list")
        };
        assert_eq!(list.items[0].term.as_deref(), Some("CPU"));
        assert_eq!(list.items[0].blocks.len(), 1);
    }

    #[test]
    fn table_rows_and_cells() {
        let doc = parse_ok("|===\n|a |b\n|c |d\n|===\n");
        let Block::Table(table) = &doc.blocks[0] else {
            panic!("expected table")
        };
        assert_eq!(table.rows.len(), 2);
        for row in &table.rows {
            assert_eq!(row.cells.len(), 2);
        }
    }

    #[test]
    fn table_reflows_cells_to_first_row_width() {
        // Four cells across three lines re-flow into 2x2.
        let doc = parse_ok("|===\n|a |b\n|c\n|d\n|===\n");
        let Block::Table(table) = &doc.blocks[0] else {
            panic!("expected table")
        };
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].cells.len(), 2);
    }

    #[test]
    fn table_escaped_pipe() {
        let doc = parse_ok("|===\n|a\\|b |c\n|===\n");
        let Block::Table(table) = &doc.blocks[0] else {
            panic!("expected table")
        };
        assert_eq!(table.rows[0].cells.len(), 2);
        let cell = &table.rows[0].cells[0];
        assert!(matches!(&cell.inlines[0], Inline::Text { text, .. } if text == "a|b"));
    }

    #[test]
    fn table_width_mismatch_is_fatal() {
        let err = parse_err("|===\n|a |b\n|c\n|===\n");
        assert!(err.message.contains("not compatible"));
    }

    #[test]
    fn unclosed_table_is_fatal() {
        let err = parse_err("|===\n|a |b\n");
        assert!(err.message.contains("closing table delimiter"));
    }

    #[test]
    fn table_line_outside_table_is_fatal() {
        let err = parse_err("== S\n|stray cell\n");
        assert_eq!(err.message, "unexpected table line");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn delimited_listing_is_raw() {
        let doc = parse_ok("----\ncode *here*\nmore\n----\n");
        let Block::Delimited(block) = &doc.blocks[0] else {
            panic!("expected delimited block")
        };
        assert_eq!(block.kind, DelimiterKind::Listing);
        assert_eq!(block.body, DelimitedBody::Raw("code *here*\nmore".into()));
    }

    #[test]
    fn delimited_example_is_container() {
        let doc = parse_ok("====\ninner paragraph\n\n* a list\n====\n");
        let Block::Delimited(block) = &doc.blocks[0] else {
            panic!("expected delimited block")
        };
        assert_eq!(block.kind, DelimiterKind::Example);
        let DelimitedBody::Blocks(blocks) = &block.body else {
            panic!("expected container body")
        };
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[1], Block::List(_)));
    }

    #[test]
    fn missing_close_fence_is_fatal() {
        let err = parse_err("----\nunclosed\n");
        assert!(err.message.contains("closing delimiter"));
    }

    #[test]
    fn fence_matching_raw_content_closes_prematurely() {
        // Known limitation: a fence line inside a listing body closes the
        // block early. The text after it reads as a paragraph, and the
        // final fence opens a listing that never closes.
        let err = parse_err("----\npart one\n----\npart two\n----\n");
        assert!(err.message.contains("closing delimiter"));

        let doc = parse_ok("----\npart one\n----\npart two\n");
        let Block::Delimited(block) = &doc.blocks[0] else {
            panic!("expected delimited block")
        };
        assert_eq!(block.body, DelimitedBody::Raw("part one".into()));
        assert!(matches!(&doc.blocks[1], Block::Paragraph(_)));
    }

    #[test]
    fn stem_block() {
        let doc = parse_ok("[stem]\n++++\nsum_(i=1)^n i\n++++\n");
        let Block::Delimited(block) = &doc.blocks[0] else {
            panic!("expected delimited block")
        };
        assert!(block.stem);
        assert_eq!(block.kind, DelimiterKind::Passthrough);
        assert_eq!(block.body, DelimitedBody::Raw("sum_(i=1)^n i".into()));
    }

    #[test]
    fn stem_without_fence_is_fatal() {
        let err = parse_err("[stem]\nplain text\n");
        assert!(err.message.contains("after [stem]"));
    }

    #[test]
    fn block_attrs_attach_to_following_block() {
        let doc = parse_ok("[source,python]\n----\nprint(1)\n----\n");
        let Block::Delimited(block) = &doc.blocks[0] else {
            panic!("expected delimited block")
        };
        let meta = block.meta.as_ref().expect("attrs should attach");
        assert!(meta.attrs.contains_key("source"));
        assert!(meta.attrs.contains_key("python"));
    }

    #[test]
    fn roles_are_derived_from_dotted_attrs() {
        let doc = parse_ok("[.lead]\nAn opening paragraph.\n");
        let Block::Paragraph(para) = &doc.blocks[0] else {
            panic!("expected paragraph")
        };
        let meta = para.meta.as_ref().expect("meta");
        assert_eq!(meta.roles, vec![EcoString::from("lead")]);
    }

    #[test]
    fn metadata_run_order_is_free() {
        // Title before attrs is as valid as the grammar order.
        let doc = parse_ok(".Listing caption\n[source,rust]\n----\nlet x = 1;\n----\n");
        let Block::Delimited(block) = &doc.blocks[0] else {
            panic!("expected delimited block")
        };
        let meta = block.meta.as_ref().expect("meta");
        assert_eq!(meta.title, "Listing caption");
        assert!(meta.attrs.contains_key("source"));
    }

    #[test]
    fn block_title_and_anchor_combine() {
        let doc = parse_ok("[[fig-1]]\n.A caption\nSome paragraph.\n");
        let Block::Paragraph(para) = &doc.blocks[0] else {
            panic!("expected paragraph")
        };
        let meta = para.meta.as_ref().expect("meta");
        assert_eq!(meta.anchor_id, "fig-1");
        assert_eq!(meta.title, "A caption");
    }

    #[test]
    fn metadata_without_block_is_fatal() {
        let err = parse_err("[[dangling]]\n\n");
        assert!(err.message.contains("not attached"));
        let err = parse_err("== S\n[[dangling]]\n");
        assert!(err.message.contains("not attached"));
    }

    #[test]
    fn block_macro_fields() {
        let doc = parse_ok("image::shapes.png[A square]\n");
        let Block::Macro(mac) = &doc.blocks[0] else {
            panic!("expected block macro")
        };
        assert_eq!(mac.name, "image");
        assert_eq!(mac.target, "shapes.png[A square]");
    }

    #[test]
    fn directive_body_ends_at_endif() {
        let doc = parse_ok("ifdef::backend-html[]\nconditional text\nendif::[]\nafter\n");
        assert_eq!(doc.blocks.len(), 2);
        let Block::Directive(dir) = &doc.blocks[0] else {
            panic!("expected directive")
        };
        assert_eq!(dir.kind, DirectiveKind::Ifdef);
        assert_eq!(dir.condition, "backend-html[]");
        assert_eq!(dir.blocks.len(), 1);
    }

    #[test]
    fn breaks_and_comments() {
        let doc = parse_ok("'''\n\n<<<\n");
        assert!(matches!(doc.blocks[0], Block::ThematicBreak { .. }));
        assert!(matches!(doc.blocks[1], Block::PageBreak { .. }));
    }

    #[test]
    fn bare_comments_are_skipped() {
        let doc = parse_ok("// invisible\nvisible\n");
        assert_eq!(doc.blocks.len(), 1);
        assert!(matches!(doc.blocks[0], Block::Paragraph(_)));
    }

    #[test]
    fn comment_after_metadata_becomes_a_node() {
        let doc = parse_ok("[[c]]\n// kept\n");
        let Block::LineComment { meta, text, .. } = &doc.blocks[0] else {
            panic!("expected line comment block")
        };
        assert_eq!(meta.as_ref().expect("meta").anchor_id, "c");
        assert_eq!(text, " kept");
    }

    #[test]
    fn quote_block_nests_paragraphs() {
        let doc = parse_ok("____\nwise words\n____\n");
        let Block::Delimited(block) = &doc.blocks[0] else {
            panic!("expected delimited block")
        };
        assert_eq!(block.kind, DelimiterKind::Quote);
        assert!(matches!(&block.body, DelimitedBody::Blocks(b) if b.len() == 1));
    }

    #[test]
    fn attr_list_parsing() {
        let attrs = parse_attr_list("[a=1, flag, k=\"quoted v\"]");
        assert_eq!(attrs.get("a").map(EcoString::as_str), Some("1"));
        assert_eq!(attrs.get("flag").map(EcoString::as_str), Some(""));
        assert_eq!(attrs.get("k").map(EcoString::as_str), Some("quoted v"));
    }

    #[test]
    fn split_pipes_edge_cases() {
        assert_eq!(split_unescaped_pipes("|a|b"), vec!["", "a", "b"]);
        assert_eq!(split_unescaped_pipes("|a\\|b"), vec!["", "a|b"]);
        // Even backslash run keeps the separator.
        assert_eq!(
            split_unescaped_pipes("|a\\\\|b"),
            vec!["", "a\\\\", "b"]
        );
    }
}
