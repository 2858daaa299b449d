// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Typed document tree for LeanDoc.
//!
//! The tree is produced by the parser in a single pass and treated as
//! read-only by every downstream consumer (the dumper and the Typst
//! generator). Every node carries a [`Pos`] for error reporting.
//!
//! # Design
//!
//! - **Closed enums** — [`Block`] and [`Inline`] are exhaustive; adding a
//!   node kind forces every walker to handle it at compile time.
//! - **Structured fields** — node-kind-specific data lives in typed fields
//!   ([`ListKind`], [`DelimiterKind`], [`Checklist`], …) rather than a
//!   string-keyed attribute map.
//! - **Ownership forest** — each node exclusively owns its children and its
//!   metadata; dropping the [`Document`] releases the whole tree.

use std::collections::BTreeMap;

use ecow::EcoString;

/// A source position as 1-based line and column.
///
/// The parser works line-at-a-time, so the column is almost always 1; it is
/// kept because parse errors are reported as `{line, column, message}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl Pos {
    /// Creates a position from line and column.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Creates a position at the start of the given line.
    #[must_use]
    pub const fn at_line(line: u32) -> Self {
        Self { line, column: 1 }
    }
}

/// Metadata attached to a block: anchor, attribute list, and title.
///
/// Built from a contiguous run of metadata lines (`[[…]]`, `[…]`, `.Title`)
/// and attached to the immediately *following* block, never the preceding
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockMeta {
    /// Anchor id from `[[id]]` or `[[id, text]]`.
    pub anchor_id: EcoString,
    /// Optional anchor text from `[[id, text]]`.
    pub anchor_text: EcoString,
    /// Block title from a `.Title` line.
    pub title: EcoString,
    /// Attributes from a bracketed `[a=b, c]` line.
    pub attrs: BTreeMap<EcoString, EcoString>,
    /// Role names: entries of `attrs` whose key begins with `.`, stripped
    /// of the dot. The originals remain in `attrs` as well.
    pub roles: Vec<EcoString>,
}

impl BlockMeta {
    /// Returns `true` when the anchor id is set.
    #[must_use]
    pub fn has_anchor(&self) -> bool {
        !self.anchor_id.is_empty()
    }
}

/// The parsed document header: title, author/revision lines, and
/// `:name: value` attribute entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    /// Document title (a level-1 section at the very top of the file).
    pub title: Option<EcoString>,
    /// Raw author line (`Name <mail>` shape).
    pub author_line: Option<EcoString>,
    /// Raw revision line (starts with `v`).
    pub revision_line: Option<EcoString>,
    /// Document attribute entries.
    pub attributes: BTreeMap<EcoString, EcoString>,
}

impl Header {
    /// Returns `true` when no header field was present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author_line.is_none()
            && self.revision_line.is_none()
            && self.attributes.is_empty()
    }
}

/// The root of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Position of the document start (always line 1).
    pub pos: Pos,
    /// Parsed document header.
    pub header: Header,
    /// Top-level blocks in source order.
    pub blocks: Vec<Block>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pos: Pos::new(1, 1),
            header: Header::default(),
            blocks: Vec::new(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A section heading and its body.
    Section(Section),
    /// A normal paragraph of inline content.
    Paragraph(Paragraph),
    /// An indented paragraph kept verbatim.
    LiteralParagraph(LiteralParagraph),
    /// A `NOTE:`/`TIP:`/… paragraph.
    Admonition(Admonition),
    /// A fenced block (`----`, `====`, …).
    Delimited(DelimitedBlock),
    /// An unordered, ordered, or description list.
    List(List),
    /// A `|===` table.
    Table(Table),
    /// A block macro such as `include::` or `video::target[]`.
    Macro(BlockMacro),
    /// An `ifdef`/`ifndef`/`endif` preprocessor directive.
    Directive(Directive),
    /// A `'''`/`---`/`***` rule.
    ThematicBreak {
        /// Source position.
        pos: Pos,
        /// Attached metadata, if any.
        meta: Option<BlockMeta>,
        /// The literal marker used in the source.
        marker: EcoString,
    },
    /// A `<<<` page break.
    PageBreak {
        /// Source position.
        pos: Pos,
        /// Attached metadata, if any.
        meta: Option<BlockMeta>,
    },
    /// A `//` comment that carried metadata (bare comments are skipped).
    LineComment {
        /// Source position.
        pos: Pos,
        /// Attached metadata, if any.
        meta: Option<BlockMeta>,
        /// Comment text after `//`.
        text: EcoString,
    },
}

impl Block {
    /// Returns the source position of this block.
    #[must_use]
    pub fn pos(&self) -> Pos {
        match self {
            Block::Section(s) => s.pos,
            Block::Paragraph(p) => p.pos,
            Block::LiteralParagraph(p) => p.pos,
            Block::Admonition(a) => a.pos,
            Block::Delimited(d) => d.pos,
            Block::List(l) => l.pos,
            Block::Table(t) => t.pos,
            Block::Macro(m) => m.pos,
            Block::Directive(d) => d.pos,
            Block::ThematicBreak { pos, .. }
            | Block::PageBreak { pos, .. }
            | Block::LineComment { pos, .. } => *pos,
        }
    }

    /// Returns the metadata attached to this block, if any.
    #[must_use]
    pub fn meta(&self) -> Option<&BlockMeta> {
        match self {
            Block::Section(s) => s.meta.as_ref(),
            Block::Paragraph(p) => p.meta.as_ref(),
            Block::LiteralParagraph(p) => p.meta.as_ref(),
            Block::Admonition(a) => a.meta.as_ref(),
            Block::Delimited(d) => d.meta.as_ref(),
            Block::List(l) => l.meta.as_ref(),
            Block::Table(t) => t.meta.as_ref(),
            Block::Macro(m) => m.meta.as_ref(),
            Block::Directive(d) => d.meta.as_ref(),
            Block::ThematicBreak { meta, .. }
            | Block::PageBreak { meta, .. }
            | Block::LineComment { meta, .. } => meta.as_ref(),
        }
    }
}

/// A section: heading level, title, and body blocks.
///
/// # Invariant
///
/// Every child [`Block::Section`] has a strictly greater level than its
/// parent; a section of equal or lower level terminates the body instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Source position of the heading line.
    pub pos: Pos,
    /// Attached metadata, if any.
    pub meta: Option<BlockMeta>,
    /// Heading level (1–6, the `=` run length).
    pub level: u8,
    /// Title text after the marker.
    pub title: EcoString,
    /// Body blocks.
    pub blocks: Vec<Block>,
}

/// A normal paragraph: consecutive text lines joined and inline-parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// Source position of the first line.
    pub pos: Pos,
    /// Attached metadata, if any.
    pub meta: Option<BlockMeta>,
    /// Inline content.
    pub inlines: Vec<Inline>,
}

/// A literal paragraph: indented lines joined verbatim with newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralParagraph {
    /// Source position of the first line.
    pub pos: Pos,
    /// Attached metadata, if any.
    pub meta: Option<BlockMeta>,
    /// Verbatim text, one leading space stripped per line.
    pub text: EcoString,
}

/// An admonition paragraph (`NOTE: be careful`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admonition {
    /// Source position.
    pub pos: Pos,
    /// Attached metadata, if any.
    pub meta: Option<BlockMeta>,
    /// The admonition label.
    pub label: AdmonitionLabel,
    /// Inline content after the label.
    pub inlines: Vec<Inline>,
}

/// The closed set of admonition labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmonitionLabel {
    /// `NOTE:`
    Note,
    /// `TIP:`
    Tip,
    /// `IMPORTANT:`
    Important,
    /// `CAUTION:`
    Caution,
    /// `WARNING:`
    Warning,
}

impl AdmonitionLabel {
    /// Parses a label from the text before the colon.
    #[must_use]
    pub fn from_head(head: &str) -> Option<Self> {
        match head {
            "NOTE" => Some(Self::Note),
            "TIP" => Some(Self::Tip),
            "IMPORTANT" => Some(Self::Important),
            "CAUTION" => Some(Self::Caution),
            "WARNING" => Some(Self::Warning),
            _ => None,
        }
    }

    /// Returns the uppercase label text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Note => "NOTE",
            Self::Tip => "TIP",
            Self::Important => "IMPORTANT",
            Self::Caution => "CAUTION",
            Self::Warning => "WARNING",
        }
    }
}

/// A delimited (fenced) block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedBlock {
    /// Source position of the opening fence.
    pub pos: Pos,
    /// Attached metadata, if any.
    pub meta: Option<BlockMeta>,
    /// Which fence opened the block.
    pub kind: DelimiterKind,
    /// Whether a `[stem]` attribute line preceded the fence.
    pub stem: bool,
    /// Raw text or nested blocks, depending on the fence kind.
    pub body: DelimitedBody,
}

/// The body of a delimited block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelimitedBody {
    /// Literal lines joined with newlines (listing, literal, passthrough,
    /// comment, and stem blocks).
    Raw(EcoString),
    /// Recursively parsed blocks (quote, example, sidebar, open).
    Blocks(Vec<Block>),
}

/// The kind of fence that delimits a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    /// `----`
    Listing,
    /// `....`
    Literal,
    /// `____`
    Quote,
    /// `====`
    Example,
    /// `****`
    Sidebar,
    /// `--`
    Open,
    /// `++++`
    Passthrough,
    /// `////`
    Comment,
}

impl DelimiterKind {
    /// Returns `true` when the block body is accumulated as literal lines
    /// rather than parsed recursively.
    #[must_use]
    pub const fn is_raw(self) -> bool {
        matches!(
            self,
            Self::Listing | Self::Literal | Self::Passthrough | Self::Comment
        )
    }

    /// Returns the lowercase kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Literal => "literal",
            Self::Quote => "quote",
            Self::Example => "example",
            Self::Sidebar => "sidebar",
            Self::Open => "open",
            Self::Passthrough => "passthrough",
            Self::Comment => "comment",
        }
    }
}

/// A list of items, all of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    /// Source position of the first marker.
    pub pos: Pos,
    /// Attached metadata, if any.
    pub meta: Option<BlockMeta>,
    /// List kind, determined by the first marker.
    pub kind: ListKind,
    /// The items.
    pub items: Vec<ListItem>,
}

/// The kind of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `*` markers.
    Unordered,
    /// `.` markers.
    Ordered,
    /// `term::` items.
    Description,
}

impl ListKind {
    /// Returns the lowercase kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unordered => "unordered",
            Self::Ordered => "ordered",
            Self::Description => "description",
        }
    }
}

/// A single list item.
///
/// For description lists `term` is set and `blocks` holds the definition;
/// for the other kinds `blocks` starts with the principal paragraph,
/// followed by any `+` continuation blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Source position of the marker line.
    pub pos: Pos,
    /// Marker run length (bullet depth or trailing-colon count).
    pub marker_level: u8,
    /// Description-list term, when applicable.
    pub term: Option<EcoString>,
    /// Checklist state from a `[*]`/`[x]`/`[ ]` prefix.
    pub check: Option<Checklist>,
    /// Item content.
    pub blocks: Vec<Block>,
}

/// Checklist state of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checklist {
    /// `[*]` or `[x]`
    Checked,
    /// `[ ]`
    Unchecked,
}

/// A table.
///
/// # Invariant
///
/// Every row has the same number of cells as the first row; the parser
/// re-flows the cell stream to guarantee it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Source position of the opening `|===`.
    pub pos: Pos,
    /// Attached metadata, if any.
    pub meta: Option<BlockMeta>,
    /// The rows.
    pub rows: Vec<TableRow>,
}

/// A single table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Source position of the first cell.
    pub pos: Pos,
    /// The cells.
    pub cells: Vec<TableCell>,
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    /// Source position of the row line.
    pub pos: Pos,
    /// Cell specification; currently always the default (see [`CellSpec`]).
    pub spec: CellSpec,
    /// Inline content.
    pub inlines: Vec<Inline>,
}

/// A table cell specification (`2+|`, `^|`, …).
///
/// The type is part of the data model, but wire-level parsing of cell specs
/// is left to a future pass: cells currently always carry the default spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpec {
    /// Number of columns spanned.
    pub colspan: u32,
    /// Number of rows spanned.
    pub rowspan: u32,
    /// Horizontal alignment.
    pub align: Option<CellAlign>,
    /// Style letter (`a`, `e`, `h`, `l`, `m`, `s`, `v`).
    pub style: Option<char>,
}

impl Default for CellSpec {
    fn default() -> Self {
        Self {
            colspan: 1,
            rowspan: 1,
            align: None,
            style: None,
        }
    }
}

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAlign {
    /// `<`
    Left,
    /// `^`
    Center,
    /// `>`
    Right,
}

/// A block macro line: `name::target[attrs]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMacro {
    /// Source position.
    pub pos: Pos,
    /// Attached metadata, if any.
    pub meta: Option<BlockMeta>,
    /// Macro name before the `::`.
    pub name: EcoString,
    /// Everything after the `::`, including the bracketed attribute part.
    pub target: EcoString,
}

/// A preprocessor directive and, for `ifdef`/`ifndef`, its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Source position.
    pub pos: Pos,
    /// Attached metadata, if any.
    pub meta: Option<BlockMeta>,
    /// Which directive this is.
    pub kind: DirectiveKind,
    /// The directive tail after the `::`, kept for a later semantic pass.
    pub condition: EcoString,
    /// Body blocks, up to the matching `endif::`.
    pub blocks: Vec<Block>,
}

/// The kind of a preprocessor directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `ifdef::`
    Ifdef,
    /// `ifndef::`
    Ifndef,
    /// `endif::`
    Endif,
}

impl DirectiveKind {
    /// Returns the lowercase directive name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ifdef => "ifdef",
            Self::Ifndef => "ifndef",
            Self::Endif => "endif",
        }
    }
}

/// An inline-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// A run of plain text.
    Text {
        /// Source position.
        pos: Pos,
        /// The text.
        text: EcoString,
    },
    /// Significant whitespace kept as a node.
    Space {
        /// Source position.
        pos: Pos,
    },
    /// A hard line break (` +` at end of a paragraph line).
    LineBreak {
        /// Source position.
        pos: Pos,
    },
    /// Emphasis: bold, italic, monospace, or highlight.
    Emph(Emphasis),
    /// `^text^`
    Superscript {
        /// Source position.
        pos: Pos,
        /// Raw inner text.
        text: EcoString,
    },
    /// `~text~`
    Subscript {
        /// Source position.
        pos: Pos,
        /// Raw inner text.
        text: EcoString,
    },
    /// A URL autolink; `children` is empty for bare autolinks.
    Link {
        /// Source position.
        pos: Pos,
        /// Link target.
        target: EcoString,
        /// Link text; the target doubles as text when empty.
        children: Vec<Inline>,
    },
    /// `image:path[alt]`
    Image {
        /// Source position.
        pos: Pos,
        /// Image path.
        target: EcoString,
        /// Raw alt text.
        alt: EcoString,
    },
    /// An inline anchor `[[id]]` or `[[id, text]]`.
    Anchor {
        /// Source position.
        pos: Pos,
        /// Anchor id.
        id: EcoString,
        /// Optional anchor text.
        children: Vec<Inline>,
    },
    /// A cross-reference `<<id>>` or `<<id, text>>`.
    Xref {
        /// Source position.
        pos: Pos,
        /// Reference target.
        target: EcoString,
        /// Optional reference text.
        children: Vec<Inline>,
    },
    /// An attribute reference `{name}`, resolved by a later semantic pass.
    AttrRef {
        /// Source position.
        pos: Pos,
        /// Attribute name.
        name: EcoString,
    },
    /// An inline macro `name:target[args]`.
    Macro(InlineMacro),
    /// A passthrough span `+…+`, `++…++`, or `+++…+++`.
    Passthrough {
        /// Source position.
        pos: Pos,
        /// Fence length (1–3).
        plus_count: u8,
        /// Inner content.
        children: Vec<Inline>,
    },
}

impl Inline {
    /// Returns the source position of this inline node.
    #[must_use]
    pub fn pos(&self) -> Pos {
        match self {
            Inline::Text { pos, .. }
            | Inline::Space { pos }
            | Inline::LineBreak { pos }
            | Inline::Superscript { pos, .. }
            | Inline::Subscript { pos, .. }
            | Inline::Link { pos, .. }
            | Inline::Image { pos, .. }
            | Inline::Anchor { pos, .. }
            | Inline::Xref { pos, .. }
            | Inline::AttrRef { pos, .. }
            | Inline::Passthrough { pos, .. } => *pos,
            Inline::Emph(e) => e.pos,
            Inline::Macro(m) => m.pos,
        }
    }
}

/// An emphasis span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emphasis {
    /// Source position.
    pub pos: Pos,
    /// Which emphasis this is.
    pub kind: EmphKind,
    /// Inner content.
    pub body: EmphBody,
}

/// The kind of an emphasis span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmphKind {
    /// `*bold*` / `**bold**`
    Bold,
    /// `_italic_` / `__italic__`
    Italic,
    /// `` `mono` `` / ``` ``mono`` ```
    Mono,
    /// `#highlight#`
    Highlight,
}

impl EmphKind {
    /// Returns the lowercase kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Mono => "mono",
            Self::Highlight => "highlight",
        }
    }
}

/// The body of an emphasis span.
///
/// Constrained monospace keeps its inner text literal instead of re-parsing
/// it, preserving characters that would otherwise read as markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmphBody {
    /// Raw inner text (constrained monospace).
    Literal(EcoString),
    /// Re-parsed inline content.
    Children(Vec<Inline>),
}

/// An inline macro call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMacro {
    /// Source position.
    pub pos: Pos,
    /// Macro name.
    pub name: EcoString,
    /// Target between the colon and the opening bracket (may be empty).
    pub target: EcoString,
    /// Parsed bracket content.
    pub children: Vec<Inline>,
}
