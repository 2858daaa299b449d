// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Typst source generation.
//!
//! The generator walks the document tree read-only, in pre-order, and
//! writes Typst markup into an output buffer. Emission is deterministic: a
//! given tree and options always produce byte-identical output.
//!
//! Constructs that need the (out-of-scope) semantic phase — `include::`,
//! `ifdef`/`ifndef` directives, attribute resolution — either surface a
//! [`GenError`] or emit an explicit placeholder, per the mapping rules.

mod escape;

pub use escape::{escape_string, escape_text};

use std::fmt::{self, Write};

use ecow::{EcoString, eco_format};
use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{
    Admonition, Block, BlockMacro, BlockMeta, DelimitedBlock, DelimitedBody, Document, EmphBody,
    EmphKind, Emphasis, Inline, InlineMacro, List, ListKind, Paragraph, Section, Table,
};

/// Generator options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Built-in preamble name: `plain` or `report`. Validated by the
    /// generator; an unknown name is a [`GenError`].
    pub template: EcoString,
    /// Optional Typst file to `#import` instead of a built-in preamble.
    pub template_file: Option<EcoString>,
    /// Whether stem blocks and passthrough spans may emit raw output.
    pub allow_raw_passthrough: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            template: "plain".into(),
            template_file: None,
            allow_raw_passthrough: true,
        }
    }
}

/// A fatal generation error.
///
/// Raised for constructs the generator cannot represent: an `include::` or
/// directive that still needs the semantic phase, an unknown template
/// name, or passthrough content while raw output is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(leandoc::typst))]
pub struct GenError {
    /// 1-based source line of the offending node (0 when unrelated to a
    /// source position).
    pub line: u32,
    /// Human-readable message.
    pub message: EcoString,
}

impl GenError {
    /// Creates a generation error at the given source line.
    #[must_use]
    pub fn at_line(line: u32, message: impl Into<EcoString>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl From<fmt::Error> for GenError {
    fn from(_: fmt::Error) -> Self {
        Self::at_line(0, "formatting error")
    }
}

/// Result type for generation operations.
type Result<T> = std::result::Result<T, GenError>;

/// Generates Typst source for a document tree.
///
/// This is the main entry point. The tree is not modified; running the
/// generator twice on the same tree yields byte-identical output.
///
/// # Errors
///
/// Returns [`GenError`] for unrepresentable constructs; no partial output
/// is returned.
///
/// # Example
///
/// ```
/// use leandoc_core::parse::parse;
/// use leandoc_core::typst::{generate, Options};
///
/// let doc = parse("NOTE: be careful\n")?;
/// let typst = generate(&doc, &Options::default())?;
/// assert!(typst.contains("#admon(\"NOTE\", [be careful])"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn generate(doc: &Document, options: &Options) -> Result<String> {
    let mut generator = Generator {
        options,
        output: String::new(),
    };
    generator.emit_document(doc)?;
    Ok(generator.output)
}

const PLAIN_PREAMBLE: &str = "\
// LeanDoc -> Typst (plain)
#set page(margin: 2cm)
#set text(font: \"Linux Libertine\", size: 11pt)

#let admon(kind, body) = block(
  inset: (x: 10pt, y: 8pt),
  radius: 4pt,
  fill: luma(240),
  stroke: luma(200),
  [*#kind:* ] + body,
)

";

const REPORT_PREAMBLE: &str = "\
// LeanDoc -> Typst (report)
#set page(margin: (top: 2cm, bottom: 2.2cm, x: 2.2cm))
#set text(font: \"Libertinus Serif\", size: 11pt, leading: 1.25em)
#set heading(numbering: \"1.\")

#let admon(kind, body) = block(
  inset: (x: 12pt, y: 10pt),
  radius: 6pt,
  fill: rgb(\"f6f7fb\"),
  stroke: rgb(\"cfd6e6\"),
  [#text(weight: \"bold\")[#kind] ] + body,
)

";

/// The generator state: options and the output buffer.
struct Generator<'a> {
    options: &'a Options,
    output: String,
}

impl Generator<'_> {
    fn emit_document(&mut self, doc: &Document) -> Result<()> {
        self.emit_preamble()?;

        if let Some(title) = &doc.header.title {
            writeln!(self.output, "= {}\n", escape_text(title))?;
        }

        for block in &doc.blocks {
            self.emit_block(block, 0)?;
            self.output.push('\n');
        }
        Ok(())
    }

    fn emit_preamble(&mut self) -> Result<()> {
        if let Some(file) = &self.options.template_file {
            writeln!(self.output, "#import \"{}\": *\n", escape_string(file))?;
            return Ok(());
        }
        match self.options.template.as_str() {
            "plain" => {
                self.output.push_str(PLAIN_PREAMBLE);
                Ok(())
            }
            "report" => {
                self.output.push_str(REPORT_PREAMBLE);
                Ok(())
            }
            other => Err(GenError::at_line(
                0,
                eco_format!("Unknown template name: {other}"),
            )),
        }
    }

    fn emit_block(&mut self, block: &Block, heading_shift: i32) -> Result<()> {
        match block {
            Block::Section(section) => self.emit_section(section, heading_shift),
            Block::Paragraph(para) => self.emit_paragraph(para),
            Block::LiteralParagraph(para) => {
                writeln!(
                    self.output,
                    "#raw(\"{}\", block: true)",
                    escape_string(&para.text)
                )?;
                Ok(())
            }
            Block::Admonition(adm) => self.emit_admonition(adm),
            Block::Delimited(delim) => self.emit_delimited(delim),
            Block::List(list) => self.emit_list(list),
            Block::Table(table) => self.emit_table(table),
            Block::Macro(mac) => self.emit_block_macro(mac),
            Block::Directive(dir) => Err(GenError::at_line(
                dir.pos.line,
                eco_format!(
                    "Directives must be resolved before Typst generation ({})",
                    dir.kind.as_str()
                ),
            )),
            Block::ThematicBreak { .. } => {
                self.output.push_str("---\n");
                Ok(())
            }
            Block::PageBreak { .. } => {
                self.output.push_str("#pagebreak()\n");
                Ok(())
            }
            Block::LineComment { text, .. } => {
                writeln!(self.output, "// {}", escape_text(text))?;
                Ok(())
            }
        }
    }

    fn emit_section(&mut self, section: &Section, heading_shift: i32) -> Result<()> {
        let level = i32::from(section.level) + heading_shift;
        writeln!(
            self.output,
            "{} {}{}\n",
            heading_marks(level),
            escape_text(&section.title),
            label_suffix(section.meta.as_ref())
        )?;
        for block in &section.blocks {
            self.emit_block(block, heading_shift)?;
            self.output.push('\n');
        }
        Ok(())
    }

    fn emit_paragraph(&mut self, para: &Paragraph) -> Result<()> {
        self.emit_inline_seq(&para.inlines)?;
        self.output.push('\n');
        Ok(())
    }

    fn emit_admonition(&mut self, adm: &Admonition) -> Result<()> {
        write!(
            self.output,
            "#admon(\"{}\", [",
            escape_string(adm.label.as_str())
        )?;
        self.emit_inline_seq(&adm.inlines)?;
        self.output.push_str("])\n");
        Ok(())
    }

    fn emit_delimited(&mut self, delim: &DelimitedBlock) -> Result<()> {
        match &delim.body {
            DelimitedBody::Blocks(blocks) => {
                self.output.push_str("#block([");
                for block in blocks {
                    self.emit_block(block, 0)?;
                    self.output.push('\n');
                }
                self.output.push_str("])\n");
                Ok(())
            }
            DelimitedBody::Raw(text) => {
                if delim.stem {
                    if !self.options.allow_raw_passthrough {
                        return Err(GenError::at_line(
                            delim.pos.line,
                            "Stem block requires raw passthrough or math conversion phase",
                        ));
                    }
                    self.output.push_str(text);
                    self.output.push('\n');
                    return Ok(());
                }
                writeln!(
                    self.output,
                    "#raw(\"{}\", block: true)",
                    escape_string(text)
                )?;
                Ok(())
            }
        }
    }

    fn emit_list(&mut self, list: &List) -> Result<()> {
        if list.kind == ListKind::Description {
            // Rendered as a two-column table: term, definition.
            self.output.push_str("#table(columns: 2,\n");
            for item in &list.items {
                write!(
                    self.output,
                    "  [{}], [",
                    escape_text(item.term.as_deref().unwrap_or(""))
                )?;
                if let Some(first) = item.blocks.first() {
                    self.emit_block(first, 0)?;
                }
                self.output.push_str("],\n");
            }
            self.output.push_str(")\n");
            return Ok(());
        }

        self.output.push_str(if list.kind == ListKind::Ordered {
            "#enum(\n"
        } else {
            "#list(\n"
        });
        for item in &list.items {
            self.output.push_str("  [");
            for (i, block) in item.blocks.iter().enumerate() {
                self.emit_block(block, 0)?;
                if i + 1 < item.blocks.len() {
                    self.output.push('\n');
                }
            }
            self.output.push_str("],\n");
        }
        self.output.push_str(")\n");
        Ok(())
    }

    fn emit_table(&mut self, table: &Table) -> Result<()> {
        let Some(first) = table.rows.first() else {
            return Ok(());
        };
        let cols = first.cells.len();
        if cols == 0 {
            return Ok(());
        }

        writeln!(self.output, "#table(columns: {cols},")?;
        for row in &table.rows {
            if row.cells.len() != cols {
                return Err(GenError::at_line(
                    row.pos.line,
                    "Table row has inconsistent number of cells",
                ));
            }
            for cell in &row.cells {
                self.output.push_str("  [");
                self.emit_inline_seq(&cell.inlines)?;
                self.output.push_str("],\n");
            }
        }
        self.output.push_str(")\n");
        Ok(())
    }

    fn emit_block_macro(&mut self, mac: &BlockMacro) -> Result<()> {
        match mac.name.as_str() {
            "include" => Err(GenError::at_line(
                mac.pos.line,
                "include:: requires semantic include expansion before Typst generation",
            )),
            "image" => {
                let target = mac.target.trim();
                let path = target.find('[').map_or(target, |lb| target[..lb].trim());
                writeln!(self.output, "#image(\"{}\")", escape_string(path))?;
                Ok(())
            }
            // No embedded media in the target; emit a link placeholder.
            "video" | "audio" => {
                let target = mac.target.trim();
                let link = format!("{}::{target}", mac.name);
                let label = format!("{}: {target}", mac.name.to_uppercase());
                writeln!(
                    self.output,
                    "#link(\"{}\")[{}]",
                    escape_string(&link),
                    escape_text(&label)
                )?;
                Ok(())
            }
            other => Err(GenError::at_line(
                mac.pos.line,
                eco_format!("Unsupported block macro in Typst generator: {other}"),
            )),
        }
    }

    fn emit_inline_seq(&mut self, inlines: &[Inline]) -> Result<()> {
        for node in inlines {
            self.emit_inline(node)?;
        }
        Ok(())
    }

    fn emit_inline(&mut self, node: &Inline) -> Result<()> {
        match node {
            Inline::Text { text, .. } => {
                self.output.push_str(&escape_text(text));
                Ok(())
            }
            Inline::Space { .. } => {
                self.output.push(' ');
                Ok(())
            }
            Inline::LineBreak { .. } => {
                self.output.push_str("#linebreak()");
                Ok(())
            }
            Inline::Emph(emphasis) => self.emit_emphasis(emphasis),
            Inline::Superscript { text, .. } => {
                write!(self.output, "#super[{}]", escape_text(text))?;
                Ok(())
            }
            Inline::Subscript { text, .. } => {
                write!(self.output, "#sub[{}]", escape_text(text))?;
                Ok(())
            }
            Inline::Link {
                target, children, ..
            } => {
                write!(self.output, "#link(\"{}\")[", escape_string(target))?;
                if children.is_empty() {
                    // Autolink: the target doubles as the body.
                    self.output.push_str(&escape_text(target));
                } else {
                    self.emit_inline_seq(children)?;
                }
                self.output.push(']');
                Ok(())
            }
            Inline::Image { target, .. } => {
                write!(self.output, "#image(\"{}\")", escape_string(target))?;
                Ok(())
            }
            Inline::Xref {
                target, children, ..
            } => {
                if children.is_empty() {
                    write!(self.output, "@{}", escape_text(target))?;
                } else {
                    write!(self.output, "#link(<{}>)[", escape_text(target))?;
                    self.emit_inline_seq(children)?;
                    self.output.push(']');
                }
                Ok(())
            }
            Inline::Anchor { id, .. } => {
                write!(self.output, "<{}>", escape_text(id))?;
                Ok(())
            }
            // Placeholder; the semantic phase resolves attribute values.
            Inline::AttrRef { name, .. } => {
                write!(self.output, "{{{}}}", escape_text(name))?;
                Ok(())
            }
            Inline::Macro(mac) => self.emit_inline_macro(mac),
            Inline::Passthrough { pos, children, .. } => {
                if !self.options.allow_raw_passthrough {
                    return Err(GenError::at_line(pos.line, "Inline passthrough disabled"));
                }
                self.emit_inline_seq(children)
            }
        }
    }

    fn emit_emphasis(&mut self, emphasis: &Emphasis) -> Result<()> {
        match emphasis.kind {
            EmphKind::Bold => {
                self.output.push('*');
                self.emit_emph_body(&emphasis.body)?;
                self.output.push('*');
            }
            EmphKind::Italic => {
                self.output.push('_');
                self.emit_emph_body(&emphasis.body)?;
                self.output.push('_');
            }
            EmphKind::Mono => {
                self.output.push('`');
                self.emit_emph_body(&emphasis.body)?;
                self.output.push('`');
            }
            EmphKind::Highlight => {
                self.output.push_str("#highlight([");
                self.emit_emph_body(&emphasis.body)?;
                self.output.push_str("])");
            }
        }
        Ok(())
    }

    fn emit_emph_body(&mut self, body: &EmphBody) -> Result<()> {
        match body {
            EmphBody::Literal(text) => {
                self.output.push_str(&escape_text(text));
                Ok(())
            }
            EmphBody::Children(children) => self.emit_inline_seq(children),
        }
    }

    fn emit_inline_macro(&mut self, mac: &InlineMacro) -> Result<()> {
        match mac.name.as_str() {
            "footnote" => {
                self.output.push_str("#footnote[");
                self.emit_inline_seq(&mac.children)?;
                self.output.push(']');
                Ok(())
            }
            "kbd" | "btn" | "menu" => {
                self.output.push_str("#smallcaps[");
                self.emit_inline_seq(&mac.children)?;
                self.output.push(']');
                Ok(())
            }
            "stem" => {
                if !self.options.allow_raw_passthrough {
                    return Err(GenError::at_line(
                        mac.pos.line,
                        "stem: inline macro requires raw passthrough or math conversion phase",
                    ));
                }
                write!(self.output, "${}$", escape_text(&mac.target))?;
                Ok(())
            }
            other => Err(GenError::at_line(
                mac.pos.line,
                eco_format!("Unsupported inline macro in Typst generator: {other}"),
            )),
        }
    }
}

/// Builds the heading marker run: `max(1, level)` `=` characters.
fn heading_marks(level: i32) -> String {
    "=".repeat(usize::try_from(level.max(1)).unwrap_or(1))
}

/// Returns the ` <id>` label suffix for an anchored block, or nothing.
fn label_suffix(meta: Option<&BlockMeta>) -> String {
    match meta {
        Some(meta) if meta.has_anchor() => format!(" <{}>", meta.anchor_id),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn gen(input: &str) -> String {
        let doc = parse(input).expect("input should parse");
        generate(&doc, &Options::default()).expect("generation should succeed")
    }

    fn gen_err(input: &str, options: &Options) -> GenError {
        let doc = parse(input).expect("input should parse");
        generate(&doc, options).expect_err("generation should fail")
    }

    fn no_raw() -> Options {
        Options {
            allow_raw_passthrough: false,
            ..Options::default()
        }
    }

    #[test]
    fn empty_document_is_preamble_only() {
        assert_eq!(gen(""), PLAIN_PREAMBLE);
    }

    #[test]
    fn admonition_emits_admon_call() {
        let out = gen("NOTE: be careful\n");
        assert!(out.contains("#admon(\"NOTE\", [be careful])"));
    }

    #[test]
    fn document_title_becomes_top_heading() {
        let out = gen("= The Title\n\nbody text\n");
        assert!(out.contains("= The Title\n\n"));
        assert!(out.contains("body text\n"));
    }

    #[test]
    fn heading_marks_match_level() {
        let out = gen("== Two\n=== Three\n");
        assert!(out.contains("\n== Two\n"));
        assert!(out.contains("\n=== Three\n"));
    }

    #[test]
    fn heading_marks_never_drop_below_one() {
        assert_eq!(heading_marks(0), "=");
        assert_eq!(heading_marks(-3), "=");
        assert_eq!(heading_marks(4), "====");
    }

    #[test]
    fn anchored_section_gets_label() {
        let out = gen("[[intro]]\n== Intro\n");
        assert!(out.contains("== Intro <intro>\n"));
    }

    #[test]
    fn paragraph_text_is_escaped() {
        let out = gen("5 < 6 and a[i]\n");
        assert!(out.contains("5 \\< 6 and a\\[i\\]"));
    }

    #[test]
    fn literal_paragraph_becomes_raw_block() {
        let out = gen(" code line one\n code line two\n");
        assert!(out.contains("#raw(\"code line one\\ncode line two\", block: true)"));
    }

    #[test]
    fn listing_block_becomes_raw_block() {
        let out = gen("----\nfn main() {}\n----\n");
        assert!(out.contains("#raw(\"fn main() {}\", block: true)"));
    }

    #[test]
    fn container_block_becomes_block_call() {
        let out = gen("====\ninner text\n====\n");
        assert!(out.contains("#block([inner text\n\n])"));
    }

    #[test]
    fn unordered_list() {
        let out = gen("* one\n* two\n");
        assert!(out.contains("#list(\n  [one\n],\n  [two\n],\n)"));
    }

    #[test]
    fn ordered_list() {
        let out = gen(". first\n. second\n");
        assert!(out.contains("#enum(\n  [first\n],\n  [second\n],\n)"));
    }

    #[test]
    fn description_list_as_two_column_table() {
        let out = gen("CPU:: Central Processing Unit\n");
        assert!(out.contains("#table(columns: 2,\n  [CPU], [Central Processing Unit\n],\n)"));
    }

    #[test]
    fn table_emission() {
        let out = gen("|===\n|a |b\n|c |d\n|===\n");
        assert!(out.contains("#table(columns: 2,\n  [a],\n  [b],\n  [c],\n  [d],\n)"));
    }

    #[test]
    fn thematic_and_page_breaks() {
        let out = gen("'''\n\n<<<\n");
        assert!(out.contains("---\n"));
        assert!(out.contains("#pagebreak()\n"));
    }

    #[test]
    fn emphasis_emission() {
        let out = gen("**b** and _i_ and `m` and #h#\n");
        assert!(out.contains("*b* and _i_ and `m` and #highlight([h])"));
    }

    #[test]
    fn super_and_subscript() {
        let out = gen("x^2^ and H~2~O\n");
        assert!(out.contains("#super[2]"));
        assert!(out.contains("#sub[2]"));
    }

    #[test]
    fn autolink_repeats_target_as_body() {
        let out = gen("see https://example.com for more\n");
        assert!(out.contains("#link(\"https://example.com\")[https://example.com]"));
    }

    #[test]
    fn xref_forms() {
        let out = gen("see <<intro>> and <<other, the other one>>\n");
        assert!(out.contains("@intro"));
        assert!(out.contains("#link(<other>)[the other one]"));
    }

    #[test]
    fn inline_anchor_and_attr_ref() {
        let out = gen("here [[spot]] version {version}\n");
        assert!(out.contains("<spot>"));
        assert!(out.contains("{version}"));
    }

    #[test]
    fn footnote_and_smallcaps_macros() {
        let out = gen("a footnote:[see appendix] and kbd:[Ctrl+C]\n");
        assert!(out.contains("#footnote[see appendix]"));
        assert!(out.contains("#smallcaps[Ctrl+C]"));
    }

    #[test]
    fn inline_stem_requires_raw() {
        let out = gen("stem:x+y[]\n");
        assert!(out.contains("$x+y$"));
        let err = gen_err("stem:x+y[]\n", &no_raw());
        assert!(err.message.contains("stem"));
    }

    #[test]
    fn hard_line_break() {
        let out = gen("first +\nsecond\n");
        assert!(out.contains("first#linebreak()second"));
    }

    #[test]
    fn image_block_macro() {
        let out = gen("image::shapes.png[A square]\n");
        assert!(out.contains("#image(\"shapes.png\")"));
    }

    #[test]
    fn inline_image() {
        let out = gen("logo image:logo.png[Logo] here\n");
        assert!(out.contains("#image(\"logo.png\")"));
    }

    #[test]
    fn video_macro_becomes_link_placeholder() {
        let out = gen("video::intro.mp4[]\n");
        assert!(out.contains("#link(\"video::intro.mp4[]\")"));
        assert!(out.contains("VIDEO: intro.mp4"));
    }

    #[test]
    fn include_macro_is_a_generation_error() {
        let err = gen_err("include::other.adoc[]\n", &Options::default());
        assert!(err.message.contains("include"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn directive_is_a_generation_error() {
        let err = gen_err("ifdef::x[]\ntext\nendif::[]\n", &Options::default());
        assert!(err.message.contains("Directives must be resolved"));
    }

    #[test]
    fn stem_block_verbatim_when_raw_allowed() {
        let out = gen("[stem]\n++++\nsum_(i=1)^n i\n++++\n");
        assert!(out.contains("sum_(i=1)^n i\n"));
        let err = gen_err("[stem]\n++++\nx\n++++\n", &no_raw());
        assert!(err.message.contains("Stem block"));
    }

    #[test]
    fn passthrough_inline_disabled_is_an_error() {
        let out = gen("+kept *as* children+\n");
        assert!(out.contains("kept *as* children"));
        let err = gen_err("+x+\n", &no_raw());
        assert_eq!(err.message, "Inline passthrough disabled");
    }

    #[test]
    fn line_comment_node_is_emitted() {
        let out = gen("[[c]]\n// remark\n");
        assert!(out.contains("//  remark\n"));
    }

    #[test]
    fn unknown_template_is_a_generation_error() {
        let options = Options {
            template: "fancy".into(),
            ..Options::default()
        };
        let err = gen_err("text\n", &options);
        assert!(err.message.contains("Unknown template name"));
    }

    #[test]
    fn template_file_emits_import() {
        let doc = parse("text\n").expect("parses");
        let options = Options {
            template_file: Some("styles/tpl.typ".into()),
            ..Options::default()
        };
        let out = generate(&doc, &options).expect("generates");
        assert!(out.starts_with("#import \"styles/tpl.typ\": *\n\n"));
    }

    #[test]
    fn report_template_preamble() {
        let doc = parse("").expect("parses");
        let options = Options {
            template: "report".into(),
            ..Options::default()
        };
        let out = generate(&doc, &options).expect("generates");
        assert!(out.contains("#set heading(numbering: \"1.\")"));
        assert!(out.contains("#let admon(kind, body)"));
    }

    #[test]
    fn generation_is_deterministic() {
        let doc = parse("== S\ntext with *bold*\n\n|===\n|a |b\n|===\n").expect("parses");
        let options = Options::default();
        let first = generate(&doc, &options).expect("generates");
        let second = generate(&doc, &options).expect("generates");
        assert_eq!(first, second);
    }
}
