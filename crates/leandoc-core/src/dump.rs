// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Plain-text dump of the document tree.
//!
//! One node per line, children indented by two spaces, long text payloads
//! previewed. This is the `--ast` output of the CLI and doubles as a
//! debugging aid for parser work.

use std::fmt::Write;

use crate::ast::{
    Block, BlockMeta, DelimitedBody, Document, EmphBody, Header, Inline, ListItem, TableRow,
};

/// Renders the document tree as indented plain text.
#[must_use]
pub fn dump_document(doc: &Document) -> String {
    let mut out = String::new();
    let _ = write!(out, "Document @{}", doc.pos.line);
    dump_header(&doc.header, &mut out);
    out.push('\n');
    for block in &doc.blocks {
        dump_block(block, 1, &mut out);
    }
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn dump_header(header: &Header, out: &mut String) {
    if let Some(title) = &header.title {
        let _ = write!(out, " title={}", preview(title));
    }
    if let Some(author) = &header.author_line {
        let _ = write!(out, " author={}", preview(author));
    }
    if let Some(revision) = &header.revision_line {
        let _ = write!(out, " revision={}", preview(revision));
    }
    if !header.attributes.is_empty() {
        let _ = write!(out, " attrs={}", header.attributes.len());
    }
}

fn dump_meta(meta: Option<&BlockMeta>, out: &mut String) {
    let Some(meta) = meta else { return };
    if !meta.anchor_id.is_empty() {
        let _ = write!(out, " anchorId=\"{}\"", meta.anchor_id);
    }
    if !meta.anchor_text.is_empty() {
        let _ = write!(out, " anchorText=\"{}\"", meta.anchor_text);
    }
    if !meta.title.is_empty() {
        let _ = write!(out, " title=\"{}\"", meta.title);
    }
    if !meta.attrs.is_empty() {
        let _ = write!(out, " attrs={}", meta.attrs.len());
    }
}

#[expect(clippy::too_many_lines, reason = "one arm per node kind")]
fn dump_block(block: &Block, depth: usize, out: &mut String) {
    indent(out, depth);
    match block {
        Block::Section(section) => {
            let _ = write!(out, "Section @{} level={}", section.pos.line, section.level);
            dump_meta(section.meta.as_ref(), out);
            let _ = write!(out, " name={}", preview(&section.title));
            out.push('\n');
            for child in &section.blocks {
                dump_block(child, depth + 1, out);
            }
        }
        Block::Paragraph(para) => {
            let _ = write!(out, "Paragraph @{}", para.pos.line);
            dump_meta(para.meta.as_ref(), out);
            out.push('\n');
            for inline in &para.inlines {
                dump_inline(inline, depth + 1, out);
            }
        }
        Block::LiteralParagraph(para) => {
            let _ = write!(out, "LiteralParagraph @{}", para.pos.line);
            dump_meta(para.meta.as_ref(), out);
            let _ = write!(out, " text={}", preview(&para.text));
            out.push('\n');
        }
        Block::Admonition(adm) => {
            let _ = write!(out, "AdmonitionParagraph @{}", adm.pos.line);
            dump_meta(adm.meta.as_ref(), out);
            let _ = write!(out, " name=\"{}\"", adm.label.as_str());
            out.push('\n');
            for inline in &adm.inlines {
                dump_inline(inline, depth + 1, out);
            }
        }
        Block::Delimited(delim) => {
            let _ = write!(
                out,
                "DelimitedBlock @{} delim={}",
                delim.pos.line,
                delim.kind.as_str()
            );
            if delim.stem {
                out.push_str(" stem=1");
            }
            dump_meta(delim.meta.as_ref(), out);
            match &delim.body {
                DelimitedBody::Raw(text) => {
                    let _ = write!(out, " text={}", preview(text));
                    out.push('\n');
                }
                DelimitedBody::Blocks(blocks) => {
                    out.push('\n');
                    for child in blocks {
                        dump_block(child, depth + 1, out);
                    }
                }
            }
        }
        Block::List(list) => {
            let _ = write!(out, "List @{} type={}", list.pos.line, list.kind.as_str());
            dump_meta(list.meta.as_ref(), out);
            out.push('\n');
            for item in &list.items {
                dump_list_item(item, depth + 1, out);
            }
        }
        Block::Table(table) => {
            let _ = write!(out, "Table @{}", table.pos.line);
            dump_meta(table.meta.as_ref(), out);
            out.push('\n');
            for row in &table.rows {
                dump_table_row(row, depth + 1, out);
            }
        }
        Block::Macro(mac) => {
            let _ = write!(
                out,
                "BlockMacro @{} name=\"{}\" target={}",
                mac.pos.line,
                mac.name,
                preview(&mac.target)
            );
            dump_meta(mac.meta.as_ref(), out);
            out.push('\n');
        }
        Block::Directive(dir) => {
            let _ = write!(
                out,
                "Directive @{} name=\"{}\" text={}",
                dir.pos.line,
                dir.kind.as_str(),
                preview(&dir.condition)
            );
            dump_meta(dir.meta.as_ref(), out);
            out.push('\n');
            for child in &dir.blocks {
                dump_block(child, depth + 1, out);
            }
        }
        Block::ThematicBreak { pos, meta, marker } => {
            let _ = write!(out, "ThematicBreak @{} text={}", pos.line, preview(marker));
            dump_meta(meta.as_ref(), out);
            out.push('\n');
        }
        Block::PageBreak { pos, meta } => {
            let _ = write!(out, "PageBreak @{}", pos.line);
            dump_meta(meta.as_ref(), out);
            out.push('\n');
        }
        Block::LineComment { pos, meta, text } => {
            let _ = write!(out, "LineComment @{} text={}", pos.line, preview(text));
            dump_meta(meta.as_ref(), out);
            out.push('\n');
        }
    }
}

fn dump_list_item(item: &ListItem, depth: usize, out: &mut String) {
    indent(out, depth);
    let _ = write!(out, "ListItem @{} level={}", item.pos.line, item.marker_level);
    if let Some(term) = &item.term {
        let _ = write!(out, " name={}", preview(term));
    }
    if let Some(check) = item.check {
        let _ = write!(
            out,
            " check={}",
            match check {
                crate::ast::Checklist::Checked => "x",
                crate::ast::Checklist::Unchecked => " ",
            }
        );
    }
    out.push('\n');
    for block in &item.blocks {
        dump_block(block, depth + 1, out);
    }
}

fn dump_table_row(row: &TableRow, depth: usize, out: &mut String) {
    indent(out, depth);
    let _ = write!(out, "TableRow @{}", row.pos.line);
    out.push('\n');
    for cell in &row.cells {
        indent(out, depth + 1);
        let _ = write!(out, "TableCell @{}", cell.pos.line);
        out.push('\n');
        for inline in &cell.inlines {
            dump_inline(inline, depth + 2, out);
        }
    }
}

fn dump_inline(inline: &Inline, depth: usize, out: &mut String) {
    indent(out, depth);
    match inline {
        Inline::Text { pos, text } => {
            let _ = write!(out, "Text @{} text={}", pos.line, preview(text));
            out.push('\n');
        }
        Inline::Space { pos } => {
            let _ = write!(out, "Space @{}", pos.line);
            out.push('\n');
        }
        Inline::LineBreak { pos } => {
            let _ = write!(out, "LineBreak @{}", pos.line);
            out.push('\n');
        }
        Inline::Emph(emphasis) => {
            let _ = write!(
                out,
                "Emph @{} name=\"{}\"",
                emphasis.pos.line,
                emphasis.kind.as_str()
            );
            match &emphasis.body {
                EmphBody::Literal(text) => {
                    let _ = write!(out, " text={}", preview(text));
                    out.push('\n');
                }
                EmphBody::Children(children) => {
                    out.push('\n');
                    for child in children {
                        dump_inline(child, depth + 1, out);
                    }
                }
            }
        }
        Inline::Superscript { pos, text } => {
            let _ = write!(out, "Superscript @{} text={}", pos.line, preview(text));
            out.push('\n');
        }
        Inline::Subscript { pos, text } => {
            let _ = write!(out, "Subscript @{} text={}", pos.line, preview(text));
            out.push('\n');
        }
        Inline::Link {
            pos,
            target,
            children,
        } => {
            let _ = write!(out, "Link @{} target={}", pos.line, preview(target));
            out.push('\n');
            for child in children {
                dump_inline(child, depth + 1, out);
            }
        }
        Inline::Image { pos, target, alt } => {
            let _ = write!(out, "ImageInline @{} target={}", pos.line, preview(target));
            if !alt.is_empty() {
                let _ = write!(out, " text={}", preview(alt));
            }
            out.push('\n');
        }
        Inline::Anchor { pos, id, children } => {
            let _ = write!(out, "AnchorInline @{} name={}", pos.line, preview(id));
            out.push('\n');
            for child in children {
                dump_inline(child, depth + 1, out);
            }
        }
        Inline::Xref {
            pos,
            target,
            children,
        } => {
            let _ = write!(out, "Xref @{} target={}", pos.line, preview(target));
            out.push('\n');
            for child in children {
                dump_inline(child, depth + 1, out);
            }
        }
        Inline::AttrRef { pos, name } => {
            let _ = write!(out, "AttrRef @{} name={}", pos.line, preview(name));
            out.push('\n');
        }
        Inline::Macro(mac) => {
            let _ = write!(
                out,
                "InlineMacro @{} name=\"{}\" target={}",
                mac.pos.line,
                mac.name,
                preview(&mac.target)
            );
            out.push('\n');
            for child in &mac.children {
                dump_inline(child, depth + 1, out);
            }
        }
        Inline::Passthrough {
            pos,
            plus_count,
            children,
        } => {
            let _ = write!(out, "PassthroughInline @{} plus={plus_count}", pos.line);
            out.push('\n');
            for child in children {
                dump_inline(child, depth + 1, out);
            }
        }
    }
}

/// Quotes a text payload, collapsing whitespace and truncating previews
/// longer than 64 characters.
fn preview(text: &str) -> String {
    if text.chars().count() <= 64 {
        return format!("\"{text}\"");
    }
    let simplified: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let head: String = simplified.chars().take(64).collect();
    format!("\"{head}\"...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn dump_shape() {
        let doc = parse("== Section\nSome *bold* text.\n").expect("parses");
        let dump = dump_document(&doc);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "Document @1");
        assert_eq!(lines[1], "  Section @1 level=2 name=\"Section\"");
        assert_eq!(lines[2], "    Paragraph @2");
        assert_eq!(lines[3], "      Text @2 text=\"Some \"");
        assert_eq!(lines[4], "      Emph @2 name=\"bold\"");
        assert_eq!(lines[5], "        Text @2 text=\"bold\"");
        assert_eq!(lines[6], "      Text @2 text=\" text.\"");
    }

    #[test]
    fn dump_shows_meta_and_header() {
        let doc = parse("= Title\n\n[[a]]\n== Anchored\nx\n").expect("parses");
        let dump = dump_document(&doc);
        assert!(dump.starts_with("Document @1 title=\"Title\"\n"));
        assert!(dump.contains("anchorId=\"a\""));
    }

    #[test]
    fn long_text_is_truncated() {
        let long = "word ".repeat(40);
        let doc = parse(&long).expect("parses");
        let dump = dump_document(&doc);
        assert!(dump.contains("\"..."));
    }

    #[test]
    fn table_dump() {
        let doc = parse("|===\n|a |b\n|===\n").expect("parses");
        let dump = dump_document(&doc);
        assert!(dump.contains("Table @1"));
        assert!(dump.contains("  TableRow @2"));
        assert!(dump.contains("    TableCell @2"));
    }
}
