// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Inline markup scanner.
//!
//! A single left-to-right pass over an assembled text run, producing an
//! ordered list of [`Inline`] nodes. The recognizers are attempted in a
//! fixed priority order; for each paired construct the scanner searches for
//! the earliest matching close and re-parses the inner text recursively,
//! bounded by a depth guard. Unmatched characters accumulate into plain
//! text runs.
//!
//! All delimiters are ASCII, so the scanner works on byte offsets; every
//! offset it lands on is a character boundary.

use ecow::EcoString;

use crate::ast::{EmphBody, EmphKind, Emphasis, Inline, InlineMacro, Pos};

/// Recursion limit for nested inline markup.
const MAX_DEPTH: u32 = 32;

/// URL schemes recognized for autolinks.
const URL_SCHEMES: [&str; 5] = ["http:", "https:", "ftp:", "irc:", "mailto:"];

/// Scans a text run into inline nodes.
pub(crate) fn parse_inline(s: &str, line_no: u32) -> Vec<Inline> {
    scan(s, line_no, 0)
}

/// Appends accumulated plain text as a `Text` node, if any.
fn flush(acc: &mut String, out: &mut Vec<Inline>, pos: Pos) {
    if !acc.is_empty() {
        out.push(Inline::Text {
            pos,
            text: EcoString::from(acc.as_str()),
        });
        acc.clear();
    }
}

/// Emits an emphasis node whose inner text is re-parsed.
fn emph(pos: Pos, kind: EmphKind, inner: &str, line_no: u32, depth: u32) -> Inline {
    Inline::Emph(Emphasis {
        pos,
        kind,
        body: EmphBody::Children(scan(inner, line_no, depth + 1)),
    })
}

#[expect(clippy::too_many_lines, reason = "one arm per inline recognizer")]
fn scan(s: &str, line_no: u32, depth: u32) -> Vec<Inline> {
    let pos = Pos::at_line(line_no);

    // Depth guard: beyond the limit the remaining input stays literal.
    if depth > MAX_DEPTH {
        if s.is_empty() {
            return Vec::new();
        }
        return vec![Inline::Text {
            pos,
            text: EcoString::from(s),
        }];
    }

    let mut out = Vec::new();
    let mut acc = String::new();
    let mut i = 0;

    while i < s.len() {
        let rest = &s[i..];

        // Attribute reference: {name}
        if rest.starts_with('{') {
            if let Some(j) = rest[1..].find('}') {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(Inline::AttrRef {
                        pos,
                        name: EcoString::from(rest[1..1 + j].trim()),
                    });
                    i += 1 + j + 1;
                    continue;
                }
            }
        }

        // Cross reference: <<id>> or <<id, text>>
        if rest.starts_with("<<") {
            if let Some(j) = rest[2..].find(">>") {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    let inner = &rest[2..2 + j];
                    let (target, children) = split_target_text(inner, line_no, depth);
                    out.push(Inline::Xref {
                        pos,
                        target,
                        children,
                    });
                    i += 2 + j + 2;
                    continue;
                }
            }
        }

        // Inline anchor: [[id]] or [[id, text]]
        if rest.starts_with("[[") {
            if let Some(j) = rest[2..].find("]]") {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    let inner = &rest[2..2 + j];
                    let (id, children) = split_target_text(inner, line_no, depth);
                    out.push(Inline::Anchor { pos, id, children });
                    i += 2 + j + 2;
                    continue;
                }
            }
        }

        // URL autolink: scheme prefix, consumed up to whitespace or a bracket.
        if URL_SCHEMES.iter().any(|scheme| rest.starts_with(scheme)) {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '[' || c == ']')
                .unwrap_or(rest.len());
            if end > 5 {
                flush(&mut acc, &mut out, pos);
                out.push(Inline::Link {
                    pos,
                    target: EcoString::from(&rest[..end]),
                    children: Vec::new(),
                });
                i += end;
                continue;
            }
        }

        // Inline macro: name:target[args]
        if let Some(colon) = rest.find(':') {
            if colon > 0
                && colon + 1 < rest.len()
                && rest[..colon]
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
            {
                if let Some(lb) = rest[colon + 1..].find('[').map(|k| colon + 1 + k) {
                    if let Some(rb) = rest[lb + 1..].find(']').map(|k| lb + 1 + k) {
                        flush(&mut acc, &mut out, pos);
                        let name = &rest[..colon];
                        let target = &rest[colon + 1..lb];
                        let inner = &rest[lb + 1..rb];
                        if name == "image" {
                            out.push(Inline::Image {
                                pos,
                                target: EcoString::from(target.trim()),
                                alt: EcoString::from(inner),
                            });
                        } else {
                            out.push(Inline::Macro(InlineMacro {
                                pos,
                                name: EcoString::from(name),
                                target: EcoString::from(target),
                                children: scan(inner, line_no, depth + 1),
                            }));
                        }
                        i += rb + 1;
                        continue;
                    }
                }
            }
        }

        // Emphasis, unconstrained before constrained.
        if rest.starts_with("**") {
            if let Some(j) = rest[2..].find("**") {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(emph(pos, EmphKind::Bold, &rest[2..2 + j], line_no, depth));
                    i += 2 + j + 2;
                    continue;
                }
            }
        }
        if rest.starts_with('*') {
            if let Some(j) = rest[1..].find('*') {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(emph(pos, EmphKind::Bold, &rest[1..1 + j], line_no, depth));
                    i += 1 + j + 1;
                    continue;
                }
            }
        }
        if rest.starts_with("__") {
            if let Some(j) = rest[2..].find("__") {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(emph(pos, EmphKind::Italic, &rest[2..2 + j], line_no, depth));
                    i += 2 + j + 2;
                    continue;
                }
            }
        }
        if rest.starts_with('_') {
            if let Some(j) = rest[1..].find('_') {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(emph(pos, EmphKind::Italic, &rest[1..1 + j], line_no, depth));
                    i += 1 + j + 1;
                    continue;
                }
            }
        }
        if rest.starts_with("``") {
            if let Some(j) = rest[2..].find("``") {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(emph(pos, EmphKind::Mono, &rest[2..2 + j], line_no, depth));
                    i += 2 + j + 2;
                    continue;
                }
            }
        }
        // Constrained monospace keeps its inner text literal.
        if rest.starts_with('`') {
            if let Some(j) = rest[1..].find('`') {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(Inline::Emph(Emphasis {
                        pos,
                        kind: EmphKind::Mono,
                        body: EmphBody::Literal(EcoString::from(&rest[1..1 + j])),
                    }));
                    i += 1 + j + 1;
                    continue;
                }
            }
        }
        if rest.starts_with('#') {
            if let Some(j) = rest[1..].find('#') {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(emph(
                        pos,
                        EmphKind::Highlight,
                        &rest[1..1 + j],
                        line_no,
                        depth,
                    ));
                    i += 1 + j + 1;
                    continue;
                }
            }
        }
        if rest.starts_with('^') {
            if let Some(j) = rest[1..].find('^') {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(Inline::Superscript {
                        pos,
                        text: EcoString::from(&rest[1..1 + j]),
                    });
                    i += 1 + j + 1;
                    continue;
                }
            }
        }
        if rest.starts_with('~') {
            if let Some(j) = rest[1..].find('~') {
                if j >= 1 {
                    flush(&mut acc, &mut out, pos);
                    out.push(Inline::Subscript {
                        pos,
                        text: EcoString::from(&rest[1..1 + j]),
                    });
                    i += 1 + j + 1;
                    continue;
                }
            }
        }

        // Passthrough: +...+ / ++...++ / +++...+++
        if rest.starts_with('+') {
            let n = rest.bytes().take_while(|&b| b == b'+').count();
            if (1..=3).contains(&n) {
                let fence = &rest[..n];
                if let Some(j) = rest[n..].find(fence) {
                    if j >= 1 {
                        flush(&mut acc, &mut out, pos);
                        out.push(Inline::Passthrough {
                            pos,
                            plus_count: u8::try_from(n).unwrap_or(3),
                            children: scan(&rest[n..n + j], line_no, depth + 1),
                        });
                        i += n + j + n;
                        continue;
                    }
                }
            }
        }

        // Default: the character joins the running text.
        match rest.chars().next() {
            Some(c) => {
                acc.push(c);
                i += c.len_utf8();
            }
            None => break,
        }
    }

    flush(&mut acc, &mut out, pos);
    out
}

/// Splits `id` or `id, text` content: the part before the first comma is
/// the target, the rest (if any) is re-parsed as inline text.
fn split_target_text(inner: &str, line_no: u32, depth: u32) -> (EcoString, Vec<Inline>) {
    match inner.find(',') {
        None => (EcoString::from(inner.trim()), Vec::new()),
        Some(comma) => (
            EcoString::from(inner[..comma].trim()),
            scan(inner[comma + 1..].trim(), line_no, depth + 1),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(node: &Inline) -> &str {
        match node {
            Inline::Text { text, .. } => text.as_str(),
            other => panic!("expected text node, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_is_one_node() {
        let nodes = parse_inline("just some words", 1);
        assert_eq!(nodes.len(), 1);
        assert_eq!(text(&nodes[0]), "just some words");
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(parse_inline("", 1).is_empty());
    }

    #[test]
    fn emphasis_kinds_in_sequence() {
        // Bold, italic, and monospace separated by plain text.
        let nodes = parse_inline("**bold** and _italic_ and ``mono``", 1);
        assert_eq!(nodes.len(), 5);
        let Inline::Emph(b) = &nodes[0] else {
            panic!("expected emphasis")
        };
        assert_eq!(b.kind, EmphKind::Bold);
        assert_eq!(text(&nodes[1]), " and ");
        let Inline::Emph(it) = &nodes[2] else {
            panic!("expected emphasis")
        };
        assert_eq!(it.kind, EmphKind::Italic);
        assert_eq!(text(&nodes[3]), " and ");
        let Inline::Emph(m) = &nodes[4] else {
            panic!("expected emphasis")
        };
        assert_eq!(m.kind, EmphKind::Mono);
        assert!(matches!(&m.body, EmphBody::Children(c) if c.len() == 1));
    }

    #[test]
    fn constrained_mono_stays_literal() {
        let nodes = parse_inline("`a*b`", 1);
        assert_eq!(nodes.len(), 1);
        let Inline::Emph(m) = &nodes[0] else {
            panic!("expected emphasis")
        };
        assert_eq!(m.kind, EmphKind::Mono);
        assert_eq!(m.body, EmphBody::Literal("a*b".into()));
    }

    #[test]
    fn highlight_super_sub() {
        let nodes = parse_inline("#hi# x^2^ H~2~O", 1);
        let Inline::Emph(h) = &nodes[0] else {
            panic!("expected emphasis")
        };
        assert_eq!(h.kind, EmphKind::Highlight);
        assert!(nodes
            .iter()
            .any(|n| matches!(n, Inline::Superscript { text, .. } if text == "2")));
        assert!(nodes
            .iter()
            .any(|n| matches!(n, Inline::Subscript { text, .. } if text == "2")));
    }

    #[test]
    fn attr_ref() {
        let nodes = parse_inline("version {version} here", 1);
        assert_eq!(nodes.len(), 3);
        assert!(matches!(&nodes[1], Inline::AttrRef { name, .. } if name == "version"));
    }

    #[test]
    fn xref_bare_and_with_text() {
        let nodes = parse_inline("<<intro>>", 1);
        assert!(
            matches!(&nodes[0], Inline::Xref { target, children, .. } if target == "intro" && children.is_empty())
        );

        let nodes = parse_inline("<<intro, the introduction>>", 1);
        let Inline::Xref { target, children, .. } = &nodes[0] else {
            panic!("expected xref")
        };
        assert_eq!(target, "intro");
        assert_eq!(text(&children[0]), "the introduction");
    }

    #[test]
    fn inline_anchor() {
        let nodes = parse_inline("[[here]]", 1);
        assert!(matches!(&nodes[0], Inline::Anchor { id, .. } if id == "here"));
    }

    #[test]
    fn url_autolink_stops_at_whitespace() {
        let nodes = parse_inline("visit https://example.com now", 1);
        assert_eq!(nodes.len(), 3);
        assert_eq!(text(&nodes[0]), "visit ");
        assert!(
            matches!(&nodes[1], Inline::Link { target, children, .. } if target == "https://example.com" && children.is_empty())
        );
        assert_eq!(text(&nodes[2]), " now");
    }

    #[test]
    fn inline_macro_with_empty_target() {
        let nodes = parse_inline("press kbd:[Ctrl+C] to copy", 1);
        let Inline::Macro(m) = &nodes[1] else {
            panic!("expected macro")
        };
        assert_eq!(m.name, "kbd");
        assert_eq!(m.target, "");
        assert_eq!(text(&m.children[0]), "Ctrl+C");
    }

    #[test]
    fn footnote_macro() {
        let nodes = parse_inline("fact footnote:[source needed]", 1);
        let Inline::Macro(m) = &nodes[1] else {
            panic!("expected macro")
        };
        assert_eq!(m.name, "footnote");
        assert_eq!(text(&m.children[0]), "source needed");
    }

    #[test]
    fn inline_image() {
        let nodes = parse_inline("image:logo.png[The Logo]", 1);
        assert!(
            matches!(&nodes[0], Inline::Image { target, alt, .. } if target == "logo.png" && alt == "The Logo")
        );
    }

    #[test]
    fn passthrough_reparses_children() {
        let nodes = parse_inline("+*lit*+", 1);
        let Inline::Passthrough {
            plus_count,
            children,
            ..
        } = &nodes[0]
        else {
            panic!("expected passthrough")
        };
        assert_eq!(*plus_count, 1);
        assert!(matches!(&children[0], Inline::Emph(e) if e.kind == EmphKind::Bold));
    }

    #[test]
    fn triple_passthrough() {
        let nodes = parse_inline("+++raw+++", 1);
        assert!(matches!(&nodes[0], Inline::Passthrough { plus_count: 3, .. }));
    }

    #[test]
    fn unmatched_markers_stay_text() {
        assert_eq!(text(&parse_inline("*only", 1)[0]), "*only");
        assert_eq!(text(&parse_inline("a { b", 1)[0]), "a { b");
        assert_eq!(text(&parse_inline("<<open", 1)[0]), "<<open");
    }

    #[test]
    fn nested_emphasis() {
        let nodes = parse_inline("*_both_*", 1);
        let Inline::Emph(outer) = &nodes[0] else {
            panic!("expected emphasis")
        };
        assert_eq!(outer.kind, EmphKind::Bold);
        let EmphBody::Children(inner) = &outer.body else {
            panic!("expected children")
        };
        assert!(matches!(&inner[0], Inline::Emph(e) if e.kind == EmphKind::Italic));
    }

    #[test]
    fn depth_guard_survives_deep_nesting() {
        // Alternate bold and italic far past the guard limit.
        let mut s = String::from("x");
        for level in 0..64 {
            if level % 2 == 0 {
                s = format!("*{s}*");
            } else {
                s = format!("_{s}_");
            }
        }
        let nodes = parse_inline(&s, 1);
        assert!(!nodes.is_empty());
    }

    #[test]
    fn multibyte_text_survives() {
        let nodes = parse_inline("naïve → *gros* œuvre", 1);
        assert_eq!(nodes.len(), 3);
        assert_eq!(text(&nodes[0]), "naïve → ");
        assert_eq!(text(&nodes[2]), " œuvre");
    }
}
