//! # Emitter
//!
//! Writes a [`Document`] back to text. Parsed nodes are written from their
//! recorded source text, so an unedited document reproduces its input byte
//! for byte. Generated nodes use the layout 4C files use: two-space block
//! indentation, compact mappings in sequences, and `[a, b]` flow style
//! where the node asks for it.

use crate::document::Document;
use crate::node::{CollectionStyle, Decor, DocumentNode, MappingNode, ScalarRepr, SequenceNode};
use crate::scalar::Scalar;

/// Serialize a document to text.
pub fn serialize(doc: &Document) -> String {
    let mut lines: Vec<String> = doc.leading.clone();

    match &doc.root {
        DocumentNode::Mapping(m) if !m.style.is_flow() => {
            emit_mapping(m, block_indent(&m.style, 0), &mut lines);
        }
        DocumentNode::Sequence(s) if !s.style.is_flow() && !s.is_empty() => {
            emit_sequence(s, block_indent(&s.style, 0), &mut lines);
        }
        root => {
            lines.extend(doc.root_decor.prefix.iter().cloned());
            emit_value(String::new(), &doc.root_decor, root, 0, None, &mut lines);
        }
    }

    lines.extend(doc.trailing.iter().cloned());
    if lines.is_empty() {
        return String::new();
    }

    let mut out = lines.join("\n");
    if doc.final_newline {
        out.push('\n');
    }
    if doc.crlf {
        out = out.replace('\n', "\r\n");
    }
    out
}

fn block_indent(style: &CollectionStyle, default: usize) -> usize {
    match style {
        CollectionStyle::Block {
            indent: Some(indent),
        } => *indent,
        _ => default,
    }
}

fn emit_mapping(mapping: &MappingNode, indent: usize, lines: &mut Vec<String>) {
    for entry in &mapping.entries {
        lines.extend(entry.decor.prefix.iter().cloned());
        let key = entry
            .key
            .repr
            .clone()
            .unwrap_or_else(|| Scalar::String(entry.key.name.clone()).render());
        let head = format!("{}{}{}:", " ".repeat(indent), key, entry.decor.key_ws);
        emit_value(head, &entry.decor, &entry.value, indent, None, lines);
    }
}

fn emit_sequence(sequence: &SequenceNode, indent: usize, lines: &mut Vec<String>) {
    for item in &sequence.items {
        lines.extend(item.decor.prefix.iter().cloned());
        let head = format!("{}-", " ".repeat(indent));
        emit_value(
            head,
            &item.decor,
            &item.value,
            indent,
            Some(item.compact),
            lines,
        );
    }
}

fn emit_collection(node: &DocumentNode, indent: usize, lines: &mut Vec<String>) {
    match node {
        DocumentNode::Mapping(m) => emit_mapping(m, indent, lines),
        DocumentNode::Sequence(s) => emit_sequence(s, indent, lines),
        DocumentNode::Scalar(_) => {}
    }
}

/// Indentation of a non-empty block collection (`None` if generated), or
/// `None` at the outer level for anything written inline.
fn block_layout(node: &DocumentNode) -> Option<Option<usize>> {
    let (style, empty) = match node {
        DocumentNode::Mapping(m) => (&m.style, m.is_empty()),
        DocumentNode::Sequence(s) => (&s.style, s.is_empty()),
        DocumentNode::Scalar(_) => return None,
    };
    match style {
        CollectionStyle::Block { indent } if !empty => Some(*indent),
        _ => None,
    }
}

/// Write the value that follows `head` (`key:` or `-`). `item` is
/// `Some(compact)` for sequence items.
fn emit_value(
    head: String,
    decor: &Decor,
    value: &DocumentNode,
    parent_indent: usize,
    item: Option<bool>,
    lines: &mut Vec<String>,
) {
    let Some(layout) = block_layout(value) else {
        let (text, body) = inline_text(value);
        let ws = if decor.value_ws.is_empty() && !text.is_empty() && !head.is_empty() {
            " "
        } else {
            decor.value_ws.as_str()
        };
        lines.push(format!("{head}{ws}{text}{}", decor.suffix));
        if let Some(body) = body {
            lines.extend(body.iter().cloned());
        }
        return;
    };

    let compact = item.is_some_and(|compact| compact || layout.is_none());
    if !compact {
        lines.push(format!("{head}{}", decor.suffix));
        emit_collection(value, layout.unwrap_or(parent_indent + 2), lines);
        return;
    }

    // The first child shares the `-` line; its comment lines go above it.
    let ws = if decor.value_ws.is_empty() {
        " "
    } else {
        decor.value_ws.as_str()
    };
    let child_indent = layout.unwrap_or(parent_indent + 1 + ws.len());
    let mut child = Vec::new();
    emit_collection(value, child_indent, &mut child);
    let first_prefix = first_prefix_len(value);
    let mut child = child.into_iter();
    lines.extend(child.by_ref().take(first_prefix));
    if let Some(first) = child.next() {
        lines.push(format!("{head}{ws}{}", first.trim_start_matches(' ')));
    }
    lines.extend(child);
}

fn first_prefix_len(node: &DocumentNode) -> usize {
    match node {
        DocumentNode::Mapping(m) => m.entries.first().map_or(0, |e| e.decor.prefix.len()),
        DocumentNode::Sequence(s) => s.items.first().map_or(0, |i| i.decor.prefix.len()),
        DocumentNode::Scalar(_) => 0,
    }
}

/// Single-line text of an inline value, plus the body lines of a block
/// scalar.
fn inline_text(node: &DocumentNode) -> (String, Option<&Vec<String>>) {
    match node {
        DocumentNode::Scalar(s) => match s.repr() {
            Some(ScalarRepr::Inline(text)) => (text.clone(), None),
            Some(ScalarRepr::Block { header, body }) => (header.clone(), Some(body)),
            None => (s.value().render(), None),
        },
        DocumentNode::Mapping(m) => match &m.style {
            CollectionStyle::Flow { repr: Some(text) } => (text.clone(), None),
            _ => (render_flow(node), None),
        },
        DocumentNode::Sequence(s) => match &s.style {
            CollectionStyle::Flow { repr: Some(text) } => (text.clone(), None),
            _ => (render_flow(node), None),
        },
    }
}

/// Flow-style text of a node, reusing source tokens where they exist.
fn render_flow(node: &DocumentNode) -> String {
    match node {
        DocumentNode::Scalar(s) => match s.repr() {
            Some(ScalarRepr::Inline(text)) if !text.is_empty() => text.clone(),
            _ => s.value().render(),
        },
        DocumentNode::Mapping(m) => {
            if let CollectionStyle::Flow { repr: Some(text) } = &m.style {
                return text.clone();
            }
            let entries: Vec<String> = m
                .entries
                .iter()
                .map(|e| {
                    let key = e
                        .key
                        .repr
                        .clone()
                        .unwrap_or_else(|| Scalar::String(e.key.name.clone()).render());
                    format!("{key}: {}", render_flow(&e.value))
                })
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        DocumentNode::Sequence(s) => {
            if let CollectionStyle::Flow { repr: Some(text) } = &s.style {
                return text.clone();
            }
            let items: Vec<String> = s.iter().map(render_flow).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourc_core::DocPath;
    use serde_json::json;

    fn path(s: &str) -> DocPath {
        DocPath::parse(s).unwrap()
    }

    #[test]
    fn test_generated_document_layout() {
        let doc = Document::from_json(&json!({
            "PROBLEM TYPE": {"PROBLEMTYPE": "Structure"},
            "FUNCT1": [{"COMPONENT": 0, "SYMBOLIC_FUNCTION_OF_SPACE_TIME": "t"}],
            "VEC": [1.0, 2.5],
            "EMPTY": [],
            "NAMES": ["a b", "1.0"],
        }));
        let expected = "\
PROBLEM TYPE:
  PROBLEMTYPE: Structure
FUNCT1:
  - COMPONENT: 0
    SYMBOLIC_FUNCTION_OF_SPACE_TIME: t
VEC: [1.0, 2.5]
EMPTY: []
NAMES:
  - a b
  - \"1.0\"
";
        assert_eq!(serialize(&doc), expected);
    }

    #[test]
    fn test_edit_keeps_surrounding_text() {
        let text = "# header\na: 1  # keep me\nb:\n  c: [1, 2]   # vec\n";
        let mut doc = Document::parse(text).unwrap();
        doc.set(&path("a"), DocumentNode::scalar(2)).unwrap();
        doc.set(&path("b.c[2]"), DocumentNode::scalar(3)).unwrap();
        doc.set(&path("b.d"), DocumentNode::scalar("new")).unwrap();
        assert_eq!(
            serialize(&doc),
            "# header\na: 2  # keep me\nb:\n  c: [1, 2, 3]   # vec\n  d: new\n"
        );
    }

    #[test]
    fn test_scalar_replaced_by_mapping() {
        let mut doc = Document::parse("a: 1\nb: 2\n").unwrap();
        doc.set(&path("a.x"), DocumentNode::null()).unwrap_err();
        doc.set(&path("a"), DocumentNode::from_json(&json!({"x": 1})))
            .unwrap();
        assert_eq!(serialize(&doc), "a:\n  x: 1\nb: 2\n");
    }

    #[test]
    fn test_failed_set_leaves_text_unchanged() {
        let mut doc = Document::parse("a: 1\n").unwrap();
        assert!(doc.set(&path("b.c[3]"), DocumentNode::scalar(1)).is_err());
        assert!(doc.set(&path("a.b"), DocumentNode::scalar(1)).is_err());
        assert_eq!(serialize(&doc), "a: 1\n");
    }

    #[test]
    fn test_removing_absent_key_keeps_flow_text() {
        let text = "m: {a: 1,   b: 2}\nn:\n  v: [1,  2]\n";
        let mut doc = Document::parse(text).unwrap();
        assert!(doc.remove(&path("m.zzz")).unwrap().is_none());
        assert!(doc.remove(&path("n.v[5]")).unwrap().is_none());
        assert!(doc.remove(&path("m.a.deeper")).is_err());
        assert_eq!(serialize(&doc), text);
    }

    #[test]
    fn test_emptied_collection_renders_inline() {
        let mut doc = Document::parse("a:\n  b: 1\nc: 2\n").unwrap();
        doc.remove(&path("a.b")).unwrap();
        assert_eq!(serialize(&doc), "a: {}\nc: 2\n");
    }

    #[test]
    fn test_removing_first_compact_entry() {
        let mut doc = Document::parse("s:\n  - a: 1\n    # about b\n    b: 2\n").unwrap();
        doc.remove(&path("s[0].a")).unwrap();
        assert_eq!(serialize(&doc), "s:\n    # about b\n  - b: 2\n");
    }

    #[test]
    fn test_crlf_preserved_on_edit() {
        let mut doc = Document::parse("a: 1\r\nb: 2\r\n").unwrap();
        doc.set(&path("c"), DocumentNode::scalar(3)).unwrap();
        assert_eq!(serialize(&doc), "a: 1\r\nb: 2\r\nc: 3\r\n");
    }

    #[test]
    fn test_appending_to_empty_document() {
        let mut doc = Document::parse("").unwrap();
        assert_eq!(serialize(&doc), "");
        doc.set(&path("a"), DocumentNode::scalar(true)).unwrap();
        assert_eq!(serialize(&doc), "a: true\n");
    }
}
