use std::ops::Range;

use slimgen_core::frontend::NodeId;

use crate::parser::parse;
use crate::syntax::SyntaxTree;

/// Remove nodes from a tree's text and re-parse it
///
/// Each removed node takes its leading indentation and its trailing line
/// break with it when it stands on a line of its own. The root node is never
/// removed.
pub fn remove_nodes(tree: &SyntaxTree, nodes: &[NodeId]) -> SyntaxTree {
    let text = tree.text();
    let mut ranges: Vec<Range<usize>> = nodes
        .iter()
        .filter_map(|id| tree.node(*id))
        .filter(|node| node.parent.is_some())
        .map(|node| with_trivia(text, node.span.clone()))
        .collect();
    ranges.sort_by_key(|r| r.start);

    let mut rewritten = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in ranges {
        if range.start >= cursor {
            rewritten.push_str(&text[cursor..range.start]);
        }
        cursor = cursor.max(range.end);
    }
    rewritten.push_str(&text[cursor..]);

    parse(tree.name(), &rewritten)
}

fn with_trivia(text: &str, span: Range<usize>) -> Range<usize> {
    let bytes = text.as_bytes();

    let mut start = span.start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] != b'\n' {
        start = span.start;
    }

    let mut end = span.end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\r' {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    }
    start..end
}
