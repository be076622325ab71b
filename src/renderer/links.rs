//! In-page anchor resolution.

use crate::node::{Node, NodePath};

/// Turns heading text into the fragment id a Markdown link would use:
/// trimmed, every non-word character replaced by `-`, lowercased.
///
/// Replacement counts UTF-16 code units, so a character outside the Basic
/// Multilingual Plane becomes `--`, as it does in the webview.
#[must_use]
pub fn heading_id(content: &str) -> String {
    let mut id = String::with_capacity(content.len());
    for c in content.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            id.push(c.to_ascii_lowercase());
        } else {
            id.extend(std::iter::repeat_n('-', c.len_utf16()));
        }
    }
    id
}

/// Finds the heading whose id equals `id`.
///
/// Only heading nodes are searched; the walk does not descend into list
/// items or blocks, which cannot contain headings.
#[must_use]
pub fn find_heading(root: &Node, id: &str) -> Option<NodePath> {
    fn go(node: &Node, path: &NodePath, id: &str) -> Option<NodePath> {
        if !node.is_heading() {
            return None;
        }
        if heading_id(&node.content) == id {
            return Some(path.clone());
        }
        children(node, path, id)
    }

    fn children(node: &Node, path: &NodePath, id: &str) -> Option<NodePath> {
        node.children.iter().enumerate().find_map(|(i, child)| go(child, &path.child(i), id))
    }

    children(root, &NodePath::root(), id)
}

/// What happened to a clicked link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// An in-page anchor; the heading at this path is now active.
    Highlighted(NodePath),
    /// An in-page anchor with no matching heading.
    NoTarget,
    /// An absolute URL, left to default handling.
    External,
    /// A relative path, forwarded to the host as `openFile`.
    Forwarded,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(tag: &str, content: &str, children: Vec<Node>) -> Node {
        let mut node = Node::leaf(content);
        node.payload.tag = Some(tag.into());
        node.children = children;
        node
    }

    #[test]
    fn normalizes_like_markdown_anchors() {
        assert_eq!(heading_id("Getting Started!"), "getting-started-");
        assert_eq!(heading_id("  API_v2 "), "api_v2");
        assert_eq!(heading_id("Café"), "caf-");
    }

    #[test]
    fn astral_characters_count_as_two_units() {
        assert_eq!(heading_id("Launch 🚀"), "launch---");
        assert_eq!(heading_id("𝔸 b"), "---b");
    }

    #[test]
    fn finds_nested_heading() {
        let root = Node {
            children: vec![heading("h1", "Guide", vec![heading("h2", "Getting Started!", vec![])])],
            ..Node::default()
        };
        assert_eq!(find_heading(&root, "getting-started-"), Some(NodePath(vec![0, 0])));
        assert_eq!(find_heading(&root, "missing"), None);
    }

    #[test]
    fn skips_non_heading_subtrees() {
        let mut item = Node::leaf("Getting Started!");
        item.payload.tag = Some("li".into());
        let root = Node { children: vec![heading("h1", "Guide", vec![item])], ..Node::default() };
        assert_eq!(find_heading(&root, "getting-started-"), None);
    }
}
