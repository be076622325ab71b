//! The mindmap node tree.
//!
//! A tree is produced fresh by every transform and replaced wholesale on each
//! document change. Nodes are addressed by [`NodePath`], the child indices
//! walked from the root, which is stable for the lifetime of one tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One element of the Markdown-derived hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Rendered HTML fragment for this node.
    #[serde(default)]
    pub content: String,
    /// Children in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    /// Free-form attributes; see [`Payload`].
    #[serde(default)]
    pub payload: Payload,
}

/// Node attributes understood by the renderer.
///
/// Keys this crate does not interpret are kept in `extra` so that they reach
/// the view untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Source tag, `h1`..`h6` for headings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Source line range as `"start,end"`, 0-based and end-exclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<String>,
    /// Collapsed state: absent or 0 is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold: Option<u8>,
    /// Everything else.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Half-open range of source lines covered by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First line, inclusive.
    pub start: u32,
    /// Last line, exclusive.
    pub end: u32,
}

impl LineRange {
    /// Returns `true` if `line` falls within the range.
    #[must_use]
    pub fn contains(self, line: u32) -> bool {
        self.start <= line && line < self.end
    }

    /// Returns `true` if `other` lies entirely within `self`.
    #[must_use]
    pub fn covers(self, other: LineRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Formats the range the way it travels in a payload.
    #[must_use]
    pub fn encode(self) -> String {
        format!("{},{}", self.start, self.end)
    }
}

impl Payload {
    /// Parses `lines`, returning `None` when absent or malformed.
    #[must_use]
    pub fn line_range(&self) -> Option<LineRange> {
        let (start, end) = self.lines.as_deref()?.split_once(',')?;
        Some(LineRange { start: start.trim().parse().ok()?, end: end.trim().parse().ok()? })
    }

    /// Returns `true` if the node is collapsed.
    #[must_use]
    pub fn is_folded(&self) -> bool {
        self.fold.is_some_and(|f| f != 0)
    }
}

/// Child indices from the root to a node. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    /// Path of the root node.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the `index`-th child of this node.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// Paths of every proper ancestor, root first.
    #[must_use]
    pub fn ancestors(&self) -> Vec<NodePath> {
        (0..self.0.len()).map(|len| NodePath(self.0[..len].to_vec())).collect()
    }

    /// Nesting depth; the root is 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

impl Node {
    /// Creates a leaf node.
    pub fn leaf(content: impl Into<String>) -> Self {
        Self { content: content.into(), ..Self::default() }
    }

    /// Node shown in place of a tree that failed to transform.
    pub fn error(message: impl fmt::Display) -> Self {
        let mut node = Self::leaf(format!("Error: {}", html_escape(&message.to_string())));
        node.payload.tag = Some("error".into());
        node
    }

    /// Returns the node at `path`.
    #[must_use]
    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        path.0.iter().try_fold(self, |node, &i| node.children.get(i))
    }

    /// Returns the node at `path` mutably.
    pub fn get_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        path.0.iter().try_fold(self, |node, &i| node.children.get_mut(i))
    }

    /// Returns `true` for `h1`..`h6` nodes.
    #[must_use]
    pub fn is_heading(&self) -> bool {
        self.payload.tag.as_deref().is_some_and(|tag| {
            let mut chars = tag.chars();
            chars.next() == Some('h')
                && chars.next().is_some_and(|c| c.is_ascii_digit())
                && chars.next().is_none()
        })
    }

    /// Number of nodes in the subtree, including this one.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// Visits every node depth-first in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&NodePath, &'a Node)) {
        fn go<'a>(node: &'a Node, path: &NodePath, visit: &mut impl FnMut(&NodePath, &'a Node)) {
            visit(path, node);
            for (i, child) in node.children.iter().enumerate() {
                go(child, &path.child(i), visit);
            }
        }
        go(self, &NodePath::root(), visit);
    }
}

/// A broken line-range invariant found by [`check_line_ranges`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeViolation {
    /// The root carries a `lines` attribute.
    RootHasLines,
    /// A child range is not contained in its parent's range.
    OutsideParent {
        /// Offending node.
        path: NodePath,
    },
    /// Two siblings overlap.
    SiblingOverlap {
        /// The later of the two siblings.
        path: NodePath,
    },
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootHasLines => write!(f, "root node must not carry a line range"),
            Self::OutsideParent { path } => {
                write!(f, "node {path} lies outside its parent's lines")
            }
            Self::SiblingOverlap { path } => write!(f, "node {path} overlaps its previous sibling"),
        }
    }
}

/// Verifies that child ranges nest in their parent and siblings are disjoint.
///
/// Nodes without a range are skipped; their children are checked against the
/// nearest ranged ancestor.
///
/// # Errors
///
/// Returns the first violation found in document order.
pub fn check_line_ranges(root: &Node) -> Result<(), RangeViolation> {
    fn go(node: &Node, path: &NodePath, bound: Option<LineRange>) -> Result<(), RangeViolation> {
        let mut previous: Option<LineRange> = None;
        for (i, child) in node.children.iter().enumerate() {
            let child_path = path.child(i);
            let range = child.payload.line_range();
            if let Some(range) = range {
                if bound.is_some_and(|b| !b.covers(range)) {
                    return Err(RangeViolation::OutsideParent { path: child_path });
                }
                if previous.is_some_and(|p| range.start < p.end) {
                    return Err(RangeViolation::SiblingOverlap { path: child_path });
                }
                previous = Some(range);
            }
            go(child, &child_path, range.or(bound))?;
        }
        Ok(())
    }

    if root.payload.lines.is_some() {
        return Err(RangeViolation::RootHasLines);
    }
    go(root, &NodePath::root(), None)
}

pub(crate) fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
