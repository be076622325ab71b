//! Locating the node under the editor caret.

use crate::node::{Node, NodePath};

/// Result of a cursor lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorMatch {
    /// The most specific node containing the line.
    pub path: NodePath,
    /// Whether ancestors were unfolded and the view must redraw.
    pub need_rerender: bool,
}

/// Finds the last node, in depth-first document order, whose line range
/// contains `line`. Because ranges nest, that is the deepest match.
///
/// With `auto_expand`, every folded ancestor of the match is unfolded in
/// place. The match itself keeps its fold state.
pub fn find_active_node(root: &mut Node, line: u32, auto_expand: bool) -> Option<CursorMatch> {
    let mut best: Option<NodePath> = None;
    root.walk(&mut |path, node| {
        if node.payload.line_range().is_some_and(|range| range.contains(line)) {
            best = Some(path.clone());
        }
    });
    let path = best?;
    let mut need_rerender = false;
    if auto_expand {
        for ancestor in path.ancestors() {
            if let Some(node) = root.get_mut(&ancestor) {
                if node.payload.is_folded() {
                    node.payload.fold = Some(0);
                    need_rerender = true;
                }
            }
        }
    }
    Some(CursorMatch { path, need_rerender })
}
