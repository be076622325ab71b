//! Headless adapter for the `MindmapView` port.
//!
//! Lays the visible part of the tree out left to right, keeps a pan/zoom
//! transform for a fixed-size viewport and serializes the result as SVG.
//! Render passes complete after the configured transition duration.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::node::{Node, NodePath};
use crate::options::ViewOptions;
use crate::ports::view::{MindmapView, Padding, Rect, RenderFuture, ViewElement};

const LEVEL_SPACING: f64 = 180.0;
const ROW_HEIGHT: f64 = 24.0;
const ROW_GAP: f64 = 8.0;
const CHAR_WIDTH: f64 = 8.0;
const NODE_PADDING: f64 = 16.0;

/// Counters describing what the view has been asked to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewStats {
    /// Calls to `set_data`.
    pub set_data: usize,
    /// Calls to `render_data`.
    pub render_data: usize,
    /// Calls to `fit`.
    pub fits: usize,
}

/// Shared handle to a view's [`ViewStats`].
pub type StatsHandle = Arc<Mutex<ViewStats>>;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    x: f64,
    y: f64,
    k: f64,
}

impl Transform {
    fn apply(self, rect: Rect) -> Rect {
        Rect {
            x: rect.x * self.k + self.x,
            y: rect.y * self.k + self.y,
            width: rect.width * self.k,
            height: rect.height * self.k,
        }
    }
}

/// View that computes layout and SVG without a display.
#[derive(Debug)]
pub struct HeadlessView {
    width: f64,
    height: f64,
    duration: Duration,
    max_width: u32,
    transform: Transform,
    layout: Vec<(NodePath, Rect)>,
    index: HashMap<NodePath, usize>,
    tree: Option<Node>,
    stats: StatsHandle,
}

impl Default for HeadlessView {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl HeadlessView {
    /// Creates a view for a viewport of the given size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            duration: Duration::ZERO,
            max_width: 0,
            transform: Transform { x: 0.0, y: 0.0, k: 1.0 },
            layout: Vec::new(),
            index: HashMap::new(),
            tree: None,
            stats: StatsHandle::default(),
        }
    }

    /// Handle for inspecting call counts after the view has been boxed.
    #[must_use]
    pub fn stats(&self) -> StatsHandle {
        Arc::clone(&self.stats)
    }

    fn bump(&self, update: impl FnOnce(&mut ViewStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }

    fn relayout(&mut self, root: &Node) {
        self.layout.clear();
        self.index.clear();
        let mut next_row = 0.0;
        self.place(root, &NodePath::root(), &mut next_row);
        self.index =
            self.layout.iter().enumerate().map(|(i, (path, _))| (path.clone(), i)).collect();
        self.tree = Some(root.clone());
    }

    /// Places `node` and its visible descendants, returning the node's centre y.
    fn place(&mut self, node: &Node, path: &NodePath, next_row: &mut f64) -> f64 {
        let slot = self.layout.len();
        self.layout.push((path.clone(), Rect::default()));
        let (width, height) = self.node_size(node);
        let visible_children = !node.payload.is_folded() && !node.children.is_empty();
        let center = if visible_children {
            let centers: Vec<f64> = node
                .children
                .iter()
                .enumerate()
                .map(|(i, child)| self.place(child, &path.child(i), next_row))
                .collect();
            (centers[0] + centers[centers.len() - 1]) / 2.0
        } else {
            let center = *next_row + height / 2.0;
            *next_row += height + ROW_GAP;
            center
        };
        #[allow(clippy::cast_precision_loss)]
        let x = path.depth() as f64 * LEVEL_SPACING;
        self.layout[slot].1 = Rect { x, y: center - height / 2.0, width, height };
        center
    }

    fn node_size(&self, node: &Node) -> (f64, f64) {
        #[allow(clippy::cast_precision_loss)]
        let text = plain_text(&node.content).chars().count() as f64 * CHAR_WIDTH + NODE_PADDING;
        if self.max_width == 0 || text <= f64::from(self.max_width) {
            return (text, ROW_HEIGHT);
        }
        let max = f64::from(self.max_width);
        (max, ROW_HEIGHT * (text / max).ceil())
    }

    fn content_bounds(&self) -> Option<Rect> {
        let mut rects = self.layout.iter().map(|(_, r)| *r);
        let first = rects.next()?;
        let (mut x0, mut y0) = (first.x, first.y);
        let (mut x1, mut y1) = (first.x + first.width, first.y + first.height);
        for r in rects {
            x0 = x0.min(r.x);
            y0 = y0.min(r.y);
            x1 = x1.max(r.x + r.width);
            y1 = y1.max(r.y + r.height);
        }
        Some(Rect { x: x0, y: y0, width: x1 - x0, height: y1 - y0 })
    }

    fn rect_of(&self, path: &NodePath) -> Option<Rect> {
        self.index.get(path).map(|&i| self.layout[i].1)
    }

    fn pause(&self) -> RenderFuture {
        let duration = self.duration;
        Box::pin(async move {
            if !duration.is_zero() {
                tokio::time::sleep(duration).await;
            }
        })
    }
}

impl MindmapView for HeadlessView {
    fn set_data(&mut self, root: &Node, options: &ViewOptions) -> RenderFuture {
        self.duration = options.duration;
        self.max_width = options.max_width;
        self.relayout(root);
        self.bump(|s| s.set_data += 1);
        self.pause()
    }

    fn render_data(&mut self, root: &Node) -> RenderFuture {
        self.relayout(root);
        self.bump(|s| s.render_data += 1);
        self.pause()
    }

    fn fit(&mut self) {
        self.bump(|s| s.fits += 1);
        let Some(bounds) = self.content_bounds() else {
            return;
        };
        let k =
            (self.width / bounds.width.max(1.0)).min(self.height / bounds.height.max(1.0)).min(2.0);
        self.transform = Transform {
            k,
            x: (self.width - bounds.width * k) / 2.0 - bounds.x * k,
            y: (self.height - bounds.height * k) / 2.0 - bounds.y * k,
        };
    }

    fn find_element(&self, path: &NodePath) -> Option<ViewElement> {
        let rect = self.rect_of(path)?;
        Some(ViewElement { id: element_id(path), rect: self.transform.apply(rect) })
    }

    fn ensure_visible(&mut self, path: &NodePath, padding: Padding) {
        let Some(rect) = self.rect_of(path).map(|r| self.transform.apply(r)) else {
            return;
        };
        let left = padding.left;
        let right = self.width - padding.right;
        let top = padding.top;
        let bottom = self.height - padding.bottom;
        if rect.x < left {
            self.transform.x += left - rect.x;
        } else if rect.x + rect.width > right {
            self.transform.x -= (rect.x + rect.width - right).min(rect.x - left);
        }
        if rect.y < top {
            self.transform.y += top - rect.y;
        } else if rect.y + rect.height > bottom {
            self.transform.y -= (rect.y + rect.height - bottom).min(rect.y - top);
        }
    }

    fn center_node(&mut self, path: &NodePath) {
        let Some(rect) = self.rect_of(path).map(|r| self.transform.apply(r)) else {
            return;
        };
        self.transform.x += self.width / 2.0 - (rect.x + rect.width / 2.0);
        self.transform.y += self.height / 2.0 - (rect.y + rect.height / 2.0);
    }

    fn serialize_svg(&self) -> String {
        let t = self.transform;
        let mut svg = format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" class="markmap" "#,
                r#"width="{}" height="{}">"#,
                r#"<g transform="translate({:.2},{:.2}) scale({:.4})">"#,
            ),
            self.width, self.height, t.x, t.y, t.k
        );
        for (path, rect) in &self.layout {
            if path.depth() == 0 {
                continue;
            }
            let parent = NodePath(path.0[..path.0.len() - 1].to_vec());
            if let Some(from) = self.rect_of(&parent) {
                let _ = write!(
                    svg,
                    r#"<path class="markmap-link" d="M{:.1},{:.1}L{:.1},{:.1}"/>"#,
                    from.x + from.width,
                    from.y + from.height / 2.0,
                    rect.x,
                    rect.y + rect.height / 2.0
                );
            }
        }
        let tree = self.tree.as_ref();
        for (path, rect) in &self.layout {
            let node = tree.and_then(|t| t.get(path));
            let content = node.map_or("", |n| n.content.as_str());
            let lines = node.and_then(|n| n.payload.lines.as_deref()).unwrap_or_default();
            let _ = write!(
                svg,
                concat!(
                    r#"<g class="markmap-node" id="{}" data-lines="{lines}">"#,
                    r#"<foreignObject x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}">"#,
                    r#"<div xmlns="http://www.w3.org/1999/xhtml">{content}</div>"#,
                    r#"</foreignObject></g>"#,
                ),
                element_id(path),
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                lines = lines,
                content = content,
            );
        }
        svg.push_str("</g></svg>");
        svg
    }
}

fn element_id(path: &NodePath) -> String {
    let parts: Vec<String> = path.0.iter().map(ToString::to_string).collect();
    format!("mm-node-{}", parts.join("-"))
}

/// Strips tags from an HTML fragment for width estimates.
fn plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::ranged;

    fn instant() -> ViewOptions {
        ViewOptions { duration: Duration::ZERO, ..ViewOptions::default() }
    }

    fn sample() -> Node {
        Node {
            children: vec![
                ranged(
                    "Alpha",
                    0,
                    4,
                    vec![ranged("one", 1, 2, vec![]), ranged("two", 2, 4, vec![])],
                ),
                ranged("Beta", 4, 6, vec![]),
            ],
            ..Node::default()
        }
    }

    #[tokio::test]
    async fn lays_out_visible_nodes_only() {
        let mut view = HeadlessView::default();
        let mut root = sample();
        view.set_data(&root, &instant()).await;
        assert!(view.find_element(&NodePath(vec![0, 1])).is_some());

        root.children[0].payload.fold = Some(1);
        view.render_data(&root).await;
        assert!(view.find_element(&NodePath(vec![0, 1])).is_none());
        assert!(view.find_element(&NodePath(vec![0])).is_some());
        let stats = *view.stats().lock().unwrap();
        assert_eq!(stats, ViewStats { set_data: 1, render_data: 1, fits: 0 });
    }

    #[tokio::test]
    async fn ensure_visible_keeps_bottom_margin() {
        let mut view = HeadlessView::new(400.0, 200.0);
        let root = Node {
            children: (0..10u32).map(|i| ranged("row", i, i + 1, vec![])).collect(),
            ..Node::default()
        };
        view.set_data(&root, &instant()).await;
        let last = NodePath(vec![9]);
        view.ensure_visible(&last, Padding { bottom: 80.0, ..Padding::default() });
        let rect = view.find_element(&last).unwrap().rect;
        assert!(rect.y + rect.height <= 200.0 - 80.0 + 0.001);
        assert!(rect.y >= 0.0);
    }

    #[tokio::test]
    async fn center_node_moves_node_to_middle() {
        let mut view = HeadlessView::new(400.0, 300.0);
        view.set_data(&sample(), &instant()).await;
        let path = NodePath(vec![1]);
        view.center_node(&path);
        let rect = view.find_element(&path).unwrap().rect;
        assert!((rect.x + rect.width / 2.0 - 200.0).abs() < 0.001);
        assert!((rect.y + rect.height / 2.0 - 150.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn svg_contains_nodes_and_links() {
        let mut view = HeadlessView::default();
        view.set_data(&sample(), &instant()).await;
        view.fit();
        let svg = view.serialize_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"data-lines="2,4""#));
        assert!(svg.contains(">Beta</div>"));
        assert_eq!(svg.matches("markmap-link").count(), 4);
    }

    #[test]
    fn wraps_long_content_at_max_width() {
        let mut view = HeadlessView::default();
        view.max_width = 100;
        let (w, h) = view.node_size(&Node::leaf("a".repeat(40)));
        assert!((w - 100.0).abs() < f64::EPSILON);
        assert!(h > ROW_HEIGHT);
    }

    #[test]
    fn plain_text_drops_tags() {
        assert_eq!(plain_text("<em>hi</em> there"), "hi there");
    }
}
