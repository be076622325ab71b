//! Mindmap view port: the layout and drawing library.

use std::future::Future;
use std::pin::Pin;

use crate::node::{Node, NodePath};
use crate::options::ViewOptions;

/// Completion of a render pass, resolved once transitions have settled.
///
/// The future is `'static` so the renderer can keep receiving messages
/// while a render is in flight.
pub type RenderFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Axis-aligned rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Extra room kept around a node when scrolling it into view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Padding {
    /// Space above.
    pub top: f64,
    /// Space to the right.
    pub right: f64,
    /// Space below.
    pub bottom: f64,
    /// Space to the left.
    pub left: f64,
}

/// A rendered node's element.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewElement {
    /// Element id inside the SVG.
    pub id: String,
    /// Bounding box in viewport coordinates.
    pub rect: Rect,
}

/// The mindmap drawing surface.
///
/// The renderer owns the tree; the view receives it on every pass and keeps
/// whatever layout state it needs.
pub trait MindmapView: Send {
    /// Replaces the displayed tree.
    fn set_data(&mut self, root: &Node, options: &ViewOptions) -> RenderFuture;

    /// Redraws after fold state changed in `root`.
    fn render_data(&mut self, root: &Node) -> RenderFuture;

    /// Zooms and pans so the whole tree is visible.
    fn fit(&mut self);

    /// Element drawn for the node at `path`, if it is currently visible.
    fn find_element(&self, path: &NodePath) -> Option<ViewElement>;

    /// Pans as little as possible to bring the node into view.
    fn ensure_visible(&mut self, path: &NodePath, padding: Padding);

    /// Pans so the node is centred.
    fn center_node(&mut self, path: &NodePath);

    /// Current SVG markup.
    fn serialize_svg(&self) -> String;
}
