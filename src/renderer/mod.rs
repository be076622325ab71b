//! Webview-side renderer.
//!
//! A [`Renderer`] owns one mindmap view and applies the host's messages to
//! it. `setData` puts the renderer into [`RenderState::Loading`] until the
//! view reports the pass finished; cursor requests that arrive meanwhile are
//! queued and replayed in order once the latest tree is on screen.

pub mod cursor;
pub mod dom;
pub mod links;

use std::collections::VecDeque;

use crate::bus::{CursorRequest, HostMessage, Inbox, Outbox, SvgDownload, TreeData, WebviewMessage};
use crate::node::{Node, NodePath};
use crate::options::{JsonOptions, Placement, ViewOptions};
use crate::ports::{MindmapView, Padding, RenderFuture, ViewElement};

pub use cursor::{find_active_node, CursorMatch};
pub use dom::{DocumentState, HostClasses};
pub use links::{find_heading, heading_id, LinkOutcome};

/// Space kept free under the active node for the toolbar.
pub const TOOLBAR_MARGIN: f64 = 80.0;

/// Loading gate for cursor requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderState {
    /// No tree received yet.
    #[default]
    Uninitialized,
    /// A `setData` pass is in flight.
    Loading,
    /// The latest tree is rendered.
    Ready,
}

/// The highlighted node and its element.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveNode {
    /// Path of the node in the current tree.
    pub path: NodePath,
    /// Element drawn for it, `None` when hidden.
    pub element: Option<ViewElement>,
}

/// Per-panel renderer state.
pub struct Renderer {
    view: Box<dyn MindmapView>,
    outbox: Outbox<WebviewMessage>,
    root: Option<Node>,
    json_options: JsonOptions,
    options: ViewOptions,
    state: RenderState,
    fitted: bool,
    pending: VecDeque<CursorRequest>,
    in_flight: Option<RenderFuture>,
    active: Option<ActiveNode>,
    document: DocumentState,
    host_classes: HostClasses,
}

impl Renderer {
    /// Creates a renderer drawing into `view` and reporting through `outbox`.
    #[must_use]
    pub fn new(
        view: Box<dyn MindmapView>,
        outbox: Outbox<WebviewMessage>,
        host_classes: HostClasses,
    ) -> Self {
        Self {
            view,
            outbox,
            root: None,
            json_options: JsonOptions::default(),
            options: ViewOptions::default(),
            state: RenderState::Uninitialized,
            fitted: false,
            pending: VecDeque::new(),
            in_flight: None,
            active: None,
            document: DocumentState::default(),
            host_classes,
        }
    }

    /// Announces the webview to the host.
    pub fn start(&self) {
        self.send(&WebviewMessage::Refresh);
    }

    /// Processes messages until the host side closes, then lets the last
    /// render settle.
    pub async fn run(mut self, mut inbox: Inbox<HostMessage>) -> Self {
        loop {
            tokio::select! {
                () = wait_for(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.on_rendered().await;
                }
                message = inbox.recv() => match message {
                    Some(message) => self.handle(message).await,
                    None => break,
                },
            }
        }
        self.settle().await;
        self
    }

    /// Waits for the in-flight `setData` pass, if any, and leaves `Loading`.
    pub async fn settle(&mut self) {
        if let Some(render) = self.in_flight.take() {
            render.await;
            self.on_rendered().await;
        }
    }

    /// Applies one host message.
    pub async fn handle(&mut self, message: HostMessage) {
        match message {
            HostMessage::SetData(data) => self.set_data(data),
            HostMessage::SetCursor(request) => {
                if self.state == RenderState::Ready {
                    self.apply_cursor(request).await;
                } else {
                    tracing::debug!(line = request.line, state = ?self.state, "cursor queued");
                    self.pending.push_back(request);
                }
            }
            HostMessage::SetCss(css) => self.document.set_css(css),
            HostMessage::SetTheme(dark) => self.document.set_dark(dark),
            HostMessage::CheckTheme => self.document.set_dark(self.host_classes.is_dark()),
            HostMessage::DownloadSvg(path) => {
                let content = self.view.serialize_svg();
                self.send(&WebviewMessage::DownloadSvg(SvgDownload { content, path }));
            }
            HostMessage::ToggleNode(recursive) => self.toggle_active(recursive).await,
        }
    }

    fn set_data(&mut self, data: TreeData) {
        let TreeData { mut root, json_options } = data;
        self.options = json_options.derive();
        self.json_options = json_options;
        if let Ok(level) = usize::try_from(self.options.initial_expand_level) {
            fold_below(&mut root, 0, level);
        }
        self.active = None;
        self.state = RenderState::Loading;
        self.in_flight = Some(self.view.set_data(&root, &self.options));
        self.root = Some(root);
    }

    async fn on_rendered(&mut self) {
        self.state = RenderState::Ready;
        if !self.fitted {
            self.view.fit();
            self.fitted = true;
        }
        while let Some(request) = self.pending.pop_front() {
            self.apply_cursor(request).await;
        }
    }

    async fn apply_cursor(&mut self, request: CursorRequest) {
        let Some(root) = self.root.as_mut() else {
            return;
        };
        let Some(found) = find_active_node(root, request.line, request.auto_expand) else {
            tracing::debug!(line = request.line, "no node at cursor");
            return;
        };
        if found.need_rerender {
            self.view.render_data(root).await;
        }
        self.highlight(found.path);
    }

    fn highlight(&mut self, path: NodePath) {
        match self.options.placement {
            Placement::Center => self.view.center_node(&path),
            Placement::Visible => {
                let padding = Padding { bottom: TOOLBAR_MARGIN, ..Padding::default() };
                self.view.ensure_visible(&path, padding);
            }
        }
        let element = self.view.find_element(&path);
        self.active = Some(ActiveNode { path, element });
    }

    async fn toggle_active(&mut self, recursive: bool) {
        let Some(path) = self.active.as_ref().map(|a| a.path.clone()) else {
            return;
        };
        let Some(root) = self.root.as_mut() else {
            return;
        };
        let Some(node) = root.get_mut(&path) else {
            return;
        };
        let fold = u8::from(!node.payload.is_folded());
        node.payload.fold = Some(fold);
        if recursive {
            set_fold_deep(node, fold);
        }
        self.view.render_data(root).await;
        self.active = Some(ActiveNode { element: self.view.find_element(&path), path });
    }

    /// Handles a click on a link inside a node.
    pub fn click_link(&mut self, href: &str) -> LinkOutcome {
        if let Some(fragment) = href.strip_prefix('#') {
            let found = self.root.as_ref().and_then(|root| find_heading(root, fragment));
            return match found {
                Some(path) => {
                    self.highlight(path.clone());
                    LinkOutcome::Highlighted(path)
                }
                None => LinkOutcome::NoTarget,
            };
        }
        if href.contains("://") {
            return LinkOutcome::External;
        }
        self.send(&WebviewMessage::OpenFile(href.to_string()));
        LinkOutcome::Forwarded
    }

    /// Handles a double-click on a node by focusing its first source line.
    pub fn double_click(&self, path: &NodePath) {
        let start = self
            .root
            .as_ref()
            .and_then(|root| root.get(path))
            .and_then(|node| node.payload.line_range())
            .map(|range| range.start);
        if let Some(line) = start {
            self.send(&WebviewMessage::SetFocus(line));
        }
    }

    /// Posts a UI-originated message such as a toolbar action.
    pub fn send(&self, message: &WebviewMessage) {
        if let Err(err) = self.outbox.post(message) {
            tracing::debug!("host gone, dropping message: {err}");
        }
    }

    /// Current gate state.
    #[must_use]
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// The displayed tree, including fold changes made by the renderer.
    #[must_use]
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// Options received with the last `setData`.
    #[must_use]
    pub fn json_options(&self) -> &JsonOptions {
        &self.json_options
    }

    /// The highlighted node.
    #[must_use]
    pub fn active(&self) -> Option<&ActiveNode> {
        self.active.as_ref()
    }

    /// Style element and root classes.
    #[must_use]
    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    /// Number of cursor requests waiting on the gate.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Current SVG markup.
    #[must_use]
    pub fn svg(&self) -> String {
        self.view.serialize_svg()
    }
}

async fn wait_for(render: &mut Option<RenderFuture>) {
    match render {
        Some(render) => render.await,
        None => std::future::pending().await,
    }
}

fn fold_below(node: &mut Node, depth: usize, level: usize) {
    if depth >= level && node.payload.fold.is_none() && !node.children.is_empty() {
        node.payload.fold = Some(1);
    }
    for child in &mut node.children {
        fold_below(child, depth + 1, level);
    }
}

fn set_fold_deep(node: &mut Node, fold: u8) {
    for child in &mut node.children {
        if !child.children.is_empty() {
            child.payload.fold = Some(fold);
        }
        set_fold_deep(child, fold);
    }
}
