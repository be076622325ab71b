//! Host-side controller for one mindmap panel.
//!
//! The controller mirrors a single document into its webview: it re-runs the
//! transform when the text changes, follows the caret, forwards style and
//! theme changes, and carries out the commands the webview sends back.
//! Content and cursor updates are debounced independently.

pub mod debounce;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::sync::mpsc;

use crate::assets::{self, AssetSet, Provider, UrlBuilder};
use crate::bus::{CursorRequest, HostMessage, Inbox, Outbox, SvgDownload, TreeData, WebviewMessage};
use crate::context::ServiceContext;
use crate::error::ExportError;
use crate::export::{embed_assets, fill_template};
use crate::node::Node;
use crate::options::JsonOptions;
use crate::ports::{EditorHost, FileSystem, ImageResolver, TransformOptions, Transformed};
use crate::settings::ThemeSignal;

pub use debounce::Debouncer;

/// Something that happened in the host editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The text of the document at this path changed.
    DocumentChanged(PathBuf),
    /// The caret moved in an editor showing the document at this path.
    SelectionChanged(PathBuf),
    /// Configuration changed.
    ConfigurationChanged(ConfigChange),
    /// The colour theme changed.
    ThemeChanged,
    /// Toggle the active node, optionally recursively.
    Toggle {
        /// Apply to the whole subtree.
        recursive: bool,
    },
    /// Ask the webview for its SVG and save it at this document-relative path.
    DownloadSvg(String),
}

/// Which configuration keys a change touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChange {
    /// `defaultOptions` changed.
    pub default_options: bool,
    /// `customCSS` changed.
    pub custom_css: bool,
}

/// Cloneable handle that disposes a panel from outside its event loop.
#[derive(Debug, Clone, Default)]
pub struct PanelHandle(Arc<AtomicBool>);

impl PanelHandle {
    /// Marks the panel disposed; nothing is posted to it afterwards.
    pub fn dispose(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The webview end a controller posts to.
pub struct Panel {
    outbox: Option<Outbox<HostMessage>>,
    handle: PanelHandle,
}

impl Panel {
    /// Wraps the host side of a panel's bus.
    #[must_use]
    pub fn new(outbox: Outbox<HostMessage>) -> Self {
        Self { outbox: Some(outbox), handle: PanelHandle::default() }
    }

    /// Handle for disposing this panel.
    #[must_use]
    pub fn handle(&self) -> PanelHandle {
        self.handle.clone()
    }

    fn post(&self, message: &HostMessage) {
        if self.handle.is_disposed() {
            tracing::debug!(?message, "panel disposed, message dropped");
            return;
        }
        let Some(outbox) = &self.outbox else {
            tracing::debug!(?message, "panel closed, message dropped");
            return;
        };
        if let Err(err) = outbox.post(message) {
            tracing::debug!("webview gone: {err}");
        }
    }

    /// Releases the bus so the webview side sees it close.
    fn close(&mut self) {
        self.outbox = None;
    }
}

/// Keeps one panel in sync with one document.
pub struct WebviewController {
    host: Arc<dyn EditorHost>,
    services: ServiceContext,
    panel: Panel,
    global_options: Option<JsonOptions>,
    custom_css: Option<String>,
    json_options: JsonOptions,
    export_provider: Provider,
    content: Debouncer,
    cursor: Debouncer,
}

impl WebviewController {
    /// Creates a controller for the document `host` owns.
    #[must_use]
    pub fn new(host: Arc<dyn EditorHost>, services: ServiceContext, panel: Panel) -> Self {
        let settings = host.settings();
        Self {
            global_options: JsonOptions::parse_global(settings.default_options.as_deref()),
            custom_css: settings.custom_css.clone(),
            content: Debouncer::new(settings.debounce()),
            cursor: Debouncer::new(settings.debounce()),
            json_options: JsonOptions::default(),
            export_provider: Provider::default(),
            host,
            services,
            panel,
        }
    }

    /// Handle for disposing the panel.
    #[must_use]
    pub fn handle(&self) -> PanelHandle {
        self.panel.handle()
    }

    /// Options sent with the last `setData`.
    #[must_use]
    pub fn json_options(&self) -> &JsonOptions {
        &self.json_options
    }

    /// Sets the CDN used by non-embedded exports.
    pub fn set_export_provider(&mut self, provider: Provider) {
        self.export_provider = provider;
    }

    /// Pushes everything a freshly opened panel needs.
    pub fn open(&mut self) {
        tracing::info!(path = %self.host.document_path().display(), "panel opened");
        self.update();
        self.update_css();
        self.update_theme();
    }

    /// Handles host events and webview messages until the panel goes away.
    ///
    /// The loop ends when the event source closes (after answering the
    /// webview messages already queued), when the webview side of the bus
    /// closes, or when the panel is disposed. Debounces already armed at
    /// disposal still fire, and post nothing; later host events are dropped.
    /// On return the controller no longer holds the bus.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<HostEvent>,
        mut inbox: Inbox<WebviewMessage>,
    ) -> Self {
        loop {
            if self.panel.handle.is_disposed()
                && !self.content.is_armed()
                && !self.cursor.is_armed()
            {
                break;
            }
            tokio::select! {
                () = self.content.fired() => {
                    self.content.cancel();
                    self.update();
                }
                () = self.cursor.fired() => {
                    self.cursor.cancel();
                    self.update_cursor();
                }
                event = events.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => {
                        for message in inbox.drain() {
                            self.on_message(message).await;
                        }
                        break;
                    }
                },
                message = inbox.recv() => match message {
                    Some(message) => self.on_message(message).await,
                    None => break,
                },
            }
        }
        self.panel.close();
        tracing::info!(path = %self.host.document_path().display(), "panel closed");
        self
    }

    /// Applies one host event.
    pub fn on_event(&mut self, event: HostEvent) {
        if self.panel.handle.is_disposed() {
            tracing::debug!(?event, "panel disposed, event ignored");
            return;
        }
        match event {
            HostEvent::DocumentChanged(path) => {
                if path == self.host.document_path() {
                    self.content.trigger();
                }
            }
            HostEvent::SelectionChanged(path) => {
                if path == self.host.document_path() {
                    self.cursor.trigger();
                }
            }
            HostEvent::ConfigurationChanged(change) => {
                let settings = self.host.settings();
                self.content.set_delay(settings.debounce());
                self.cursor.set_delay(settings.debounce());
                if change.default_options {
                    self.global_options =
                        JsonOptions::parse_global(settings.default_options.as_deref());
                    self.update();
                }
                if change.custom_css {
                    self.update_css();
                }
            }
            HostEvent::ThemeChanged => self.update_theme(),
            HostEvent::Toggle { recursive } => self.panel.post(&HostMessage::ToggleNode(recursive)),
            HostEvent::DownloadSvg(path) => self.panel.post(&HostMessage::DownloadSvg(path)),
        }
    }

    /// Applies one webview message.
    pub async fn on_message(&mut self, message: WebviewMessage) {
        match message {
            WebviewMessage::Refresh => {
                self.update();
                self.update_css();
                self.update_theme();
            }
            WebviewMessage::EditAsText => self.host.show_text_beside(),
            WebviewMessage::Export | WebviewMessage::ExportAsHtml => self.export().await,
            WebviewMessage::OpenFile(relative) => {
                self.host.open_path(&self.document_dir().join(relative))
            }
            WebviewMessage::SetFocus(line) => self.host.reveal_line(line),
            WebviewMessage::Log(text) => tracing::info!(target: "mindsync::webview", "{text}"),
            WebviewMessage::DownloadSvg(download) => self.save_svg(&download),
        }
    }

    /// Re-transforms the document and sends the tree, then the cursor.
    pub fn update(&mut self) {
        let transformed = self.transform(Some(self.webview_image_resolver()));
        let front = transformed.frontmatter.and_then(|f| f.markmap);
        let defaults = JsonOptions::defaults();
        let layers =
            std::iter::once(&defaults).chain(self.global_options.as_ref()).chain(front.as_ref());
        self.json_options = JsonOptions::merged(layers);
        self.panel.post(&HostMessage::SetData(TreeData {
            root: transformed.root,
            json_options: self.json_options.clone(),
        }));
        self.update_cursor();
    }

    /// Sends the caret line, if an editor for this document has focus.
    pub fn update_cursor(&self) {
        if let Some(line) = self.host.active_line() {
            let auto_expand = self.json_options.auto_expand.unwrap_or(true);
            self.panel.post(&HostMessage::SetCursor(CursorRequest { line, auto_expand }));
        }
    }

    fn update_css(&mut self) {
        self.custom_css = self.host.settings().custom_css;
        self.panel.post(&HostMessage::SetCss(self.custom_css.clone()));
    }

    fn update_theme(&self) {
        let message = match self.host.settings().theme_signal {
            ThemeSignal::Explicit => HostMessage::SetTheme(self.host.color_theme().is_dark()),
            ThemeSignal::Detect => HostMessage::CheckTheme,
        };
        self.panel.post(&message);
    }

    fn document_dir(&self) -> PathBuf {
        let path = self.host.document_path();
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    fn transform_options(&self, image_resolver: Option<ImageResolver>) -> TransformOptions {
        TransformOptions {
            image_resolver,
            html_parser: self
                .global_options
                .as_ref()
                .and_then(|o| o.extra.get("htmlParser").cloned()),
        }
    }

    /// Runs the transform, substituting an error node on failure.
    fn transform(&self, image_resolver: Option<ImageResolver>) -> Transformed {
        let text = self.host.document_text();
        let options = self.transform_options(image_resolver);
        self.services.transformer.transform(&text, &options).unwrap_or_else(|err| {
            tracing::warn!("transform failed: {err}");
            let root = Node { children: vec![Node::error(&err)], ..Node::default() };
            Transformed { root, ..Transformed::default() }
        })
    }

    fn webview_image_resolver(&self) -> ImageResolver {
        let dir = self.document_dir();
        Arc::new(move |src: &str| format!("file://{}", dir.join(src).display()))
    }

    fn embedding_image_resolver(&self) -> ImageResolver {
        let dir = self.document_dir();
        let fs = Arc::clone(&self.services.fs);
        Arc::new(move |src: &str| match fs.read_bytes(&dir.join(src)) {
            Ok(bytes) => format!("data:{};base64,{}", image_mime(src), STANDARD.encode(bytes)),
            Err(err) => {
                tracing::warn!("cannot embed image {src}: {err}");
                src.to_string()
            }
        })
    }

    /// Builds the standalone HTML export for the current document.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Asset`] if an asset to embed cannot be read.
    pub fn export_html(&self) -> Result<String, ExportError> {
        let plain = self.transform(None);
        let front = plain.frontmatter.clone().and_then(|f| f.markmap);
        let json_options = JsonOptions::merged(self.global_options.iter().chain(front.as_ref()));
        let embed = json_options.embed_assets.unwrap_or(false);
        let transformed =
            if embed { self.transform(Some(self.embedding_image_resolver())) } else { plain };

        let urls = UrlBuilder::for_export(embed, self.export_provider);
        let mut extra = AssetSet::default();
        if let Some(css) = self.custom_css.as_ref().filter(|css| !css.is_empty()) {
            extra.styles.push(assets::Asset::Style(css.clone()));
        }
        extra.scripts.push(assets::toolbar_snippet());
        let resolved = AssetSet::merge([
            &assets::base_assets(),
            &assets::feature_assets(&transformed.features),
            &assets::toolbar_assets(),
        ])
        .resolve(&urls);
        let mut page_assets = AssetSet::merge([&resolved, &extra]);
        if embed {
            let asset_root = self.host.settings().asset_root;
            page_assets = embed_assets(&page_assets, &*self.services.fs, &asset_root)?;
        }
        Ok(fill_template(Some(&transformed.root), &page_assets, Some(&json_options)))
    }

    /// Writes the HTML export to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if assets cannot be loaded or the file cannot be
    /// written.
    pub fn export_to(&self, target: &Path) -> Result<(), ExportError> {
        let html = self.export_html()?;
        self.services
            .fs
            .write(target, html.as_bytes())
            .map_err(|source| ExportError::Write { path: target.to_path_buf(), source })?;
        tracing::info!(target = %target.display(), "exported");
        Ok(())
    }

    async fn export(&self) {
        let Some(target) = self.host.save_dialog().await else {
            return;
        };
        if let Err(err) = self.export_to(&target) {
            self.host.show_error(&err.to_string());
        }
    }

    fn save_svg(&self, download: &SvgDownload) {
        let target = self.document_dir().join(&download.path);
        if let Err(err) = self.services.fs.write(&target, download.content.as_bytes()) {
            self.host.show_error(&format!("Cannot write file \"{}\"! {err}", target.display()));
        }
    }
}

fn image_mime(src: &str) -> &'static str {
    let ext = Path::new(src).extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
