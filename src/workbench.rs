//! Panel registry and the extension commands.
//!
//! Each open panel is a controller task and a renderer task joined by a
//! bus. The workbench routes host events to them and tears them down.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::adapters::recording::transport::RecordingTransport;
use crate::assets::{self, AssetSet, Provider, UrlBuilder};
use crate::bus;
use crate::context::ServiceContext;
use crate::controller::{HostEvent, Panel, PanelHandle, WebviewController};
use crate::error::{PortError, WorkbenchError};
use crate::export::fill_template;
use crate::ports::{EditorHost, MindmapView};
use crate::renderer::{HostClasses, Renderer};
use crate::transcript::TranscriptRecorder;

/// Loads a document into an editor host.
pub type HostFactory = Box<dyn Fn(&Path) -> Result<Arc<dyn EditorHost>, PortError> + Send + Sync>;

/// Creates the drawing surface for a new panel.
pub type ViewFactory = Box<dyn Fn() -> Box<dyn MindmapView> + Send + Sync>;

struct PanelEntry {
    path: PathBuf,
    host: Arc<dyn EditorHost>,
    html: String,
    classes: HostClasses,
    handle: PanelHandle,
    events: mpsc::UnboundedSender<HostEvent>,
    controller: JoinHandle<WebviewController>,
    renderer: JoinHandle<Renderer>,
}

/// Both halves of a panel after it stopped.
pub struct ClosedPanel {
    /// Document the panel showed.
    pub path: PathBuf,
    /// Host-side state.
    pub controller: WebviewController,
    /// Webview-side state.
    pub renderer: Renderer,
}

/// Owns every open panel.
pub struct Workbench {
    services: ServiceContext,
    hosts: HostFactory,
    views: ViewFactory,
    panels: BTreeMap<Uuid, PanelEntry>,
    focused: Option<Uuid>,
    active_document: Option<PathBuf>,
    recorder: Option<Arc<Mutex<TranscriptRecorder>>>,
}

impl Workbench {
    /// Creates an empty workbench.
    #[must_use]
    pub fn new(services: ServiceContext, hosts: HostFactory, views: ViewFactory) -> Self {
        Self {
            services,
            hosts,
            views,
            panels: BTreeMap::new(),
            focused: None,
            active_document: None,
            recorder: None,
        }
    }

    /// Records the bus traffic of panels opened from now on.
    pub fn record_into(&mut self, recorder: Arc<Mutex<TranscriptRecorder>>) {
        self.recorder = Some(recorder);
    }

    /// Sets the document `open` falls back to.
    pub fn set_active_document(&mut self, path: Option<PathBuf>) {
        self.active_document = path;
    }

    /// Ids of open panels.
    #[must_use]
    pub fn panels(&self) -> Vec<Uuid> {
        self.panels.keys().copied().collect()
    }

    /// The panel commands are sent to.
    #[must_use]
    pub fn focused(&self) -> Option<Uuid> {
        self.focused
    }

    /// Page the panel's webview was loaded with.
    #[must_use]
    pub fn html(&self, id: Uuid) -> Option<&str> {
        self.panels.get(&id).map(|entry| entry.html.as_str())
    }

    /// `open`: shows `path`, or the active document, in a new panel.
    ///
    /// Must be called inside a tokio runtime; the panel's halves run as
    /// tasks on it.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no document or it cannot be loaded.
    pub fn open(&mut self, path: Option<&Path>) -> Result<Uuid, WorkbenchError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| self.active_document.clone())
            .ok_or(WorkbenchError::NoDocument)?;
        let host = (self.hosts)(&path)
            .map_err(|source| WorkbenchError::Open { path: path.clone(), source })?;
        let id = Uuid::new_v4();

        let (host_end, webview_end) = match &self.recorder {
            Some(recorder) => bus::pair_with(|transport, direction| {
                Box::new(RecordingTransport::new(transport, direction, Arc::clone(recorder)))
            }),
            None => bus::pair(),
        };
        let classes = HostClasses::for_theme(host.color_theme());
        let renderer = Renderer::new((self.views)(), webview_end.outbox, classes.clone());
        let panel = Panel::new(host_end.outbox);
        let handle = panel.handle();
        let controller = WebviewController::new(Arc::clone(&host), self.services.clone(), panel);

        renderer.start();
        let (events, rx) = mpsc::unbounded_channel();
        let entry = PanelEntry {
            html: webview_page(),
            path: path.clone(),
            host,
            classes,
            handle,
            events,
            controller: tokio::spawn(controller.run(rx, host_end.inbox)),
            renderer: tokio::spawn(renderer.run(webview_end.inbox)),
        };
        tracing::info!(%id, path = %path.display(), "panel opened");
        self.panels.insert(id, entry);
        self.focused = Some(id);
        Ok(id)
    }

    /// `toggle` / `toggle-recursively`: toggles the active node of the
    /// focused panel.
    ///
    /// # Errors
    ///
    /// Returns an error if no panel is focused.
    pub fn toggle(&self, recursive: bool) -> Result<(), WorkbenchError> {
        self.send_focused(HostEvent::Toggle { recursive })
    }

    /// Asks the focused panel to save its SVG next to the document.
    ///
    /// # Errors
    ///
    /// Returns an error if no panel is focused.
    pub fn download_svg(&self, path: &str) -> Result<(), WorkbenchError> {
        self.send_focused(HostEvent::DownloadSvg(path.to_string()))
    }

    fn send_focused(&self, event: HostEvent) -> Result<(), WorkbenchError> {
        let entry =
            self.focused.and_then(|id| self.panels.get(&id)).ok_or(WorkbenchError::NoDocument)?;
        if entry.events.send(event).is_err() {
            tracing::debug!("panel already stopped");
        }
        Ok(())
    }

    /// Forwards a host event to every panel.
    pub fn notify(&self, event: &HostEvent) {
        for entry in self.panels.values() {
            if *event == HostEvent::ThemeChanged {
                entry.classes.apply_theme(entry.host.color_theme());
            }
            if entry.events.send(event.clone()).is_err() {
                tracing::debug!(path = %entry.path.display(), "panel already stopped");
            }
        }
    }

    /// Stops listening for host events, lets the panel answer what is
    /// already queued and its last render settle, and returns both halves.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or a failed panel task.
    pub async fn close(&mut self, id: Uuid) -> Result<ClosedPanel, WorkbenchError> {
        let entry = self.panels.remove(&id).ok_or(WorkbenchError::UnknownPanel(id))?;
        if self.focused == Some(id) {
            self.focused = self.panels.keys().next().copied();
        }
        let PanelEntry { path, events, controller, renderer, .. } = entry;
        drop(events);
        let controller = controller.await?;
        let renderer = renderer.await?;
        Ok(ClosedPanel { path, controller, renderer })
    }

    /// Disposes a panel: nothing more is posted to it, including updates
    /// from debounces that were already pending.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or a failed panel task.
    pub async fn dispose(&mut self, id: Uuid) -> Result<ClosedPanel, WorkbenchError> {
        let entry = self.panels.get(&id).ok_or(WorkbenchError::UnknownPanel(id))?;
        entry.handle.dispose();
        tracing::info!(%id, "panel disposed");
        self.close(id).await
    }
}

fn webview_page() -> String {
    let local = UrlBuilder::new(Provider::Local);
    let assets = AssetSet::merge([
        &assets::base_assets().resolve(&local),
        &assets::toolbar_assets().resolve(&local),
        &assets::app_assets(),
    ]);
    fill_template(None, &assets, None)
}
