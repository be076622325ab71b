//! `mindsync session` command.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::view::HeadlessView;
use crate::context::ServiceContext;
use crate::error::PortError;
use crate::ports::{EditorHost, MindmapView};
use crate::settings::Settings;
use crate::transcript::TranscriptRecorder;
use crate::workbench::Workbench;

/// Execute the `session` command.
///
/// Opens `file` in a headless panel with the caret on `line`, waits for the
/// panel to settle and prints the highlighted node.
///
/// # Errors
///
/// Returns an error string if the document cannot be read, the panel fails,
/// or the SVG cannot be written.
pub async fn run(
    ctx: &ServiceContext,
    settings: Settings,
    file: &Path,
    line: Option<u32>,
    svg: Option<&Path>,
    recorder: Option<Arc<Mutex<TranscriptRecorder>>>,
) -> Result<(), String> {
    let host = super::load_host(ctx, file, settings)?;
    host.update(|state| state.active_line = line);

    let shared = Arc::clone(&host) as Arc<dyn EditorHost>;
    let mut workbench = Workbench::new(
        ctx.clone(),
        Box::new(move |_: &Path| -> Result<Arc<dyn EditorHost>, PortError> {
            Ok(Arc::clone(&shared))
        }),
        Box::new(|| Box::new(HeadlessView::default()) as Box<dyn MindmapView>),
    );
    if let Some(recorder) = recorder {
        workbench.record_into(recorder);
    }
    let id = workbench.open(Some(file)).map_err(|e| e.to_string())?;
    let closed = workbench.close(id).await.map_err(|e| e.to_string())?;

    for error in host.snapshot().errors {
        eprintln!("error: {error}");
    }
    let renderer = &closed.renderer;
    let root = renderer.root().ok_or("the panel rendered nothing")?;
    println!("{} nodes", root.count());
    let active = renderer.active().and_then(|a| root.get(&a.path).map(|node| (&a.path, node)));
    match active {
        Some((path, node)) => {
            let lines = node.payload.lines.as_deref().unwrap_or("-");
            println!("active {path} [{lines}]: {}", node.content);
        }
        None => println!("no active node"),
    }
    if let Some(target) = svg {
        ctx.fs
            .write(target, renderer.svg().as_bytes())
            .map_err(|e| format!("failed to write {}: {e}", target.display()))?;
        println!("SVG written to {}", target.display());
    }
    Ok(())
}
