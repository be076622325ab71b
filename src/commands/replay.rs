//! `mindsync replay` command.

use std::path::Path;

use crate::adapters::live::view::HeadlessView;
use crate::context::ServiceContext;
use crate::renderer::HostClasses;
use crate::transcript::{Transcript, TranscriptReplayer};

/// Execute the `replay` command.
///
/// # Errors
///
/// Returns an error string if the transcript cannot be read or parsed.
pub async fn run(ctx: &ServiceContext, path: &Path) -> Result<(), String> {
    let yaml = ctx
        .fs
        .read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let transcript: Transcript = serde_yaml::from_str(&yaml)
        .map_err(|e| format!("failed to parse transcript {}: {e}", path.display()))?;
    let replayer = TranscriptReplayer::new(&transcript);
    println!("Replaying {} host frames from {:?}", replayer.len(), transcript.name);

    let replay = replayer.replay(Box::new(HeadlessView::default()), HostClasses::default()).await;
    let renderer = &replay.renderer;
    println!("state: {:?}", renderer.state());
    if let Some(root) = renderer.root() {
        println!("nodes: {}", root.count());
    }
    match renderer.active() {
        Some(active) => println!("active: {}", active.path),
        None => println!("active: none"),
    }
    println!("dark: {}", renderer.document().is_dark());
    println!("emitted: {}", replay.emitted.len());
    Ok(())
}
