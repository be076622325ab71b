//! Command dispatch and handlers.

pub mod export;
pub mod fetch_assets;
pub mod replay;
pub mod session;
pub mod tree;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::headless::HeadlessHost;
use crate::cli::Command;
use crate::context::ServiceContext;
use crate::settings::Settings;
use crate::transcript::TranscriptRecorder;

/// Dispatch a parsed command to its handler.
///
/// When `MINDSYNC_RECORD` is set to a file path, the bus traffic of a
/// `session` is recorded to that transcript.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let settings = Settings::from_env().map_err(|e| format!("invalid configuration: {e}"))?;
    let ctx = ServiceContext::live();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;
    runtime.block_on(dispatch_with_context(command, &ctx, settings))
}

/// Dispatch a command with the given service context.
async fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    settings: Settings,
) -> Result<(), String> {
    match command {
        Command::Tree { file, check } => tree::run(ctx, file, *check),
        Command::Export { file, output, embed_assets } => {
            export::run(ctx, settings, file, output, *embed_assets).await
        }
        Command::Session { file, line, svg } => {
            let recorder = env::var("MINDSYNC_RECORD").ok().map(|path| {
                let name = file.display().to_string();
                Arc::new(Mutex::new(TranscriptRecorder::new(PathBuf::from(path), name, "session")))
            });
            let result =
                session::run(ctx, settings, file, *line, svg.as_deref(), recorder.clone()).await;
            // Finish recording after the session completes (even on error)
            if let Some(recorder) = recorder {
                finish_recording(&recorder)?;
            }
            result
        }
        Command::Replay { transcript } => replay::run(ctx, transcript).await,
        Command::FetchAssets { dir } => fetch_assets::run(ctx, dir).await,
    }
}

/// Write a recorded transcript and print where it went.
fn finish_recording(recorder: &Mutex<TranscriptRecorder>) -> Result<(), String> {
    let recorder = recorder.lock().map_err(|_| "transcript recorder poisoned".to_string())?;
    let path = recorder.finish().map_err(|e| format!("failed to write transcript: {e}"))?;
    eprintln!("Recording saved to: {}", path.display());
    Ok(())
}

/// Load `file` into a headless editor host.
fn load_host(
    ctx: &ServiceContext,
    file: &Path,
    settings: Settings,
) -> Result<Arc<HeadlessHost>, String> {
    let text = ctx
        .fs
        .read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let host = HeadlessHost::new(file, text);
    host.update(|state| state.settings = settings);
    Ok(Arc::new(host))
}
