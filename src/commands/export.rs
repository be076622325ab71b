//! `mindsync export` command.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::assets::fastest_provider;
use crate::bus;
use crate::context::ServiceContext;
use crate::controller::{Panel, WebviewController};
use crate::ports::EditorHost;
use crate::settings::Settings;

/// Execute the `export` command.
///
/// Goes through the same controller path as the panel's export button,
/// with the save dialog answered by `output`. Without embedding, asset
/// links point at whichever CDN answers a sample request first.
///
/// # Errors
///
/// Returns an error string if the document cannot be read, an asset to
/// embed is missing, or the output cannot be written.
pub async fn run(
    ctx: &ServiceContext,
    mut settings: Settings,
    file: &Path,
    output: &Path,
    embed: bool,
) -> Result<(), String> {
    if embed {
        settings.default_options = Some(with_embed_flag(settings.default_options.as_deref()));
    }
    let host = super::load_host(ctx, file, settings)?;
    // Nobody listens on the webview side; exporting posts nothing.
    let (host_end, _webview) = bus::pair();
    let mut controller = WebviewController::new(
        host as Arc<dyn EditorHost>,
        ctx.clone(),
        Panel::new(host_end.outbox),
    );
    if !embed {
        controller.set_export_provider(fastest_provider(&*ctx.fetcher).await);
    }
    controller.export_to(output).map_err(|e| e.to_string())?;
    println!("Exported to {}", output.display());
    Ok(())
}

/// Adds `"embedAssets": true` to a raw global options object.
fn with_embed_flag(raw: Option<&str>) -> String {
    let mut options = raw
        .and_then(|raw| serde_json::from_str::<Map<String, Value>>(raw).ok())
        .unwrap_or_default();
    options.insert("embedAssets".into(), Value::Bool(true));
    Value::Object(options).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_flag_keeps_other_options() {
        let raw = with_embed_flag(Some(r#"{"maxWidth": 300}"#));
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["maxWidth"], 300);
        assert_eq!(value["embedAssets"], true);
    }

    #[test]
    fn embed_flag_replaces_invalid_options() {
        assert_eq!(with_embed_flag(Some("not json")), r#"{"embedAssets":true}"#);
        assert_eq!(with_embed_flag(None), r#"{"embedAssets":true}"#);
    }
}
