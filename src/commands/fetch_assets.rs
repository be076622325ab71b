//! `mindsync fetch-assets` command.

use std::path::Path;

use crate::assets::{download_local_assets, fastest_provider, Download};
use crate::context::ServiceContext;

/// Execute the `fetch-assets` command.
///
/// # Errors
///
/// Returns an error string on the first failed download or write.
pub async fn run(ctx: &ServiceContext, dir: &Path) -> Result<(), String> {
    let provider = fastest_provider(&*ctx.fetcher).await;
    println!("Using {provider}");
    let report = download_local_assets(&*ctx.fetcher, &*ctx.fs, dir, provider)
        .await
        .map_err(|e| e.to_string())?;
    for download in &report {
        match download {
            Download::Fetched { url, path } => println!("{url} -> {}", path.display()),
            Download::Skipped(path) => println!("exists: {}", path.display()),
        }
    }
    Ok(())
}
