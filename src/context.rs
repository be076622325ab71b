//! Service context bundling the port objects shared by every panel.

use std::sync::Arc;

use crate::adapters::live::assets::LiveAssetFetcher;
use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::transform::PulldownTransformer;
use crate::ports::{AssetFetcher, FileSystem, MarkdownTransformer};

/// Bundles the port trait objects a controller needs.
///
/// Fields are reference counted so that transform hooks (image resolvers)
/// can hold on to the filesystem beyond a single call.
#[derive(Clone)]
pub struct ServiceContext {
    /// Filesystem for exports, embedded assets and SVG downloads.
    pub fs: Arc<dyn FileSystem>,
    /// Markdown to tree conversion.
    pub transformer: Arc<dyn MarkdownTransformer>,
    /// Network access for asset downloads.
    pub fetcher: Arc<dyn AssetFetcher>,
}

impl ServiceContext {
    /// Creates a live context with real adapters.
    #[must_use]
    pub fn live() -> Self {
        Self {
            fs: Arc::new(LiveFileSystem),
            transformer: Arc::new(PulldownTransformer),
            fetcher: Arc::new(LiveAssetFetcher::new()),
        }
    }

    /// Creates a context over the given filesystem, with no network access.
    #[must_use]
    pub fn with_fs(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs, transformer: Arc::new(PulldownTransformer), fetcher: Arc::new(OfflineFetcher) }
    }
}

/// Fetcher that refuses every request.
struct OfflineFetcher;

impl AssetFetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> crate::ports::FetchFuture<'_> {
        let message = format!("network access disabled: {url}");
        Box::pin(async move { Err(message.into()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::ports::TransformOptions;

    #[tokio::test]
    async fn offline_context_refuses_network() {
        let ctx = ServiceContext::with_fs(Arc::new(MemoryFileSystem::new()));
        assert!(ctx.fetcher.fetch("https://unpkg.com/x").await.is_err());
        let tree = ctx.transformer.transform("# A", &TransformOptions::default()).unwrap();
        assert_eq!(tree.root.count(), 2);
    }
}
