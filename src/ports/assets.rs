//! Network port for downloading static assets.

use std::future::Future;
use std::pin::Pin;

use crate::error::PortError;

/// Boxed future type alias used by [`AssetFetcher`] to keep the trait dyn-compatible.
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, PortError>> + Send + 'a>>;

/// Downloads assets (scripts, stylesheets, fonts) by URL.
pub trait AssetFetcher: Send + Sync {
    /// Fetches the body at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    fn fetch(&self, url: &str) -> FetchFuture<'_>;
}
