//! Live adapter for the `AssetFetcher` port using `reqwest`.

use reqwest::Client;

use crate::error::PortError;
use crate::ports::assets::{AssetFetcher, FetchFuture};

/// Downloads assets over HTTP.
pub struct LiveAssetFetcher {
    client: Client,
}

impl LiveAssetFetcher {
    /// Creates a new fetcher with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for LiveAssetFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetFetcher for LiveAssetFetcher {
    fn fetch(&self, url: &str) -> FetchFuture<'_> {
        let url = url.to_string();
        Box::pin(async move {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| -> PortError { format!("request to {url} failed: {e}").into() })?;

            let status = response.status();
            if !status.is_success() {
                return Err(format!("failed to download {url} ({})", status.as_u16()).into());
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| -> PortError { format!("failed to read body of {url}: {e}").into() })?;
            Ok(body.to_vec())
        })
    }
}
