//! Script and stylesheet assets for the webview page and HTML exports.
//!
//! Asset paths are npm-style (`package@version/file`). A [`UrlBuilder`]
//! turns them into CDN URLs or paths under `dist/web_assets/`, where
//! `fetch-assets` keeps local copies for offline exports.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tokio::time::Instant;

use crate::error::FetchError;
use crate::ports::{AssetFetcher, Feature, FileSystem};

/// Prefix of locally bundled asset copies, relative to the asset root.
pub const LOCAL_PREFIX: &str = "dist/web_assets/";

const D3: &str = "d3@7.9.0/dist/d3.min.js";
const MARKMAP_VIEW: &str = "markmap-view@0.18.12/dist/browser/index.js";
const TOOLBAR_CSS: &str = "markmap-toolbar@0.18.12/dist/style.css";
const TOOLBAR_JS: &str = "markmap-toolbar@0.18.12/dist/index.js";
const KATEX_CSS: &str = "katex@0.16.22/dist/katex.min.css";
const KATEX_JS: &str = "katex@0.16.22/dist/katex.min.js";
const HLJS_CSS: &str = "@highlightjs/cdn-assets@11.11.1/styles/default.min.css";
const SAMPLE: &str = "npm2url/dist/index.cjs";

/// Longest a single CDN may take to answer the sample request before it is skipped.
pub const SAMPLE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

const APP_CSS: &str = "assets/style.css";
const APP_JS: &str = "dist/app.js";

const RENDER_TOOLBAR: &str = "() => setTimeout(() => {
  const { markmap, mm } = window;
  const { el } = markmap.Toolbar.create(mm);
  el.setAttribute('style', 'position:absolute;bottom:20px;right:20px');
  document.body.append(el);
})";

/// One `<link>`, `<style>` or `<script>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    /// External stylesheet.
    Stylesheet {
        /// Stylesheet location.
        href: String,
    },
    /// Inline CSS.
    Style(String),
    /// External script.
    Script {
        /// Script location.
        src: String,
    },
    /// Inline script text.
    InlineScript(String),
    /// A function expression invoked once on load.
    Iife(String),
}

/// Styles and scripts for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSet {
    /// Emitted in `<head>`.
    pub styles: Vec<Asset>,
    /// Emitted at the end of `<body>`.
    pub scripts: Vec<Asset>,
}

impl AssetSet {
    /// Concatenates sets in order.
    #[must_use]
    pub fn merge<'a>(sets: impl IntoIterator<Item = &'a AssetSet>) -> Self {
        let mut merged = Self::default();
        for set in sets {
            merged.styles.extend(set.styles.iter().cloned());
            merged.scripts.extend(set.scripts.iter().cloned());
        }
        merged
    }

    /// Resolves every npm-style location through `urls`.
    #[must_use]
    pub fn resolve(&self, urls: &UrlBuilder) -> Self {
        let map = |asset: &Asset| match asset {
            Asset::Stylesheet { href } => Asset::Stylesheet { href: urls.full_url(href) },
            Asset::Script { src } => Asset::Script { src: urls.full_url(src) },
            other => other.clone(),
        };
        Self {
            styles: self.styles.iter().map(map).collect(),
            scripts: self.scripts.iter().map(map).collect(),
        }
    }

    /// Every external location, stylesheets and scripts alike.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().chain(&self.scripts).filter_map(|asset| match asset {
            Asset::Stylesheet { href } => Some(href.as_str()),
            Asset::Script { src } => Some(src.as_str()),
            _ => None,
        })
    }
}

/// Where npm-style asset paths are served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Provider {
    /// `cdn.jsdelivr.net`.
    #[default]
    Jsdelivr,
    /// `unpkg.com`.
    Unpkg,
    /// Local copies under [`LOCAL_PREFIX`].
    Local,
}

impl Provider {
    /// Providers reachable over the network.
    pub const CDNS: [Provider; 2] = [Provider::Jsdelivr, Provider::Unpkg];
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jsdelivr => "jsdelivr",
            Self::Unpkg => "unpkg",
            Self::Local => "local",
        })
    }
}

/// Builds asset URLs for a chosen provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlBuilder {
    /// Active provider.
    pub provider: Provider,
}

impl UrlBuilder {
    /// Builder for `provider`.
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    /// Builder for exports: local copies when embedding, otherwise the
    /// best known CDN.
    #[must_use]
    pub fn for_export(embed: bool, best: Provider) -> Self {
        Self::new(if embed { Provider::Local } else { best })
    }

    /// URL of `path` with the active provider.
    #[must_use]
    pub fn full_url(&self, path: &str) -> String {
        Self::url_for(path, self.provider)
    }

    /// URL of `path` with a specific provider.
    #[must_use]
    pub fn url_for(path: &str, provider: Provider) -> String {
        match provider {
            Provider::Jsdelivr => format!("https://cdn.jsdelivr.net/npm/{path}"),
            Provider::Unpkg => format!("https://unpkg.com/{path}"),
            Provider::Local => format!("{LOCAL_PREFIX}{path}"),
        }
    }
}

/// Mindmap runtime scripts needed by every page.
#[must_use]
pub fn base_assets() -> AssetSet {
    AssetSet {
        styles: Vec::new(),
        scripts: vec![Asset::Script { src: D3.into() }, Asset::Script { src: MARKMAP_VIEW.into() }],
    }
}

/// Assets needed for the features a document uses.
#[must_use]
pub fn feature_assets(features: &BTreeSet<Feature>) -> AssetSet {
    let mut set = AssetSet::default();
    if features.contains(&Feature::Math) {
        set.styles.push(Asset::Stylesheet { href: KATEX_CSS.into() });
        set.scripts.push(Asset::Script { src: KATEX_JS.into() });
    }
    if features.contains(&Feature::Code) {
        set.styles.push(Asset::Stylesheet { href: HLJS_CSS.into() });
    }
    set
}

/// The floating zoom/fit toolbar.
#[must_use]
pub fn toolbar_assets() -> AssetSet {
    AssetSet {
        styles: vec![Asset::Stylesheet { href: TOOLBAR_CSS.into() }],
        scripts: vec![Asset::Script { src: TOOLBAR_JS.into() }],
    }
}

/// Snippet that mounts the toolbar once the page has loaded.
#[must_use]
pub fn toolbar_snippet() -> Asset {
    Asset::Iife(RENDER_TOOLBAR.into())
}

/// The webview application's own stylesheet and script, relative to the
/// asset root.
#[must_use]
pub fn app_assets() -> AssetSet {
    AssetSet {
        styles: vec![Asset::Stylesheet { href: APP_CSS.into() }],
        scripts: vec![Asset::Script { src: APP_JS.into() }],
    }
}

/// Every npm-style path that is kept as a local copy.
#[must_use]
pub fn local_paths() -> Vec<&'static str> {
    vec![D3, MARKMAP_VIEW, TOOLBAR_CSS, TOOLBAR_JS, KATEX_CSS, KATEX_JS, HLJS_CSS]
}

/// Times one sample request per CDN and returns the quickest to answer.
///
/// Falls back to the default provider when every request fails.
pub async fn fastest_provider(fetcher: &dyn AssetFetcher) -> Provider {
    let mut best: Option<(Provider, std::time::Duration)> = None;
    for provider in Provider::CDNS {
        let started = Instant::now();
        let url = UrlBuilder::url_for(SAMPLE, provider);
        match tokio::time::timeout(SAMPLE_TIMEOUT, fetcher.fetch(&url)).await {
            Err(_) => tracing::debug!(%provider, "provider timed out"),
            Ok(Ok(_)) => {
                let elapsed = started.elapsed();
                tracing::debug!(%provider, ?elapsed, "provider answered");
                if best.is_none_or(|(_, fastest)| elapsed < fastest) {
                    best = Some((provider, elapsed));
                }
            }
            Ok(Err(err)) => tracing::debug!(%provider, "provider failed: {err}"),
        }
    }
    best.map(|(provider, _)| provider).unwrap_or_default()
}

/// Outcome for one local asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// Downloaded from this URL.
    Fetched {
        /// Source URL.
        url: String,
        /// Local file written.
        path: PathBuf,
    },
    /// Already present.
    Skipped(PathBuf),
}

/// Downloads every local asset copy into `<root>/dist/web_assets/`,
/// skipping files that already exist.
///
/// # Errors
///
/// Stops at the first download or write failure.
pub async fn download_local_assets(
    fetcher: &dyn AssetFetcher,
    fs: &dyn FileSystem,
    root: &Path,
    provider: Provider,
) -> Result<Vec<Download>, FetchError> {
    let mut report = Vec::new();
    for path in local_paths() {
        let target = root.join(UrlBuilder::url_for(path, Provider::Local));
        if fs.exists(&target) {
            report.push(Download::Skipped(target));
            continue;
        }
        let url = UrlBuilder::url_for(path, provider);
        tracing::info!("{url} -> {}", target.display());
        let body = fetcher
            .fetch(&url)
            .await
            .map_err(|source| FetchError::Download { url: url.clone(), source })?;
        fs.write(&target, &body)
            .map_err(|source| FetchError::Save { path: target.clone(), source })?;
        report.push(Download::Fetched { url, path: target });
    }
    Ok(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::error::PortError;
    use crate::ports::FetchFuture;

    /// Fetcher serving canned bodies, with a per-host delay.
    #[derive(Default)]
    pub(crate) struct FakeFetcher {
        pub(crate) delays: HashMap<&'static str, Duration>,
        pub(crate) failing: Vec<&'static str>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl AssetFetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> FetchFuture<'_> {
            let url = url.to_string();
            Box::pin(async move {
                self.requests.lock().unwrap().push(url.clone());
                if self.failing.iter().any(|host| url.contains(host)) {
                    return Err::<Vec<u8>, PortError>("offline".into());
                }
                let delay =
                    self.delays.iter().find(|(host, _)| url.contains(*host)).map(|(_, d)| *d);
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(format!("/* {url} */").into_bytes())
            })
        }
    }

    #[test]
    fn urls_per_provider() {
        assert_eq!(
            UrlBuilder::url_for("d3@7/x.js", Provider::Jsdelivr),
            "https://cdn.jsdelivr.net/npm/d3@7/x.js"
        );
        let unpkg = UrlBuilder::url_for("d3@7/x.js", Provider::Unpkg);
        assert_eq!(unpkg, "https://unpkg.com/d3@7/x.js");
        assert_eq!(
            UrlBuilder::for_export(true, Provider::Unpkg).full_url("d3@7/x.js"),
            "dist/web_assets/d3@7/x.js"
        );
    }

    #[test]
    fn features_pull_in_their_assets() {
        let features = BTreeSet::from([Feature::Math, Feature::Table]);
        let set = feature_assets(&features);
        assert_eq!(set.locations().count(), 2);
        assert!(set.locations().all(|l| l.starts_with("katex@")));
        assert_eq!(feature_assets(&BTreeSet::new()), AssetSet::default());
    }

    #[test]
    fn merge_and_resolve_keep_order() {
        let merged = AssetSet::merge([&base_assets(), &toolbar_assets()]);
        let resolved = merged.resolve(&UrlBuilder::new(Provider::Local));
        let locations: Vec<&str> = resolved.locations().collect();
        assert_eq!(locations[0], "dist/web_assets/markmap-toolbar@0.18.12/dist/style.css");
        assert_eq!(locations[1], "dist/web_assets/d3@7.9.0/dist/d3.min.js");
        assert_eq!(locations.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn picks_the_quickest_cdn() {
        let fetcher = FakeFetcher {
            delays: HashMap::from([
                ("jsdelivr", Duration::from_millis(80)),
                ("unpkg", Duration::from_millis(20)),
            ]),
            ..FakeFetcher::default()
        };
        assert_eq!(fastest_provider(&fetcher).await, Provider::Unpkg);
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_default_when_offline() {
        let fetcher = FakeFetcher { failing: vec!["jsdelivr", "unpkg"], ..FakeFetcher::default() };
        assert_eq!(fastest_provider(&fetcher).await, Provider::Jsdelivr);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cdns_are_given_up_on() {
        let fetcher = FakeFetcher {
            delays: HashMap::from([
                ("jsdelivr", Duration::from_secs(60)),
                ("unpkg", Duration::from_secs(1)),
            ]),
            ..FakeFetcher::default()
        };
        let started = Instant::now();
        assert_eq!(fastest_provider(&fetcher).await, Provider::Unpkg);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn downloads_missing_assets_only() {
        let fetcher = FakeFetcher::default();
        let fs = MemoryFileSystem::new();
        let root = Path::new("/ext");
        let existing = root.join("dist/web_assets/d3@7.9.0/dist/d3.min.js");
        fs.write(&existing, b"kept").unwrap();

        let report = download_local_assets(&fetcher, &fs, root, Provider::Unpkg).await.unwrap();
        assert_eq!(report[0], Download::Skipped(existing.clone()));
        assert_eq!(report.len(), local_paths().len());
        assert_eq!(fetcher.requests.lock().unwrap().len(), local_paths().len() - 1);
        assert_eq!(fs.read_bytes(&existing).unwrap(), b"kept");
        let toolbar = root.join("dist/web_assets/markmap-toolbar@0.18.12/dist/index.js");
        assert_eq!(
            fs.read_to_string(&toolbar).unwrap(),
            "/* https://unpkg.com/markmap-toolbar@0.18.12/dist/index.js */"
        );
    }

    #[tokio::test]
    async fn download_failure_names_url() {
        let fetcher = FakeFetcher { failing: vec!["unpkg"], ..FakeFetcher::default() };
        let fs = MemoryFileSystem::new();
        let root = Path::new("/ext");
        let err = download_local_assets(&fetcher, &fs, root, Provider::Unpkg).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to download: https://unpkg.com/d3@7.9.0"));
    }
}
