//! Standalone HTML documents.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::assets::{Asset, AssetSet};
use crate::error::ExportError;
use crate::node::{html_escape, Node};
use crate::options::JsonOptions;
use crate::ports::FileSystem;

const PAGE_STYLE: &str = "* {
  margin: 0;
  padding: 0;
}
#mindmap {
  display: block;
  width: 100vw;
  height: 100vh;
}";

const BOOTSTRAP: &str = "((root, jsonOptions) => {
  const { Markmap, deriveOptions } = window.markmap;
  window.mm = Markmap.create('svg#mindmap', deriveOptions(jsonOptions), root);
})";

/// Renders a complete HTML page.
///
/// With a `root`, the page bootstraps a mindmap for it; without one it only
/// loads the assets, as the live webview does before its first `setData`.
#[must_use]
pub fn fill_template(
    root: Option<&Node>,
    assets: &AssetSet,
    json_options: Option<&JsonOptions>,
) -> String {
    let mut html = String::from(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <meta http-equiv=\"X-UA-Compatible\" content=\"ie=edge\">\n<title>Markmap</title>\n",
    );
    let _ = writeln!(html, "<style>\n{PAGE_STYLE}\n</style>");
    for style in &assets.styles {
        html.push_str(&render_asset(style));
        html.push('\n');
    }
    html.push_str("</head>\n<body>\n<svg id=\"mindmap\"></svg>\n");
    for script in &assets.scripts {
        html.push_str(&render_asset(script));
        html.push('\n');
    }
    if let Some(root) = root {
        let options = json_options.cloned().unwrap_or_default();
        let (root, options) = (script_json(root), script_json(&options));
        let _ = writeln!(html, "<script>{BOOTSTRAP}({root}, {options})</script>");
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn render_asset(asset: &Asset) -> String {
    match asset {
        Asset::Stylesheet { href } => {
            format!("<link rel=\"stylesheet\" href=\"{}\">", html_escape(href))
        }
        Asset::Style(css) => format!("<style>{css}</style>"),
        Asset::Script { src } => format!("<script src=\"{}\"></script>", html_escape(src)),
        Asset::InlineScript(text) => format!("<script>{text}</script>"),
        Asset::Iife(body) => format!("<script>({body})()</script>"),
    }
}

/// Serializes `value` for use inside a `<script>` element.
fn script_json(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".into()).replace('<', "\\u003c")
}

/// Replaces every external stylesheet and script with its contents, read
/// from `root`.
///
/// # Errors
///
/// Returns [`ExportError::Asset`] for the first file that cannot be read.
pub fn embed_assets(
    assets: &AssetSet,
    fs: &dyn FileSystem,
    root: &Path,
) -> Result<AssetSet, ExportError> {
    let load = |path: &str| {
        fs.read_to_string(&root.join(path))
            .map_err(|source| ExportError::Asset { path: path.to_string(), source })
    };
    let mut embedded = AssetSet::default();
    for style in &assets.styles {
        embedded.styles.push(match style {
            Asset::Stylesheet { href } => Asset::Style(load(href)?),
            other => other.clone(),
        });
    }
    for script in &assets.scripts {
        embedded.scripts.push(match script {
            Asset::Script { src } => Asset::InlineScript(load(src)?),
            other => other.clone(),
        });
    }
    Ok(embedded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryFileSystem;
    use crate::assets::{
        base_assets, toolbar_assets, toolbar_snippet, Provider, UrlBuilder, LOCAL_PREFIX,
    };

    #[test]
    fn page_without_root_has_no_bootstrap() {
        let html = fill_template(None, &base_assets(), None);
        assert!(html.contains("<svg id=\"mindmap\"></svg>"));
        assert!(html.contains("<script src=\"d3@7.9.0/dist/d3.min.js\"></script>"));
        assert!(!html.contains("Markmap.create"));
    }

    #[test]
    fn bootstrap_escapes_closing_tags() {
        let root = Node::leaf("</script><script>alert(1)</script>");
        let html = fill_template(Some(&root), &AssetSet::default(), Some(&JsonOptions::defaults()));
        assert!(html.contains("Markmap.create"));
        assert!(!html.contains("</script><script>alert"));
        assert!(html.contains("\\u003c/script>"));
        assert!(html.contains("\"initialExpandLevel\":-1"));
    }

    #[test]
    fn styles_precede_body_and_iife_is_invoked() {
        let mut assets = toolbar_assets().resolve(&UrlBuilder::new(Provider::Jsdelivr));
        assets.scripts.push(toolbar_snippet());
        let html = fill_template(None, &assets, None);
        let link = html.find("markmap-toolbar@0.18.12/dist/style.css").unwrap();
        assert!(link < html.find("<body>").unwrap());
        assert!(html.contains("<script>(() => setTimeout("));
        assert!(html.contains("}))()</script>"));
    }

    #[test]
    fn embedding_inlines_local_copies() {
        let root = Path::new("/ext");
        let toolbar = root.join(LOCAL_PREFIX).join("markmap-toolbar@0.18.12/dist");
        let fs = MemoryFileSystem::new()
            .with_file(toolbar.join("style.css"), ".mm-toolbar{}")
            .with_file(toolbar.join("index.js"), "var toolbar;");
        let local = toolbar_assets().resolve(&UrlBuilder::new(Provider::Local));
        let embedded = embed_assets(&local, &fs, root).unwrap();
        assert_eq!(embedded.styles, vec![Asset::Style(".mm-toolbar{}".into())]);
        assert_eq!(embedded.scripts, vec![Asset::InlineScript("var toolbar;".into())]);
        assert_eq!(embedded.locations().count(), 0);
    }

    #[test]
    fn missing_local_copy_is_reported() {
        let local = base_assets().resolve(&UrlBuilder::new(Provider::Local));
        let err = embed_assets(&local, &MemoryFileSystem::new(), Path::new("/ext")).unwrap_err();
        assert!(err.to_string().contains("dist/web_assets/d3@7.9.0/dist/d3.min.js"));
    }
}
