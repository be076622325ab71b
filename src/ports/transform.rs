//! Markdown transform port.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::node::Node;
use crate::options::Frontmatter;

/// Rewrites a relative image source into a URL the target can load.
pub type ImageResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Per-call transform settings.
#[derive(Clone, Default)]
pub struct TransformOptions {
    /// Hook for relative `img` sources; `None` leaves them untouched.
    pub image_resolver: Option<ImageResolver>,
    /// Opaque `htmlParser` options from the global configuration.
    pub html_parser: Option<serde_json::Value>,
}

impl fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformOptions")
            .field("image_resolver", &self.image_resolver.as_ref().map(|_| "<fn>"))
            .field("html_parser", &self.html_parser)
            .finish()
    }
}

/// Markdown constructs that need extra assets when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    /// GFM tables.
    Table,
    /// Inline or display math.
    Math,
    /// Fenced or indented code.
    Code,
}

/// Result of one transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformed {
    /// Tree root; carries no line range.
    pub root: Node,
    /// Parsed frontmatter, if the document has one.
    pub frontmatter: Option<Frontmatter>,
    /// Features used by the document.
    pub features: BTreeSet<Feature>,
}

/// Converts Markdown into a mindmap tree.
pub trait MarkdownTransformer: Send + Sync {
    /// Transforms `markdown`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be turned into a tree.
    fn transform(
        &self,
        markdown: &str,
        options: &TransformOptions,
    ) -> Result<Transformed, TransformError>;
}
