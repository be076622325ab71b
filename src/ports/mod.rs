//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the synchronization core and a
//! collaborator it does not own: the editor, the Markdown transform, the
//! mindmap view, the filesystem, the network and the webview transport.
//! Implementations live in `src/adapters/`.

pub mod assets;
pub mod filesystem;
pub mod host;
pub mod transform;
pub mod transport;
pub mod view;

pub use assets::{AssetFetcher, FetchFuture};
pub use filesystem::FileSystem;
pub use host::{EditorHost, SaveDialogFuture, ThemeKind};
pub use transform::{Feature, ImageResolver, MarkdownTransformer, TransformOptions, Transformed};
pub use transport::Transport;
pub use view::{MindmapView, Padding, Rect, RenderFuture, ViewElement};
