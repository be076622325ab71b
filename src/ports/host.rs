//! Editor host port: the document, its editor and the host UI.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::settings::Settings;

/// Boxed future returned by [`EditorHost::save_dialog`].
pub type SaveDialogFuture<'a> = Pin<Box<dyn Future<Output = Option<PathBuf>> + Send + 'a>>;

/// Colour theme kind reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeKind {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
    /// High-contrast dark theme.
    HighContrast,
    /// High-contrast light theme.
    HighContrastLight,
}

impl ThemeKind {
    /// Returns `true` for themes the mindmap should render dark.
    #[must_use]
    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark | Self::HighContrast)
    }

    /// Body classes the host puts on the webview document for this theme.
    #[must_use]
    pub fn body_classes(self) -> &'static [&'static str] {
        match self {
            Self::Light => &["vscode-light"],
            Self::Dark => &["vscode-dark"],
            Self::HighContrast => &["vscode-high-contrast"],
            Self::HighContrastLight => &["vscode-high-contrast", "vscode-high-contrast-light"],
        }
    }
}

/// The editor that owns one document.
///
/// A controller holds one host for the document it mirrors. All methods
/// take `&self`; implementations use interior mutability where they record
/// effects.
pub trait EditorHost: Send + Sync {
    /// Full current text of the document.
    fn document_text(&self) -> String;

    /// Location of the document on disk.
    fn document_path(&self) -> PathBuf;

    /// Caret line of the active editor, or `None` when the active editor is
    /// not showing this document.
    fn active_line(&self) -> Option<u32>;

    /// Current `markmap` configuration section.
    fn settings(&self) -> Settings;

    /// Current colour theme.
    fn color_theme(&self) -> ThemeKind;

    /// Moves the caret to `line` and scrolls it into view.
    fn reveal_line(&self, line: u32);

    /// Shows the document as plain text in the column beside the panel.
    fn show_text_beside(&self);

    /// Opens `path` with the host's default handler.
    fn open_path(&self, path: &Path);

    /// Asks the user for an HTML export target; `None` when cancelled.
    fn save_dialog(&self) -> SaveDialogFuture<'_>;

    /// Shows a non-fatal error message.
    fn show_error(&self, message: &str);
}
