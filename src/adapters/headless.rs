//! Editor host without an editor.
//!
//! Holds the document and caret in memory and records every UI effect the
//! controller asks for, so CLI sessions and tests can inspect them.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::ports::{EditorHost, SaveDialogFuture, ThemeKind};
use crate::settings::Settings;

/// Mutable state behind a [`HeadlessHost`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostState {
    /// Document text.
    pub text: String,
    /// Document location.
    pub path: PathBuf,
    /// Caret line, `None` when another document has focus.
    pub active_line: Option<u32>,
    /// Current configuration.
    pub settings: Settings,
    /// Current colour theme.
    pub theme: ThemeKind,
    /// Answer given by the save dialog.
    pub save_target: Option<PathBuf>,
    /// Lines revealed through `setFocus`.
    pub revealed: Vec<u32>,
    /// Paths opened through `openFile`.
    pub opened: Vec<PathBuf>,
    /// Error messages shown.
    pub errors: Vec<String>,
    /// Times the document was shown as text.
    pub shown_as_text: usize,
}

/// In-memory [`EditorHost`].
#[derive(Debug, Default)]
pub struct HeadlessHost {
    state: Mutex<HostState>,
}

impl HeadlessHost {
    /// Host for a document at `path` with the given text.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(HostState {
                text: text.into(),
                path: path.into(),
                ..HostState::default()
            }),
        }
    }

    /// Runs `update` against the state.
    pub fn update(&self, update: impl FnOnce(&mut HostState)) {
        update(&mut self.lock());
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> HostState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl EditorHost for HeadlessHost {
    fn document_text(&self) -> String {
        self.lock().text.clone()
    }

    fn document_path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    fn active_line(&self) -> Option<u32> {
        self.lock().active_line
    }

    fn settings(&self) -> Settings {
        self.lock().settings.clone()
    }

    fn color_theme(&self) -> ThemeKind {
        self.lock().theme
    }

    fn reveal_line(&self, line: u32) {
        self.lock().revealed.push(line);
    }

    fn show_text_beside(&self) {
        self.lock().shown_as_text += 1;
    }

    fn open_path(&self, path: &Path) {
        self.lock().opened.push(path.to_path_buf());
    }

    fn save_dialog(&self) -> SaveDialogFuture<'_> {
        let target = self.lock().save_target.clone();
        Box::pin(async move { target })
    }

    fn show_error(&self, message: &str) {
        tracing::warn!("{message}");
        self.lock().errors.push(message.to_string());
    }
}
