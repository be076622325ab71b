//! The slice of the webview document the renderer touches.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::ports::ThemeKind;

/// Class toggled on the root element for dark mode.
pub const DARK_CLASS: &str = "markmap-dark";

/// Body classes written by the host into the webview document.
///
/// The host owns these; the renderer only reads them when asked to
/// `checkTheme`.
#[derive(Debug, Clone, Default)]
pub struct HostClasses(Arc<Mutex<BTreeSet<String>>>);

impl HostClasses {
    /// Creates classes for an initial theme.
    #[must_use]
    pub fn for_theme(kind: ThemeKind) -> Self {
        let classes = Self::default();
        classes.apply_theme(kind);
        classes
    }

    /// Replaces the theme classes.
    pub fn apply_theme(&self, kind: ThemeKind) {
        if let Ok(mut set) = self.0.lock() {
            set.retain(|c| !c.starts_with("vscode-"));
            set.extend(kind.body_classes().iter().map(|c| (*c).to_string()));
        }
    }

    /// Returns `true` when the classes describe a dark theme.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.0.lock().is_ok_and(|set| {
            set.contains("vscode-dark")
                || (set.contains("vscode-high-contrast")
                    && !set.contains("vscode-high-contrast-light"))
        })
    }
}

/// Style element and root classes owned by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentState {
    style: Option<String>,
    root_classes: BTreeSet<String>,
}

impl DocumentState {
    /// Replaces the custom stylesheet, creating the element on first use.
    pub fn set_css(&mut self, css: Option<String>) {
        *self.style.get_or_insert_with(String::new) = css.unwrap_or_default();
    }

    /// Text of the custom style element, `None` until one was created.
    #[must_use]
    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// Adds or removes the dark class.
    pub fn set_dark(&mut self, dark: bool) {
        if dark {
            self.root_classes.insert(DARK_CLASS.to_string());
        } else {
            self.root_classes.remove(DARK_CLASS);
        }
    }

    /// Returns `true` if dark mode is on.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.root_classes.contains(DARK_CLASS)
    }
}
