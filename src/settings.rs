//! The `markmap` configuration section.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::SettingsError;

/// Default debounce delay for content and cursor updates.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// How theme changes are announced to the webview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeSignal {
    /// Send `setTheme` with an explicit dark flag.
    #[default]
    Explicit,
    /// Send `checkTheme` and let the webview read its body classes.
    Detect,
}

/// Host configuration for the mindmap panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Raw JSON for global default options.
    pub default_options: Option<String>,
    /// Extra stylesheet injected into the webview and exports.
    pub custom_css: Option<String>,
    /// Debounce delay in milliseconds.
    pub debounce_ms: u64,
    /// Theme announcement style.
    pub theme_signal: ThemeSignal,
    /// Directory containing `dist/web_assets` and the app assets.
    pub asset_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_options: None,
            custom_css: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            theme_signal: ThemeSignal::default(),
            asset_root: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Debounce delay as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Loads settings from `MINDSYNC_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or enumerated variable is malformed.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or enumerated value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        settings.default_options =
            lookup("MINDSYNC_DEFAULT_OPTIONS").filter(|s| !s.trim().is_empty());
        settings.custom_css = lookup("MINDSYNC_CUSTOM_CSS").filter(|s| !s.is_empty());
        if let Some(raw) = lookup("MINDSYNC_DEBOUNCE_MS") {
            settings.debounce_ms = raw.trim().parse().map_err(|_| SettingsError::Number {
                key: "MINDSYNC_DEBOUNCE_MS",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup("MINDSYNC_THEME_SIGNAL") {
            settings.theme_signal = match raw.trim() {
                "explicit" => ThemeSignal::Explicit,
                "detect" => ThemeSignal::Detect,
                _ => {
                    return Err(SettingsError::Choice {
                        key: "MINDSYNC_THEME_SIGNAL",
                        expected: "explicit, detect",
                        value: raw,
                    })
                }
            };
        }
        if let Some(root) = lookup("MINDSYNC_ASSET_ROOT") {
            settings.asset_root = PathBuf::from(root);
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn reads_all_keys() {
        let settings = Settings::from_lookup(lookup(&[
            ("MINDSYNC_DEFAULT_OPTIONS", r#"{"maxWidth":300}"#),
            ("MINDSYNC_CUSTOM_CSS", ".markmap{}"),
            ("MINDSYNC_DEBOUNCE_MS", "50"),
            ("MINDSYNC_THEME_SIGNAL", "detect"),
            ("MINDSYNC_ASSET_ROOT", "/opt/mindsync"),
        ]))
        .unwrap();
        assert_eq!(settings.default_options.as_deref(), Some(r#"{"maxWidth":300}"#));
        assert_eq!(settings.custom_css.as_deref(), Some(".markmap{}"));
        assert_eq!(settings.debounce_ms, 50);
        assert_eq!(settings.theme_signal, ThemeSignal::Detect);
        assert_eq!(settings.asset_root, PathBuf::from("/opt/mindsync"));
    }

    #[test]
    fn rejects_bad_debounce() {
        let err = Settings::from_lookup(lookup(&[("MINDSYNC_DEBOUNCE_MS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("MINDSYNC_DEBOUNCE_MS"));
    }

    #[test]
    fn rejects_unknown_theme_signal() {
        assert!(Settings::from_lookup(lookup(&[("MINDSYNC_THEME_SIGNAL", "auto")])).is_err());
    }
}
