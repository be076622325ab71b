//! Error types shared across the host and webview halves.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by port implementations.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to turn Markdown into a node tree.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The YAML frontmatter block could not be parsed.
    #[error("invalid frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),
    /// The transformer rejected the document for another reason.
    #[error("{0}")]
    Other(String),
}

/// Failure on the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The receiving side has gone away.
    #[error("message bus closed")]
    Closed,
    /// The message could not be encoded as JSON.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure while producing an exported HTML file.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A bundled asset could not be loaded for embedding.
    #[error("cannot load asset \"{path}\": {source}")]
    Asset {
        /// Path of the asset relative to the asset root.
        path: String,
        /// Underlying I/O failure.
        source: PortError,
    },
    /// The target file could not be written.
    #[error("Cannot write file \"{}\"!", path.display())]
    Write {
        /// Target file chosen by the user.
        path: PathBuf,
        /// Underlying I/O failure.
        source: PortError,
    },
}

/// Failure while downloading local asset copies.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The asset could not be downloaded.
    #[error("Failed to download: {url}: {source}")]
    Download {
        /// Full URL requested.
        url: String,
        /// Underlying network failure.
        source: PortError,
    },
    /// The downloaded asset could not be saved.
    #[error("cannot save \"{}\": {source}", path.display())]
    Save {
        /// Local target path.
        path: PathBuf,
        /// Underlying I/O failure.
        source: PortError,
    },
}

/// Failure of a workbench command.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    /// `open` was called without a path and no document is active.
    #[error("no document to open")]
    NoDocument,
    /// No panel has this id.
    #[error("unknown panel {0}")]
    UnknownPanel(uuid::Uuid),
    /// The document could not be loaded into an editor host.
    #[error("cannot open \"{}\": {source}", path.display())]
    Open {
        /// Document path.
        path: PathBuf,
        /// Underlying failure.
        source: PortError,
    },
    /// A panel task panicked or was cancelled.
    #[error("panel task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A numeric setting did not parse.
    #[error("{key} must be a non-negative integer, got {value:?}")]
    Number {
        /// Setting name.
        key: &'static str,
        /// Raw value found.
        value: String,
    },
    /// An enumerated setting had an unknown value.
    #[error("{key} must be one of {expected}, got {value:?}")]
    Choice {
        /// Setting name.
        key: &'static str,
        /// Accepted values.
        expected: &'static str,
        /// Raw value found.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_error_names_target() {
        let err =
            ExportError::Write { path: PathBuf::from("/tmp/out.html"), source: "denied".into() };
        assert_eq!(err.to_string(), "Cannot write file \"/tmp/out.html\"!");
    }

    #[test]
    fn frontmatter_error_wraps_yaml() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let err = TransformError::from(yaml_err);
        assert!(err.to_string().starts_with("invalid frontmatter"));
    }
}
