//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `mindsync`.
#[derive(Debug, Parser)]
#[command(name = "mindsync", version, about = "Render Markdown documents as interactive mindmaps")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the mindmap tree of a document as JSON.
    Tree {
        /// Markdown document.
        file: PathBuf,
        /// Fail if node line ranges do not nest.
        #[arg(long)]
        check: bool,
    },
    /// Write a standalone HTML mindmap.
    Export {
        /// Markdown document.
        file: PathBuf,
        /// Output HTML file.
        #[arg(short, long)]
        output: PathBuf,
        /// Inline scripts, stylesheets and local images.
        #[arg(long)]
        embed_assets: bool,
    },
    /// Open the document in a headless panel and report the highlighted node.
    Session {
        /// Markdown document.
        file: PathBuf,
        /// Caret line (0-based).
        #[arg(long)]
        line: Option<u32>,
        /// Save the rendered SVG here.
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// Replay a recorded transcript into a fresh renderer.
    Replay {
        /// Transcript YAML file.
        transcript: PathBuf,
    },
    /// Download local copies of the webview assets.
    FetchAssets {
        /// Directory that receives `dist/web_assets/`.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_tree_with_check() {
        let cli = Cli::parse_from(["mindsync", "tree", "doc.md", "--check"]);
        assert!(matches!(cli.command, Command::Tree { check: true, .. }));
    }

    #[test]
    fn export_requires_output() {
        assert!(Cli::try_parse_from(["mindsync", "export", "doc.md"]).is_err());
        let cli =
            Cli::parse_from(["mindsync", "export", "doc.md", "-o", "out.html", "--embed-assets"]);
        match cli.command {
            Command::Export { output, embed_assets, .. } => {
                assert_eq!(output.to_str(), Some("out.html"));
                assert!(embed_assets);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_session_line() {
        let cli = Cli::parse_from(["mindsync", "session", "doc.md", "--line", "3"]);
        assert!(matches!(cli.command, Command::Session { line: Some(3), svg: None, .. }));
    }

    #[test]
    fn fetch_assets_defaults_to_current_dir() {
        let cli = Cli::parse_from(["mindsync", "fetch-assets"]);
        match cli.command {
            Command::FetchAssets { dir } => assert_eq!(dir.to_str(), Some(".")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
