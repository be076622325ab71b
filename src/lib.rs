//! Core library for `mindsync`: keeps a Markdown mindmap view in sync with
//! the editor that owns the document.

pub mod adapters;
pub mod assets;
pub mod bus;
pub mod cli;
pub mod commands;
pub mod context;
pub mod controller;
pub mod error;
pub mod export;
pub mod node;
pub mod options;
pub mod ports;
pub mod renderer;
pub mod settings;
pub mod transcript;
pub mod workbench;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}
