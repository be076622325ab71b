//! `mindsync tree` command.

use std::path::Path;

use crate::context::ServiceContext;
use crate::node::check_line_ranges;
use crate::ports::TransformOptions;

/// Execute the `tree` command.
///
/// Prints the transformed tree as JSON. With `check`, also verifies that
/// line ranges nest and fails on the first violation.
///
/// # Errors
///
/// Returns an error string if the document cannot be read or transformed,
/// or if the check fails.
pub fn run(ctx: &ServiceContext, file: &Path, check: bool) -> Result<(), String> {
    let text = ctx
        .fs
        .read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let transformed = ctx
        .transformer
        .transform(&text, &TransformOptions::default())
        .map_err(|e| format!("failed to transform {}: {e}", file.display()))?;
    let json = serde_json::to_string_pretty(&transformed.root)
        .map_err(|e| format!("failed to encode tree: {e}"))?;
    println!("{json}");
    if check {
        check_line_ranges(&transformed.root).map_err(|v| format!("line range check failed: {v}"))?;
        eprintln!("{} nodes, line ranges ok", transformed.root.count());
    }
    Ok(())
}
