//! Integration tests for top-level CLI behavior.

use std::path::PathBuf;
use std::process::Command;

fn run_mindsync(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_mindsync");
    Command::new(bin)
        .args(args)
        .env_remove("MINDSYNC_RECORD")
        .env_remove("MINDSYNC_DEFAULT_OPTIONS")
        .output()
        .expect("failed to run mindsync binary")
}

/// Writes `contents` to a fresh file under a per-test temp directory.
fn temp_doc(test: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mindsync_cli_{test}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("doc.md");
    std::fs::write(&path, contents).unwrap();
    path
}

const DOC: &str = "# Title\n\n## Foo\n\n- one\n- two\n";

#[test]
fn tree_prints_nodes_with_line_ranges() {
    let doc = temp_doc("tree", DOC);
    let output = run_mindsync(&["tree", doc.to_str().unwrap(), "--check"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    let root: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(root["children"][0]["content"], "Title");
    assert_eq!(root["children"][0]["payload"]["lines"], "0,6");
    assert!(String::from_utf8_lossy(&output.stderr).contains("line ranges ok"));
}

#[test]
fn tree_of_missing_file_fails() {
    let output = run_mindsync(&["tree", "/nonexistent/mindsync/doc.md"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}

#[test]
fn export_writes_standalone_html() {
    let doc = temp_doc("export", DOC);
    let out = doc.with_file_name("doc.html");
    let output = run_mindsync(&["export", doc.to_str().unwrap(), "-o", out.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("<svg id=\"mindmap\"></svg>"));
    assert!(html.contains("d3@7.9.0/dist/d3.min.js\"></script>"));
    assert!(html.contains("<script src=\"https://"));
    assert!(html.contains("Markmap.create"));
    assert!(html.contains("\"Title\""));
}

#[test]
fn embedded_export_without_local_assets_fails() {
    let doc = temp_doc("embed", DOC);
    let out = doc.with_file_name("doc.html");
    let output = Command::new(env!("CARGO_BIN_EXE_mindsync"))
        .args(["export", doc.to_str().unwrap(), "-o", out.to_str().unwrap(), "--embed-assets"])
        .env("MINDSYNC_ASSET_ROOT", doc.parent().unwrap())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot load asset"));
    assert!(!out.exists());
}

#[test]
fn session_reports_the_node_under_the_caret() {
    let doc = temp_doc("session", DOC);
    let svg = doc.with_file_name("doc.svg");
    let (doc, svg_arg) = (doc.to_str().unwrap(), svg.to_str().unwrap());
    let output = run_mindsync(&["session", doc, "--line", "4", "--svg", svg_arg]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("[4,5]: one"), "{stdout}");
    assert!(std::fs::read_to_string(&svg).unwrap().starts_with("<svg"));
}

#[test]
fn session_without_caret_has_no_active_node() {
    let doc = temp_doc("no_caret", DOC);
    let output = run_mindsync(&["session", doc.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no active node"));
}

#[test]
fn invalid_debounce_is_a_configuration_error() {
    let doc = temp_doc("config", DOC);
    let output = Command::new(env!("CARGO_BIN_EXE_mindsync"))
        .args(["tree", doc.to_str().unwrap()])
        .env("MINDSYNC_DEBOUNCE_MS", "soon")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("MINDSYNC_DEBOUNCE_MS"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_mindsync(&["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}
