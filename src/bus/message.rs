//! Message variants for both directions of the bus.
//!
//! On the wire every message is a JSON object `{"type": ..., "data": ...}`.

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::options::JsonOptions;

/// Messages posted by the host controller to the webview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum HostMessage {
    /// Replace the rendered tree.
    SetData(TreeData),
    /// Highlight the node under the editor caret.
    SetCursor(CursorRequest),
    /// Replace the custom stylesheet; `None` clears it.
    #[serde(rename = "setCSS")]
    SetCss(Option<String>),
    /// Switch dark mode on or off.
    SetTheme(bool),
    /// Ask the webview to work out dark mode from its own body classes.
    CheckTheme,
    /// Serialize the current SVG and send it back for saving at this path.
    DownloadSvg(String),
    /// Toggle the active node; `true` toggles recursively.
    ToggleNode(bool),
}

/// Payload of [`HostMessage::SetData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeData {
    /// Tree root.
    pub root: Node,
    /// Merged options for this document.
    #[serde(default)]
    pub json_options: JsonOptions,
}

/// Payload of [`HostMessage::SetCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorRequest {
    /// 0-based editor line.
    pub line: u32,
    /// Unfold collapsed ancestors of the match.
    #[serde(default = "default_auto_expand")]
    pub auto_expand: bool,
}

fn default_auto_expand() -> bool {
    true
}

/// Messages posted by the webview to the host controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum WebviewMessage {
    /// Webview is ready (or wants everything pushed again).
    Refresh,
    /// Open the document as plain text beside the panel.
    EditAsText,
    /// Export the mindmap as HTML (toolbar button).
    Export,
    /// Export the mindmap as HTML (command palette).
    ExportAsHtml,
    /// Open a link relative to the document.
    OpenFile(String),
    /// Move the editor caret to this line.
    SetFocus(u32),
    /// Diagnostic text from the webview.
    Log(String),
    /// Serialized SVG to save.
    DownloadSvg(SvgDownload),
}

/// Payload of [`WebviewMessage::DownloadSvg`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvgDownload {
    /// SVG markup.
    pub content: String,
    /// Target path, relative to the document.
    pub path: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn set_cursor_wire_shape() {
        let msg = HostMessage::SetCursor(CursorRequest { line: 6, auto_expand: true });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "setCursor", "data": {"line": 6, "autoExpand": true}})
        );
    }

    #[test]
    fn set_css_uses_upper_case_name() {
        let value = serde_json::to_value(HostMessage::SetCss(Some("a{}".into()))).unwrap();
        assert_eq!(value["type"], "setCSS");
    }

    #[test]
    fn auto_expand_defaults_to_true() {
        let msg: HostMessage =
            serde_json::from_value(json!({"type": "setCursor", "data": {"line": 2}})).unwrap();
        assert_eq!(msg, HostMessage::SetCursor(CursorRequest { line: 2, auto_expand: true }));
    }

    #[test]
    fn unit_messages_need_no_data() {
        let msg: WebviewMessage = serde_json::from_value(json!({"type": "refresh"})).unwrap();
        assert_eq!(msg, WebviewMessage::Refresh);
        let msg: HostMessage = serde_json::from_value(json!({"type": "checkTheme"})).unwrap();
        assert_eq!(msg, HostMessage::CheckTheme);
    }

    #[test]
    fn set_data_carries_json_options() {
        let value = json!({
            "type": "setData",
            "data": {"root": {"content": "r"}, "jsonOptions": {"maxWidth": 200}}
        });
        let HostMessage::SetData(data) = serde_json::from_value(value).unwrap() else {
            panic!("expected setData");
        };
        assert_eq!(data.root.content, "r");
        assert_eq!(data.json_options.max_width, Some(200));
    }
}
