//! Mindmap display options.
//!
//! Options arrive in layers (built-in defaults, the user's global
//! `defaultOptions`, the document's `markmap:` frontmatter block) and are
//! merged shallowly, later layers winning key by key.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// How the view scrolls to the active node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Pan so the node sits in the middle of the viewport.
    Center,
    /// Pan as little as needed to bring the node into view.
    #[default]
    Visible,
}

/// `activeNode` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActiveNodeOptions {
    /// Scroll behaviour for the highlighted node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    /// Keys passed through to the view untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for ActiveNodeOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut block = object_or_empty(Value::deserialize(deserializer)?, "activeNode");
        let placement = take(&mut block, "placement");
        Ok(Self { placement, extra: block })
    }
}

/// Options in their JSON form, as sent with `setData`.
///
/// Decoding never fails on a recognised key with an unexpected value: the
/// value is logged, left out of the typed field and passed through in
/// `extra`, so the view receives it as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonOptions {
    /// Depth to expand initially; -1 expands everything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_expand_level: Option<i32>,
    /// Maximum node width in pixels; 0 disables wrapping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    /// Depth below which branch colours stop changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_freeze_level: Option<u32>,
    /// Transition duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Export with inlined assets instead of CDN links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_assets: Option<bool>,
    /// Active node behaviour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_node: Option<ActiveNodeOptions>,
    /// Unfold collapsed ancestors when the cursor lands inside them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_expand: Option<bool>,
    /// Keys passed through to the view untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for JsonOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

/// Moves `key` out of `map` as a `T`; an ill-typed value stays in `map`.
fn take<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = map.remove(key).filter(|v| !v.is_null())?;
    match T::deserialize(&value) {
        Ok(typed) => Some(typed),
        Err(err) => {
            tracing::warn!(key, %value, "unexpected option value, passing it through: {err}");
            map.insert(key.to_string(), value);
            None
        }
    }
}

fn object_or_empty(value: Value, what: &str) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            tracing::warn!(%other, "ignoring {what}: not a mapping");
            Map::new()
        }
    }
}

impl JsonOptions {
    /// Decodes options from loosely typed JSON.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let mut map = object_or_empty(value, "options");
        Self {
            initial_expand_level: take(&mut map, "initialExpandLevel"),
            max_width: take(&mut map, "maxWidth"),
            color_freeze_level: take(&mut map, "colorFreezeLevel"),
            duration: take(&mut map, "duration"),
            embed_assets: take(&mut map, "embedAssets"),
            active_node: take(&mut map, "activeNode"),
            auto_expand: take(&mut map, "autoExpand"),
            extra: map,
        }
    }

    /// Built-in defaults, the bottom layer of every merge.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            initial_expand_level: Some(-1),
            max_width: Some(0),
            color_freeze_level: Some(0),
            duration: Some(500),
            embed_assets: None,
            active_node: Some(ActiveNodeOptions {
                placement: Some(Placement::Visible),
                extra: Map::new(),
            }),
            auto_expand: Some(true),
            extra: Map::new(),
        }
    }

    /// Parses the global `defaultOptions` setting.
    ///
    /// Invalid or empty JSON yields `None`, which behaves like no global layer.
    #[must_use]
    pub fn parse_global(raw: Option<&str>) -> Option<Self> {
        let raw = raw?.trim();
        if raw.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Some(Self::from_value(value)),
            Err(err) => {
                tracing::warn!("ignoring invalid defaultOptions: {err}");
                None
            }
        }
    }

    /// Shallow-merges `layers` in order; a key set in a later layer replaces
    /// the whole value from earlier layers.
    #[must_use]
    pub fn merged<'a>(layers: impl IntoIterator<Item = &'a JsonOptions>) -> Self {
        let mut merged = Map::new();
        for layer in layers {
            if let Ok(Value::Object(map)) = serde_json::to_value(layer) {
                merged.extend(map.into_iter().filter(|(_, v)| !v.is_null()));
            }
        }
        Self::from_value(Value::Object(merged))
    }

    /// Resolves the options the view acts on, filling gaps from the defaults.
    #[must_use]
    pub fn derive(&self) -> ViewOptions {
        let defaults = Self::defaults();
        ViewOptions {
            initial_expand_level: self
                .initial_expand_level
                .or(defaults.initial_expand_level)
                .unwrap_or(-1),
            max_width: self.max_width.unwrap_or(0),
            color_freeze_level: self.color_freeze_level.unwrap_or(0),
            duration: Duration::from_millis(self.duration.or(defaults.duration).unwrap_or(0)),
            placement: self.active_node.as_ref().and_then(|a| a.placement).unwrap_or_default(),
            auto_expand: self.auto_expand.unwrap_or(true),
        }
    }
}

/// Options resolved to concrete values.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    /// Depth to expand initially; -1 expands everything.
    pub initial_expand_level: i32,
    /// Maximum node width in pixels; 0 disables wrapping.
    pub max_width: u32,
    /// Depth below which branch colours stop changing.
    pub color_freeze_level: u32,
    /// Transition duration.
    pub duration: Duration,
    /// Scroll behaviour for the highlighted node.
    pub placement: Placement,
    /// Unfold ancestors of the cursor node.
    pub auto_expand: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        JsonOptions::defaults().derive()
    }
}

/// Parsed YAML frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// The `markmap:` block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markmap: Option<JsonOptions>,
    /// Any other frontmatter keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
