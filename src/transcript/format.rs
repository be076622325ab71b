//! Transcript data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bus::Direction;

/// One message as it crossed the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    /// Sequence number across both directions.
    pub seq: u64,
    /// Which way the message travelled.
    pub direction: Direction,
    /// The wire message, `{type, data}`.
    pub message: serde_json::Value,
}

/// A recorded panel session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    /// Human-readable name.
    pub name: String,
    /// When recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Panel or document the frames belong to.
    pub session: String,
    /// Frames in the order they were posted.
    pub frames: Vec<Frame>,
}

impl Transcript {
    /// Frames travelling in `direction`.
    pub fn frames_to(&self, direction: Direction) -> impl Iterator<Item = &Frame> {
        self.frames.iter().filter(move |frame| frame.direction == direction)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn yaml_uses_camel_case_directions() {
        let transcript = Transcript {
            name: "t".into(),
            recorded_at: Utc::now(),
            session: "doc.md".into(),
            frames: vec![
                Frame { seq: 0, direction: Direction::ToHost, message: json!({"type": "refresh"}) },
                Frame {
                    seq: 1,
                    direction: Direction::ToWebview,
                    message: json!({"type": "setTheme", "data": true}),
                },
            ],
        };
        let yaml = serde_yaml::to_string(&transcript).unwrap();
        assert!(yaml.contains("direction: toHost"));
        assert!(yaml.contains("direction: toWebview"));
        let back: Transcript = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.frames_to(Direction::ToWebview).count(), 1);
    }
}
