//! Records bus frames into a transcript file.

use std::path::PathBuf;

use chrono::Utc;

use super::format::{Frame, Transcript};
use crate::bus::Direction;

/// Collects frames and writes them as a YAML transcript.
#[derive(Debug)]
pub struct TranscriptRecorder {
    path: PathBuf,
    name: String,
    session: String,
    frames: Vec<Frame>,
    next_seq: u64,
}

impl TranscriptRecorder {
    /// Create a recorder that will write to `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        session: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            session: session.into(),
            frames: Vec::new(),
            next_seq: 0,
        }
    }

    /// Record one message. The `seq` field is assigned automatically.
    pub fn record(&mut self, direction: Direction, message: serde_json::Value) {
        self.frames.push(Frame { seq: self.next_seq, direction, message });
        self.next_seq += 1;
    }

    /// Number of frames so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The transcript as recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> Transcript {
        Transcript {
            name: self.name.clone(),
            recorded_at: Utc::now(),
            session: self.session.clone(),
            frames: self.frames.clone(),
        }
    }

    /// Write the transcript YAML file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(&self) -> Result<PathBuf, std::io::Error> {
        let yaml = serde_yaml::to_string(&self.snapshot()).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn record_and_finish() {
        let dir = std::env::temp_dir().join("mindsync_transcript_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.yaml");

        let mut recorder = TranscriptRecorder::new(&path, "test-recording", "notes.md");
        recorder.record(Direction::ToHost, json!({"type": "refresh"}));
        recorder.record(Direction::ToWebview, json!({"type": "checkTheme"}));
        assert_eq!(recorder.len(), 2);

        let written = recorder.finish().expect("finish should succeed");
        assert_eq!(written, path);

        let yaml = std::fs::read_to_string(&path).unwrap();
        let transcript: Transcript = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(transcript.name, "test-recording");
        assert_eq!(transcript.session, "notes.md");
        assert_eq!(transcript.frames[0].seq, 0);
        assert_eq!(transcript.frames[1].seq, 1);
        assert_eq!(transcript.frames[1].direction, Direction::ToWebview);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
