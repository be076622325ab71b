//! Recording adapter for the `Transport` port.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::bus::Direction;
use crate::error::PortError;
use crate::ports::Transport;
use crate::transcript::TranscriptRecorder;

/// Records every posted message while delegating to an inner transport.
pub struct RecordingTransport {
    inner: Box<dyn Transport>,
    direction: Direction,
    recorder: Arc<Mutex<TranscriptRecorder>>,
}

impl RecordingTransport {
    /// Creates a recording transport for one direction of the bus.
    pub fn new(
        inner: Box<dyn Transport>,
        direction: Direction,
        recorder: Arc<Mutex<TranscriptRecorder>>,
    ) -> Self {
        Self { inner, direction, recorder }
    }
}

impl Transport for RecordingTransport {
    fn post(&self, message: Value) -> Result<(), PortError> {
        match self.recorder.lock() {
            Ok(mut guard) => guard.record(self.direction, message.clone()),
            Err(_) => tracing::warn!("transcript recorder poisoned, frame not recorded"),
        }
        self.inner.post(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{self, HostMessage, WebviewMessage};

    #[tokio::test]
    async fn records_both_directions_in_post_order() {
        let recorder = Arc::new(Mutex::new(TranscriptRecorder::new("unused.yaml", "t", "doc.md")));
        let (host, mut webview) = bus::pair_with(|transport, direction| {
            Box::new(RecordingTransport::new(transport, direction, Arc::clone(&recorder)))
        });
        webview.outbox.post(&WebviewMessage::Refresh).unwrap();
        host.outbox.post(&HostMessage::SetTheme(false)).unwrap();

        assert_eq!(webview.inbox.recv().await, Some(HostMessage::SetTheme(false)));
        let transcript = recorder.lock().unwrap().snapshot();
        assert_eq!(transcript.frames.len(), 2);
        assert_eq!(transcript.frames[0].direction, Direction::ToHost);
        assert_eq!(transcript.frames[0].message["type"], "refresh");
        assert_eq!(transcript.frames[1].direction, Direction::ToWebview);
        let theme = serde_json::json!({"type": "setTheme", "data": false});
        assert_eq!(transcript.frames[1].message, theme);
    }
}
