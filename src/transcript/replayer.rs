//! Replays the host side of a transcript into a fresh renderer.

use serde_json::Value;

use super::format::Transcript;
use crate::adapters::live::transport::ChannelTransport;
use crate::bus::{Direction, Inbox, Outbox, WebviewMessage};
use crate::ports::{MindmapView, Transport};
use crate::renderer::{HostClasses, Renderer};

/// Outcome of a replay.
pub struct Replay {
    /// Renderer after every frame was applied and the last render settled.
    pub renderer: Renderer,
    /// Messages the renderer sent back while replaying.
    pub emitted: Vec<WebviewMessage>,
}

/// Feeds recorded `toWebview` frames, in order, into a renderer.
pub struct TranscriptReplayer {
    frames: Vec<Value>,
}

impl TranscriptReplayer {
    /// Create a replayer from a loaded transcript.
    #[must_use]
    pub fn new(transcript: &Transcript) -> Self {
        let frames = transcript.frames_to(Direction::ToWebview).map(|frame| frame.message.clone());
        Self { frames: frames.collect() }
    }

    /// Number of frames that will be replayed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if the transcript has no host frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Runs the frames through a renderer drawing into `view`.
    ///
    /// Frames go through the same decoding as live traffic, so message types
    /// the renderer does not know are skipped.
    pub async fn replay(self, view: Box<dyn MindmapView>, host_classes: HostClasses) -> Replay {
        let (to_webview, webview_rx) = ChannelTransport::channel();
        let (to_host, host_rx) = ChannelTransport::channel();
        for frame in self.frames {
            if to_webview.post(frame).is_err() {
                break;
            }
        }
        drop(to_webview);
        let renderer = Renderer::new(view, Outbox::new(Box::new(to_host)), host_classes);
        let renderer = renderer.run(Inbox::new(webview_rx)).await;
        let emitted = Inbox::<WebviewMessage>::new(host_rx).drain();
        Replay { renderer, emitted }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::adapters::live::view::HeadlessView;
    use crate::node::NodePath;
    use crate::renderer::RenderState;
    use crate::transcript::Frame;

    fn frame(seq: u64, direction: Direction, message: Value) -> Frame {
        Frame { seq, direction, message }
    }

    #[tokio::test(start_paused = true)]
    async fn replays_host_frames_only() {
        let root = json!({
            "content": "",
            "children": [
                {"content": "A", "payload": {"tag": "h1", "lines": "0,4"},
                 "children": [{"content": "x", "payload": {"tag": "li", "lines": "2,3"}}]}
            ]
        });
        let options = json!({"duration": 500});
        let transcript = Transcript {
            name: "t".into(),
            recorded_at: Utc::now(),
            session: "doc.md".into(),
            frames: vec![
                frame(0, Direction::ToHost, json!({"type": "refresh"})),
                frame(
                    1,
                    Direction::ToWebview,
                    json!({"type": "setData", "data": {"root": root, "jsonOptions": options}}),
                ),
                frame(
                    2,
                    Direction::ToWebview,
                    json!({"type": "setCursor", "data": {"line": 2, "autoExpand": true}}),
                ),
                frame(3, Direction::ToWebview, json!({"type": "fromTheFuture"})),
                frame(4, Direction::ToWebview, json!({"type": "downloadSvg", "data": "out.svg"})),
                frame(5, Direction::ToHost, json!({"type": "setFocus", "data": 2})),
            ],
        };
        let replayer = TranscriptReplayer::new(&transcript);
        assert_eq!(replayer.len(), 4);

        let replay =
            replayer.replay(Box::new(HeadlessView::default()), HostClasses::default()).await;
        assert_eq!(replay.renderer.state(), RenderState::Ready);
        assert_eq!(replay.renderer.active().unwrap().path, NodePath(vec![0, 0]));
        assert!(matches!(
            replay.emitted.as_slice(),
            [WebviewMessage::DownloadSvg(d)] if d.path == "out.svg"
        ));
    }
}
