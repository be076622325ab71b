//! In-process transport backed by a tokio channel.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::PortError;
use crate::ports::Transport;

/// Transport that delivers messages into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Value>,
}

impl ChannelTransport {
    /// Creates a transport and the receiver it feeds.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn post(&self, message: Value) -> Result<(), PortError> {
        self.tx.send(message).map_err(|_| "webview channel closed".into())
    }
}
