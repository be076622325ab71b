//! The typed message bus between the host controller and the webview.
//!
//! Each direction is a FIFO of JSON values. Senders serialize through an
//! [`Outbox`] into a [`Transport`]; receivers decode in an [`Inbox`], which
//! drops messages whose `type` it does not know.

pub mod message;

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::adapters::live::transport::ChannelTransport;
use crate::error::BusError;
use crate::ports::Transport;

pub use message::{CursorRequest, HostMessage, SvgDownload, TreeData, WebviewMessage};

/// Which way a message travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Host controller to webview renderer.
    ToWebview,
    /// Webview renderer to host controller.
    ToHost,
}

/// Sending half, typed by the messages it accepts.
pub struct Outbox<M> {
    transport: Box<dyn Transport>,
    _message: PhantomData<fn(M)>,
}

impl<M: Serialize> Outbox<M> {
    /// Wraps a transport.
    #[must_use]
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport, _message: PhantomData }
    }

    /// Serializes and posts `message`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Closed`] if the other side is gone.
    pub fn post(&self, message: &M) -> Result<(), BusError> {
        let value = serde_json::to_value(message)?;
        self.transport.post(value).map_err(|_| BusError::Closed)
    }
}

/// Receiving half, typed by the messages it understands.
pub struct Inbox<M> {
    rx: mpsc::UnboundedReceiver<Value>,
    _message: PhantomData<fn() -> M>,
}

impl<M: DeserializeOwned> Inbox<M> {
    /// Wraps the receiving end of a channel.
    #[must_use]
    pub fn new(rx: mpsc::UnboundedReceiver<Value>) -> Self {
        Self { rx, _message: PhantomData }
    }

    /// Waits for the next understood message; `None` once the sender is gone.
    pub async fn recv(&mut self) -> Option<M> {
        loop {
            let value = self.rx.recv().await?;
            if let Some(message) = decode(value) {
                return Some(message);
            }
        }
    }

    /// Returns the next understood message already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<M> {
        while let Ok(value) = self.rx.try_recv() {
            if let Some(message) = decode(value) {
                return Some(message);
            }
        }
        None
    }

    /// Drains every understood message already queued.
    pub fn drain(&mut self) -> Vec<M> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Decodes a wire value, ignoring unknown or malformed messages.
pub fn decode<M: DeserializeOwned>(value: Value) -> Option<M> {
    let kind = value.get("type").and_then(Value::as_str).unwrap_or_default().to_owned();
    match serde_json::from_value(value) {
        Ok(message) => Some(message),
        Err(err) => {
            tracing::debug!(kind = %kind, "ignoring message: {err}");
            None
        }
    }
}

/// One side's view of the bus.
pub struct Endpoint<Out, In> {
    /// Messages this side sends.
    pub outbox: Outbox<Out>,
    /// Messages this side receives.
    pub inbox: Inbox<In>,
}

/// Host side of a panel's bus.
pub type HostEndpoint = Endpoint<HostMessage, WebviewMessage>;

/// Webview side of a panel's bus.
pub type WebviewEndpoint = Endpoint<WebviewMessage, HostMessage>;

/// Creates a connected pair of endpoints.
#[must_use]
pub fn pair() -> (HostEndpoint, WebviewEndpoint) {
    pair_with(|transport, _| transport)
}

/// Creates a connected pair, letting `wrap` decorate each direction's
/// transport (for example to record it).
pub fn pair_with(
    mut wrap: impl FnMut(Box<dyn Transport>, Direction) -> Box<dyn Transport>,
) -> (HostEndpoint, WebviewEndpoint) {
    let (to_webview, webview_rx) = ChannelTransport::channel();
    let (to_host, host_rx) = ChannelTransport::channel();
    let host = Endpoint {
        outbox: Outbox::new(wrap(Box::new(to_webview), Direction::ToWebview)),
        inbox: Inbox::new(host_rx),
    };
    let webview = Endpoint {
        outbox: Outbox::new(wrap(Box::new(to_host), Direction::ToHost)),
        inbox: Inbox::new(webview_rx),
    };
    (host, webview)
}
