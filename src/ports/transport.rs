//! Transport port carrying serialized bus messages to the other side.

use serde_json::Value;

use crate::error::PortError;

/// One direction of the webview messaging channel.
///
/// Messages are already serialized; a transport only moves JSON values and
/// never interprets them.
pub trait Transport: Send + Sync {
    /// Posts one message. Delivery is FIFO and unacknowledged.
    ///
    /// # Errors
    ///
    /// Returns an error if the receiving side has gone away.
    fn post(&self, message: Value) -> Result<(), PortError>;
}
