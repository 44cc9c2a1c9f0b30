use async_trait::async_trait;
use linkmeet_core::{ConnectionId, ServerMessage};

/// Outbound side of the relay: something that can deliver an event to one connection.
///
/// Delivery is fire-and-forget. A missing target is logged by the implementor
/// and never reported back to whoever caused the send.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(&self, to: ConnectionId, msg: ServerMessage);
}
