use async_trait::async_trait;
use linkmeet_core::ClientMessage;

/// Outbound half of the signaling channel as seen by a session.
///
/// Delivery is fire-and-forget; a lost transport surfaces on the inbound side.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, msg: ClientMessage);
}
