use linkmeet_core::{ClientMessage, ConnectionId, SessionDescription};

use crate::integration::{create_test_relay, init_tracing};

#[tokio::test]
async fn test_missing_target_is_silent() {
    init_tracing();

    let (relay, signaling) = create_test_relay();
    let sender = ConnectionId::new();
    let vanished = ConnectionId::new();
    signaling.mark_gone(vanished).await;

    relay
        .handle(
            sender,
            ClientMessage::UserCall {
                to: vanished,
                offer: SessionDescription::offer("v=0"),
            },
        )
        .await;

    // Nothing reaches the target and the sender hears nothing back.
    assert!(signaling.deliveries().await.is_empty());
}
