use anyhow::Result;
use linkmeet_client::{EndReason, SessionController, UserCommand};
use linkmeet_core::{ConnectionId, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{MockDevices, MockNegotiator, RecordingSink};

#[tokio::test]
async fn test_controller_run_loop() -> Result<()> {
    init_tracing();

    let (negotiator, events) = MockNegotiator::new("alice");
    let sink = RecordingSink::new();
    let devices = MockDevices::new("alice");
    let (controller, _updates) = SessionController::new(
        ConnectionId::new(),
        Box::new(negotiator.clone()),
        Arc::new(sink.clone()),
        Arc::new(devices.clone()),
    );

    let (inbound_tx, inbound) = mpsc::unbounded_channel();
    let (commands_tx, commands) = mpsc::channel(8);
    let task = tokio::spawn(controller.run(inbound, events, commands));

    inbound_tx.send(ServerMessage::UserJoined {
        email: "bob@example.com".into(),
        id: ConnectionId::new(),
    })?;
    commands_tx.send(UserCommand::StartCall).await?;

    sink.wait_for_event("user:call", Duration::from_secs(2)).await?;

    // Losing the relay ends the session.
    drop(inbound_tx);
    let reason = tokio::time::timeout(Duration::from_secs(2), task).await??;

    assert_eq!(reason, EndReason::TransportClosed);
    assert_eq!(devices.stops(), 1);

    Ok(())
}
