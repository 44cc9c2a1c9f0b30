use crate::config::ClientConfig;
use crate::media::MediaDevices;
use crate::negotiator::{NegotiatorError, RtcNegotiator};
use crate::session::{EndReason, SessionController, SessionUpdate, UserCommand};
use crate::signaling::{SignalSink, SignalingError, WsSignaling};
use linkmeet_core::{ClientMessage, ConnectionId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Negotiator(#[from] NegotiatorError),
}

/// A running session: feed it commands, watch its updates.
pub struct SessionHandle {
    pub id: ConnectionId,
    pub commands: mpsc::Sender<UserCommand>,
    pub updates: mpsc::UnboundedReceiver<SessionUpdate>,
    pub task: JoinHandle<EndReason>,
}

/// Connects to the relay, joins the configured room and spawns the controller.
pub async fn launch(
    config: ClientConfig,
    devices: Arc<dyn MediaDevices>,
) -> Result<SessionHandle, LaunchError> {
    let connection = WsSignaling::connect(&config.server_url).await?;
    let ice_servers = config.effective_ice_servers(connection.ice_servers);

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let negotiator = RtcNegotiator::new(&ice_servers, config.gather_timeout, event_tx).await?;

    let sink: Arc<dyn SignalSink> = Arc::new(connection.sink);
    let (controller, updates) =
        SessionController::new(connection.id, Box::new(negotiator), sink.clone(), devices);
    let controller = controller.with_constraints(config.constraints);

    info!("Joining room '{}' as {}", config.room, config.email);
    sink.send(ClientMessage::RoomJoin {
        email: config.email,
        room: config.room,
    })
    .await;

    let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(controller.run(connection.inbound, event_rx, command_rx));

    Ok(SessionHandle {
        id: connection.id,
        commands,
        updates,
        task,
    })
}
