use crate::signaling::signal_sink::SignalSink;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use linkmeet_core::{ClientMessage, ConnectionId, IceServerConfig, ServerMessage};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// How long the relay gets to greet a fresh connection.
pub const WELCOME_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum SignalingError {
    #[error("failed to connect to relay: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("relay closed the connection before greeting")]
    Closed,

    #[error("relay did not greet within {0:?}")]
    NoWelcome(Duration),

    #[error("expected connection:welcome, got {0}")]
    UnexpectedGreeting(&'static str),
}

/// Cloneable handle that queues frames for the socket writer task.
#[derive(Clone)]
pub struct WsSignaling {
    tx: mpsc::UnboundedSender<Message>,
}

/// A greeted relay connection.
pub struct SignalingConnection {
    pub sink: WsSignaling,
    /// Relay frames after the welcome. Closes when the socket does.
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
    pub id: ConnectionId,
    pub ice_servers: Vec<IceServerConfig>,
}

impl WsSignaling {
    pub async fn connect(url: &str) -> Result<SignalingConnection, SignalingError> {
        info!("Connecting to relay at {}", url);
        let (ws, _) = connect_async(url).await?;
        let (mut ws_sender, mut ws_receiver) = ws.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, mut in_rx) = mpsc::unbounded_channel::<ServerMessage>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if ws_sender.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = ws_sender.close().await;
            debug!("Signaling writer stopped");
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = ws_receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(server_msg) => {
                            if in_tx.send(server_msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping unparseable relay frame: {}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Relay connection closed");
        });

        let greeting = tokio::time::timeout(WELCOME_TIMEOUT, in_rx.recv())
            .await
            .map_err(|_| SignalingError::NoWelcome(WELCOME_TIMEOUT))?;

        match greeting {
            Some(ServerMessage::Welcome { id, ice_servers }) => {
                info!("Relay assigned connection id {}", id);
                Ok(SignalingConnection {
                    sink: WsSignaling { tx: out_tx },
                    inbound: in_rx,
                    id,
                    ice_servers,
                })
            }
            Some(other) => Err(SignalingError::UnexpectedGreeting(other.event_name())),
            None => Err(SignalingError::Closed),
        }
    }
}

#[async_trait]
impl SignalSink for WsSignaling {
    async fn send(&self, msg: ClientMessage) {
        let event = msg.event_name();
        match serde_json::to_string(&msg) {
            Ok(json) => {
                if self.tx.send(Message::Text(json.into())).is_err() {
                    warn!("Signaling socket gone, dropping {}", event);
                }
            }
            Err(e) => warn!("Failed to encode {}: {}", event, e),
        }
    }
}
