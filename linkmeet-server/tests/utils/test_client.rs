use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use linkmeet_core::{ClientMessage, ConnectionId, ServerMessage};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single expected signaling frame (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// How long to wait before concluding that nothing else is coming (ms).
pub const QUIET_PERIOD_MS: u64 = 200;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Raw WebSocket participant speaking the JSON signaling vocabulary.
pub struct TestClient {
    pub id: ConnectionId,
    ws: WsStream,
}

impl TestClient {
    /// Connects and consumes the `connection:welcome` frame.
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url)
            .await
            .context("Failed to connect to relay")?;

        let mut client = Self {
            id: ConnectionId::new(),
            ws,
        };

        match client.recv().await? {
            ServerMessage::Welcome { id, .. } => client.id = id,
            other => anyhow::bail!("Expected welcome, got {:?}", other),
        }

        Ok(client)
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.ws
            .send(Message::Text(json.into()))
            .await
            .context("Failed to send frame")?;
        Ok(())
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .context("Failed to send raw frame")?;
        Ok(())
    }

    pub async fn join(&mut self, email: &str, room: &str) -> Result<()> {
        self.send(&ClientMessage::RoomJoin {
            email: email.to_owned(),
            room: room.into(),
        })
        .await
    }

    /// Waits for the next signaling frame.
    pub async fn recv(&mut self) -> Result<ServerMessage> {
        self.recv_within(SIGNAL_TIMEOUT_MS)
            .await?
            .context("Timeout waiting for signaling frame")
    }

    /// Returns `None` if no frame arrives within `timeout_ms`.
    pub async fn recv_within(&mut self, timeout_ms: u64) -> Result<Option<ServerMessage>> {
        loop {
            let next = tokio::time::timeout(Duration::from_millis(timeout_ms), self.ws.next()).await;

            let frame = match next {
                Err(_) => return Ok(None),
                Ok(None) => anyhow::bail!("Relay closed the connection"),
                Ok(Some(frame)) => frame.context("WebSocket error")?,
            };

            if let Message::Text(text) = frame {
                let msg = serde_json::from_str(&text).context("Unparseable frame from relay")?;
                return Ok(Some(msg));
            }
        }
    }

    /// Asserts that nothing arrives for a short while.
    pub async fn expect_silence(&mut self) -> Result<()> {
        match self.recv_within(QUIET_PERIOD_MS).await? {
            None => Ok(()),
            Some(msg) => anyhow::bail!("Expected silence, got {:?}", msg),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close")?;
        Ok(())
    }
}
