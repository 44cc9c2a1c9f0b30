use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use linkmeet_core::{ConnectionId, IceServerConfig, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

struct SignalingInner {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Table of live WebSocket connections and their outbound queues.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                ice_servers,
            }),
        }
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_peer(&self, id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(id, tx);
    }

    pub fn remove_peer(&self, id: &ConnectionId) {
        self.inner.peers.remove(id);
    }

    pub fn is_connected(&self, id: &ConnectionId) -> bool {
        self.inner.peers.contains_key(id)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.peers.len()
    }

    fn send(&self, to: ConnectionId, msg: ServerMessage) {
        let Some(peer) = self.inner.peers.get(&to) else {
            warn!(
                "Dropping '{}' for disconnected connection {}",
                msg.event_name(),
                to
            );
            return;
        };

        match serde_json::to_string(&msg) {
            Ok(json) => {
                debug!("-> {} '{}'", to, msg.event_name());
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!("Failed to queue WS message to {}: {:?}", to, e);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send_signal(&self, to: ConnectionId, msg: ServerMessage) {
        self.send(to, msg);
    }
}
