use crate::media::MediaConstraints;
use crate::negotiator::DEFAULT_GATHER_TIMEOUT;
use linkmeet_core::{IceServerConfig, RoomId};
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:3000/ws";

/// What a participant needs to join a room.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub email: String,
    pub room: RoomId,
    /// Overrides the ICE servers announced by the relay when non-empty.
    pub ice_servers: Vec<IceServerConfig>,
    pub gather_timeout: Duration,
    pub constraints: MediaConstraints,
}

impl ClientConfig {
    pub fn new(email: impl Into<String>, room: impl Into<RoomId>) -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            email: email.into(),
            room: room.into(),
            ice_servers: Vec::new(),
            gather_timeout: DEFAULT_GATHER_TIMEOUT,
            constraints: MediaConstraints::default(),
        }
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// ICE servers to use, falling back to the relay's list.
    pub fn effective_ice_servers(&self, announced: Vec<IceServerConfig>) -> Vec<IceServerConfig> {
        if self.ice_servers.is_empty() {
            announced
        } else {
            self.ice_servers.clone()
        }
    }
}
