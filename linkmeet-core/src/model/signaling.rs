use crate::model::connection::ConnectionId;
use crate::model::description::SessionDescription;
use crate::model::ice::IceServerConfig;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

/// Events a participant sends to the relay.
///
/// Every frame on the wire is `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "room:join")]
    RoomJoin { email: String, room: RoomId },

    #[serde(rename = "user:call")]
    UserCall {
        to: ConnectionId,
        offer: SessionDescription,
    },

    #[serde(rename = "call:accepted")]
    CallAccepted {
        to: ConnectionId,
        ans: SessionDescription,
    },

    #[serde(rename = "peer:nego:needed")]
    NegotiationNeeded {
        to: ConnectionId,
        offer: SessionDescription,
    },

    #[serde(rename = "peer:nego:done")]
    NegotiationDone {
        to: ConnectionId,
        ans: SessionDescription,
    },

    #[serde(rename = "user:video-toggle")]
    VideoToggle {
        to: ConnectionId,
        #[serde(rename = "isOn")]
        is_on: bool,
    },
}

/// Events the relay delivers to a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "connection:welcome")]
    Welcome {
        id: ConnectionId,
        #[serde(rename = "iceServers", default)]
        ice_servers: Vec<IceServerConfig>,
    },

    /// Join acknowledgment.
    #[serde(rename = "room:join")]
    RoomJoined { room: RoomId },

    #[serde(rename = "room:full")]
    RoomFull { room: RoomId },

    #[serde(rename = "user:joined")]
    UserJoined { email: String, id: ConnectionId },

    #[serde(rename = "user:left")]
    UserLeft { id: ConnectionId },

    #[serde(rename = "incoming:call", alias = "incomming:call")]
    IncomingCall {
        from: ConnectionId,
        offer: SessionDescription,
    },

    #[serde(rename = "call:accepted")]
    CallAccepted {
        from: ConnectionId,
        ans: SessionDescription,
    },

    #[serde(rename = "peer:nego:needed")]
    NegotiationNeeded {
        from: ConnectionId,
        offer: SessionDescription,
    },

    #[serde(rename = "peer:nego:final")]
    NegotiationFinal {
        from: ConnectionId,
        ans: SessionDescription,
    },

    #[serde(rename = "peer:video-toggle")]
    VideoToggle {
        from: ConnectionId,
        #[serde(rename = "isOn")]
        is_on: bool,
    },
}

impl ClientMessage {
    /// Maps a peer-addressed message to its target and the event that target receives.
    ///
    /// The payload is passed through untouched; only the addressing is rewritten.
    /// `room:join` is addressed to the relay itself and yields `None`.
    pub fn route(self, from: ConnectionId) -> Option<(ConnectionId, ServerMessage)> {
        let routed = match self {
            ClientMessage::RoomJoin { .. } => return None,
            ClientMessage::UserCall { to, offer } => (to, ServerMessage::IncomingCall { from, offer }),
            ClientMessage::CallAccepted { to, ans } => (to, ServerMessage::CallAccepted { from, ans }),
            ClientMessage::NegotiationNeeded { to, offer } => {
                (to, ServerMessage::NegotiationNeeded { from, offer })
            }
            ClientMessage::NegotiationDone { to, ans } => {
                (to, ServerMessage::NegotiationFinal { from, ans })
            }
            ClientMessage::VideoToggle { to, is_on } => {
                (to, ServerMessage::VideoToggle { from, is_on })
            }
        };
        Some(routed)
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::RoomJoin { .. } => "room:join",
            ClientMessage::UserCall { .. } => "user:call",
            ClientMessage::CallAccepted { .. } => "call:accepted",
            ClientMessage::NegotiationNeeded { .. } => "peer:nego:needed",
            ClientMessage::NegotiationDone { .. } => "peer:nego:done",
            ClientMessage::VideoToggle { .. } => "user:video-toggle",
        }
    }
}

impl ServerMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "connection:welcome",
            ServerMessage::RoomJoined { .. } => "room:join",
            ServerMessage::RoomFull { .. } => "room:full",
            ServerMessage::UserJoined { .. } => "user:joined",
            ServerMessage::UserLeft { .. } => "user:left",
            ServerMessage::IncomingCall { .. } => "incoming:call",
            ServerMessage::CallAccepted { .. } => "call:accepted",
            ServerMessage::NegotiationNeeded { .. } => "peer:nego:needed",
            ServerMessage::NegotiationFinal { .. } => "peer:nego:final",
            ServerMessage::VideoToggle { .. } => "peer:video-toggle",
        }
    }
}
