use crate::media::LocalTrack;
use crate::negotiator::{NegotiatorEvent, RemoteTrackInfo};
use linkmeet_core::{ConnectionId, RoomId, ServerMessage};

/// Everything that can drive a [`crate::SessionController`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Signal(ServerMessage),
    Negotiator(NegotiatorEvent),
    Command(UserCommand),
    TransportClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    StartCall,
    SendStreams,
    ToggleAudio,
    ToggleVideo,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    LocalLeave,
    PeerLeft,
    TransportClosed,
    ConnectionLost,
}

/// What the UI layer gets told.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Welcome { id: ConnectionId },
    RoomJoined { room: RoomId },
    RoomFull { room: RoomId },
    PeerJoined { id: ConnectionId, email: String },
    LocalMediaReady { tracks: Vec<LocalTrack> },
    MediaUnavailable { reason: String },
    /// `initiated` is set on the side whose call offer was answered.
    CallEstablished { peer: ConnectionId, initiated: bool },
    RemoteTrack(RemoteTrackInfo),
    LocalAudio(bool),
    LocalVideo(bool),
    RemoteVideo(bool),
    Ended(EndReason),
}
