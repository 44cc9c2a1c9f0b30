use crate::media::TrackKind;

/// Remote media that arrived on the peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub track_id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

/// Events the negotiation engine raises on its own, outside of any call the
/// controller makes into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiatorEvent {
    /// The local track set changed after the connection was established.
    NegotiationNeeded,
    RemoteTrack(RemoteTrackInfo),
    /// The underlying transport failed or closed.
    ConnectionLost,
}
