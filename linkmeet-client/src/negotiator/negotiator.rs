use crate::media::LocalTrack;
use async_trait::async_trait;
use linkmeet_core::{SdpType, SessionDescription};

#[derive(Debug, thiserror::Error)]
pub enum NegotiatorError {
    #[error("WebRTC error: {0}")]
    Rtc(#[from] webrtc::Error),

    #[error("expected {expected:?} description, got {got:?}")]
    UnexpectedDescription { expected: SdpType, got: SdpType },

    #[error("no local description after negotiation")]
    MissingLocalDescription,

    #[error("negotiator already closed")]
    Closed,

    #[error("negotiation failed: {0}")]
    Backend(String),
}

/// The offer/answer engine behind a session.
///
/// Implementations report spontaneous events (renegotiation requests, remote
/// tracks, connection loss) through the channel they were built with.
#[async_trait]
pub trait Negotiator: Send {
    /// Creates an offer and installs it as the local description.
    async fn produce_offer(&mut self) -> Result<SessionDescription, NegotiatorError>;

    /// Applies a remote offer and returns the local answer to it.
    async fn produce_answer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiatorError>;

    async fn apply_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiatorError>;

    async fn attach_local_track(&mut self, track: &LocalTrack) -> Result<(), NegotiatorError>;

    /// Discards the local offer that is still waiting for an answer.
    async fn rollback(&mut self) -> Result<(), NegotiatorError>;

    async fn close(&mut self) -> Result<(), NegotiatorError>;
}
