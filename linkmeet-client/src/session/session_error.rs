use crate::media::MediaError;
use crate::negotiator::NegotiatorError;
use crate::session::negotiation_state::NegotiationState;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session has ended")]
    Ended,

    #[error("no peer in the room")]
    NoPeer,

    #[error("no local media acquired")]
    NoLocalMedia,

    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: NegotiationState,
    },

    #[error("media unavailable: {0}")]
    Media(#[from] MediaError),

    #[error("negotiation failed: {0}")]
    Negotiator(#[from] NegotiatorError),
}
