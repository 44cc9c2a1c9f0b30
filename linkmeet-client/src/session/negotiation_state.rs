use linkmeet_core::ConnectionId;

/// Local view of the offer/answer exchange with the current peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegotiationState {
    #[default]
    Idle,
    OfferSent,
    AnswerPending,
    Stable,
}

impl NegotiationState {
    /// States in which a new local offer may be issued.
    pub fn can_offer(self) -> bool {
        matches!(self, NegotiationState::Idle | NegotiationState::Stable)
    }
}

/// Which half of the vocabulary an offer travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationKind {
    /// `user:call` / `call:accepted`
    Call,
    /// `peer:nego:needed` / `peer:nego:done`
    Renegotiation,
}

/// Glare tie-break role, fixed per pair of connection ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Yields: rolls back its own offer when offers collide.
    Polite,
    /// Keeps its offer and ignores the colliding one.
    Impolite,
}

impl Role {
    pub fn between(local: &ConnectionId, remote: &ConnectionId) -> Self {
        if local < remote {
            Role::Polite
        } else {
            Role::Impolite
        }
    }
}
