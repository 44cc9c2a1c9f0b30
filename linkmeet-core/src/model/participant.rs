use crate::model::connection::ConnectionId;
use serde::{Deserialize, Serialize};

/// Application-supplied display data sent along with `room:join`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantMeta {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ConnectionId,
    pub meta: ParticipantMeta,
}

impl Participant {
    pub fn new(id: ConnectionId, email: impl Into<String>) -> Self {
        Self {
            id,
            meta: ParticipantMeta {
                email: email.into(),
            },
        }
    }
}
