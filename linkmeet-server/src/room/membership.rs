use linkmeet_core::{Participant, RoomId};

/// Result of a join attempt, decided under the room's lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Newly admitted. `others` are the occupants that were already present.
    Admitted { others: Vec<Participant> },

    /// The connection was already an occupant of this room.
    AlreadyPresent,

    /// The room holds its maximum number of occupants.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub room: RoomId,
    pub remaining: Vec<Participant>,
}
