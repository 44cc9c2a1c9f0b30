use crate::room::membership::JoinOutcome;
use linkmeet_core::{ConnectionId, Participant, RoomId};

/// A room is a two-party meeting point.
pub const ROOM_CAPACITY: usize = 2;

/// Occupants of one room, in join order.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    occupants: Vec<Participant>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            occupants: Vec::with_capacity(ROOM_CAPACITY),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn admit(&mut self, participant: Participant) -> JoinOutcome {
        if self.contains(&participant.id) {
            return JoinOutcome::AlreadyPresent;
        }
        if self.occupants.len() >= ROOM_CAPACITY {
            return JoinOutcome::Full;
        }

        let others = self.occupants.clone();
        self.occupants.push(participant);
        JoinOutcome::Admitted { others }
    }

    /// Removes the occupant, returning whether it was present.
    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|p| &p.id != id);
        before != self.occupants.len()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.occupants.iter().any(|p| &p.id == id)
    }

    pub fn occupants(&self) -> &[Participant] {
        &self.occupants
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }
}
