use crate::room::membership::{JoinOutcome, LeaveOutcome};
use crate::room::room::Room;
use dashmap::DashMap;
use linkmeet_core::{ConnectionId, Participant, RoomId};
use std::sync::Arc;
use tracing::{debug, info};

/// Room registry shared by every connection task.
///
/// Each join or leave mutates one room while holding that room's shard lock,
/// so rooms never observe more than [`crate::ROOM_CAPACITY`] occupants and
/// operations on unrelated rooms do not contend.
#[derive(Clone, Default)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, Room>>,
    memberships: Arc<DashMap<ConnectionId, RoomId>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room_id: &RoomId, participant: Participant) -> JoinOutcome {
        let id = participant.id;

        let outcome = {
            let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                Room::new(room_id.clone())
            });
            room.admit(participant)
        };

        if let JoinOutcome::Admitted { .. } = outcome {
            self.memberships.insert(id, room_id.clone());
        }

        outcome
    }

    /// Removes the connection from whatever room it occupies.
    pub fn leave(&self, id: &ConnectionId) -> Option<LeaveOutcome> {
        let (_, room_id) = self.memberships.remove(id)?;

        let remaining = match self.rooms.get_mut(&room_id) {
            Some(mut room) => {
                room.remove(id);
                room.occupants().to_vec()
            }
            None => Vec::new(),
        };

        if self.rooms.remove_if(&room_id, |_, room| room.is_empty()).is_some() {
            debug!("Dropped empty room: {}", room_id);
        }

        Some(LeaveOutcome {
            room: room_id,
            remaining,
        })
    }

    pub fn room_of(&self, id: &ConnectionId) -> Option<RoomId> {
        self.memberships.get(id).map(|entry| entry.value().clone())
    }

    pub fn occupants(&self, room_id: &RoomId) -> Vec<Participant> {
        self.rooms
            .get(room_id)
            .map(|room| room.occupants().to_vec())
            .unwrap_or_default()
    }

    pub fn occupancy(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map(|room| room.len()).unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
