use crate::room::{JoinOutcome, RoomManager};
use crate::signaling::SignalingOutput;
use linkmeet_core::{ClientMessage, ConnectionId, Participant, ParticipantMeta, RoomId, ServerMessage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pairs connections into rooms and forwards peer-addressed events without
/// looking at their payload.
#[derive(Clone)]
pub struct Relay {
    rooms: RoomManager,
    output: Arc<dyn SignalingOutput>,
}

impl Relay {
    pub fn new(rooms: RoomManager, output: Arc<dyn SignalingOutput>) -> Self {
        Self { rooms, output }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    /// Entry point for every parsed frame from `from`.
    pub async fn handle(&self, from: ConnectionId, msg: ClientMessage) {
        debug!("<- {} '{}'", from, msg.event_name());

        match msg {
            ClientMessage::RoomJoin { email, room } => {
                self.join(from, room, ParticipantMeta { email }).await;
            }
            other => {
                if let Some((to, routed)) = other.route(from) {
                    self.relay(to, routed).await;
                }
            }
        }
    }

    pub async fn join(&self, from: ConnectionId, room: RoomId, meta: ParticipantMeta) {
        if let Some(current) = self.rooms.room_of(&from) {
            if current != room {
                info!("Connection {} moves from room '{}' to '{}'", from, current, room);
                self.leave_room(&from).await;
            }
        }

        let participant = Participant { id: from, meta };
        let email = participant.meta.email.clone();

        match self.rooms.join(&room, participant) {
            JoinOutcome::Admitted { others } => {
                info!("{} ({}) joined room '{}'", email, from, room);
                for other in others {
                    self.output
                        .send_signal(
                            other.id,
                            ServerMessage::UserJoined {
                                email: email.clone(),
                                id: from,
                            },
                        )
                        .await;
                }
                self.output
                    .send_signal(from, ServerMessage::RoomJoined { room })
                    .await;
            }
            JoinOutcome::AlreadyPresent => {
                debug!("{} re-joined room '{}'", from, room);
                self.output
                    .send_signal(from, ServerMessage::RoomJoined { room })
                    .await;
            }
            JoinOutcome::Full => {
                warn!("Room '{}' is full, turning away {} ({})", room, email, from);
                self.output
                    .send_signal(from, ServerMessage::RoomFull { room })
                    .await;
            }
        }
    }

    pub async fn relay(&self, to: ConnectionId, msg: ServerMessage) {
        self.output.send_signal(to, msg).await;
    }

    /// Forgets the connection and tells whoever is left in its room.
    pub async fn disconnect(&self, id: &ConnectionId) {
        self.leave_room(id).await;
    }

    async fn leave_room(&self, id: &ConnectionId) {
        let Some(outcome) = self.rooms.leave(id) else {
            return;
        };

        info!("{} left room '{}'", id, outcome.room);

        for other in outcome.remaining {
            self.output
                .send_signal(other.id, ServerMessage::UserLeft { id: *id })
                .await;
        }
    }
}
