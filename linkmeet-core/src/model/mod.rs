mod connection;
mod description;
mod ice;
mod participant;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use description::{SdpType, SessionDescription};
pub use ice::IceServerConfig;
pub use participant::{Participant, ParticipantMeta};
pub use room::RoomId;
pub use signaling::{ClientMessage, ServerMessage};
