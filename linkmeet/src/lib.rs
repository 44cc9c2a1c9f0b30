pub use linkmeet_core::{ConnectionId, RoomId};

pub mod model {
    pub use linkmeet_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use linkmeet_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use linkmeet_client::*;
}
