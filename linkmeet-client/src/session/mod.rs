mod negotiation_state;
mod session_controller;
mod session_error;
mod session_event;

pub use negotiation_state::*;
pub use session_controller::*;
pub use session_error::*;
pub use session_event::*;
