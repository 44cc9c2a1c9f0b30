mod config;
mod launch;
mod media;
mod negotiator;
mod session;
mod signaling;

pub use config::*;
pub use launch::*;
pub use media::*;
pub use negotiator::*;
pub use session::*;
pub use signaling::*;
