mod negotiator;
mod negotiator_event;
mod rtc_negotiator;

pub use negotiator::*;
pub use negotiator_event::*;
pub use rtc_negotiator::*;
