mod headless;
mod media_devices;
mod media_guard;

pub use headless::*;
pub use media_devices::*;
pub use media_guard::*;
