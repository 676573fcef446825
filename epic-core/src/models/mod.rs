mod autopilot;
mod phase;
mod progress;
mod suggestion;
mod user;

pub use autopilot::*;
pub use phase::*;
pub use progress::*;
pub use suggestion::*;
pub use user::*;
