#![doc = "Heartbeat monitor that detects stalled simulation targets."]

pub mod clock;
pub mod monitor;
pub mod record;
pub mod source;

pub use clock::*;
pub use monitor::*;
pub use record::*;
pub use source::*;
