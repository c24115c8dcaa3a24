//! Data models

pub mod threat;
pub mod stats;
pub mod honeypot;
pub mod user;
pub mod progress;

pub use threat::*;
pub use stats::*;
pub use honeypot::*;
pub use user::*;
pub use progress::*;
