#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod time;
pub mod tracker;

pub use error::Error;
pub use time::Clock;
pub use tracker::{ActivityTracker, TrackerError};
