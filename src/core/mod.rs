//! Core types and constants for the Petoi serial link

pub mod types;
pub mod constants;
pub mod timing;

pub use types::*;
pub use constants::*;
pub use timing::{Sleeper, ThreadSleeper, RecordingSleeper};
