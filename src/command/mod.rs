//! Command queue model

pub mod queue;
pub mod error;

pub use queue::{CommandQueue, DurationInput, COMMAND_PACK_KEY};
pub use error::{EntryRejection, QueueError};
