//! Hardware abstraction layer for the serial link
//!
//! The board is reached through a [`SerialTransport`]; the real port and a
//! scripted mock share the same interface so the protocol layer above can be
//! exercised without a robot attached.

pub mod transport;
pub mod serial;
pub mod mock;
pub mod error;

pub use transport::{SerialTransport, TransportConfig};
pub use serial::SerialPortTransport;
pub use mock::MockTransport;
pub use error::{CommError, CommResult};
