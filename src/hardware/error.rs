//! Communication error types and handling

/// Communication error types for the serial link
#[derive(Debug, thiserror::Error)]
pub enum CommError {
    /// The port could not be opened
    #[error("Failed to open port {port}: {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: std::io::Error,
    },
    /// Writing or flushing a command failed
    #[error("Failed to write command [{command}]: {source}")]
    WriteFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// Reading from the receive buffer failed
    #[error("Failed to read from port: {source}")]
    ReadFailed {
        #[source]
        source: std::io::Error,
    },
    /// An I/O operation needed an open port
    #[error("Port {port} is not open")]
    NotOpen { port: String },
    /// Link settings are unusable
    #[error("Configuration error: invalid {parameter} = {value}")]
    ConfigurationError { parameter: String, value: String },
}

/// Result type for communication operations
pub type CommResult<T> = Result<T, CommError>;
