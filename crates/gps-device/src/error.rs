//! GPS Device Error Types

use thiserror::Error;

/// Errors that can occur while connecting to or running the receiver
#[derive(Debug, Error)]
pub enum GpsError {
    /// Serial device could not be opened
    #[error("Failed to open serial port {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Baud rate has no termios equivalent
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// Line settings could not be applied
    #[error("Serial configuration failed: {0}")]
    Configure(String),

    /// Serial port I/O error
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Configuration value out of range
    #[error("Invalid device configuration: {0}")]
    InvalidConfig(String),

    /// Reader thread could not be created
    #[error("Failed to spawn serial reader: {0}")]
    Spawn(String),
}

impl From<std::io::Error> for GpsError {
    fn from(err: std::io::Error) -> Self {
        GpsError::SerialError(err.to_string())
    }
}
