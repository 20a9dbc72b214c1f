//! Sentence Error Types

use thiserror::Error;

/// Reasons a framed sentence was not applied
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SentenceError {
    /// Sentence does not start with `$`
    #[error("Sentence does not start with '$'")]
    MissingStart,

    /// No `*HH` checksum suffix
    #[error("Sentence has no checksum")]
    MissingChecksum,

    /// Checksum mismatch
    #[error("Checksum mismatch: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Sentence body is not ASCII text
    #[error("Sentence is not valid ASCII")]
    InvalidEncoding,

    /// Sentence type this decoder does not handle
    #[error("Unsupported sentence type: {0}")]
    Unsupported(String),

    /// Field present but unparsable
    #[error("Invalid {field} field: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
