//! Error handling for the Bitcoin primitives
//!
//! Construction and parsing failures are reported through [`BtcError`]. Script
//! evaluation failures are not errors: the interpreter reports them as a plain
//! `bool` so per-input results can be aggregated without unwinding.

use std::fmt;

/// Result type alias for fallible operations in this crate
pub type Result<T> = std::result::Result<T, BtcError>;

/// Error taxonomy for the crate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BtcError {
    /// A value outside its algebraic domain: field element out of range,
    /// point off the curve, operands from different fields or curves
    Validation(String),
    /// Malformed bytes: DER, SEC, Script, transaction, varint, base58 text
    Format(String),
    /// Base58Check checksum mismatch
    Checksum { expected: Vec<u8>, actual: Vec<u8> },
    /// The previous-transaction collaborator could not deliver a transaction
    Fetch(String),
    /// File I/O errors
    Io(String),
    /// JSON/TOML serialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
}

impl fmt::Display for BtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BtcError::Validation(msg) => write!(f, "Validation error: {msg}"),
            BtcError::Format(msg) => write!(f, "Format error: {msg}"),
            BtcError::Checksum { expected, actual } => write!(
                f,
                "Checksum error: expected {}, got {}",
                data_encoding::HEXLOWER.encode(expected),
                data_encoding::HEXLOWER.encode(actual)
            ),
            BtcError::Fetch(msg) => write!(f, "Fetch error: {msg}"),
            BtcError::Io(msg) => write!(f, "I/O error: {msg}"),
            BtcError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BtcError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for BtcError {}

impl From<std::io::Error> for BtcError {
    fn from(err: std::io::Error) -> Self {
        BtcError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BtcError {
    fn from(err: serde_json::Error) -> Self {
        BtcError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BtcError {
    fn from(err: toml::de::Error) -> Self {
        BtcError::Config(err.to_string())
    }
}

impl From<data_encoding::DecodeError> for BtcError {
    fn from(err: data_encoding::DecodeError) -> Self {
        BtcError::Format(format!("Invalid hex: {err}"))
    }
}
