//! Error types for index-entry sealing and key parsing.

use core::fmt;

/// Opening an index entry failed.
///
/// Wrong key, wrong label, truncation and tampering all collapse into this
/// one value so callers cannot tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenError;

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index entry could not be opened")
    }
}

impl std::error::Error for OpenError {}

/// Sealing an index entry failed (RNG or cipher setup).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealError;

impl fmt::Display for SealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index entry could not be sealed")
    }
}

impl std::error::Error for SealError {}

/// A key or label supplied as hex text was malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    InvalidHex(String),
    WrongLength { expected: usize, got: usize },
}

impl fmt::Display for KeyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHex(msg) => write!(f, "invalid hex: {}", msg),
            Self::WrongLength { expected, got } => {
                write!(f, "expected {} bytes, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for KeyParseError {}

impl From<hex::FromHexError> for KeyParseError {
    fn from(e: hex::FromHexError) -> Self {
        Self::InvalidHex(e.to_string())
    }
}
