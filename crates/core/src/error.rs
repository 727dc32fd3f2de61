//! Error types for the core crate.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Claim bytes are malformed or truncated.
    #[error("Invalid claim encoding: {0}")]
    InvalidEncoding(String),

    /// The claim-type discriminant is not part of the kind table.
    #[error("Unknown claim type: 0x{0}")]
    UnknownClaimType(String),

    /// The encoded index length does not match the claim kind.
    #[error("Index length mismatch: expected {expected}, found {found}")]
    IndexLengthMismatch {
        /// Index length fixed by the kind.
        expected: u32,
        /// Index length found in the header.
        found: u32,
    },

    /// Invalid hex encoding.
    #[error("Invalid hex encoding")]
    InvalidHex,
}

/// Result type alias for CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
