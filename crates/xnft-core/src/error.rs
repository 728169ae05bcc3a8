//! # Error Types
//!
//! Errors raised while constructing identifiers or encoding payloads.
//! Higher crates wrap these with `#[from]` so that the original context
//! survives up to the caller.

use thiserror::Error;

/// Errors produced when parsing or constructing core identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The value does not fit in the remote domain's field.
    #[error("value {value} is not a valid field element (must be below the field modulus)")]
    FeltOutOfRange {
        /// The rejected value, rendered in hex.
        value: String,
    },

    /// The text is not a valid local-domain address.
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The text is not a valid 256-bit integer.
    #[error("invalid integer {input:?}: {reason}")]
    InvalidInteger {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp could not be built.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Errors produced by the split/join codec and the payload layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A limb handed to `join` does not fit in 128 bits.
    #[error("{limb} limb {value} exceeds 128 bits")]
    LimbOutOfRange {
        /// Which limb ("low" or "high").
        limb: &'static str,
        /// The offending value, rendered in hex.
        value: String,
    },

    /// The payload is shorter than its fixed header.
    #[error("payload has {len} words, header needs at least {min}")]
    PayloadTooShort {
        /// Number of words received.
        len: usize,
        /// Minimum number of words.
        min: usize,
    },

    /// The length word does not match the words that follow it.
    #[error("payload length word is {declared} but {actual} limb words follow")]
    LengthMismatch {
        /// The value of the length word.
        declared: String,
        /// The number of limb words actually present.
        actual: usize,
    },

    /// A header word that must be a local address is wider than 160 bits.
    #[error("payload word {index} is not a local address: {value}")]
    NotAnAddress {
        /// Position of the word in the payload.
        index: usize,
        /// The offending value, rendered in hex.
        value: String,
    },
}
