//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during decoding or encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The byte length does not match the configured integer width.
    #[error("width mismatch: expected {expected} bytes, got {actual}")]
    WidthMismatch {
        /// The configured width in bytes.
        expected: usize,
        /// The actual byte length of the input.
        actual: usize,
    },

    /// The value does not fit in the configured integer width.
    #[error("value {value} does not fit in {width} bytes")]
    ValueOverflow {
        /// The value that was being encoded.
        value: u64,
        /// The configured width in bytes.
        width: usize,
    },

    /// Unrecognized integer width name.
    #[error("invalid width {input:?}: expected 4 or 8")]
    InvalidWidth {
        /// The rejected input.
        input: String,
    },

    /// Unrecognized byte order name.
    #[error("invalid byte order {input:?}: expected native, little, or big")]
    InvalidEndian {
        /// The rejected input.
        input: String,
    },
}
