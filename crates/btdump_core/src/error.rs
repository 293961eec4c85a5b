//! Error types for the btree reader.

use btdump_storage::StorageError;
use thiserror::Error;

/// Result type for reader operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while reading a btree database file.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An error from the storage backend.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The file does not carry a recognized database magic number.
    #[error("not a btree database: magic 0x{magic:08x}")]
    BadMagic {
        /// The magic number found in the file.
        magic: u32,
    },

    /// A recognized database format this reader does not handle.
    #[error("unsupported database: {message}")]
    Unsupported {
        /// Description of the unsupported feature.
        message: String,
    },

    /// A btree on-disk version outside the supported range.
    #[error("unsupported btree version {version}")]
    UnsupportedVersion {
        /// The version found in the metadata page.
        version: u32,
    },

    /// Structural damage in the file.
    #[error("corrupt database: {message}")]
    Corrupt {
        /// Description of the structural violation.
        message: String,
    },
}

impl CoreError {
    /// Creates an unsupported-database error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}
