//! # btdump Storage
//!
//! Read-only storage backends for btdump.
//!
//! This crate provides the lowest-level byte access abstraction for btdump.
//! Backends are **opaque byte stores** - they do not interpret the data
//! they expose.
//!
//! ## Design Principles
//!
//! - Backends are simple byte sources (read at offset, report size)
//! - No knowledge of database page layouts or record formats
//! - No mutation: btdump never writes to the files it inspects
//! - Must be `Send + Sync`
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing against synthetic images
//! - [`FileBackend`] - For reading on-disk database files
//!
//! ## Example
//!
//! ```rust
//! use btdump_storage::{ReadBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::with_data(b"hello world".to_vec());
//! let data = backend.read_at(6, 5).unwrap();
//! assert_eq!(&data, b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::ReadBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
