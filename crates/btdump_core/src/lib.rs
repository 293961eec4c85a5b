//! # btdump Core
//!
//! Read-only reader for Berkeley DB btree database files.
//!
//! This crate decodes the on-disk btree page layout far enough for ordered
//! sequential iteration: the metadata page, the leaf page chain, and
//! overflow chains for items too large to live on a leaf. Nothing here
//! writes; the file is only ever opened for reading.
//!
//! Byte order is detected from the stored magic number, so files written on
//! machines of either endianness are readable. Key and value payload bytes
//! are returned exactly as stored - interpreting them is the caller's job
//! (see `btdump_codec`).
//!
//! ## Usage
//!
//! ```no_run
//! use btdump_core::BtreeDb;
//! use std::path::Path;
//!
//! let db = BtreeDb::open(Path::new("counts.db")).unwrap();
//! for result in db.records().unwrap() {
//!     let record = result.unwrap();
//!     // record.key / record.value are raw byte strings
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cursor;
mod db;
mod error;
mod meta;
mod page;

pub use cursor::{Record, RecordCursor};
pub use db::BtreeDb;
pub use error::{CoreError, CoreResult};
pub use meta::{BtreeMeta, BTREE_MAGIC};
