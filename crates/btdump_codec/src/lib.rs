//! # btdump Codec
//!
//! Fixed-width unsigned integer decoding for btdump.
//!
//! Keys and values in the databases btdump inspects are raw byte strings
//! holding a single unsigned integer in the byte order of the machine that
//! wrote them. The file carries no marker for either property, so both are
//! explicit here instead of hard-coded:
//!
//! - [`IntWidth`] - the integer width (4 or 8 bytes)
//! - [`Endian`] - the byte order (native, little, big)
//! - [`IntCodec`] - decodes and encodes values for a chosen layout
//!
//! The defaults (4 bytes, native order) match the databases the original
//! tooling was built against.
//!
//! ## Usage
//!
//! ```
//! use btdump_codec::IntCodec;
//!
//! let codec = IntCodec::default();
//! let value = codec.decode(&42u32.to_ne_bytes()).unwrap();
//! assert_eq!(value, 42);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod int;

pub use error::{CodecError, CodecResult};
pub use int::{Endian, IntCodec, IntWidth};
