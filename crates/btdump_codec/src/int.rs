//! Fixed-width unsigned integer layouts and the codec over them.

use crate::error::{CodecError, CodecResult};
use std::str::FromStr;

/// Width of a stored unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntWidth {
    /// 4-byte unsigned integer.
    #[default]
    U32,
    /// 8-byte unsigned integer.
    U64,
}

impl IntWidth {
    /// Returns the width in bytes.
    #[must_use]
    pub fn bytes(self) -> usize {
        match self {
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }
}

impl FromStr for IntWidth {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        match s {
            "4" => Ok(Self::U32),
            "8" => Ok(Self::U64),
            other => Err(CodecError::InvalidWidth {
                input: other.to_string(),
            }),
        }
    }
}

/// Byte order of a stored unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// The byte order of the machine running btdump.
    #[default]
    Native,
    /// Little-endian.
    Little,
    /// Big-endian.
    Big,
}

impl FromStr for Endian {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        match s {
            "native" => Ok(Self::Native),
            "little" => Ok(Self::Little),
            "big" => Ok(Self::Big),
            other => Err(CodecError::InvalidEndian {
                input: other.to_string(),
            }),
        }
    }
}

/// Codec for fixed-width unsigned integers.
///
/// Decoding requires the input byte length to match the configured width
/// exactly; a mismatch means the stored record does not have the layout the
/// caller asked for.
///
/// # Example
///
/// ```
/// use btdump_codec::{Endian, IntCodec, IntWidth};
///
/// let codec = IntCodec::new(IntWidth::U32, Endian::Little);
/// assert_eq!(codec.decode(&[0x2a, 0, 0, 0]).unwrap(), 42);
/// assert!(codec.decode(&[0x2a, 0]).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IntCodec {
    width: IntWidth,
    endian: Endian,
}

impl IntCodec {
    /// Creates a codec for the given layout.
    #[must_use]
    pub fn new(width: IntWidth, endian: Endian) -> Self {
        Self { width, endian }
    }

    /// Returns the configured width.
    #[must_use]
    pub fn width(&self) -> IntWidth {
        self.width
    }

    /// Returns the configured byte order.
    #[must_use]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Decodes a stored integer.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::WidthMismatch`] when the input length differs
    /// from the configured width.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<u64> {
        if bytes.len() != self.width.bytes() {
            return Err(CodecError::WidthMismatch {
                expected: self.width.bytes(),
                actual: bytes.len(),
            });
        }

        match self.width {
            IntWidth::U32 => {
                let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
                let value = match self.endian {
                    Endian::Native => u32::from_ne_bytes(raw),
                    Endian::Little => u32::from_le_bytes(raw),
                    Endian::Big => u32::from_be_bytes(raw),
                };
                Ok(u64::from(value))
            }
            IntWidth::U64 => {
                let raw = [
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ];
                let value = match self.endian {
                    Endian::Native => u64::from_ne_bytes(raw),
                    Endian::Little => u64::from_le_bytes(raw),
                    Endian::Big => u64::from_be_bytes(raw),
                };
                Ok(value)
            }
        }
    }

    /// Encodes a value into the configured layout.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ValueOverflow`] when the value does not fit
    /// the configured width.
    pub fn encode(&self, value: u64) -> CodecResult<Vec<u8>> {
        match self.width {
            IntWidth::U32 => {
                let narrow = u32::try_from(value).map_err(|_| CodecError::ValueOverflow {
                    value,
                    width: self.width.bytes(),
                })?;
                let raw = match self.endian {
                    Endian::Native => narrow.to_ne_bytes(),
                    Endian::Little => narrow.to_le_bytes(),
                    Endian::Big => narrow.to_be_bytes(),
                };
                Ok(raw.to_vec())
            }
            IntWidth::U64 => {
                let raw = match self.endian {
                    Endian::Native => value.to_ne_bytes(),
                    Endian::Little => value.to_le_bytes(),
                    Endian::Big => value.to_be_bytes(),
                };
                Ok(raw.to_vec())
            }
        }
    }
}
