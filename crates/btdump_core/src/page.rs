//! Page header and item parsing.
//!
//! Every page starts with a 26-byte header followed by an array of 2-byte
//! item offsets. Items themselves grow from the end of the page toward the
//! offset array. On btree leaf pages, keys and values alternate: item `2i`
//! is the key of pair `i` and item `2i + 1` is its value.

use crate::error::{CoreError, CoreResult};

/// Size of the common page header.
pub(crate) const PAGE_HEADER_SIZE: usize = 26;

/// Page number that terminates page chains.
pub(crate) const PGNO_INVALID: u32 = 0;

// Page types.
pub(crate) const P_IBTREE: u8 = 3;
pub(crate) const P_LBTREE: u8 = 5;
pub(crate) const P_LRECNO: u8 = 6;
pub(crate) const P_OVERFLOW: u8 = 7;
pub(crate) const P_BTREEMETA: u8 = 9;
pub(crate) const P_LDUP: u8 = 12;

// Leaf item types; the high bit marks a deleted item.
const B_KEYDATA: u8 = 1;
const B_DUPLICATE: u8 = 2;
const B_OVERFLOW: u8 = 3;
const B_DELETE: u8 = 0x80;

// Header field offsets.
const NEXT_PGNO_OFFSET: usize = 16;
const ENTRIES_OFFSET: usize = 20;
const HF_OFFSET_OFFSET: usize = 22;
const TYPE_OFFSET: usize = 25;

/// Reads a u16 header field, swapping bytes for opposite-endian files.
pub(crate) fn get_u16(buf: &[u8], offset: usize, swapped: bool) -> u16 {
    let value = u16::from_ne_bytes([buf[offset], buf[offset + 1]]);
    if swapped {
        value.swap_bytes()
    } else {
        value
    }
}

/// Reads a u32 header field, swapping bytes for opposite-endian files.
pub(crate) fn get_u32(buf: &[u8], offset: usize, swapped: bool) -> u32 {
    let value = u32::from_ne_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]);
    if swapped {
        value.swap_bytes()
    } else {
        value
    }
}

/// A single item parsed from a btree leaf page.
pub(crate) enum Item<'a> {
    /// An inline key or value.
    KeyData {
        /// The stored bytes.
        bytes: &'a [u8],
        /// Whether the item carries the deleted flag.
        deleted: bool,
    },
    /// A reference to an overflow page chain.
    Overflow {
        /// First page of the chain.
        pgno: u32,
        /// Total item length across the chain.
        tlen: u32,
        /// Whether the item carries the deleted flag.
        deleted: bool,
    },
    /// A reference to an off-page duplicate tree.
    Duplicate,
}

impl Item<'_> {
    /// Whether the item is marked deleted.
    pub(crate) fn is_deleted(&self) -> bool {
        match self {
            Item::KeyData { deleted, .. } | Item::Overflow { deleted, .. } => *deleted,
            Item::Duplicate => false,
        }
    }
}

/// A page read from the database file.
pub(crate) struct Page {
    pgno: u32,
    data: Vec<u8>,
    swapped: bool,
}

impl Page {
    /// Wraps a page-sized buffer read from the file.
    pub(crate) fn new(pgno: u32, data: Vec<u8>, swapped: bool) -> CoreResult<Self> {
        if data.len() < PAGE_HEADER_SIZE {
            return Err(CoreError::corrupt(format!(
                "page {pgno} shorter than the page header"
            )));
        }
        Ok(Self {
            pgno,
            data,
            swapped,
        })
    }

    pub(crate) fn pgno(&self) -> u32 {
        self.pgno
    }

    pub(crate) fn page_type(&self) -> u8 {
        self.data[TYPE_OFFSET]
    }

    pub(crate) fn next_pgno(&self) -> u32 {
        get_u32(&self.data, NEXT_PGNO_OFFSET, self.swapped)
    }

    /// Number of items on the page.
    pub(crate) fn entries(&self) -> usize {
        get_u16(&self.data, ENTRIES_OFFSET, self.swapped) as usize
    }

    /// Bytes used by an overflow page's payload.
    fn hf_offset(&self) -> usize {
        get_u16(&self.data, HF_OFFSET_OFFSET, self.swapped) as usize
    }

    /// Byte offset of item `index` from the page's item index array.
    fn item_offset(&self, index: usize) -> CoreResult<usize> {
        let slot = PAGE_HEADER_SIZE + index * 2;
        if slot + 2 > self.data.len() {
            return Err(CoreError::corrupt(format!(
                "item index {index} out of bounds on page {}",
                self.pgno
            )));
        }
        let offset = get_u16(&self.data, slot, self.swapped) as usize;
        if offset < PAGE_HEADER_SIZE || offset >= self.data.len() {
            return Err(CoreError::corrupt(format!(
                "item {index} on page {} points at offset {offset}",
                self.pgno
            )));
        }
        Ok(offset)
    }

    /// Parses the leaf item at `index`.
    pub(crate) fn item(&self, index: usize) -> CoreResult<Item<'_>> {
        let offset = self.item_offset(index)?;
        if offset + 3 > self.data.len() {
            return Err(CoreError::corrupt(format!(
                "item {index} header past the end of page {}",
                self.pgno
            )));
        }

        let len = get_u16(&self.data, offset, self.swapped) as usize;
        let raw_type = self.data[offset + 2];
        let deleted = raw_type & B_DELETE != 0;

        match raw_type & !B_DELETE {
            B_KEYDATA => {
                if offset + 3 + len > self.data.len() {
                    return Err(CoreError::corrupt(format!(
                        "item {index} on page {} extends past the page end",
                        self.pgno
                    )));
                }
                Ok(Item::KeyData {
                    bytes: &self.data[offset + 3..offset + 3 + len],
                    deleted,
                })
            }
            B_OVERFLOW => {
                if offset + 12 > self.data.len() {
                    return Err(CoreError::corrupt(format!(
                        "overflow item {index} truncated on page {}",
                        self.pgno
                    )));
                }
                Ok(Item::Overflow {
                    pgno: get_u32(&self.data, offset + 4, self.swapped),
                    tlen: get_u32(&self.data, offset + 8, self.swapped),
                    deleted,
                })
            }
            B_DUPLICATE => Ok(Item::Duplicate),
            other => Err(CoreError::corrupt(format!(
                "unknown item type {other} on page {}",
                self.pgno
            ))),
        }
    }

    /// First child page number of an internal page.
    pub(crate) fn leftmost_child(&self) -> CoreResult<u32> {
        if self.entries() == 0 {
            return Err(CoreError::corrupt(format!(
                "internal page {} has no entries",
                self.pgno
            )));
        }
        let offset = self.item_offset(0)?;
        if offset + 8 > self.data.len() {
            return Err(CoreError::corrupt(format!(
                "internal item truncated on page {}",
                self.pgno
            )));
        }
        Ok(get_u32(&self.data, offset + 4, self.swapped))
    }

    /// Payload stored on an overflow page.
    pub(crate) fn overflow_data(&self) -> CoreResult<&[u8]> {
        let len = self.hf_offset();
        if PAGE_HEADER_SIZE + len > self.data.len() {
            return Err(CoreError::corrupt(format!(
                "overflow payload on page {} extends past the page end",
                self.pgno
            )));
        }
        Ok(&self.data[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + len])
    }
}
