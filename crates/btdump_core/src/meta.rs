//! Metadata page parsing.
//!
//! Every database file starts with a metadata page. The first 72 bytes are
//! the generic header shared by all access methods; the btree extension
//! that follows carries the root page number. All multi-byte fields are in
//! the writer's byte order - a byte-swapped file is recognized from the
//! magic number and every header field is swapped on read.

use crate::error::{CoreError, CoreResult};
use crate::page::{get_u32, P_BTREEMETA};

/// Magic number identifying a btree database file.
pub const BTREE_MAGIC: u32 = 0x0005_3162;

/// Magic number of hash database files (recognized, not supported).
const HASH_MAGIC: u32 = 0x0006_1561;
/// Magic number of queue database files (recognized, not supported).
const QUEUE_MAGIC: u32 = 0x0004_2253;
/// Magic number of heap database files (recognized, not supported).
const HEAP_MAGIC: u32 = 0x0007_4582;

/// Size of the metadata header through the btree root field.
pub(crate) const BTMETA_SIZE: usize = 92;

/// Btree on-disk versions this reader handles.
const MIN_VERSION: u32 = 8;
const MAX_VERSION: u32 = 10;

/// Page size bounds enforced by the format.
const MIN_PAGESIZE: u32 = 512;
const MAX_PAGESIZE: u32 = 65536;

// Field offsets within the metadata page.
const MAGIC_OFFSET: usize = 12;
const VERSION_OFFSET: usize = 16;
const PAGESIZE_OFFSET: usize = 20;
const ENCRYPT_ALG_OFFSET: usize = 24;
const TYPE_OFFSET: usize = 25;
const LAST_PGNO_OFFSET: usize = 32;
const KEY_COUNT_OFFSET: usize = 40;
const RECORD_COUNT_OFFSET: usize = 44;
const FLAGS_OFFSET: usize = 48;
const MINKEY_OFFSET: usize = 76;
const ROOT_OFFSET: usize = 88;

/// Parsed btree metadata page.
#[derive(Debug, Clone)]
pub struct BtreeMeta {
    /// Btree on-disk format version.
    pub version: u32,
    /// Page size the file was created with.
    pub pagesize: u32,
    /// Page number of the last page in the file.
    pub last_pgno: u32,
    /// Cached key count; may be stale.
    pub key_count: u32,
    /// Cached record count; may be stale.
    pub record_count: u32,
    /// Access-method flags.
    pub flags: u32,
    /// Minimum keys per page the tree was built with.
    pub minkey: u32,
    /// Page number of the btree root.
    pub root: u32,
    /// Whether the file was written on a machine of opposite endianness.
    pub swapped: bool,
}

impl BtreeMeta {
    /// Parses the metadata page from the first bytes of the file.
    pub(crate) fn parse(buf: &[u8]) -> CoreResult<Self> {
        if buf.len() < BTMETA_SIZE {
            return Err(CoreError::corrupt(format!(
                "file too small to hold a metadata page: {} bytes",
                buf.len()
            )));
        }

        let raw_magic = get_u32(buf, MAGIC_OFFSET, false);
        let swapped = match raw_magic {
            BTREE_MAGIC => false,
            m if m.swap_bytes() == BTREE_MAGIC => true,
            m => {
                return Err(match (m, m.swap_bytes()) {
                    (HASH_MAGIC, _) | (_, HASH_MAGIC) => {
                        CoreError::unsupported("hash database files")
                    }
                    (QUEUE_MAGIC, _) | (_, QUEUE_MAGIC) => {
                        CoreError::unsupported("queue database files")
                    }
                    (HEAP_MAGIC, _) | (_, HEAP_MAGIC) => {
                        CoreError::unsupported("heap database files")
                    }
                    _ => CoreError::BadMagic { magic: m },
                });
            }
        };

        let version = get_u32(buf, VERSION_OFFSET, swapped);
        if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
            return Err(CoreError::UnsupportedVersion { version });
        }

        let pagesize = get_u32(buf, PAGESIZE_OFFSET, swapped);
        if !pagesize.is_power_of_two() || !(MIN_PAGESIZE..=MAX_PAGESIZE).contains(&pagesize) {
            return Err(CoreError::corrupt(format!(
                "invalid page size {pagesize}"
            )));
        }

        if buf[ENCRYPT_ALG_OFFSET] != 0 {
            return Err(CoreError::unsupported("encrypted database files"));
        }

        let ptype = buf[TYPE_OFFSET];
        if ptype != P_BTREEMETA {
            return Err(CoreError::corrupt(format!(
                "metadata page has type {ptype}, expected btree metadata"
            )));
        }

        let root = get_u32(buf, ROOT_OFFSET, swapped);
        if root == 0 {
            return Err(CoreError::corrupt("metadata page has no root page"));
        }

        Ok(Self {
            version,
            pagesize,
            last_pgno: get_u32(buf, LAST_PGNO_OFFSET, swapped),
            key_count: get_u32(buf, KEY_COUNT_OFFSET, swapped),
            record_count: get_u32(buf, RECORD_COUNT_OFFSET, swapped),
            flags: get_u32(buf, FLAGS_OFFSET, swapped),
            minkey: get_u32(buf, MINKEY_OFFSET, swapped),
            root,
            swapped,
        })
    }
}
