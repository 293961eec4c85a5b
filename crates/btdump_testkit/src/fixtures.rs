//! Synthetic btree database images.
//!
//! [`BtreeImageBuilder`] lays out a minimal but structurally faithful btree
//! database file: metadata page at page 0, leaf pages chained left to right,
//! an internal root when more than one leaf is needed, and overflow chains
//! for items pushed past the inline threshold. Header fields can be written
//! byte-swapped to model files from opposite-endian machines.

use std::path::PathBuf;
use tempfile::TempDir;

const PAGE_HEADER_SIZE: usize = 26;

const P_IBTREE: u8 = 3;
const P_LBTREE: u8 = 5;
const P_OVERFLOW: u8 = 7;
const P_BTREEMETA: u8 = 9;

const B_KEYDATA: u8 = 1;
const B_OVERFLOW: u8 = 3;
const B_DELETE: u8 = 0x80;

const BTREE_MAGIC: u32 = 0x0005_3162;

struct PairEntry {
    key: Vec<u8>,
    value: Vec<u8>,
    deleted: bool,
}

/// A database file in a temporary directory.
///
/// The directory lives as long as this value; dropping it removes the file.
pub struct TestDbFile {
    /// Path to the database file.
    pub path: PathBuf,
    _temp_dir: TempDir,
}

/// Builder for synthetic btree database images.
///
/// Records are laid out in the order given; callers supply them sorted when
/// order matters, matching what a real tree would hold.
pub struct BtreeImageBuilder {
    pagesize: u32,
    version: u32,
    swapped: bool,
    leaf_capacity: Option<usize>,
    overflow_threshold: Option<usize>,
    pairs: Vec<PairEntry>,
}

impl Default for BtreeImageBuilder {
    fn default() -> Self {
        Self {
            pagesize: 512,
            version: 9,
            swapped: false,
            leaf_capacity: None,
            overflow_threshold: None,
            pairs: Vec::new(),
        }
    }
}

impl BtreeImageBuilder {
    /// Creates a builder with the default layout (512-byte pages, native
    /// byte order, everything inline on a single leaf).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size. Must be a power of two in 512..=65536.
    #[must_use]
    pub fn pagesize(mut self, pagesize: u32) -> Self {
        self.pagesize = pagesize;
        self
    }

    /// Sets the btree version written to the metadata page.
    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Writes all header fields byte-swapped, modeling a file from a
    /// machine of opposite endianness.
    #[must_use]
    pub fn swapped(mut self, swapped: bool) -> Self {
        self.swapped = swapped;
        self
    }

    /// Caps pairs per leaf page, forcing a multi-leaf chain with an
    /// internal root.
    #[must_use]
    pub fn leaf_capacity(mut self, capacity: usize) -> Self {
        self.leaf_capacity = Some(capacity);
        self
    }

    /// Stores items longer than `threshold` bytes in overflow chains.
    #[must_use]
    pub fn overflow_threshold(mut self, threshold: usize) -> Self {
        self.overflow_threshold = Some(threshold);
        self
    }

    /// Appends a record.
    #[must_use]
    pub fn pair(mut self, key: &[u8], value: &[u8]) -> Self {
        self.pairs.push(PairEntry {
            key: key.to_vec(),
            value: value.to_vec(),
            deleted: false,
        });
        self
    }

    /// Appends a record whose items carry the deleted flag.
    #[must_use]
    pub fn deleted_pair(mut self, key: &[u8], value: &[u8]) -> Self {
        self.pairs.push(PairEntry {
            key: key.to_vec(),
            value: value.to_vec(),
            deleted: true,
        });
        self
    }

    /// Appends records of native-endian u32 key/value pairs.
    #[must_use]
    pub fn pairs_u32(mut self, pairs: &[(u32, u32)]) -> Self {
        for &(key, value) in pairs {
            self = self.pair(&key.to_ne_bytes(), &value.to_ne_bytes());
        }
        self
    }

    /// Builds the complete database image.
    ///
    /// # Panics
    ///
    /// Panics if a page cannot hold its items; fixtures are expected to
    /// stay within the configured page size.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let pagesize = self.pagesize as usize;
        assert!(
            self.pagesize.is_power_of_two() && (512..=65536).contains(&self.pagesize),
            "invalid fixture page size {}",
            self.pagesize
        );

        let leaf_cap = self.leaf_capacity.unwrap_or(usize::MAX).max(1);
        let empty: &[PairEntry] = &[];
        let chunks: Vec<&[PairEntry]> = if self.pairs.is_empty() {
            vec![empty]
        } else {
            self.pairs.chunks(leaf_cap).collect()
        };
        let nleaves = chunks.len() as u32;

        let root = if nleaves == 1 { 1 } else { nleaves + 1 };
        let mut next_free_pgno = if nleaves == 1 { 2 } else { nleaves + 2 };

        let mut pages: Vec<(u32, Vec<u8>)> = Vec::new();

        // Leaf pages, chained left to right.
        for (i, chunk) in chunks.iter().enumerate() {
            let pgno = i as u32 + 1;
            let prev = if i == 0 { 0 } else { pgno - 1 };
            let next = if i + 1 == chunks.len() { 0 } else { pgno + 1 };

            let mut page = vec![0u8; pagesize];
            self.put_u32(&mut page, 8, pgno);
            self.put_u32(&mut page, 12, prev);
            self.put_u32(&mut page, 16, next);
            self.put_u16(&mut page, 20, (chunk.len() * 2) as u16);
            page[24] = 1; // leaf level
            page[25] = P_LBTREE;

            let mut top = pagesize;
            let mut slot = PAGE_HEADER_SIZE;
            for pair in chunk.iter() {
                for (data, deleted) in
                    [(&pair.key, pair.deleted), (&pair.value, pair.deleted)]
                {
                    let item = self.build_item(data, deleted, &mut next_free_pgno, &mut pages);
                    assert!(
                        item.len() <= top && top - item.len() > slot + 2,
                        "fixture page {pgno} cannot hold its items"
                    );
                    top -= item.len();
                    page[top..top + item.len()].copy_from_slice(&item);
                    self.put_u16(&mut page, slot, top as u16);
                    slot += 2;
                }
            }
            self.put_u16(&mut page, 22, top as u16);

            pages.push((pgno, page));
        }

        // Internal root referencing each leaf in order.
        if nleaves > 1 {
            let pgno = nleaves + 1;
            let mut page = vec![0u8; pagesize];
            self.put_u32(&mut page, 8, pgno);
            self.put_u16(&mut page, 20, nleaves as u16);
            page[24] = 2;
            page[25] = P_IBTREE;

            let mut top = pagesize;
            let mut slot = PAGE_HEADER_SIZE;
            for (i, chunk) in chunks.iter().enumerate() {
                // The first separator key is empty by convention.
                let key: &[u8] = if i == 0 {
                    &[]
                } else {
                    chunk.first().map(|p| p.key.as_slice()).unwrap_or(&[])
                };
                let mut item = Vec::with_capacity(12 + key.len());
                item.extend_from_slice(&self.u16_bytes(key.len() as u16));
                item.push(B_KEYDATA);
                item.push(0);
                item.extend_from_slice(&self.u32_bytes(i as u32 + 1));
                item.extend_from_slice(&self.u32_bytes(chunk.len() as u32));
                item.extend_from_slice(key);

                assert!(
                    item.len() <= top && top - item.len() > slot + 2,
                    "fixture root page cannot hold its items"
                );
                top -= item.len();
                page[top..top + item.len()].copy_from_slice(&item);
                self.put_u16(&mut page, slot, top as u16);
                slot += 2;
            }
            self.put_u16(&mut page, 22, top as u16);

            pages.push((pgno, page));
        }

        let last_pgno = pages.iter().map(|(pgno, _)| *pgno).max().unwrap_or(0);
        let live_pairs = self.pairs.iter().filter(|p| !p.deleted).count() as u32;

        // Metadata page.
        let mut meta = vec![0u8; pagesize];
        self.put_u32(&mut meta, 12, BTREE_MAGIC);
        self.put_u32(&mut meta, 16, self.version);
        self.put_u32(&mut meta, 20, self.pagesize);
        meta[25] = P_BTREEMETA;
        self.put_u32(&mut meta, 32, last_pgno);
        self.put_u32(&mut meta, 40, live_pairs);
        self.put_u32(&mut meta, 44, live_pairs);
        self.put_u32(&mut meta, 76, 2);
        self.put_u32(&mut meta, 88, root);

        let mut image = vec![0u8; (last_pgno as usize + 1) * pagesize];
        image[..pagesize].copy_from_slice(&meta);
        for (pgno, page) in pages {
            let offset = pgno as usize * pagesize;
            image[offset..offset + pagesize].copy_from_slice(&page);
        }
        image
    }

    /// Builds the image and writes it to a file in a fresh temp directory.
    #[must_use]
    pub fn write_to_temp_file(self) -> TestDbFile {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("test.db");
        std::fs::write(&path, self.build()).expect("failed to write database image");
        TestDbFile {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Builds one leaf item, spilling to overflow pages past the threshold.
    fn build_item(
        &self,
        data: &[u8],
        deleted: bool,
        next_free_pgno: &mut u32,
        pages: &mut Vec<(u32, Vec<u8>)>,
    ) -> Vec<u8> {
        let delete_flag = if deleted { B_DELETE } else { 0 };

        let spills = self
            .overflow_threshold
            .map_or(false, |threshold| data.len() > threshold);
        if !spills {
            let mut item = Vec::with_capacity(3 + data.len());
            item.extend_from_slice(&self.u16_bytes(data.len() as u16));
            item.push(B_KEYDATA | delete_flag);
            item.extend_from_slice(data);
            return item;
        }

        let pagesize = self.pagesize as usize;
        let per_page = pagesize - PAGE_HEADER_SIZE;
        let chunks: Vec<&[u8]> = if data.is_empty() {
            vec![data]
        } else {
            data.chunks(per_page).collect()
        };

        let first_pgno = *next_free_pgno;
        for (i, chunk) in chunks.iter().enumerate() {
            let pgno = *next_free_pgno;
            *next_free_pgno += 1;
            let next = if i + 1 == chunks.len() { 0 } else { pgno + 1 };

            let mut page = vec![0u8; pagesize];
            self.put_u32(&mut page, 8, pgno);
            self.put_u32(&mut page, 16, next);
            self.put_u16(&mut page, 20, 1); // reference count
            self.put_u16(&mut page, 22, chunk.len() as u16);
            page[25] = P_OVERFLOW;
            page[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + chunk.len()].copy_from_slice(chunk);

            pages.push((pgno, page));
        }

        let mut item = Vec::with_capacity(12);
        item.extend_from_slice(&self.u16_bytes(0));
        item.push(B_OVERFLOW | delete_flag);
        item.push(0);
        item.extend_from_slice(&self.u32_bytes(first_pgno));
        item.extend_from_slice(&self.u32_bytes(data.len() as u32));
        item
    }

    fn u16_bytes(&self, value: u16) -> [u8; 2] {
        let value = if self.swapped {
            value.swap_bytes()
        } else {
            value
        };
        value.to_ne_bytes()
    }

    fn u32_bytes(&self, value: u32) -> [u8; 4] {
        let value = if self.swapped {
            value.swap_bytes()
        } else {
            value
        };
        value.to_ne_bytes()
    }

    fn put_u16(&self, buf: &mut [u8], offset: usize, value: u16) {
        buf[offset..offset + 2].copy_from_slice(&self.u16_bytes(value));
    }

    fn put_u32(&self, buf: &mut [u8], offset: usize, value: u32) {
        buf[offset..offset + 4].copy_from_slice(&self.u32_bytes(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_has_meta_and_root_leaf() {
        let image = BtreeImageBuilder::new().build();
        assert_eq!(image.len(), 2 * 512);
        // Magic in place, root page is a leaf.
        assert_eq!(
            u32::from_ne_bytes([image[12], image[13], image[14], image[15]]),
            BTREE_MAGIC
        );
        assert_eq!(image[512 + 25], P_LBTREE);
    }

    #[test]
    fn multi_leaf_image_gets_internal_root() {
        let image = BtreeImageBuilder::new()
            .leaf_capacity(1)
            .pairs_u32(&[(1, 10), (2, 20)])
            .build();
        // Pages: meta, two leaves, internal root.
        assert_eq!(image.len(), 4 * 512);
        assert_eq!(image[3 * 512 + 25], P_IBTREE);
    }

    #[test]
    fn overflow_pages_are_appended() {
        let image = BtreeImageBuilder::new()
            .overflow_threshold(4)
            .pair(&1u32.to_ne_bytes(), &[0xaa; 100])
            .build();
        // Pages: meta, leaf, one overflow page.
        assert_eq!(image.len(), 3 * 512);
        assert_eq!(image[2 * 512 + 25], P_OVERFLOW);
    }

    #[test]
    fn temp_file_is_written() {
        let db_file = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &2u32.to_ne_bytes())
            .write_to_temp_file();
        let len = std::fs::metadata(&db_file.path).unwrap().len();
        assert_eq!(len, 2 * 512);
    }
}
