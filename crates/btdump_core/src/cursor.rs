//! Ordered record iteration over the leaf page chain.
//!
//! The cursor descends from the root to the leftmost leaf once, then walks
//! the leaf chain forward, yielding key/value pairs in the order the tree
//! stores them. Pages are read one at a time; memory stays bounded by the
//! page size regardless of database size.
//!
//! # Error Handling
//!
//! - Structural violations (odd entry counts, out-of-range offsets,
//!   unterminated chains) end iteration with a corruption error
//! - Off-page duplicate trees and record-number leaves are reported as
//!   unsupported
//! - Deleted-marked pairs are skipped; they are not live records

use crate::db::BtreeDb;
use crate::error::{CoreError, CoreResult};
use crate::page::{Item, Page, PGNO_INVALID, P_IBTREE, P_LBTREE, P_LDUP, P_LRECNO, P_OVERFLOW};

/// Descent guard; no real tree is this deep.
const MAX_DEPTH: u32 = 100;

/// A key/value record read from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Raw key bytes, exactly as stored.
    pub key: Vec<u8>,
    /// Raw value bytes, exactly as stored.
    pub value: Vec<u8>,
}

/// A streaming cursor over all records in key order.
///
/// Yields `CoreResult<Record>`; the first error ends iteration.
pub struct RecordCursor<'a> {
    db: &'a BtreeDb,
    /// Current leaf page; `None` once the chain is exhausted.
    page: Option<Page>,
    /// Next item index on the current page.
    index: usize,
    /// Leaf pages visited, for chain termination checks.
    pages_walked: usize,
    finished: bool,
}

impl<'a> RecordCursor<'a> {
    /// Creates a cursor positioned before the first record.
    pub(crate) fn new(db: &'a BtreeDb) -> CoreResult<Self> {
        let leaf = descend_to_leftmost(db)?;
        Ok(Self {
            db,
            page: Some(leaf),
            index: 0,
            pages_walked: 1,
            finished: false,
        })
    }

    fn read_next(&mut self) -> CoreResult<Option<Record>> {
        let db = self.db;
        loop {
            let Some(page) = self.page.as_ref() else {
                return Ok(None);
            };

            let entries = page.entries();
            if entries % 2 != 0 {
                return Err(CoreError::corrupt(format!(
                    "odd entry count {entries} on leaf page {}",
                    page.pgno()
                )));
            }

            if self.index >= entries {
                let next = page.next_pgno();
                let current = page.pgno();
                if next == PGNO_INVALID {
                    self.page = None;
                    return Ok(None);
                }
                self.pages_walked += 1;
                if self.pages_walked > db.meta().last_pgno as usize + 1 {
                    return Err(CoreError::corrupt(format!(
                        "leaf chain does not terminate after page {current}"
                    )));
                }
                let next_page = db.read_page(next)?;
                if next_page.page_type() != P_LBTREE {
                    return Err(CoreError::corrupt(format!(
                        "page {next} in the leaf chain has type {}",
                        next_page.page_type()
                    )));
                }
                self.page = Some(next_page);
                self.index = 0;
                continue;
            }

            let key_item = page.item(self.index)?;
            let value_item = page.item(self.index + 1)?;
            let key = resolve_item(db, key_item)?;
            let value = resolve_item(db, value_item)?;
            self.index += 2;

            match (key, value) {
                (Some(key), Some(value)) => return Ok(Some(Record { key, value })),
                // Deleted pair; not a live record.
                _ => continue,
            }
        }
    }
}

impl Iterator for RecordCursor<'_> {
    type Item = CoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Descends from the root to the leftmost leaf page.
fn descend_to_leftmost(db: &BtreeDb) -> CoreResult<Page> {
    let mut pgno = db.meta().root;
    let mut depth = 0u32;
    loop {
        let page = db.read_page(pgno)?;
        match page.page_type() {
            P_LBTREE => return Ok(page),
            P_IBTREE => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(CoreError::corrupt(format!(
                        "btree deeper than {MAX_DEPTH} levels at page {pgno}"
                    )));
                }
                pgno = page.leftmost_child()?;
            }
            P_LRECNO => {
                return Err(CoreError::unsupported("record-number databases"));
            }
            P_LDUP => {
                return Err(CoreError::unsupported("off-page duplicate trees"));
            }
            other => {
                return Err(CoreError::corrupt(format!(
                    "unexpected page type {other} at page {pgno}"
                )));
            }
        }
    }
}

/// Materializes a leaf item, following overflow chains.
///
/// Returns `None` for deleted-marked items.
fn resolve_item(db: &BtreeDb, item: Item<'_>) -> CoreResult<Option<Vec<u8>>> {
    if item.is_deleted() {
        return Ok(None);
    }
    match item {
        Item::KeyData { bytes, .. } => Ok(Some(bytes.to_vec())),
        Item::Overflow { pgno, tlen, .. } => read_overflow(db, pgno, tlen).map(Some),
        Item::Duplicate => Err(CoreError::unsupported("off-page duplicate trees")),
    }
}

/// Reassembles an overflow item from its page chain.
fn read_overflow(db: &BtreeDb, first_pgno: u32, tlen: u32) -> CoreResult<Vec<u8>> {
    let mut out = Vec::with_capacity(tlen as usize);
    let mut pgno = first_pgno;
    let mut walked = 0usize;

    while pgno != PGNO_INVALID {
        let page = db.read_page(pgno)?;
        if page.page_type() != P_OVERFLOW {
            return Err(CoreError::corrupt(format!(
                "expected an overflow page at page {pgno}"
            )));
        }
        out.extend_from_slice(page.overflow_data()?);
        if out.len() > tlen as usize {
            return Err(CoreError::corrupt(format!(
                "overflow chain starting at page {first_pgno} exceeds its item length"
            )));
        }
        walked += 1;
        if walked > db.meta().last_pgno as usize + 1 {
            return Err(CoreError::corrupt(format!(
                "overflow chain starting at page {first_pgno} does not terminate"
            )));
        }
        pgno = page.next_pgno();
    }

    if out.len() != tlen as usize {
        return Err(CoreError::corrupt(format!(
            "overflow item truncated: expected {tlen} bytes, got {}",
            out.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use btdump_storage::InMemoryBackend;
    use btdump_testkit::fixtures::BtreeImageBuilder;
    use btdump_testkit::generators::sorted_u32_pairs;
    use proptest::prelude::*;

    fn open(image: Vec<u8>) -> BtreeDb {
        BtreeDb::with_backend(Box::new(InMemoryBackend::with_data(image))).unwrap()
    }

    fn collect(db: &BtreeDb) -> Vec<Record> {
        db.records().unwrap().map(|r| r.unwrap()).collect()
    }

    fn read_u16_native(image: &[u8], offset: usize) -> u16 {
        u16::from_ne_bytes([image[offset], image[offset + 1]])
    }

    #[test]
    fn empty_store_yields_no_records() {
        let image = BtreeImageBuilder::new().build();
        let db = open(image);
        assert!(collect(&db).is_empty());
    }

    #[test]
    fn single_record() {
        let image = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &42u32.to_ne_bytes())
            .build();
        let db = open(image);

        let records = collect(&db);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, 1u32.to_ne_bytes());
        assert_eq!(records[0].value, 42u32.to_ne_bytes());
    }

    #[test]
    fn records_come_back_in_store_order() {
        let image = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &42u32.to_ne_bytes())
            .pair(&2u32.to_ne_bytes(), &7u32.to_ne_bytes())
            .build();
        let db = open(image);

        let records = collect(&db);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, 1u32.to_ne_bytes());
        assert_eq!(records[0].value, 42u32.to_ne_bytes());
        assert_eq!(records[1].key, 2u32.to_ne_bytes());
        assert_eq!(records[1].value, 7u32.to_ne_bytes());
    }

    #[test]
    fn multi_leaf_chain_is_walked_in_order() {
        let mut builder = BtreeImageBuilder::new().leaf_capacity(2);
        for i in 0u32..10 {
            builder = builder.pair(&i.to_ne_bytes(), &(i * 10).to_ne_bytes());
        }
        let db = open(builder.build());

        let records = collect(&db);
        assert_eq!(records.len(), 10);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.key, (i as u32).to_ne_bytes());
            assert_eq!(record.value, (i as u32 * 10).to_ne_bytes());
        }
    }

    #[test]
    fn swapped_image_reads_identically() {
        let image = BtreeImageBuilder::new()
            .swapped(true)
            .pair(&1u32.to_ne_bytes(), &42u32.to_ne_bytes())
            .pair(&2u32.to_ne_bytes(), &7u32.to_ne_bytes())
            .build();
        let db = open(image);
        assert!(db.meta().swapped);

        let records = collect(&db);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, 1u32.to_ne_bytes());
        assert_eq!(records[0].value, 42u32.to_ne_bytes());
        assert_eq!(records[1].key, 2u32.to_ne_bytes());
        assert_eq!(records[1].value, 7u32.to_ne_bytes());
    }

    #[test]
    fn larger_pagesize_reads_fine() {
        let image = BtreeImageBuilder::new()
            .pagesize(1024)
            .pairs_u32(&[(1, 42), (2, 7)])
            .build();
        let db = open(image);
        assert_eq!(db.meta().pagesize, 1024);
        assert_eq!(collect(&db).len(), 2);
    }

    #[test]
    fn overflow_value_is_reassembled() {
        let big_value = vec![0xabu8; 600];
        let image = BtreeImageBuilder::new()
            .overflow_threshold(16)
            .pair(&1u32.to_ne_bytes(), &big_value)
            .build();
        let db = open(image);

        let records = collect(&db);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, 1u32.to_ne_bytes());
        assert_eq!(records[0].value, big_value);
    }

    #[test]
    fn deleted_pair_is_skipped() {
        let image = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &42u32.to_ne_bytes())
            .deleted_pair(&2u32.to_ne_bytes(), &99u32.to_ne_bytes())
            .pair(&3u32.to_ne_bytes(), &7u32.to_ne_bytes())
            .build();
        let db = open(image);

        let records = collect(&db);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, 1u32.to_ne_bytes());
        assert_eq!(records[1].key, 3u32.to_ne_bytes());
    }

    #[test]
    fn odd_entry_count_is_corrupt() {
        let mut image = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &42u32.to_ne_bytes())
            .build();
        // Page 1 header: entry count lives at page offset 20.
        image[512 + 20..512 + 22].copy_from_slice(&3u16.to_ne_bytes());

        let db = open(image);
        let result: CoreResult<Vec<_>> = db.records().unwrap().collect();
        assert!(matches!(result, Err(CoreError::Corrupt { .. })));
    }

    #[test]
    fn duplicate_item_is_unsupported() {
        let mut image = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &42u32.to_ne_bytes())
            .build();
        // Rewrite the value item's type byte to an off-page duplicate marker.
        let value_offset = read_u16_native(&image, 512 + 26 + 2) as usize;
        image[512 + value_offset + 2] = 2;

        let db = open(image);
        let result: CoreResult<Vec<_>> = db.records().unwrap().collect();
        assert!(matches!(result, Err(CoreError::Unsupported { .. })));
    }

    #[test]
    fn truncated_file_fails() {
        let mut image = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &42u32.to_ne_bytes())
            .build();
        image.truncate(520);

        let db = open(image);
        let result = db.records();
        assert!(matches!(result, Err(CoreError::Storage(_))));
    }

    #[test]
    fn iteration_stops_after_error() {
        let mut image = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &42u32.to_ne_bytes())
            .build();
        image[512 + 20..512 + 22].copy_from_slice(&3u16.to_ne_bytes());

        let db = open(image);
        let mut cursor = db.records().unwrap();
        assert!(matches!(cursor.next(), Some(Err(_))));
        assert!(cursor.next().is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn iterates_every_pair_in_order(pairs in sorted_u32_pairs(50)) {
            let mut builder = BtreeImageBuilder::new().leaf_capacity(4);
            for &(key, value) in &pairs {
                builder = builder.pair(&key.to_ne_bytes(), &value.to_ne_bytes());
            }
            let db = open(builder.build());

            let records: Vec<_> = db.records().unwrap().map(|r| r.unwrap()).collect();
            prop_assert_eq!(records.len(), pairs.len());
            for (record, &(key, value)) in records.iter().zip(&pairs) {
                prop_assert_eq!(&record.key, &key.to_ne_bytes());
                prop_assert_eq!(&record.value, &value.to_ne_bytes());
            }
        }
    }
}
