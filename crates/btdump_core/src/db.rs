//! Read-only btree database handle.

use crate::cursor::RecordCursor;
use crate::error::CoreResult;
use crate::meta::{BtreeMeta, BTMETA_SIZE};
use crate::page::Page;
use btdump_storage::{FileBackend, ReadBackend};
use std::path::Path;
use tracing::debug;

/// An opened, read-only btree database file.
///
/// The handle owns the storage backend for the duration of the dump and
/// releases it on drop. Nothing is ever written through it.
pub struct BtreeDb {
    backend: Box<dyn ReadBackend>,
    meta: BtreeMeta,
}

impl BtreeDb {
    /// Opens a btree database file read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its metadata page
    /// is not a valid btree metadata page.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let backend = FileBackend::open(path)?;
        Self::with_backend(Box::new(backend))
    }

    /// Opens a btree database over an arbitrary backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata page is not a valid btree metadata
    /// page.
    pub fn with_backend(backend: Box<dyn ReadBackend>) -> CoreResult<Self> {
        let size = backend.size()?;
        let head_len = size.min(BTMETA_SIZE as u64) as usize;
        let head = backend.read_at(0, head_len)?;
        let meta = BtreeMeta::parse(&head)?;

        debug!(
            "opened btree database: version {} pagesize {} root {} swapped {}",
            meta.version, meta.pagesize, meta.root, meta.swapped
        );

        Ok(Self { backend, meta })
    }

    /// Returns the parsed metadata page.
    #[must_use]
    pub fn meta(&self) -> &BtreeMeta {
        &self.meta
    }

    /// Returns a cursor over all records in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the descent from the root to the leftmost leaf
    /// fails.
    pub fn records(&self) -> CoreResult<RecordCursor<'_>> {
        RecordCursor::new(self)
    }

    /// Reads the page with the given number.
    pub(crate) fn read_page(&self, pgno: u32) -> CoreResult<Page> {
        let offset = u64::from(pgno) * u64::from(self.meta.pagesize);
        let data = self.backend.read_at(offset, self.meta.pagesize as usize)?;
        Page::new(pgno, data, self.meta.swapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btdump_testkit::fixtures::BtreeImageBuilder;
    use btdump_storage::InMemoryBackend;

    #[test]
    fn open_file_backed() {
        let db_file = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &42u32.to_ne_bytes())
            .write_to_temp_file();

        let db = BtreeDb::open(&db_file.path).unwrap();
        assert_eq!(db.meta().key_count, 1);

        let records: Vec<_> = db.records().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, 1u32.to_ne_bytes());
        assert_eq!(records[0].value, 42u32.to_ne_bytes());
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");

        let result = BtreeDb::open(&path);
        assert!(matches!(result, Err(crate::CoreError::Storage(_))));
    }

    #[test]
    fn meta_is_exposed() {
        let image = BtreeImageBuilder::new()
            .pair(&1u32.to_ne_bytes(), &2u32.to_ne_bytes())
            .pair(&3u32.to_ne_bytes(), &4u32.to_ne_bytes())
            .build();

        let db = BtreeDb::with_backend(Box::new(InMemoryBackend::with_data(image))).unwrap();
        let meta = db.meta();
        assert_eq!(meta.pagesize, 512);
        assert_eq!(meta.key_count, 2);
        assert_eq!(meta.record_count, 2);
        assert_eq!(meta.root, 1);
        assert!(!meta.swapped);
    }

    #[test]
    fn accepts_current_format_version() {
        let image = BtreeImageBuilder::new()
            .version(10)
            .pairs_u32(&[(1, 2)])
            .build();

        let db = BtreeDb::with_backend(Box::new(InMemoryBackend::with_data(image))).unwrap();
        assert_eq!(db.meta().version, 10);
    }

    #[test]
    fn empty_backend_fails() {
        let result = BtreeDb::with_backend(Box::new(InMemoryBackend::new()));
        assert!(matches!(result, Err(crate::CoreError::Corrupt { .. })));
    }
}
