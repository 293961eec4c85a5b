//! Metadata command implementation.

use btdump_core::BtreeDb;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Store metadata summary for output.
#[derive(Debug, Serialize)]
pub struct MetaInfo {
    /// Database path.
    pub path: String,
    /// Byte order relative to this machine (native, swapped).
    pub byte_order: String,
    /// Btree on-disk format version.
    pub version: u32,
    /// Page size in bytes.
    pub pagesize: u32,
    /// Page number of the last page in the file.
    pub last_pgno: u32,
    /// Page number of the btree root.
    pub root: u32,
    /// Minimum keys per page.
    pub minkey: u32,
    /// Access-method flags.
    pub flags: u32,
    /// Cached key count; may be stale.
    pub key_count: u32,
    /// Cached record count; may be stale.
    pub record_count: u32,
}

/// Runs the meta command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    debug!("reading metadata from {:?}", path);

    let db = BtreeDb::open(path)?;
    let info = build_info(path, &db);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        _ => {
            print_text_output(&info);
        }
    }

    Ok(())
}

fn build_info(path: &Path, db: &BtreeDb) -> MetaInfo {
    let meta = db.meta();
    let byte_order = if meta.swapped { "swapped" } else { "native" };
    MetaInfo {
        path: path.display().to_string(),
        byte_order: byte_order.to_string(),
        version: meta.version,
        pagesize: meta.pagesize,
        last_pgno: meta.last_pgno,
        root: meta.root,
        minkey: meta.minkey,
        flags: meta.flags,
        key_count: meta.key_count,
        record_count: meta.record_count,
    }
}

fn print_text_output(info: &MetaInfo) {
    println!("Btree Database");
    println!("==============");
    println!();
    println!("Path:         {}", info.path);
    println!("Byte order:   {}", info.byte_order);
    println!("Version:      {}", info.version);
    println!("Page size:    {}", info.pagesize);
    println!("Last page:    {}", info.last_pgno);
    println!("Root page:    {}", info.root);
    println!("Min keys:     {}", info.minkey);
    println!("Flags:        {}", info.flags);
    println!("Key count:    {}", info.key_count);
    println!("Record count: {}", info.record_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use btdump_testkit::fixtures::BtreeImageBuilder;

    #[test]
    fn info_reflects_store_metadata() {
        let db_file = BtreeImageBuilder::new()
            .pairs_u32(&[(1, 42), (2, 7)])
            .write_to_temp_file();
        let db = BtreeDb::open(&db_file.path).unwrap();

        let info = build_info(&db_file.path, &db);
        assert_eq!(info.byte_order, "native");
        assert_eq!(info.version, 9);
        assert_eq!(info.pagesize, 512);
        assert_eq!(info.root, 1);
        assert_eq!(info.key_count, 2);
        assert_eq!(info.record_count, 2);
    }

    #[test]
    fn run_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");

        let result = run(&path, "text");
        assert!(result.is_err());
    }
}
