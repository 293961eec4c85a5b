//! Dump command implementation.

use btdump_codec::IntCodec;
use btdump_core::BtreeDb;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Decoded record representation for output.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Decoded key.
    pub key: u64,
    /// Decoded value.
    pub value: u64,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    codec: &IntCodec,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    debug!("dumping records from {:?}", path);

    let db = BtreeDb::open(path)?;
    let records = collect_records(&db, codec, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            print_text_output(&records);
        }
    }

    Ok(())
}

fn collect_records(
    db: &BtreeDb,
    codec: &IntCodec,
    limit: Option<usize>,
) -> Result<Vec<RecordInfo>, Box<dyn std::error::Error>> {
    let max_records = limit.unwrap_or(usize::MAX);
    let mut records = Vec::new();

    for result in db.records()? {
        if records.len() >= max_records {
            break;
        }
        let record = result?;
        records.push(RecordInfo {
            key: codec.decode(&record.key)?,
            value: codec.decode(&record.value)?,
        });
    }

    Ok(records)
}

fn print_text_output(records: &[RecordInfo]) {
    for record in records {
        println!("{}:{}", record.key, record.value);
    }
}
