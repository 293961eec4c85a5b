//! btdump CLI
//!
//! Read-only dump tool for btree database files.
//!
//! Prints every stored record as `<key>:<value>`, decoding both sides as
//! fixed-width unsigned integers. The width and byte order are explicit
//! options; the defaults (4 bytes, native order) match the databases this
//! tool was built against.

mod commands;

use btdump_codec::IntCodec;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Read-only dump tool for btree database files.
#[derive(Parser)]
#[command(name = "btdump")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database file
    dbfile: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Integer width of keys and values in bytes (4, 8)
    #[arg(short, long, default_value = "4")]
    width: String,

    /// Byte order of keys and values (native, little, big)
    #[arg(short, long, default_value = "native")]
    endian: String,

    /// Maximum number of records to dump
    #[arg(short, long)]
    limit: Option<usize>,

    /// Show store metadata instead of records
    #[arg(short, long)]
    meta: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; stderr keeps the dump output clean.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.meta {
        commands::meta::run(&cli.dbfile, &cli.format)?;
    } else {
        let codec = IntCodec::new(cli.width.parse()?, cli.endian.parse()?);
        commands::dump::run(&cli.dbfile, &codec, cli.limit, &cli.format)?;
    }

    Ok(())
}
