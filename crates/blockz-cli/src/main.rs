//! blockz command-line tool: compress and decompress `.blz` containers.
//!
//! # Command overview
//!
//! ```text
//! blockz <COMMAND> [OPTIONS]
//!
//! Commands:
//!   decompress   Decode a .blz container back into raw bytes
//!   compress     Encode raw bytes into a .blz container
//!   help         Print help information
//! ```
//!
//! # Exit codes
//!
//! | Code | Meaning                                   |
//! |------|-------------------------------------------|
//! | 0    | Success                                   |
//! | 5    | Input is not a readable blockz container  |
//! | 7    | Output exists and `--force` was not given |
//! | 8    | Output cannot be created                  |
//! | 10   | Input cannot be opened                    |
//! | 11   | Input read failed (compress)              |
//! | 12   | Output write failed                       |
//! | 13   | Block decode or encode failed             |
//! | 20   | Input and output are the same file        |
//!
//! Diagnostics go to stderr through `env_logger` so stdout can carry data.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::LevelFilter;

mod cmd_compress;
mod cmd_decompress;
mod profile;

// ── CLI root ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "blockz", version, about = "Block-parallel stream compressor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a .blz container back into raw bytes.
    Decompress(DecompressArgs),
    /// Encode raw bytes into a .blz container.
    Compress(CompressArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `blockz decompress`.
///
/// ```text
/// ┌──────────────┬───────────────────────────────────────────────────────┐
/// │ Flag         │ Values / default                                      │
/// ├──────────────┼───────────────────────────────────────────────────────┤
/// │ -i/--input   │ path or STDIN                                         │
/// │ -o/--output  │ path, STDOUT or NONE (default: input minus .blz)      │
/// │ -j/--jobs    │ blocks decoded concurrently (default 1)               │
/// │ -v/--verbose │ 0 silent … 5 (default 1)                              │
/// │ -f/--force   │ overwrite an existing output file                     │
/// │ --cpu-prof   │ write a JSON timing report to this path               │
/// └──────────────┴───────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct DecompressArgs {
    /// Compressed input file, or STDIN.
    #[arg(short, long)]
    pub input: String,

    /// Decoded output file, STDOUT, or NONE to discard.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of blocks decoded concurrently.
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Verbosity level (0 = silent).
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub verbose: u8,

    /// Overwrite the output file if it exists.
    #[arg(short, long)]
    pub force: bool,

    /// Write a JSON timing report for the run to this path.
    #[arg(long, value_name = "PATH")]
    pub cpu_prof: Option<PathBuf>,
}

/// Arguments for `blockz compress`.
#[derive(clap::Args)]
pub struct CompressArgs {
    /// Raw input file, or STDIN.
    #[arg(short, long)]
    pub input: String,

    /// Container output file, STDOUT, or NONE (default: input + .blz).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Block size in bytes; accepts K and M suffixes (e.g. 256K, 4M).
    #[arg(short, long, default_value = "1M", value_parser = cmd_compress::parse_block_size)]
    pub block: usize,

    /// zstd compression level.
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(i32).range(1..=22))]
    pub level: i32,

    /// Do not append a CRC-32 to each block.
    #[arg(long)]
    pub no_checksums: bool,

    /// Number of blocks compressed concurrently.
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Verbosity level (0 = silent).
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub verbose: u8,

    /// Overwrite the output file if it exists.
    #[arg(short, long)]
    pub force: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// `RUST_LOG` wins when set; otherwise the verbosity level picks the filter.
fn init_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => LevelFilter::Warn,
            1..=3 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        };
        builder.filter(None, level);
    }
    builder.format_timestamp(None).format_target(false).init();
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decompress(args) => {
            init_logging(args.verbose);
            cmd_decompress::run(&args)
        }
        Commands::Compress(args) => {
            init_logging(args.verbose);
            cmd_compress::run(&args)
        }
    };

    process::exit(result.code.code());
}
