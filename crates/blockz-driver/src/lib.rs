#![warn(clippy::pedantic)]

pub mod compressor;
pub mod config;
pub mod decompressor;
pub mod endpoint;
pub mod error;
pub mod exit_code;
pub mod info_printer;

pub use blockz_types::{Event, EventKind, Listener, ListenerError, Listeners};
pub use compressor::{BlockCompressor, EncodeFailure, EncodeStats};
pub use config::{CompressConfig, DecompressConfig};
pub use decompressor::{BlockDecompressor, DecodeFailure, DecodeStats, DEFAULT_BUFFER_SIZE};
pub use error::DriverError;
pub use exit_code::{ExitCode, RunResult};
pub use info_printer::InfoPrinter;
