use blockz_wire::WireError;

/// Errors that can occur while decoding a blockz stream.
///
/// Construction only fails with `InvalidHeader` or `ThreadPool`; every
/// other variant surfaces from `read` or `close`, by which point the
/// caller may already have consumed decoded bytes.
///
/// ```text
///   DecodeError
///   ├── InvalidHeader(WireError)   ← magic, version, reserved byte, short header
///   ├── ThreadPool                 ← worker pool for jobs > 1 could not start
///   ├── MissingEnd                 ← stream ran out before the END frame
///   ├── DecompressFailed           ← zstd rejected a block body
///   ├── LengthMismatch             ← decoded size differs from declared size
///   ├── ChecksumMismatch           ← CRC-32 of a decoded block is wrong
///   ├── TrailingData               ← bytes after the END frame
///   ├── Closed                     ← read after close
///   ├── Wire(WireError)            ← frame parsing
///   └── Io(std::io::Error)         ← underlying reader
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The 8-byte container header failed validation or could not be read.
    #[error("invalid header: {0}")]
    InvalidHeader(WireError),

    #[error("cannot start decoder thread pool: {0}")]
    ThreadPool(String),

    /// The frame sequence ended without an END frame: the input is truncated.
    #[error("stream ended without END frame")]
    MissingEnd,

    #[error("block {block}: zstd decompression failed: {reason}")]
    DecompressFailed { block: u64, reason: String },

    /// `block` is `None` when the mismatch is against the END frame total.
    #[error("decoded length mismatch{}: expected {expected}, got {actual}", fmt_block(.block))]
    LengthMismatch {
        block: Option<u64>,
        expected: u64,
        actual: u64,
    },

    #[error("block {block}: checksum mismatch: expected {expected:#010X}, found {found:#010X}")]
    ChecksumMismatch { block: u64, expected: u32, found: u32 },

    #[error("unexpected data after END frame")]
    TrailingData,

    #[error("stream is closed")]
    Closed,

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[allow(clippy::ref_option)]
fn fmt_block(block: &Option<u64>) -> String {
    block.map_or_else(String::new, |b| format!(" in block {b}"))
}
