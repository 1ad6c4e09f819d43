use std::io::Cursor;

/// Default zstd compression level (1–22 scale).
///
/// Level 3 balances speed and ratio for general-purpose blocks; higher
/// levels give diminishing returns for the latency cost.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Compress one block with zstd.
///
/// Returns `Some(compressed)` only if compression made the block smaller.
/// `None` tells the caller to store the block verbatim, so compression is
/// never harmful. A zstd failure is treated the same way.
#[must_use]
pub fn compress(data: &[u8], level: i32) -> Option<Vec<u8>> {
    let compressed = zstd::encode_all(Cursor::new(data), level).ok()?;
    if compressed.len() < data.len() {
        Some(compressed)
    } else {
        None
    }
}
