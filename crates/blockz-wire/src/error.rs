/// Errors raised while reading or writing the blockz container framing.
///
/// ```text
///   WireError
///   ├── VarintTooLong        ← varint ran past 10 bytes
///   ├── UnexpectedEof        ← input ended mid-structure
///   ├── InvalidMagic         ← first 4 bytes are not "BLZ\0"
///   ├── UnsupportedVersion   ← major version is not 1
///   ├── ReservedNonZero      ← reserved header byte set
///   ├── UnknownBlockType     ← frame tag is neither DATA nor END
///   ├── FrameTooLarge        ← declared length above the reader's limit
///   └── Io(std::io::Error)   ← underlying reader/writer failure
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Varint encoding exceeded 10 bytes without terminating.
    #[error("varint too long: exceeded 10-byte limit")]
    VarintTooLong,

    /// Input ended before a complete varint, header or frame could be read.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// Magic number did not match "BLZ\0".
    #[error("invalid magic number: expected \"BLZ\\0\", got {found:#010X}")]
    InvalidMagic { found: u32 },

    /// Unsupported container version.
    #[error("unsupported version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Reserved field was non-zero.
    #[error("reserved field at offset {offset} was {value:#04X}, expected 0x00")]
    ReservedNonZero { offset: usize, value: u8 },

    /// A frame started with a tag this version does not understand.
    #[error("unknown block type {tag:#04X}")]
    UnknownBlockType { tag: u64 },

    /// A frame declared a length above the reader's limit.
    #[error("frame length {len} exceeds limit {limit}")]
    FrameTooLarge { len: u64, limit: u64 },

    /// I/O error during read or write.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
