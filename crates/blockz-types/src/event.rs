use std::fmt;

/// What an [`Event`] reports.
///
/// The run-level kinds are emitted by the driver around a whole
/// compression or decompression run. The block-level kinds originate in
/// the decoder and reach listeners verbatim.
///
/// ```text
///   DecompressionStart
///     BlockInfo → BeforeDecode → AfterDecode     (per block)
///     BlockInfo → BeforeDecode → AfterDecode
///     ...
///   DecompressionEnd                              (success only)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    CompressionStart,
    CompressionEnd,
    DecompressionStart,
    DecompressionEnd,
    /// A frame header was read: stored size and checksum are known.
    BlockInfo,
    /// A block is about to be decompressed.
    BeforeDecode,
    /// A block was decompressed (and verified, if checksummed).
    AfterDecode,
}

impl EventKind {
    /// True for kinds the decoder emits per block.
    #[must_use]
    pub fn is_block_level(self) -> bool {
        matches!(
            self,
            EventKind::BlockInfo | EventKind::BeforeDecode | EventKind::AfterDecode
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::CompressionStart => "compression-start",
            EventKind::CompressionEnd => "compression-end",
            EventKind::DecompressionStart => "decompression-start",
            EventKind::DecompressionEnd => "decompression-end",
            EventKind::BlockInfo => "block-info",
            EventKind::BeforeDecode => "before-decode",
            EventKind::AfterDecode => "after-decode",
        };
        f.write_str(name)
    }
}

/// An immutable progress notification.
///
/// `block_id` is `None` for run-level events. `size` is a byte count whose
/// meaning depends on the kind: stored size for `BlockInfo` and
/// `BeforeDecode`, decoded size for `AfterDecode`, compressed bytes read
/// for `DecompressionEnd`. `skipped` marks a degenerate block, i.e. one
/// stored verbatim with nothing to decompress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub block_id: Option<u64>,
    pub size: u64,
    pub checksum: Option<u32>,
    pub skipped: bool,
}

impl Event {
    /// A run-level event with no block index.
    #[must_use]
    pub fn run(kind: EventKind, size: u64) -> Self {
        Self {
            kind,
            block_id: None,
            size,
            checksum: None,
            skipped: false,
        }
    }

    /// A block-level event for block `block_id`.
    #[must_use]
    pub fn block(kind: EventKind, block_id: u64, size: u64) -> Self {
        Self {
            kind,
            block_id: Some(block_id),
            size,
            checksum: None,
            skipped: false,
        }
    }

    #[must_use]
    pub fn with_checksum(mut self, checksum: Option<u32>) -> Self {
        self.checksum = checksum;
        self
    }

    #[must_use]
    pub fn with_skipped(mut self, skipped: bool) -> Self {
        self.skipped = skipped;
        self
    }
}
