use std::io::{self, Write};

use blockz_wire::{
    clamp_jobs, BlockzHeader, DataFrame, Frame, FrameFlags, HeaderFlags, MAX_BLOCK_SIZE,
};
use log::debug;
use rayon::prelude::*;

use crate::compression::{compress, DEFAULT_COMPRESSION_LEVEL};
use crate::error::EncodeError;

/// Smallest accepted block size.
pub const MIN_BLOCK_SIZE: usize = 1024;

/// Default block size: 1 MiB.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Encoder settings.
///
/// ```text
/// ┌────────────┬────────────────────────────────────────────────────┐
/// │ Field      │ Purpose                                            │
/// ├────────────┼────────────────────────────────────────────────────┤
/// │ block_size │ Decoded bytes per DATA frame (1 KiB ..= 64 MiB)    │
/// │ jobs       │ Blocks compressed concurrently (clamped to 1..=64) │
/// │ checksums  │ Append a CRC-32 of each decoded block              │
/// │ level      │ zstd level                                         │
/// └────────────┴────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    pub block_size: usize,
    pub jobs: usize,
    pub checksums: bool,
    pub level: i32,
}

impl EncoderConfig {
    /// Check that the settings can produce a readable container.
    ///
    /// # Errors
    ///
    /// [`EncodeError::InvalidBlockSize`] when `block_size` is outside
    /// `MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE`.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.block_size < MIN_BLOCK_SIZE || self.block_size as u64 > MAX_BLOCK_SIZE {
            return Err(EncodeError::InvalidBlockSize {
                size: self.block_size,
                min: MIN_BLOCK_SIZE,
                max: MAX_BLOCK_SIZE,
            });
        }
        Ok(())
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            jobs: 1,
            checksums: true,
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Streaming blockz encoder, the inverse of the decoder's
/// `CompressedInputStream`.
///
/// Bytes written through [`io::Write`] are cut into `block_size` blocks.
/// Full blocks are queued until `jobs` of them are pending, then compressed
/// as one batch (in parallel when `jobs > 1`) and framed in order. Nothing
/// is framed until a block is full, so [`finish`](Self::finish) must be
/// called to emit the last partial block and the END frame.
///
/// # Example
///
/// ```rust
/// use std::io::Write;
/// use blockz_encoder::{CompressedOutputStream, EncoderConfig};
///
/// let mut stream = CompressedOutputStream::new(Vec::new(), EncoderConfig::default()).unwrap();
/// stream.write_all(b"hello!").unwrap();
/// let container = stream.finish().unwrap();
/// assert_eq!(&container[0..4], b"BLZ\0");
/// ```
pub struct CompressedOutputStream<W: Write> {
    writer: W,
    config: EncoderConfig,
    pool: Option<rayon::ThreadPool>,
    /// The block currently being filled.
    current: Vec<u8>,
    /// Full blocks waiting for the next batch.
    pending: Vec<Vec<u8>>,
    total_in: u64,
    total_written: u64,
    blocks_written: u64,
}

impl<W: Write> CompressedOutputStream<W> {
    /// Validate `config`, start the worker pool if needed and write the
    /// container header.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::InvalidBlockSize`] for a block size out of range.
    /// - [`EncodeError::ThreadPool`] if the rayon pool cannot be built.
    /// - [`EncodeError::Io`] if the header cannot be written.
    pub fn new(mut writer: W, mut config: EncoderConfig) -> Result<Self, EncodeError> {
        config.validate()?;
        config.jobs = clamp_jobs(config.jobs);

        let pool = if config.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.jobs)
                .build()
                .map_err(|e| EncodeError::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        let flags = if config.checksums {
            HeaderFlags::CHECKSUMS
        } else {
            HeaderFlags::NONE
        };
        let header = BlockzHeader::new(flags).to_bytes();
        writer.write_all(&header)?;

        Ok(Self {
            writer,
            current: Vec::with_capacity(config.block_size),
            config,
            pool,
            pending: Vec::new(),
            total_in: 0,
            total_written: header.len() as u64,
            blocks_written: 0,
        })
    }

    /// Decoded bytes accepted so far.
    #[must_use]
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Container bytes written to the inner writer so far.
    #[must_use]
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    #[must_use]
    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    /// Frame the remaining data, write the END frame and return the writer.
    ///
    /// # Errors
    ///
    /// Propagates framing and writer errors.
    pub fn finish(mut self) -> Result<W, EncodeError> {
        if !self.current.is_empty() {
            let last = std::mem::take(&mut self.current);
            self.pending.push(last);
        }
        self.flush_batch()?;

        let end = Frame::End {
            total_len: self.total_in,
        };
        self.total_written += end.write_to(&mut self.writer)? as u64;
        self.writer.flush()?;

        debug!(
            "encoded {} bytes into {} blocks ({} bytes)",
            self.total_in, self.blocks_written, self.total_written
        );
        Ok(self.writer)
    }

    fn accept(&mut self, mut data: &[u8]) -> Result<(), EncodeError> {
        while !data.is_empty() {
            let room = self.config.block_size - self.current.len();
            let take = room.min(data.len());
            self.current.extend_from_slice(&data[..take]);
            data = &data[take..];
            self.total_in += take as u64;

            if self.current.len() == self.config.block_size {
                let full = std::mem::replace(
                    &mut self.current,
                    Vec::with_capacity(self.config.block_size),
                );
                self.pending.push(full);
                if self.pending.len() >= self.config.jobs {
                    self.flush_batch()?;
                }
            }
        }
        Ok(())
    }

    /// Compress every pending block and write the frames in order.
    fn flush_batch(&mut self) -> Result<(), EncodeError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let blocks = std::mem::take(&mut self.pending);
        let (level, checksums) = (self.config.level, self.config.checksums);

        let frames: Vec<Frame> = match &self.pool {
            Some(pool) => pool.install(|| {
                blocks
                    .par_iter()
                    .map(|block| encode_block(block, level, checksums))
                    .collect()
            }),
            None => blocks
                .iter()
                .map(|block| encode_block(block, level, checksums))
                .collect(),
        };

        for frame in &frames {
            self.total_written += frame.write_to(&mut self.writer)? as u64;
            self.blocks_written += 1;
        }
        Ok(())
    }
}

impl<W: Write> Write for CompressedOutputStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.accept(buf).map_err(|e| match e {
            EncodeError::Io(io) => io,
            other => io::Error::other(other),
        })?;
        Ok(buf.len())
    }

    /// Flushes the inner writer only; a partially filled block stays
    /// buffered until it is full or the stream is finished.
    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Compress one block into a DATA frame, falling back to verbatim storage.
fn encode_block(block: &[u8], level: i32, checksums: bool) -> Frame {
    let checksum = checksums.then(|| crc32fast::hash(block));
    let (flags, body) = match compress(block, level) {
        Some(compressed) => (FrameFlags::COMPRESSED, compressed),
        None => (FrameFlags::NONE, block.to_vec()),
    };
    Frame::Data(DataFrame {
        flags,
        raw_len: block.len() as u64,
        body,
        checksum,
    })
}

/// Encode a complete in-memory payload.
///
/// # Errors
///
/// Same as [`CompressedOutputStream::new`] and
/// [`CompressedOutputStream::finish`].
pub fn encode_all(data: &[u8], config: &EncoderConfig) -> Result<Vec<u8>, EncodeError> {
    let mut stream = CompressedOutputStream::new(Vec::new(), config.clone())?;
    stream.accept(data)?;
    stream.finish()
}
