use std::collections::VecDeque;
use std::io::{self, BufReader, Read};
use std::sync::Arc;

use blockz_types::{Event, EventKind, Listener, Listeners};
use blockz_wire::{clamp_jobs, BlockzHeader, DataFrame, Frame, MAX_BLOCK_SIZE};
use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::decompression::decode_block;
use crate::error::DecodeError;

/// Decoder settings.
///
/// `jobs` is the number of blocks decoded concurrently; `0` and `1` both
/// mean serial decoding on the caller's thread. Hints above
/// [`MAX_JOBS`](blockz_wire::MAX_JOBS) are clamped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    pub jobs: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

/// Internal state machine.
///
/// ```text
///   Blocks ──END frame──▶ Drained ──close()──▶ Closed
///      └───────────────close()───────────────────▲
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    Blocks,
    Drained { declared_total: u64 },
    Closed,
}

/// Counts bytes pulled through the inner reader.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// The blockz stream decoder.
///
/// Wraps any [`Read`] source holding a blockz container and hands out the
/// decoded bytes through [`read`](Self::read). Frames are pulled in
/// batches of up to `jobs`; a batch is decompressed on a rayon pool when
/// `jobs > 1`, but blocks are always delivered in stream order.
///
/// # Read contract
///
/// `read` fills the caller's buffer completely unless the END frame has
/// been reached. A short read therefore means the stream is exhausted, and
/// the following call returns `Ok(0)`.
///
/// # Events
///
/// For every block, attached listeners receive `BlockInfo` (stored size,
/// checksum), `BeforeDecode` (stored size) and `AfterDecode` (decoded
/// size; `skipped` when the block was stored verbatim).
///
/// # Example
///
/// ```rust
/// use blockz_decoder::{CompressedInputStream, DecoderConfig};
/// use blockz_encoder::{encode_all, EncoderConfig};
///
/// let container = encode_all(b"hello!", &EncoderConfig::default()).unwrap();
/// let mut stream = CompressedInputStream::new(&container[..], DecoderConfig::default()).unwrap();
/// let mut buf = [0u8; 64];
/// assert_eq!(stream.read(&mut buf).unwrap(), 6);
/// assert_eq!(stream.read(&mut buf).unwrap(), 0);
/// stream.close().unwrap();
/// ```
pub struct CompressedInputStream<R: Read> {
    reader: CountingReader<BufReader<R>>,
    header: BlockzHeader,
    listeners: Listeners,
    pool: Option<rayon::ThreadPool>,
    jobs: usize,
    /// Decoded blocks not yet handed to the caller.
    ready: VecDeque<Vec<u8>>,
    current: Vec<u8>,
    pos: usize,
    state: StreamState,
    next_block: u64,
    total_decoded: u64,
}

impl<R: Read> CompressedInputStream<R> {
    /// Open a stream: read and validate the header and start the worker
    /// pool when `config.jobs > 1`.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidHeader`] if the header is malformed,
    ///   unsupported, truncated or unreadable.
    /// - [`DecodeError::ThreadPool`] if the rayon pool cannot be built.
    pub fn new(reader: R, config: DecoderConfig) -> Result<Self, DecodeError> {
        let mut reader = CountingReader {
            inner: BufReader::new(reader),
            count: 0,
        };
        let header = BlockzHeader::read_from_stream(&mut reader).map_err(DecodeError::InvalidHeader)?;

        let jobs = clamp_jobs(config.jobs);
        if jobs < config.jobs {
            warn!("{} jobs requested, using {jobs}", config.jobs);
        }
        let pool = if jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| DecodeError::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        debug!(
            "opened blockz v{}.{} stream (checksums: {}, jobs: {jobs})",
            header.version_major,
            header.version_minor,
            header.flags.has_checksums()
        );

        Ok(Self {
            reader,
            header,
            listeners: Listeners::new(),
            pool,
            jobs,
            ready: VecDeque::new(),
            current: Vec::new(),
            pos: 0,
            state: StreamState::Blocks,
            next_block: 0,
            total_decoded: 0,
        })
    }

    #[must_use]
    pub fn header(&self) -> &BlockzHeader {
        &self.header
    }

    pub fn add_listener(&mut self, listener: Arc<dyn Listener>) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn Listener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Container bytes consumed from the source so far, header included.
    #[must_use]
    pub fn total_read(&self) -> u64 {
        self.reader.count
    }

    /// Decoded bytes produced so far (including any not yet handed out).
    #[must_use]
    pub fn total_decoded(&self) -> u64 {
        self.total_decoded
    }

    /// Fill `buf` with decoded bytes.
    ///
    /// Returns `buf.len()` while data remains, fewer bytes only once the
    /// END frame has been reached, and `0` after that.
    ///
    /// # Errors
    ///
    /// Any frame, decompression or validation error, [`DecodeError::MissingEnd`]
    /// for a truncated stream, and [`DecodeError::Closed`] after
    /// [`close`](Self::close). The stream must not be read again after an
    /// error.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        if self.state == StreamState::Closed {
            return Err(DecodeError::Closed);
        }

        let mut filled = 0;
        while filled < buf.len() {
            if self.pos == self.current.len() {
                if let Some(block) = self.ready.pop_front() {
                    self.current = block;
                    self.pos = 0;
                    continue;
                }
                if !self.decode_next_batch()? {
                    break;
                }
                continue;
            }

            let n = (buf.len() - filled).min(self.current.len() - self.pos);
            buf[filled..filled + n].copy_from_slice(&self.current[self.pos..self.pos + n]);
            self.pos += n;
            filled += n;
        }

        Ok(filled)
    }

    /// Finish the stream.
    ///
    /// When the END frame has been reached, checks that the decoded total
    /// matches the END frame and that nothing follows it. Closing before
    /// the END frame only releases the stream. Calling `close` again is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::LengthMismatch`] (with `block: None`) if the END
    ///   total disagrees with the decoded byte count.
    /// - [`DecodeError::TrailingData`] if bytes follow the END frame.
    /// - [`DecodeError::Io`] if probing for trailing data fails.
    pub fn close(&mut self) -> Result<(), DecodeError> {
        let state = std::mem::replace(&mut self.state, StreamState::Closed);
        let StreamState::Drained { declared_total } = state else {
            return Ok(());
        };

        if declared_total != self.total_decoded {
            return Err(DecodeError::LengthMismatch {
                block: None,
                expected: declared_total,
                actual: self.total_decoded,
            });
        }

        let mut probe = [0u8; 1];
        loop {
            match self.reader.read(&mut probe) {
                Ok(0) => return Ok(()),
                Ok(_) => return Err(DecodeError::TrailingData),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(DecodeError::Io(e)),
            }
        }
    }

    /// Pull up to `jobs` frames, decode them and queue the results.
    ///
    /// Returns `Ok(false)` when no more blocks remain.
    fn decode_next_batch(&mut self) -> Result<bool, DecodeError> {
        if !matches!(self.state, StreamState::Blocks) {
            return Ok(false);
        }

        let checksums = self.header.flags.has_checksums();
        let mut batch: Vec<(u64, DataFrame)> = Vec::with_capacity(self.jobs);

        while batch.len() < self.jobs {
            match Frame::read_from_stream(&mut self.reader, checksums, MAX_BLOCK_SIZE)? {
                Some(Frame::Data(frame)) => {
                    let id = self.next_block;
                    self.next_block += 1;
                    self.listeners.notify(
                        &Event::block(EventKind::BlockInfo, id, frame.body.len() as u64)
                            .with_checksum(frame.checksum),
                    );
                    batch.push((id, frame));
                }
                Some(Frame::End { total_len }) => {
                    trace!("END frame after {} blocks, declared total {total_len}", self.next_block);
                    self.state = StreamState::Drained {
                        declared_total: total_len,
                    };
                    break;
                }
                None => return Err(DecodeError::MissingEnd),
            }
        }

        if batch.is_empty() {
            return Ok(false);
        }

        // Captured before the frames move into the workers.
        let meta: Vec<(u64, bool, Option<u32>)> = batch
            .iter()
            .map(|(id, frame)| (*id, frame.flags.is_compressed(), frame.checksum))
            .collect();
        for (id, frame) in &batch {
            self.listeners.notify(&Event::block(
                EventKind::BeforeDecode,
                *id,
                frame.body.len() as u64,
            ));
        }

        let decoded: Vec<Result<Vec<u8>, DecodeError>> = match &self.pool {
            Some(pool) => pool.install(|| {
                batch
                    .into_par_iter()
                    .map(|(id, frame)| decode_block(id, frame))
                    .collect()
            }),
            None => batch
                .into_iter()
                .map(|(id, frame)| decode_block(id, frame))
                .collect(),
        };

        for ((id, compressed, checksum), result) in meta.into_iter().zip(decoded) {
            let block = result?;
            self.total_decoded += block.len() as u64;
            self.listeners.notify(
                &Event::block(EventKind::AfterDecode, id, block.len() as u64)
                    .with_checksum(checksum)
                    .with_skipped(!compressed),
            );
            self.ready.push_back(block);
        }

        Ok(true)
    }
}

impl<R: Read> Read for CompressedInputStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        CompressedInputStream::read(self, buf).map_err(|e| match e {
            DecodeError::Io(io) => io,
            other => io::Error::other(other),
        })
    }
}
