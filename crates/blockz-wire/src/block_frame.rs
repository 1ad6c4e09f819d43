use std::io::{self, Read, Write};

use crate::error::WireError;
use crate::varint::{read_varint_from, write_varint};

/// Largest decoded size a single block may declare (64 MiB).
///
/// Encoders never produce larger blocks; readers pass this as the
/// `max_len` of [`Frame::read_from_stream`].
pub const MAX_BLOCK_SIZE: u64 = 64 * 1024 * 1024;

/// Most blocks a reader or writer may hold in one batch.
///
/// Together with [`MAX_BLOCK_SIZE`] this bounds the memory a batch can
/// pin, whatever concurrency the caller asks for.
pub const MAX_JOBS: usize = 64;

/// Map a concurrency hint onto `1..=MAX_JOBS`.
#[must_use]
pub fn clamp_jobs(hint: usize) -> usize {
    hint.clamp(1, MAX_JOBS)
}

/// Frame tags as they appear on the wire.
pub mod block_type {
    pub const DATA: u8 = 0x01;
    pub const END: u8 = 0xFF;
}

/// Per-frame flags bitfield.
///
/// Bit layout:
///   bit 0 = body is zstd-compressed (otherwise stored verbatim)
///   bits 1-7 = reserved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameFlags(u8);

impl FrameFlags {
    pub const NONE: Self = Self(0);
    pub const COMPRESSED: Self = Self(0b0000_0001);

    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_compressed(self) -> bool {
        self.0 & Self::COMPRESSED.0 != 0
    }
}

/// A DATA frame: one independently decodable block.
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │ block_type   (varint, 0x01)                      │
/// │ flags        (uint8)                             │
/// │ raw_len      (varint, decoded size)              │
/// │ content_len  (varint, stored size)               │
/// │ body         [content_len bytes]                 │
/// │ checksum     (u32 LE, only if header bit 0)      │
/// └──────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataFrame {
    pub flags: FrameFlags,

    /// Length of the block once decoded.
    pub raw_len: u64,

    /// Stored body (compressed or verbatim, per `flags`).
    pub body: Vec<u8>,

    /// CRC-32 of the decoded block, present iff the stream is checksummed.
    pub checksum: Option<u32>,
}

/// One unit of the frame sequence following the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Data(DataFrame),

    /// Terminator carrying the sum of every DATA frame's `raw_len`.
    End { total_len: u64 },
}

impl Frame {
    /// Write this frame to `w`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Propagates the writer's I/O error as [`WireError::Io`].
    pub fn write_to(&self, w: &mut impl Write) -> Result<usize, WireError> {
        match self {
            Frame::Data(data) => {
                let mut written = write_varint(w, u64::from(block_type::DATA))?;
                w.write_all(&[data.flags.raw()])?;
                written += 1;
                written += write_varint(w, data.raw_len)?;
                written += write_varint(w, data.body.len() as u64)?;
                w.write_all(&data.body)?;
                written += data.body.len();
                if let Some(checksum) = data.checksum {
                    w.write_all(&checksum.to_le_bytes())?;
                    written += 4;
                }
                Ok(written)
            }
            Frame::End { total_len } => {
                let mut written = write_varint(w, u64::from(block_type::END))?;
                written += write_varint(w, *total_len)?;
                Ok(written)
            }
        }
    }

    /// Read the next frame from a byte stream.
    ///
    /// `checksums` must mirror the header's checksum flag. `max_len` bounds
    /// both `raw_len` and `content_len` so a corrupt length never drives a
    /// huge allocation.
    ///
    /// Returns `Ok(None)` when the stream is at EOF before a frame tag.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnknownBlockType`] for a tag other than DATA/END.
    /// - [`WireError::FrameTooLarge`] when a length exceeds `max_len`.
    /// - [`WireError::UnexpectedEof`] if the stream ends inside a frame.
    /// - [`WireError::VarintTooLong`] / [`WireError::Io`] from the reader.
    pub fn read_from_stream(
        r: &mut impl Read,
        checksums: bool,
        max_len: u64,
    ) -> Result<Option<Self>, WireError> {
        let Some(tag) = read_varint_from(r)? else {
            return Ok(None);
        };

        match tag {
            t if t == u64::from(block_type::END) => {
                let total_len = require_varint(r)?;
                Ok(Some(Frame::End { total_len }))
            }
            t if t == u64::from(block_type::DATA) => {
                let mut flags = [0u8; 1];
                read_exact_or_eof(r, &mut flags)?;

                let raw_len = require_varint(r)?;
                let content_len = require_varint(r)?;
                for len in [raw_len, content_len] {
                    if len > max_len {
                        return Err(WireError::FrameTooLarge { len, limit: max_len });
                    }
                }

                let body = read_body(r, content_len)?;

                let checksum = if checksums {
                    let mut crc = [0u8; 4];
                    read_exact_or_eof(r, &mut crc)?;
                    Some(u32::from_le_bytes(crc))
                } else {
                    None
                };

                Ok(Some(Frame::Data(DataFrame {
                    flags: FrameFlags::from_raw(flags[0]),
                    raw_len,
                    body,
                    checksum,
                })))
            }
            other => Err(WireError::UnknownBlockType { tag: other }),
        }
    }
}

/// A varint that must be present: EOF here means a truncated frame.
fn require_varint(r: &mut impl Read) -> Result<u64, WireError> {
    read_varint_from(r)?.ok_or(WireError::UnexpectedEof { offset: 0 })
}

/// Read exactly `len` body bytes. The buffer grows with the data that
/// actually arrives, so a forged length costs nothing until it is backed
/// by input.
fn read_body(r: &mut impl Read, len: u64) -> Result<Vec<u8>, WireError> {
    let mut body = Vec::new();
    r.by_ref().take(len).read_to_end(&mut body)?;
    if (body.len() as u64) < len {
        return Err(WireError::UnexpectedEof { offset: body.len() });
    }
    Ok(body)
}

fn read_exact_or_eof(r: &mut impl Read, buf: &mut [u8]) -> Result<(), WireError> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            WireError::UnexpectedEof { offset: buf.len() }
        } else {
            WireError::Io(e)
        }
    })
}
