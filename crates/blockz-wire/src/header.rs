use std::io::Read;

use crate::error::WireError;

/// Magic number: ASCII "BLZ\0".
/// Stored as raw bytes so byte order never enters the comparison.
pub const BLOCKZ_MAGIC: [u8; 4] = [0x42, 0x4C, 0x5A, 0x00];

/// Total header size in bytes (fixed).
pub const HEADER_SIZE: usize = 8;

/// Current container version major.
pub const VERSION_MAJOR: u8 = 1;

/// Current container version minor.
pub const VERSION_MINOR: u8 = 0;

/// Header flags bitfield.
///
/// Bit layout:
///   bit 0 = checksummed (every DATA frame carries a CRC-32 trailer)
///   bits 1-7 = reserved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeaderFlags(u8);

impl HeaderFlags {
    /// Every DATA frame ends with a CRC-32 of its decoded bytes.
    pub const CHECKSUMS: Self = Self(0b0000_0001);

    /// No flags set.
    pub const NONE: Self = Self(0);

    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn has_checksums(self) -> bool {
        self.0 & Self::CHECKSUMS.0 != 0
    }
}

/// Container header: the first 8 bytes of every blockz stream.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────┐
/// │ Offset │ Size    │ Description                      │
/// ├────────┼─────────┼──────────────────────────────────┤
/// │ 0x00   │ 4 bytes │ Magic: "BLZ\0"                   │
/// │ 0x04   │ 1 byte  │ Version major                    │
/// │ 0x05   │ 1 byte  │ Version minor                    │
/// │ 0x06   │ 1 byte  │ Flags                            │
/// │ 0x07   │ 1 byte  │ Reserved (0x00)                  │
/// └────────┴─────────┴──────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockzHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub flags: HeaderFlags,
}

impl BlockzHeader {
    /// Create a header with the current version and the given flags.
    #[must_use]
    pub fn new(flags: HeaderFlags) -> Self {
        Self {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            flags,
        }
    }

    /// Serialize the header into its fixed 8-byte form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&BLOCKZ_MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6] = self.flags.raw();
        buf
    }

    /// Parse a header from the first 8 bytes of `buf`.
    ///
    /// Validation order is magic, then version, then reserved byte, so
    /// the first failure reported is the most useful one.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if the buffer is too short.
    /// - [`WireError::InvalidMagic`] if the magic number doesn't match.
    /// - [`WireError::UnsupportedVersion`] if the major version is unknown.
    /// - [`WireError::ReservedNonZero`] if the reserved byte is not 0x00.
    pub fn read_from(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }

        if buf[0..4] != BLOCKZ_MAGIC {
            let found = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
            return Err(WireError::InvalidMagic { found });
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major != VERSION_MAJOR {
            return Err(WireError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        if buf[7] != 0x00 {
            return Err(WireError::ReservedNonZero {
                offset: 7,
                value: buf[7],
            });
        }

        Ok(Self {
            version_major,
            version_minor,
            flags: HeaderFlags::from_raw(buf[6]),
        })
    }

    /// Read and validate a header from the front of a byte stream.
    ///
    /// # Errors
    ///
    /// Same as [`read_from`](Self::read_from); a stream shorter than 8
    /// bytes is [`WireError::UnexpectedEof`] at the number of bytes seen.
    pub fn read_from_stream(r: &mut impl Read) -> Result<Self, WireError> {
        let mut buf = [0u8; HEADER_SIZE];
        let mut filled = 0;
        while filled < HEADER_SIZE {
            match r.read(&mut buf[filled..]) {
                Ok(0) => return Err(WireError::UnexpectedEof { offset: filled }),
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(WireError::Io(e)),
            }
        }
        Self::read_from(&buf)
    }
}
