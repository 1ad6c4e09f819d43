use std::io::{self, Read, Write};

use crate::error::WireError;

/// Maximum number of bytes a u64 varint can occupy.
/// ceil(64 / 7) = 10 bytes.
pub const MAX_VARINT_BYTES: usize = 10;

/// Encode a `u64` value as an unsigned LEB128 varint into the provided buffer.
///
/// # Returns
///
/// The number of bytes written (1–10).
///
/// # Panics
///
/// Panics if `buf` is shorter than the required encoding length.
/// A 10-byte buffer is always sufficient for any `u64`.
///
/// | Value   | Encoded bytes        | Length |
/// |---------|----------------------|--------|
/// | 0       | `[0x00]`             | 1      |
/// | 127     | `[0x7F]`             | 1      |
/// | 128     | `[0x80, 0x01]`       | 2      |
/// | 32768   | `[0x80, 0x80, 0x02]` | 3      |
pub fn encode_varint(mut value: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value > 0 {
            byte |= 0x80;
        }

        buf[i] = byte;
        i += 1;

        if value == 0 {
            break;
        }
    }
    i
}

/// Encode `value` and write it to `w`, returning the number of bytes written.
///
/// # Errors
///
/// Propagates the writer's I/O error.
pub fn write_varint(w: &mut impl Write, value: u64) -> io::Result<usize> {
    let mut buf = [0u8; MAX_VARINT_BYTES];
    let n = encode_varint(value, &mut buf);
    w.write_all(&buf[..n])?;
    Ok(n)
}

/// Decode an unsigned LEB128 varint from the provided byte slice.
///
/// # Returns
///
/// `(decoded_value, bytes_consumed)` on success.
///
/// # Errors
///
/// - [`WireError::VarintTooLong`] if more than 10 bytes are consumed
///   without finding a terminating byte.
/// - [`WireError::UnexpectedEof`] if the slice ends mid-varint.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), WireError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_BYTES {
            return Err(WireError::VarintTooLong);
        }

        result |= u64::from(byte & 0x7F) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(WireError::UnexpectedEof { offset: buf.len() })
}

/// Read a single varint from a byte stream.
///
/// Bytes are pulled one at a time so the reader is never advanced past
/// the varint. Returns `Ok(None)` if the stream is already at EOF before
/// the first byte; EOF after the first byte is [`WireError::UnexpectedEof`]
/// with `offset` set to the number of varint bytes read.
///
/// # Errors
///
/// - [`WireError::VarintTooLong`] past 10 bytes.
/// - [`WireError::UnexpectedEof`] if the stream ends mid-varint.
/// - [`WireError::Io`] for any other reader failure.
pub fn read_varint_from(r: &mut impl Read) -> Result<Option<u64>, WireError> {
    let mut varint_buf = [0u8; MAX_VARINT_BYTES];
    let mut len = 0;

    loop {
        let mut byte = [0u8; 1];
        match r.read(&mut byte) {
            Ok(0) if len == 0 => return Ok(None),
            Ok(0) => return Err(WireError::UnexpectedEof { offset: len }),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(WireError::Io(e)),
        }

        varint_buf[len] = byte[0];
        len += 1;

        if byte[0] & 0x80 == 0 {
            break;
        }
        if len >= MAX_VARINT_BYTES {
            return Err(WireError::VarintTooLong);
        }
    }

    let (value, _) = decode_varint(&varint_buf[..len])?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(value: u64) -> Vec<u8> {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let len = encode_varint(value, &mut buf);
        buf[..len].to_vec()
    }

    #[test]
    fn encode_single_byte_values() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(127), vec![0x7F]);
    }

    #[test]
    fn encode_default_buffer_size() {
        // 32 KiB is the orchestrator's read buffer; 3 bytes on the wire.
        assert_eq!(encode(32_768), vec![0x80, 0x80, 0x02]);
    }

    #[test]
    fn encode_u64_max_uses_ten_bytes() {
        assert_eq!(encode(u64::MAX).len(), MAX_VARINT_BYTES);
    }

    #[test]
    fn decode_with_trailing_bytes() {
        let buf = [0xAC, 0x02, 0xFF, 0xFF];
        let (value, consumed) = decode_varint(&buf).unwrap();
        assert_eq!(value, 300);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn decode_truncated_varint() {
        let result = decode_varint(&[0x80]);
        assert!(matches!(result, Err(WireError::UnexpectedEof { .. })));
    }

    #[test]
    fn decode_too_long() {
        let buf = [0x80; 11];
        assert!(matches!(decode_varint(&buf), Err(WireError::VarintTooLong)));
    }

    #[test]
    fn stream_read_stops_after_varint() {
        let mut cursor = Cursor::new(vec![0xAC, 0x02, 0x7F]);
        assert_eq!(read_varint_from(&mut cursor).unwrap(), Some(300));
        assert_eq!(cursor.position(), 2);
        assert_eq!(read_varint_from(&mut cursor).unwrap(), Some(127));
    }

    #[test]
    fn stream_read_clean_eof_is_none() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(read_varint_from(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn stream_read_eof_mid_varint() {
        let mut cursor = Cursor::new(vec![0x80, 0x80]);
        let result = read_varint_from(&mut cursor);
        assert!(matches!(result, Err(WireError::UnexpectedEof { offset: 2 })));
    }

    #[test]
    fn write_varint_matches_encode() {
        let mut out = Vec::new();
        let n = write_varint(&mut out, 16_384).unwrap();
        assert_eq!(n, 3);
        assert_eq!(out, encode(16_384));
    }
}
