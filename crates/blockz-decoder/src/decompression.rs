use blockz_wire::DataFrame;

use crate::error::DecodeError;

/// Decode one DATA frame back into its block bytes.
///
/// Compressed bodies are decompressed into a buffer capped at the declared
/// `raw_len`, so a frame cannot expand past what it announced. The result
/// is then checked against `raw_len` and, if present, the CRC-32.
pub(crate) fn decode_block(block: u64, frame: DataFrame) -> Result<Vec<u8>, DecodeError> {
    let expected = frame.raw_len;
    // raw_len is bounded by MAX_BLOCK_SIZE when the frame is parsed.
    #[allow(clippy::cast_possible_truncation)]
    let capacity = expected as usize;

    let data = if frame.flags.is_compressed() {
        zstd::bulk::decompress(&frame.body, capacity).map_err(|e| {
            DecodeError::DecompressFailed {
                block,
                reason: e.to_string(),
            }
        })?
    } else {
        frame.body
    };

    if data.len() as u64 != expected {
        return Err(DecodeError::LengthMismatch {
            block: Some(block),
            expected,
            actual: data.len() as u64,
        });
    }

    if let Some(expected) = frame.checksum {
        let found = crc32fast::hash(&data);
        if found != expected {
            return Err(DecodeError::ChecksumMismatch {
                block,
                expected,
                found,
            });
        }
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockz_wire::FrameFlags;

    fn stored(body: &[u8], raw_len: u64, checksum: Option<u32>) -> DataFrame {
        DataFrame {
            flags: FrameFlags::NONE,
            raw_len,
            body: body.to_vec(),
            checksum,
        }
    }

    #[test]
    fn stored_block_passes_through() {
        let data = decode_block(0, stored(b"hello!", 6, Some(crc32fast::hash(b"hello!")))).unwrap();
        assert_eq!(data, b"hello!");
    }

    #[test]
    fn compressed_block_roundtrips() {
        let raw = "block ".repeat(500);
        let body = zstd::bulk::compress(raw.as_bytes(), 3).unwrap();
        let frame = DataFrame {
            flags: FrameFlags::COMPRESSED,
            raw_len: raw.len() as u64,
            body,
            checksum: None,
        };
        assert_eq!(decode_block(1, frame).unwrap(), raw.as_bytes());
    }

    #[test]
    fn corrupt_checksum_is_detected() {
        let result = decode_block(4, stored(b"hello!", 6, Some(0)));
        assert!(matches!(
            result,
            Err(DecodeError::ChecksumMismatch { block: 4, expected: 0, .. })
        ));
    }

    #[test]
    fn declared_length_is_enforced() {
        let result = decode_block(2, stored(b"hello!", 7, None));
        assert!(matches!(
            result,
            Err(DecodeError::LengthMismatch { block: Some(2), expected: 7, actual: 6 })
        ));
    }

    #[test]
    fn expansion_past_declared_length_fails() {
        let raw = vec![0u8; 10_000];
        let body = zstd::bulk::compress(&raw, 3).unwrap();
        let frame = DataFrame {
            flags: FrameFlags::COMPRESSED,
            raw_len: 100,
            body,
            checksum: None,
        };
        assert!(matches!(
            decode_block(0, frame),
            Err(DecodeError::DecompressFailed { block: 0, .. })
        ));
    }

    #[test]
    fn garbage_body_fails() {
        let frame = DataFrame {
            flags: FrameFlags::COMPRESSED,
            raw_len: 64,
            body: b"this is not zstd data".to_vec(),
            checksum: None,
        };
        assert!(matches!(
            decode_block(0, frame),
            Err(DecodeError::DecompressFailed { .. })
        ));
    }
}
