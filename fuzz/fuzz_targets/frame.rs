#![no_main]

use std::io::Cursor;

use blockz_wire::{Frame, MAX_BLOCK_SIZE};
use libfuzzer_sys::fuzz_target;

// Fuzz target: Frame::read_from_stream over a whole byte sequence.
//
// First byte selects whether checksum trailers are expected.
//
// Catches bugs in:
// - Varint overflow in tags and lengths
// - Truncated frames and checksum trailers
// - Oversized length rejection before allocation
fuzz_target!(|data: &[u8]| {
    let Some((&mode, rest)) = data.split_first() else {
        return;
    };
    let mut cursor = Cursor::new(rest);
    while let Ok(Some(_)) = Frame::read_from_stream(&mut cursor, mode & 1 == 1, MAX_BLOCK_SIZE) {}
});
