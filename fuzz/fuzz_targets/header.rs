#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: BlockzHeader::read_from with arbitrary bytes.
//
// Catches bugs in:
// - Magic byte validation
// - Version checking
// - Reserved byte enforcement
// - Truncated header handling
fuzz_target!(|data: &[u8]| {
    let _ = blockz_wire::BlockzHeader::read_from(data);
});
