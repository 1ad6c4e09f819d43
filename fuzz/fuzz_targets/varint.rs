#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: LEB128 varint slice and stream decoders must agree.
fuzz_target!(|data: &[u8]| {
    let from_slice = blockz_wire::varint::decode_varint(data);
    let from_stream = blockz_wire::varint::read_varint_from(&mut &data[..]);
    if let Ok((value, _)) = from_slice {
        assert_eq!(from_stream.ok().flatten(), Some(value));
    }
});
