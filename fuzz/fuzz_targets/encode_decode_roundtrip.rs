#![no_main]

use std::io::Read;

use arbitrary::{Arbitrary, Unstructured};
use blockz_decoder::{CompressedInputStream, DecoderConfig};
use blockz_encoder::{encode_all, EncoderConfig};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    payload: Vec<u8>,
    block_kib: u8,
    encode_jobs: u8,
    decode_jobs: u8,
    checksums: bool,
}

// Fuzz target: CompressedOutputStream -> CompressedInputStream roundtrip.
//
// The decoder must reproduce every payload the encoder accepts.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut u) else {
        return;
    };

    let config = EncoderConfig {
        block_size: (usize::from(input.block_kib % 8) + 1) * 1024,
        jobs: usize::from(input.encode_jobs % 4) + 1,
        checksums: input.checksums,
        ..EncoderConfig::default()
    };
    let container = encode_all(&input.payload, &config).unwrap();

    let decoder_config = DecoderConfig {
        jobs: usize::from(input.decode_jobs % 4) + 1,
    };
    let mut stream = CompressedInputStream::new(container.as_slice(), decoder_config).unwrap();
    let mut decoded = Vec::new();
    stream.read_to_end(&mut decoded).unwrap();
    stream.close().unwrap();
    assert_eq!(decoded, input.payload);
});
