#![no_main]

use blockz_decoder::{CompressedInputStream, DecoderConfig};
use libfuzzer_sys::fuzz_target;

// Fuzz target: full stream decoder on arbitrary input.
//
// First byte picks the job count (1-4); the rest is the container.
// Reads with an odd buffer size to exercise block boundaries, then closes.
fuzz_target!(|data: &[u8]| {
    let Some((&jobs, container)) = data.split_first() else {
        return;
    };
    let config = DecoderConfig {
        jobs: usize::from(jobs % 4) + 1,
    };
    let Ok(mut stream) = CompressedInputStream::new(container, config) else {
        return;
    };
    let mut buf = [0u8; 777];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => return,
        }
    }
    let _ = stream.close();
});
