//! Golden fixture generator for the blockz conformance tests.
//!
//! Writes every fixture under `tests/golden/`. Frames are assembled with
//! `blockz-wire` directly and bodies are stored verbatim, so the output
//! does not depend on the zstd version in use.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_golden -p blockz-tests
//! ```
//!
//! # Generated fixtures
//!
//! | Directory                 | Contents                                  |
//! |---------------------------|-------------------------------------------|
//! | hello                     | One checksummed block "hello!"            |
//! | empty                     | Header and END only                       |
//! | unchecked                 | Two blocks, no checksums                  |
//! | edge_cases/trailing_data  | `hello` + 4 bytes after END               |
//! | edge_cases/bad_checksum   | `hello` with the CRC off by one bit       |
//! | edge_cases/wrong_total    | `hello` with END declaring 7 bytes        |
//! | edge_cases/missing_end    | `hello` without its END frame             |

#![allow(clippy::pedantic)]

use std::path::Path;

use blockz_wire::{BlockzHeader, DataFrame, Frame, FrameFlags, HeaderFlags};

fn stored(body: &[u8], checksums: bool) -> Frame {
    Frame::Data(DataFrame {
        flags: FrameFlags::NONE,
        raw_len: body.len() as u64,
        body: body.to_vec(),
        checksum: checksums.then(|| crc32fast::hash(body)),
    })
}

fn build(flags: HeaderFlags, frames: &[Frame]) -> Vec<u8> {
    let mut out = BlockzHeader::new(flags).to_bytes().to_vec();
    for frame in frames {
        frame.write_to(&mut out).expect("write to Vec cannot fail");
    }
    out
}

fn write(golden_dir: &Path, fixture: &str, bytes: &[u8]) {
    let dir = golden_dir.join(fixture);
    std::fs::create_dir_all(&dir).expect("create fixture dir");
    std::fs::write(dir.join("payload.blz"), bytes).expect("write fixture");
    println!("wrote {fixture} ({} bytes)", bytes.len());
}

fn main() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let golden_dir = manifest_dir.join("tests/golden");

    let hello = stored(b"hello!", true);
    let end6 = Frame::End { total_len: 6 };

    write(&golden_dir, "hello", &build(HeaderFlags::CHECKSUMS, &[hello.clone(), end6.clone()]));
    write(&golden_dir, "empty", &build(HeaderFlags::CHECKSUMS, &[Frame::End { total_len: 0 }]));
    write(
        &golden_dir,
        "unchecked",
        &build(
            HeaderFlags::NONE,
            &[stored(b"abc", false), stored(b"defg", false), Frame::End { total_len: 7 }],
        ),
    );

    let mut trailing = build(HeaderFlags::CHECKSUMS, &[hello.clone(), end6.clone()]);
    trailing.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    write(&golden_dir, "edge_cases/trailing_data", &trailing);

    let mut bad = hello.clone();
    if let Frame::Data(data) = &mut bad {
        data.checksum = data.checksum.map(|c| c ^ 1);
    }
    write(&golden_dir, "edge_cases/bad_checksum", &build(HeaderFlags::CHECKSUMS, &[bad, end6]));
    write(
        &golden_dir,
        "edge_cases/wrong_total",
        &build(HeaderFlags::CHECKSUMS, &[hello.clone(), Frame::End { total_len: 7 }]),
    );
    write(&golden_dir, "edge_cases/missing_end", &build(HeaderFlags::CHECKSUMS, &[hello]));
}
