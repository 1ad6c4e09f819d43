//! Shared fixtures for the blockz integration tests and benchmarks.

#![allow(clippy::missing_panics_doc)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use blockz_encoder::{EncoderConfig, encode_all};
use blockz_types::{Event, EventKind, Listener, ListenerError};
use blockz_wire::{BlockzHeader, Frame, HEADER_SIZE, MAX_BLOCK_SIZE};

/// Deterministic payload mixing a repetitive run with a pseudo-random
/// tail, so containers hold both compressed and stored blocks.
#[must_use]
pub fn sample_payload(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    (0..len)
        .map(|i| {
            if i % 4096 < 2048 {
                b"the quick brown fox "[i % 20]
            } else {
                // xorshift32
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state.to_le_bytes()[0]
            }
        })
        .collect()
}

/// Encode `data` with the given block size and job count.
#[must_use]
pub fn container(data: &[u8], block_size: usize, jobs: usize) -> Vec<u8> {
    let config = EncoderConfig {
        block_size,
        jobs,
        ..EncoderConfig::default()
    };
    encode_all(data, &config).expect("fixture encoding must succeed")
}

/// Read `tests/golden/<fixture>/payload.blz`.
#[must_use]
pub fn golden(fixture: &str) -> Vec<u8> {
    let path = golden_path(fixture);
    std::fs::read(&path)
        .unwrap_or_else(|e| panic!("failed to read golden fixture {}: {e}", path.display()))
}

#[must_use]
pub fn golden_path(fixture: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/golden")
        .join(fixture)
        .join("payload.blz")
}

/// Lossy `&str` form of a path, as the driver takes endpoint names.
#[must_use]
pub fn name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// One line per header field and frame, for snapshot comparison.
///
/// ```text
/// header v1.0 checksums
/// DATA stored raw=6 body=6 crc=9A86C960
/// END total=6
/// ```
#[must_use]
pub fn describe_container(bytes: &[u8]) -> String {
    let header = BlockzHeader::read_from(bytes).expect("valid header");
    let mut lines = vec![format!(
        "header v{}.{} {}",
        header.version_major,
        header.version_minor,
        if header.flags.has_checksums() { "checksums" } else { "unchecked" }
    )];

    let mut cursor = Cursor::new(&bytes[HEADER_SIZE..]);
    let checksums = header.flags.has_checksums();
    while let Some(frame) = Frame::read_from_stream(&mut cursor, checksums, MAX_BLOCK_SIZE)
        .expect("valid frame")
    {
        lines.push(match frame {
            Frame::Data(data) => {
                let mode = if data.flags.is_compressed() { "zstd" } else { "stored" };
                let crc = data
                    .checksum
                    .map_or_else(String::new, |c| format!(" crc={c:08X}"));
                format!("DATA {mode} raw={} body={}{crc}", data.raw_len, data.body.len())
            }
            Frame::End { total_len } => format!("END total={total_len}"),
        });
    }
    lines.join("\n")
}

/// Listener that keeps every event it sees.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("recorder lock").clone()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }
}

impl Listener for RecordingListener {
    fn process_event(&self, event: &Event) -> Result<(), ListenerError> {
        self.events
            .lock()
            .map_err(|_| ListenerError("recorder poisoned".into()))?
            .push(*event);
        Ok(())
    }
}

/// Listener that rejects every event.
pub struct FailingListener;

impl Listener for FailingListener {
    fn process_event(&self, event: &Event) -> Result<(), ListenerError> {
        Err(ListenerError(format!("refusing {}", event.kind)))
    }
}

/// Listener that panics on every event.
pub struct PanickingListener;

impl Listener for PanickingListener {
    fn process_event(&self, event: &Event) -> Result<(), ListenerError> {
        panic!("listener blew up on {}", event.kind)
    }
}
