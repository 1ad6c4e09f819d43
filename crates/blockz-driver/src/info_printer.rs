use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use blockz_types::{Event, EventKind, Listener, ListenerError};
use log::info;

/// Listener that logs per-block diagnostics.
///
/// Attached automatically when verbosity is 3 or more. At 3 it reports
/// the run boundaries and the stored size of each block; from 4 upward it
/// also reports decode timings per block. Everything goes through the
/// `log` facade under the `blockz::blocks` target, never to stdout, so
/// decoded output written to stdout stays clean.
pub struct InfoPrinter {
    verbosity: u8,
    started: Mutex<HashMap<u64, Instant>>,
}

impl InfoPrinter {
    #[must_use]
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            started: Mutex::new(HashMap::new()),
        }
    }

    /// Render `event` as a log line, or `None` if this verbosity skips it.
    ///
    /// # Errors
    ///
    /// Fails only if the timing table's lock was poisoned.
    pub fn describe(&self, event: &Event) -> Result<Option<String>, ListenerError> {
        let detailed = self.verbosity >= 4;
        let line = match (event.kind, event.block_id) {
            (EventKind::DecompressionStart, _) => Some("Decompression started".to_owned()),
            (EventKind::DecompressionEnd, _) => Some(format!(
                "Decompression finished: {} bytes read",
                event.size
            )),
            (EventKind::CompressionStart, _) => Some("Compression started".to_owned()),
            (EventKind::CompressionEnd, _) => Some(format!(
                "Compression finished: {} bytes written",
                event.size
            )),
            (EventKind::BlockInfo, Some(id)) => Some(match event.checksum {
                Some(crc) => format!("Block {id}: {} bytes stored [{crc:08X}]", event.size),
                None => format!("Block {id}: {} bytes stored", event.size),
            }),
            (EventKind::BeforeDecode, Some(id)) if detailed => {
                self.started
                    .lock()
                    .map_err(|_| ListenerError("timing table poisoned".into()))?
                    .insert(id, Instant::now());
                None
            }
            (EventKind::AfterDecode, Some(id)) if detailed => {
                let started = self
                    .started
                    .lock()
                    .map_err(|_| ListenerError("timing table poisoned".into()))?
                    .remove(&id);
                let micros = started.map_or(0, |t| t.elapsed().as_micros());
                let mode = if event.skipped { " (stored)" } else { "" };
                Some(format!(
                    "Block {id}: {} bytes decoded in {micros} us{mode}",
                    event.size
                ))
            }
            _ => None,
        };
        Ok(line)
    }
}

impl Listener for InfoPrinter {
    fn process_event(&self, event: &Event) -> Result<(), ListenerError> {
        if let Some(line) = self.describe(event)? {
            info!(target: "blockz::blocks", "{line}");
        }
        Ok(())
    }
}
