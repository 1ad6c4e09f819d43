use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use blockz_decoder::{CompressedInputStream, DecoderConfig};
use blockz_types::{Event, EventKind, Listener, Listeners};
use log::{error, info};

use crate::config::DecompressConfig;
use crate::endpoint::{probe_sink, resolve_source};
use crate::error::DriverError;
use crate::exit_code::RunResult;
use crate::info_printer::InfoPrinter;

/// Size of the transfer buffer between decoder and sink (32 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 32_768;

/// Counters collected by one decode loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Container bytes consumed from the source.
    pub compressed_bytes: u64,
    /// Decoded bytes written to the sink.
    pub decoded_bytes: u64,
    /// Calls made to the decoder's `read`, including the final empty one.
    pub read_calls: u64,
    pub elapsed: Duration,
}

impl DecodeStats {
    /// Decoded KiB per second, or `None` when the run took under 1 ms.
    #[must_use]
    pub fn throughput_kib(&self) -> Option<u64> {
        let ms = u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX);
        if ms == 0 {
            return None;
        }
        Some((self.decoded_bytes.saturating_mul(1000) >> 10) / ms)
    }
}

/// A failed decode loop together with what already reached the sink.
#[derive(Debug, thiserror::Error)]
#[error("{error} ({decoded_bytes} bytes written)")]
pub struct DecodeFailure {
    #[source]
    pub error: DriverError,
    pub decoded_bytes: u64,
}

impl From<DriverError> for DecodeFailure {
    fn from(error: DriverError) -> Self {
        Self {
            error,
            decoded_bytes: 0,
        }
    }
}

/// Establish the decoder over `source` and attach `listeners` to it.
///
/// # Errors
///
/// [`DriverError::DecoderInit`] when the header is missing or invalid, or
/// the worker pool cannot start.
pub fn open_decoder<R: Read>(
    source: R,
    jobs: usize,
    listeners: &Listeners,
) -> Result<CompressedInputStream<R>, DriverError> {
    let mut decoder =
        CompressedInputStream::new(source, DecoderConfig { jobs }).map_err(DriverError::DecoderInit)?;
    for listener in listeners.iter() {
        decoder.add_listener(Arc::clone(listener));
    }
    Ok(decoder)
}

/// Move every decoded byte from `decoder` into `sink`.
///
/// ```text
///   DecompressionStart
///   loop:  read(32 KiB) ── 0 ──▶ close ─▶ flush ─▶ DecompressionEnd
///            │ n > 0
///            └──▶ write(n), counting every accepted byte
/// ```
///
/// The loop stops on the first empty read, so a stream shorter than the
/// buffer costs exactly one data read and one terminating read. The end
/// event is only emitted on success and carries the compressed byte count.
///
/// # Errors
///
/// - [`DriverError::Process`] for a decode failure or a failed `close`
///   (missing END, length mismatch, trailing data).
/// - [`DriverError::Write`] when the sink rejects a write or the flush.
///
/// Either way the failure carries the byte count already written.
pub fn pump<R: Read, W: Write>(
    mut decoder: CompressedInputStream<R>,
    sink: &mut W,
    listeners: &Listeners,
) -> Result<DecodeStats, DecodeFailure> {
    let before = Instant::now();
    let mut stats = DecodeStats::default();
    let mut buffer = vec![0u8; DEFAULT_BUFFER_SIZE];

    listeners.notify(&Event::run(EventKind::DecompressionStart, 0));

    let fail = |error: DriverError, written: u64| DecodeFailure {
        error,
        decoded_bytes: written,
    };

    loop {
        stats.read_calls += 1;
        let decoded = decoder
            .read(&mut buffer)
            .map_err(|e| fail(DriverError::Process(e), stats.decoded_bytes))?;
        if decoded == 0 {
            break;
        }
        write_counted(sink, &buffer[..decoded], &mut stats.decoded_bytes)
            .map_err(|e| fail(DriverError::Write(e), stats.decoded_bytes))?;
    }

    decoder
        .close()
        .map_err(|e| fail(DriverError::Process(e), stats.decoded_bytes))?;
    sink.flush()
        .map_err(|e| fail(DriverError::Write(e), stats.decoded_bytes))?;

    stats.compressed_bytes = decoder.total_read();
    stats.elapsed = before.elapsed();
    listeners.notify(&Event::run(EventKind::DecompressionEnd, stats.compressed_bytes));
    Ok(stats)
}

/// `write_all` that adds each accepted chunk to `written` as it lands, so a
/// sink failing halfway through a buffer still reports what it took.
fn write_counted<W: Write>(sink: &mut W, mut buf: &[u8], written: &mut u64) -> io::Result<()> {
    while !buf.is_empty() {
        match sink.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "sink accepted no bytes",
                ));
            }
            Ok(n) => {
                *written += n as u64;
                buf = &buf[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// One decompression run from a named input to a named output.
///
/// The run resolves the input, checks the output without creating it,
/// reads the container header, and only then creates or truncates the
/// output. A bad header therefore never clobbers an existing file.
///
/// ```text
///   input ──▶ OpenFailed
///   output probe ──▶ CreateFailed (dir) · SameFile · OverwriteRefused
///   header ──▶ DecoderInitFailed
///   output create ──▶ CreateFailed
///   decode loop ──▶ ProcessFailed · WriteFailed
/// ```
pub struct BlockDecompressor {
    config: DecompressConfig,
    listeners: Listeners,
}

impl BlockDecompressor {
    /// Build a run. At verbosity 3 and above an [`InfoPrinter`] is
    /// registered as the first listener.
    #[must_use]
    pub fn new(config: DecompressConfig) -> Self {
        let mut listeners = Listeners::new();
        if config.verbosity >= 3 {
            listeners.add(Arc::new(InfoPrinter::new(config.verbosity)));
        }
        Self { config, listeners }
    }

    #[must_use]
    pub fn config(&self) -> &DecompressConfig {
        &self.config
    }

    #[must_use]
    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn add_listener(&mut self, listener: Arc<dyn Listener>) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn Listener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Execute the run. Never panics on I/O or format errors; every
    /// failure is logged and folded into the returned exit code.
    #[must_use]
    pub fn call(&self) -> RunResult {
        let verbosity = self.config.verbosity;
        if verbosity >= 3 {
            for line in self.config.describe() {
                info!("{line}");
            }
        }

        match self.run() {
            Ok(stats) => {
                self.report(&stats);
                RunResult::success(stats.decoded_bytes)
            }
            Err(failure) => {
                error!("{}", failure.error);
                RunResult::failure(failure.error.exit_code(), failure.decoded_bytes)
            }
        }
    }

    fn run(&self) -> Result<DecodeStats, DecodeFailure> {
        let source = resolve_source(&self.config.input)?;
        let plan = probe_sink(&self.config.output, self.config.overwrite, &source)?;

        if self.config.verbosity >= 2 {
            info!("Decoding {} ...", source.describe());
        }

        let decoder = open_decoder(source, self.config.jobs, &self.listeners)?;
        let mut sink = plan.open()?;
        pump(decoder, &mut sink, &self.listeners)
    }

    fn report(&self, stats: &DecodeStats) {
        let ms = stats.elapsed.as_millis();
        match self.config.verbosity {
            0 => {}
            1 => info!(
                "Decoding: {} => {} bytes in {ms} ms",
                stats.compressed_bytes, stats.decoded_bytes
            ),
            _ => {
                info!("Decoding:          {ms} ms");
                info!("Input size:        {}", stats.compressed_bytes);
                info!("Output size:       {}", stats.decoded_bytes);
                if let Some(kib) = stats.throughput_kib() {
                    info!("Throughput (KB/s): {kib}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockz_encoder::{encode_all, EncoderConfig};
    use blockz_types::ListenerError;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn recorder() -> (Arc<dyn Listener>, Arc<Mutex<Vec<EventKind>>>) {
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&kinds);
        let listener: Arc<dyn Listener> = Arc::new(move |e: &Event| -> Result<(), ListenerError> {
            sink.lock().unwrap().push(e.kind);
            Ok(())
        });
        (listener, kinds)
    }

    /// Accepts `limit` bytes, then fails every write.
    struct BrokenPipe {
        limit: usize,
        taken: usize,
    }

    impl Write for BrokenPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.taken >= self.limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            let n = buf.len().min(self.limit - self.taken);
            self.taken += n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn container(data: &[u8]) -> Vec<u8> {
        encode_all(data, &EncoderConfig::default()).unwrap()
    }

    #[test]
    fn short_stream_takes_one_data_read_and_one_empty_read() {
        let encoded = container(b"hello!");
        let decoder = open_decoder(encoded.as_slice(), 1, &Listeners::new()).unwrap();
        let mut out = Vec::new();
        let stats = pump(decoder, &mut out, &Listeners::new()).unwrap();

        assert_eq!(out, b"hello!");
        assert_eq!(stats.read_calls, 2);
        assert_eq!(stats.decoded_bytes, 6);
        assert_eq!(stats.compressed_bytes, encoded.len() as u64);
    }

    #[test]
    fn empty_payload_decodes_to_nothing() {
        let encoded = container(b"");
        let decoder = open_decoder(encoded.as_slice(), 1, &Listeners::new()).unwrap();
        let mut out = Vec::new();
        let stats = pump(decoder, &mut out, &Listeners::new()).unwrap();
        assert!(out.is_empty());
        assert_eq!(stats.read_calls, 1);
    }

    #[test]
    fn large_payload_uses_full_buffers() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 7) as u8).collect();
        let encoded = container(&data);
        let decoder = open_decoder(encoded.as_slice(), 2, &Listeners::new()).unwrap();
        let mut out = Vec::new();
        let stats = pump(decoder, &mut out, &Listeners::new()).unwrap();
        assert_eq!(out, data);
        // ceil(100_000 / 32_768) data reads plus the empty one.
        assert_eq!(stats.read_calls, 5);
    }

    #[test]
    fn garbage_header_is_decoder_init_failure() {
        let err = open_decoder(&b"not a container"[..], 1, &Listeners::new()).err().unwrap();
        assert!(matches!(err, DriverError::DecoderInit(_)));
    }

    #[test]
    fn sink_failure_reports_bytes_already_written() {
        let data = vec![1u8; DEFAULT_BUFFER_SIZE * 3];
        let encoded = container(&data);
        let decoder = open_decoder(encoded.as_slice(), 1, &Listeners::new()).unwrap();
        let mut sink = BrokenPipe {
            limit: DEFAULT_BUFFER_SIZE,
            taken: 0,
        };
        let failure = pump(decoder, &mut sink, &Listeners::new()).unwrap_err();
        assert!(matches!(failure.error, DriverError::Write(_)));
        assert_eq!(failure.decoded_bytes, DEFAULT_BUFFER_SIZE as u64);
    }

    #[test]
    fn sink_failure_mid_buffer_counts_the_accepted_part() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 13) as u8).collect();
        let encoded = container(&data);
        let decoder = open_decoder(encoded.as_slice(), 1, &Listeners::new()).unwrap();
        let mut sink = BrokenPipe {
            limit: 40_000,
            taken: 0,
        };
        let failure = pump(decoder, &mut sink, &Listeners::new()).unwrap_err();
        assert!(matches!(failure.error, DriverError::Write(_)));
        assert_eq!(sink.taken, 40_000);
        assert_eq!(failure.decoded_bytes, 40_000);
    }

    #[test]
    fn zero_length_write_is_write_zero() {
        struct Stuck;
        impl Write for Stuck {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let encoded = container(b"hello!");
        let decoder = open_decoder(encoded.as_slice(), 1, &Listeners::new()).unwrap();
        let failure = pump(decoder, &mut Stuck, &Listeners::new()).unwrap_err();
        match failure.error {
            DriverError::Write(e) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
            other => panic!("expected a write failure, got {other:?}"),
        }
        assert_eq!(failure.decoded_bytes, 0);
    }

    #[test]
    fn truncated_container_fails_after_partial_output() {
        let data = vec![9u8; 5000];
        let config = EncoderConfig {
            block_size: 1024,
            ..EncoderConfig::default()
        };
        let mut encoded = encode_all(&data, &config).unwrap();
        encoded.truncate(encoded.len() - 3);

        let (listener, kinds) = recorder();
        let mut listeners = Listeners::new();
        listeners.add(listener);
        let decoder = open_decoder(encoded.as_slice(), 1, &listeners).unwrap();
        let mut out = Vec::new();
        let failure = pump(decoder, &mut out, &listeners).unwrap_err();

        assert!(matches!(failure.error, DriverError::Process(_)));
        let kinds = kinds.lock().unwrap();
        assert_eq!(kinds.first(), Some(&EventKind::DecompressionStart));
        assert!(!kinds.contains(&EventKind::DecompressionEnd));
    }

    #[test]
    fn start_and_end_frame_the_block_events() {
        let encoded = container(b"observe me");
        let (listener, kinds) = recorder();
        let mut listeners = Listeners::new();
        listeners.add(listener);

        let decoder = open_decoder(encoded.as_slice(), 1, &listeners).unwrap();
        pump(decoder, &mut Vec::new(), &listeners).unwrap();

        let kinds = kinds.lock().unwrap();
        assert_eq!(
            *kinds,
            vec![
                EventKind::DecompressionStart,
                EventKind::BlockInfo,
                EventKind::BeforeDecode,
                EventKind::AfterDecode,
                EventKind::DecompressionEnd,
            ]
        );
    }

    #[test]
    fn throughput_needs_a_measurable_duration() {
        let mut stats = DecodeStats {
            decoded_bytes: 2048 * 1000,
            ..DecodeStats::default()
        };
        assert_eq!(stats.throughput_kib(), None);
        stats.elapsed = Duration::from_millis(1000);
        assert_eq!(stats.throughput_kib(), Some(2000));
    }

    #[test]
    fn verbosity_three_attaches_info_printer() {
        let quiet = BlockDecompressor::new(DecompressConfig::default());
        assert!(quiet.listeners().is_empty());
        let loud = BlockDecompressor::new(DecompressConfig {
            verbosity: 3,
            ..DecompressConfig::default()
        });
        assert_eq!(loud.listeners().len(), 1);
    }

    #[test]
    fn call_decodes_file_to_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("greeting.blz");
        let output = dir.path().join("greeting.txt");
        fs::write(&input, container(b"hello!")).unwrap();

        let run = BlockDecompressor::new(DecompressConfig {
            input: input.to_string_lossy().into_owned(),
            output: output.to_string_lossy().into_owned(),
            verbosity: 0,
            ..DecompressConfig::default()
        })
        .call();

        assert_eq!(run, RunResult::success(6));
        assert_eq!(fs::read(&output).unwrap(), b"hello!");
    }

    #[test]
    fn bad_header_leaves_existing_output_alone() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bogus.blz");
        let output = dir.path().join("precious.txt");
        fs::write(&input, b"definitely not blockz").unwrap();
        fs::write(&output, b"precious").unwrap();

        let run = BlockDecompressor::new(DecompressConfig {
            input: input.to_string_lossy().into_owned(),
            output: output.to_string_lossy().into_owned(),
            overwrite: true,
            verbosity: 0,
            ..DecompressConfig::default()
        })
        .call();

        assert_eq!(run.code, crate::ExitCode::DecoderInitFailed);
        assert_eq!(run.bytes, 0);
        assert_eq!(fs::read(&output).unwrap(), b"precious");
    }
}
