use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use blockz_encoder::{CompressedOutputStream, EncodeError, EncoderConfig};
use blockz_types::{Event, EventKind, Listener, Listeners};
use log::{error, info};

use crate::config::CompressConfig;
use crate::decompressor::DEFAULT_BUFFER_SIZE;
use crate::endpoint::{probe_sink, resolve_source};
use crate::error::DriverError;
use crate::exit_code::RunResult;
use crate::info_printer::InfoPrinter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Raw bytes read from the source.
    pub raw_bytes: u64,
    /// Container bytes written to the sink.
    pub compressed_bytes: u64,
    pub elapsed: Duration,
}

/// Writer errors surface as [`DriverError::Write`]; everything else the
/// encoder reports is a processing failure.
fn encode_error(e: EncodeError) -> DriverError {
    match e {
        EncodeError::Io(io) => DriverError::Write(io),
        other => DriverError::Encode(other),
    }
}

/// A failed compression together with how much raw input it consumed.
#[derive(Debug, thiserror::Error)]
#[error("{error} ({raw_bytes} bytes consumed)")]
pub struct EncodeFailure {
    #[source]
    pub error: DriverError,
    pub raw_bytes: u64,
}

impl From<DriverError> for EncodeFailure {
    fn from(error: DriverError) -> Self {
        Self {
            error,
            raw_bytes: 0,
        }
    }
}

/// Stream `source` through a [`CompressedOutputStream`] into `sink`.
///
/// Emits `CompressionStart` before the first read and, on success,
/// `CompressionEnd` carrying the container size.
///
/// # Errors
///
/// - [`DriverError::Read`] when the source fails.
/// - [`DriverError::Write`] when the sink fails.
/// - [`DriverError::Encode`] for worker pool or framing failures.
///
/// Either way the failure carries the raw bytes read from `source` so far.
pub fn compress_stream<R: Read, W: Write>(
    source: &mut R,
    sink: W,
    config: EncoderConfig,
    listeners: &Listeners,
) -> Result<EncodeStats, EncodeFailure> {
    let before = Instant::now();
    listeners.notify(&Event::run(EventKind::CompressionStart, 0));

    let fail = |error: DriverError, consumed: u64| EncodeFailure {
        error,
        raw_bytes: consumed,
    };

    let mut encoder =
        CompressedOutputStream::new(CountingSink::new(sink), config).map_err(encode_error)?;
    let mut buffer = vec![0u8; DEFAULT_BUFFER_SIZE];
    let mut consumed = 0u64;
    loop {
        let n = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(fail(DriverError::Read(e), consumed)),
        };
        consumed += n as u64;
        encoder
            .write_all(&buffer[..n])
            .map_err(|e| fail(DriverError::Write(e), consumed))?;
    }

    let raw_bytes = encoder.total_in();
    let mut sink = encoder
        .finish()
        .map_err(|e| fail(encode_error(e), consumed))?;
    sink.flush()
        .map_err(|e| fail(DriverError::Write(e), consumed))?;

    let stats = EncodeStats {
        raw_bytes,
        compressed_bytes: sink.written,
        elapsed: before.elapsed(),
    };
    listeners.notify(&Event::run(EventKind::CompressionEnd, stats.compressed_bytes));
    Ok(stats)
}

/// One compression run from a named input to a named output.
///
/// Endpoint rules and exit codes match
/// [`BlockDecompressor`](crate::BlockDecompressor). An invalid encoder
/// configuration is rejected before the output is created.
pub struct BlockCompressor {
    config: CompressConfig,
    listeners: Listeners,
}

impl BlockCompressor {
    #[must_use]
    pub fn new(config: CompressConfig) -> Self {
        let mut listeners = Listeners::new();
        if config.verbosity >= 3 {
            listeners.add(Arc::new(InfoPrinter::new(config.verbosity)));
        }
        Self { config, listeners }
    }

    #[must_use]
    pub fn config(&self) -> &CompressConfig {
        &self.config
    }

    pub fn add_listener(&mut self, listener: Arc<dyn Listener>) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn Listener>) -> bool {
        self.listeners.remove(listener)
    }

    fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            block_size: self.config.block_size,
            jobs: self.config.jobs,
            checksums: self.config.checksums,
            level: self.config.level,
        }
    }

    /// Execute the run. The returned byte count is the raw input consumed,
    /// also when the run fails partway.
    #[must_use]
    pub fn call(&self) -> RunResult {
        if self.config.verbosity >= 3 {
            for line in self.config.describe() {
                info!("{line}");
            }
        }
        match self.run() {
            Ok(stats) => {
                self.report(&stats);
                RunResult::success(stats.raw_bytes)
            }
            Err(failure) => {
                error!("{}", failure.error);
                RunResult::failure(failure.error.exit_code(), failure.raw_bytes)
            }
        }
    }

    fn run(&self) -> Result<EncodeStats, EncodeFailure> {
        let encoder_config = self.encoder_config();
        encoder_config
            .validate()
            .map_err(|e| EncodeFailure::from(DriverError::Encode(e)))?;

        let mut source = resolve_source(&self.config.input)?;
        let plan = probe_sink(&self.config.output, self.config.overwrite, &source)?;
        if self.config.verbosity >= 2 {
            info!("Encoding {} ...", source.describe());
        }

        let sink = plan.open()?;
        compress_stream(&mut source, sink, encoder_config, &self.listeners)
    }

    fn report(&self, stats: &EncodeStats) {
        let ms = stats.elapsed.as_millis();
        match self.config.verbosity {
            0 => {}
            1 => info!(
                "Encoding: {} => {} bytes in {ms} ms",
                stats.raw_bytes, stats.compressed_bytes
            ),
            _ => {
                info!("Encoding:          {ms} ms");
                info!("Input size:        {}", stats.raw_bytes);
                info!("Output size:       {}", stats.compressed_bytes);
                if stats.raw_bytes > 0 {
                    #[allow(clippy::cast_precision_loss)]
                    let ratio = stats.compressed_bytes as f64 / stats.raw_bytes as f64;
                    info!("Ratio:             {ratio:.6}");
                }
            }
        }
    }
}

/// Sink wrapper that counts the bytes accepted.
struct CountingSink<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingSink<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }
}

impl<W: Write> Write for CountingSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_code::ExitCode;
    use blockz_decoder::{CompressedInputStream, DecoderConfig};
    use std::fs;
    use tempfile::TempDir;

    /// Yields `ok` bytes of zeros, then fails.
    struct FlakySource {
        ok: usize,
    }

    impl Read for FlakySource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.ok == 0 {
                return Err(io::Error::other("device gone"));
            }
            let n = buf.len().min(self.ok);
            buf[..n].fill(0);
            self.ok -= n;
            Ok(n)
        }
    }

    #[test]
    fn stream_produces_decodable_container() {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 13) as u8).collect();
        let mut out = Vec::new();
        let stats = compress_stream(
            &mut data.as_slice(),
            &mut out,
            EncoderConfig::default(),
            &Listeners::new(),
        )
        .unwrap();

        assert_eq!(stats.raw_bytes, data.len() as u64);
        assert_eq!(stats.compressed_bytes, out.len() as u64);

        let mut decoder = CompressedInputStream::new(out.as_slice(), DecoderConfig::default()).unwrap();
        let mut decoded = Vec::new();
        io::Read::read_to_end(&mut decoder, &mut decoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn source_failure_is_read_failed() {
        let failure = compress_stream(
            &mut FlakySource { ok: 100 },
            Vec::new(),
            EncoderConfig::default(),
            &Listeners::new(),
        )
        .unwrap_err();
        assert_eq!(failure.error.exit_code(), ExitCode::ReadFailed);
        assert_eq!(failure.raw_bytes, 100);
    }

    #[test]
    fn sink_failure_reports_raw_bytes_consumed() {
        /// Takes the header, then refuses everything.
        struct HeaderOnly(usize);

        impl Write for HeaderOnly {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                if self.0 == 0 {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
                }
                let n = buf.len().min(self.0);
                self.0 -= n;
                Ok(n)
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let data = vec![5u8; 70_000];
        let config = EncoderConfig {
            block_size: 16 * 1024,
            ..EncoderConfig::default()
        };
        let failure = compress_stream(
            &mut data.as_slice(),
            HeaderOnly(blockz_wire::HEADER_SIZE),
            config,
            &Listeners::new(),
        )
        .unwrap_err();

        assert_eq!(failure.error.exit_code(), ExitCode::WriteFailed);
        // The first full block is framed while the first 32 KiB read is
        // being accepted, so the run stops after that read.
        assert_eq!(failure.raw_bytes, DEFAULT_BUFFER_SIZE as u64);
    }

    #[test]
    fn bad_block_size_does_not_create_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.bin");
        let output = dir.path().join("raw.bin.blz");
        fs::write(&input, b"payload").unwrap();

        let run = BlockCompressor::new(CompressConfig {
            input: input.to_string_lossy().into_owned(),
            output: output.to_string_lossy().into_owned(),
            block_size: 10,
            verbosity: 0,
            ..CompressConfig::default()
        })
        .call();

        assert_eq!(run.code, ExitCode::ProcessFailed);
        assert!(!output.exists());
    }

    #[test]
    fn call_compresses_file_to_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.bin");
        let output = dir.path().join("raw.bin.blz");
        fs::write(&input, b"hello!").unwrap();

        let run = BlockCompressor::new(CompressConfig {
            input: input.to_string_lossy().into_owned(),
            output: output.to_string_lossy().into_owned(),
            verbosity: 0,
            ..CompressConfig::default()
        })
        .call();

        assert_eq!(run, RunResult::success(6));
        assert_eq!(&fs::read(&output).unwrap()[0..4], b"BLZ\0");
    }
}
