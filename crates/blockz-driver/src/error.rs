use std::io;
use std::path::PathBuf;

use blockz_decoder::DecodeError;
use blockz_encoder::EncodeError;

use crate::exit_code::ExitCode;

/// Every failure a compression or decompression run can hit.
///
/// Each variant maps to exactly one [`ExitCode`] through
/// [`exit_code`](Self::exit_code); the driver never lets one of these
/// escape its `call()` methods.
///
/// ```text
///   DriverError                      ExitCode
///   ├── OverwriteRefused      ──▶    OverwriteRefused   ┐
///   ├── SameFile              ──▶    SameFile           │ endpoint: nothing
///   ├── CreateFailed          ──▶    CreateFailed       │ decoded yet
///   ├── OpenFailed            ──▶    OpenFailed         ┘
///   ├── DecoderInit           ──▶    DecoderInitFailed
///   ├── Process               ──▶    ProcessFailed      ┐ decoder: partial
///   ├── Encode                ──▶    ProcessFailed      ┘ output possible
///   ├── Read                  ──▶    ReadFailed
///   └── Write                 ──▶    WriteFailed          sink
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("the output file '{}' exists and overwrite is not enabled", path.display())]
    OverwriteRefused { path: PathBuf },

    #[error("the input and output files must be different: '{}'", path.display())]
    SameFile { path: PathBuf },

    #[error("cannot open output file '{}' for writing: {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open input file '{}': {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create compressed stream: {0}")]
    DecoderInit(#[source] DecodeError),

    #[error("failed to decode block: {0}")]
    Process(#[source] DecodeError),

    #[error("failed to encode block: {0}")]
    Encode(#[source] EncodeError),

    #[error("failed to read input: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
}

impl DriverError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            DriverError::OverwriteRefused { .. } => ExitCode::OverwriteRefused,
            DriverError::SameFile { .. } => ExitCode::SameFile,
            DriverError::CreateFailed { .. } => ExitCode::CreateFailed,
            DriverError::OpenFailed { .. } => ExitCode::OpenFailed,
            DriverError::DecoderInit(_) => ExitCode::DecoderInitFailed,
            DriverError::Process(_) | DriverError::Encode(_) => ExitCode::ProcessFailed,
            DriverError::Read(_) => ExitCode::ReadFailed,
            DriverError::Write(_) => ExitCode::WriteFailed,
        }
    }
}
