use blockz_wire::WireError;

/// Errors that can occur while producing a blockz stream.
///
/// ```text
///   EncodeError
///   ├── InvalidBlockSize     ← block size outside [1 KiB, 64 MiB]
///   ├── ThreadPool           ← worker pool for jobs > 1 could not start
///   ├── Wire(WireError)      ← from blockz-wire serialization
///   └── Io(std::io::Error)   ← from the underlying writer
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("invalid block size {size}: must be between {min} and {max} bytes")]
    InvalidBlockSize { size: usize, min: usize, max: u64 },

    #[error("cannot start encoder thread pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
