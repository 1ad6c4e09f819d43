//! Input and output resolution.
//!
//! Names are matched case-insensitively against the reserved words:
//! `STDIN` on the input side, `STDOUT` and `NONE` on the output side.
//! Anything else is a filesystem path.
//!
//! Output resolution is split in two so nothing on disk is touched before
//! the decoder has accepted the input: [`probe_sink`] runs every check and
//! returns a [`SinkPlan`], and [`SinkPlan::open`] creates or truncates.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::{NONE, STDIN, STDOUT};
use crate::error::DriverError;

/// A parsed input name. `STDOUT` and `NONE` are ordinary file names here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceName {
    Stdin,
    Path(PathBuf),
}

impl SourceName {
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case(STDIN) {
            SourceName::Stdin
        } else {
            SourceName::Path(PathBuf::from(name))
        }
    }
}

/// A parsed output name. `STDIN` is an ordinary file name here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkName {
    Stdout,
    Null,
    Path(PathBuf),
}

impl SinkName {
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case(STDOUT) {
            SinkName::Stdout
        } else if name.eq_ignore_ascii_case(NONE) {
            SinkName::Null
        } else {
            SinkName::Path(PathBuf::from(name))
        }
    }
}

/// The compressed (or raw, when compressing) byte source.
pub enum Source {
    Stdin(io::Stdin),
    File {
        file: File,
        path: PathBuf,
        /// Canonical path used for the same-file check.
        canonical: Option<PathBuf>,
    },
}

impl Source {
    /// Canonical path of a file source; `None` for standard input.
    #[must_use]
    pub fn canonical_path(&self) -> Option<&Path> {
        match self {
            Source::Stdin(_) => None,
            Source::File { canonical, .. } => canonical.as_deref(),
        }
    }

    /// Size of a file source, when the filesystem reports one.
    #[must_use]
    pub fn len_hint(&self) -> Option<u64> {
        match self {
            Source::Stdin(_) => None,
            Source::File { file, .. } => file.metadata().ok().map(|m| m.len()),
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Source::Stdin(_) => STDIN.to_owned(),
            Source::File { path, .. } => path.display().to_string(),
        }
    }
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Stdin(stdin) => stdin.read(buf),
            Source::File { file, .. } => file.read(buf),
        }
    }
}

/// Resolve the input name.
///
/// # Errors
///
/// [`DriverError::OpenFailed`] if a file input cannot be opened for reading.
pub fn resolve_source(name: &str) -> Result<Source, DriverError> {
    match SourceName::parse(name) {
        SourceName::Stdin => Ok(Source::Stdin(io::stdin())),
        SourceName::Path(path) => {
            let file = File::open(&path).map_err(|source| DriverError::OpenFailed {
                path: path.clone(),
                source,
            })?;
            let canonical = fs::canonicalize(&path).ok();
            Ok(Source::File {
                file,
                path,
                canonical,
            })
        }
    }
}

/// Result of looking at an output path before anything is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkProbe {
    Absent,
    Present,
    SameAsSource,
}

/// Probe `path` against the input's canonical path.
///
/// A file counts as present when it opens for read/write, or when it
/// exists but cannot be opened (so permission problems still go through
/// the overwrite and same-file rules and fail later at creation).
#[must_use]
pub fn probe_path(path: &Path, source: Option<&Path>) -> SinkProbe {
    let exists = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(_) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(_) => fs::symlink_metadata(path).is_ok(),
    };
    if !exists {
        return SinkProbe::Absent;
    }
    match (source, fs::canonicalize(path)) {
        (Some(input), Ok(output)) if input == output => SinkProbe::SameAsSource,
        _ => SinkProbe::Present,
    }
}

/// A validated output that has not been opened yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkPlan {
    Stdout,
    Null,
    File { path: PathBuf, existed: bool },
}

/// Decide where output goes, enforcing the directory, same-file and
/// overwrite rules. The same-file rule is checked first, so it wins even
/// when overwriting is allowed.
///
/// # Errors
///
/// - [`DriverError::CreateFailed`] when the output path is a directory.
/// - [`DriverError::SameFile`] when the output is the input file.
/// - [`DriverError::OverwriteRefused`] when the output exists and
///   `overwrite` is false.
pub fn probe_sink(name: &str, overwrite: bool, source: &Source) -> Result<SinkPlan, DriverError> {
    let path = match SinkName::parse(name) {
        SinkName::Stdout => return Ok(SinkPlan::Stdout),
        SinkName::Null => return Ok(SinkPlan::Null),
        SinkName::Path(path) => path,
    };

    if path.is_dir() {
        return Err(DriverError::CreateFailed {
            source: io::Error::other(format!("'{}' is a directory", path.display())),
            path,
        });
    }

    match probe_path(&path, source.canonical_path()) {
        SinkProbe::SameAsSource => Err(DriverError::SameFile { path }),
        SinkProbe::Present if !overwrite => Err(DriverError::OverwriteRefused { path }),
        SinkProbe::Present => Ok(SinkPlan::File {
            path,
            existed: true,
        }),
        SinkProbe::Absent => Ok(SinkPlan::File {
            path,
            existed: false,
        }),
    }
}

impl SinkPlan {
    /// Materialize the output: create the file, or truncate an existing
    /// one to zero length.
    ///
    /// # Errors
    ///
    /// [`DriverError::CreateFailed`] if the file cannot be opened for writing.
    pub fn open(self) -> Result<Sink, DriverError> {
        match self {
            SinkPlan::Stdout => Ok(Sink::Stdout(io::stdout())),
            SinkPlan::Null => Ok(Sink::Null(io::sink())),
            SinkPlan::File { path, existed } => {
                debug!(
                    "{} output file '{}'",
                    if existed { "truncating" } else { "creating" },
                    path.display()
                );
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path)
                    .map(Sink::File)
                    .map_err(|source| DriverError::CreateFailed { path, source })
            }
        }
    }
}

/// The decoded (or compressed, when compressing) byte destination.
pub enum Sink {
    Stdout(io::Stdout),
    Null(io::Sink),
    File(File),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(out) => out.write(buf),
            Sink::Null(null) => null.write(buf),
            Sink::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(out) => out.flush(),
            Sink::Null(null) => null.flush(),
            Sink::File(file) => file.flush(),
        }
    }
}
