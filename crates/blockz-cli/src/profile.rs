use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use blockz_driver::RunResult;
use serde::Serialize;

/// Timing report written by `--cpu-prof`.
#[derive(Debug, Serialize)]
pub struct ProfileReport {
    pub command: &'static str,
    pub elapsed_ms: u64,
    pub exit_code: i32,
    pub bytes: u64,
}

/// Brackets one run and records how long it took.
pub struct ProfileScope {
    path: PathBuf,
    command: &'static str,
    started: Instant,
}

impl ProfileScope {
    pub fn start(path: &Path, command: &'static str) -> Self {
        Self {
            path: path.to_path_buf(),
            command,
            started: Instant::now(),
        }
    }

    fn report(&self, result: &RunResult) -> ProfileReport {
        ProfileReport {
            command: self.command,
            elapsed_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            exit_code: result.code.code(),
            bytes: result.bytes,
        }
    }

    /// Write the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be serialized or written.
    pub fn finish(self, result: &RunResult) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.report(result))
            .context("cannot serialize profile report")?;
        fs::write(&self.path, json)
            .with_context(|| format!("cannot write profile report {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockz_driver::ExitCode;
    use tempfile::TempDir;

    #[test]
    fn report_is_written_as_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prof.json");
        let scope = ProfileScope::start(&path, "decompress");
        scope
            .finish(&RunResult::failure(ExitCode::WriteFailed, 12))
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["command"], "decompress");
        assert_eq!(value["exit_code"], 12);
        assert_eq!(value["bytes"], 12);
        assert!(value["elapsed_ms"].is_u64());
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let scope = ProfileScope::start(dir.path(), "decompress");
        assert!(scope.finish(&RunResult::success(0)).is_err());
    }
}
