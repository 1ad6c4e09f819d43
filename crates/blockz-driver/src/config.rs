use std::path::PathBuf;

use blockz_encoder::encoder::DEFAULT_BLOCK_SIZE;

/// Reserved endpoint name for standard input.
pub const STDIN: &str = "STDIN";

/// Reserved endpoint name for standard output.
pub const STDOUT: &str = "STDOUT";

/// Reserved endpoint name for a sink that discards everything.
pub const NONE: &str = "NONE";

/// Settings for one decompression run.
///
/// ```text
/// ┌────────────┬──────────────────────────────────────────────────────┐
/// │ Field      │ Meaning                                              │
/// ├────────────┼──────────────────────────────────────────────────────┤
/// │ verbosity  │ 0 silent, 1 summary, 2 phases, ≥3 config + blocks    │
/// │ overwrite  │ replace an existing output file                      │
/// │ input      │ path or "STDIN" (case-insensitive)                   │
/// │ output     │ path, "STDOUT" or "NONE" (case-insensitive)          │
/// │ jobs       │ blocks decoded concurrently (0 is treated as 1)      │
/// │ profile    │ where the CLI writes a timing report, if anywhere    │
/// └────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecompressConfig {
    pub verbosity: u8,
    pub overwrite: bool,
    pub input: String,
    pub output: String,
    pub jobs: usize,
    pub profile: Option<PathBuf>,
}

impl Default for DecompressConfig {
    fn default() -> Self {
        Self {
            verbosity: 1,
            overwrite: false,
            input: STDIN.to_owned(),
            output: STDOUT.to_owned(),
            jobs: 1,
            profile: None,
        }
    }
}

impl DecompressConfig {
    /// Lines echoed at verbosity 3 and above.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        vec![
            format!("Input file name set to '{}'", self.input),
            format!("Output file name set to '{}'", self.output),
            format!("Verbosity set to {}", self.verbosity),
            format!("Overwrite set to {}", self.overwrite),
            format!("Using {} job{}", self.jobs, plural(self.jobs)),
        ]
    }
}

/// Settings for one compression run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressConfig {
    pub verbosity: u8,
    pub overwrite: bool,
    pub input: String,
    pub output: String,
    pub jobs: usize,
    pub block_size: usize,
    pub checksums: bool,
    pub level: i32,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            verbosity: 1,
            overwrite: false,
            input: STDIN.to_owned(),
            output: STDOUT.to_owned(),
            jobs: 1,
            block_size: DEFAULT_BLOCK_SIZE,
            checksums: true,
            level: blockz_encoder::compression::DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl CompressConfig {
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        vec![
            format!("Input file name set to '{}'", self.input),
            format!("Output file name set to '{}'", self.output),
            format!("Block size set to {} bytes", self.block_size),
            format!("Checksums set to {}", self.checksums),
            format!("Compression level set to {}", self.level),
            format!("Verbosity set to {}", self.verbosity),
            format!("Overwrite set to {}", self.overwrite),
            format!("Using {} job{}", self.jobs, plural(self.jobs)),
        ]
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_stream_stdin_to_stdout() {
        let config = DecompressConfig::default();
        assert_eq!(config.input, STDIN);
        assert_eq!(config.output, STDOUT);
        assert!(!config.overwrite);
        assert_eq!(config.jobs, 1);
    }

    #[test]
    fn describe_echoes_every_setting() {
        let config = DecompressConfig {
            jobs: 4,
            ..DecompressConfig::default()
        };
        let lines = config.describe();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "Using 4 jobs");
    }

    #[test]
    fn compress_describe_mentions_block_size() {
        let lines = CompressConfig::default().describe();
        assert!(lines.iter().any(|l| l == "Block size set to 1048576 bytes"));
        assert!(lines.iter().any(|l| l == "Using 1 job"));
    }
}
