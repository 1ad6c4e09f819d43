//! Implementation of `blockz compress`.

use blockz_driver::config::{STDIN, STDOUT};
use blockz_driver::{BlockCompressor, CompressConfig, RunResult};

use crate::CompressArgs;
use crate::cmd_decompress::EXTENSION;

pub fn run(args: &CompressArgs) -> RunResult {
    let config = CompressConfig {
        verbosity: args.verbose,
        overwrite: args.force,
        output: args
            .output
            .clone()
            .unwrap_or_else(|| default_output(&args.input)),
        input: args.input.clone(),
        jobs: args.jobs,
        block_size: args.block,
        checksums: !args.no_checksums,
        level: args.level,
    };
    BlockCompressor::new(config).call()
}

pub fn default_output(input: &str) -> String {
    if input.eq_ignore_ascii_case(STDIN) {
        STDOUT.to_owned()
    } else {
        format!("{input}{EXTENSION}")
    }
}

/// Parse a block size such as `65536`, `64K` or `4M`.
///
/// Range checks are left to the encoder so the limits live in one place.
pub fn parse_block_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let (digits, multiplier) = match s.chars().last() {
        Some('k' | 'K') => (&s[..s.len() - 1], 1024),
        Some('m' | 'M') => (&s[..s.len() - 1], 1024 * 1024),
        _ => (s, 1),
    };
    let value: usize = digits
        .parse()
        .map_err(|_| format!("invalid block size {s:?}"))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("block size {s:?} is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_suffixes() {
        assert_eq!(parse_block_size("4096"), Ok(4096));
        assert_eq!(parse_block_size("64k"), Ok(65_536));
        assert_eq!(parse_block_size("4M"), Ok(4 * 1024 * 1024));
        assert!(parse_block_size("lots").is_err());
        assert!(parse_block_size("M").is_err());
    }

    #[test]
    fn default_output_appends_extension() {
        assert_eq!(default_output("notes.txt"), "notes.txt.blz");
        assert_eq!(default_output("STDIN"), STDOUT);
    }
}
