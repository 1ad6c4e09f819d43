//! Implementation of `blockz decompress`.
//!
//! Maps the flags onto a [`DecompressConfig`], runs a
//! [`BlockDecompressor`] and hands its [`RunResult`] back to `main`, which
//! turns the code into the process exit status.

use blockz_driver::config::{STDIN, STDOUT};
use blockz_driver::{BlockDecompressor, DecompressConfig, RunResult};

use crate::DecompressArgs;
use crate::profile::ProfileScope;

/// Extension of compressed files.
pub const EXTENSION: &str = ".blz";

pub fn run(args: &DecompressArgs) -> RunResult {
    let config = DecompressConfig {
        verbosity: args.verbose,
        overwrite: args.force,
        output: args
            .output
            .clone()
            .unwrap_or_else(|| default_output(&args.input)),
        input: args.input.clone(),
        jobs: args.jobs,
        profile: args.cpu_prof.clone(),
    };

    let scope = config
        .profile
        .as_deref()
        .map(|path| ProfileScope::start(path, "decompress"));
    let result = BlockDecompressor::new(config).call();
    if let Some(scope) = scope {
        if let Err(e) = scope.finish(&result) {
            log::error!("{e:#}");
        }
    }
    result
}

/// Output name used when `-o` is absent: standard output for standard
/// input, otherwise the input with `.blz` removed, or `<input>.out` when
/// it has no such extension.
pub fn default_output(input: &str) -> String {
    if input.eq_ignore_ascii_case(STDIN) {
        return STDOUT.to_owned();
    }
    let split = input.len().saturating_sub(EXTENSION.len());
    match input.get(split..) {
        Some(tail) if split > 0 && tail.eq_ignore_ascii_case(EXTENSION) => input[..split].to_owned(),
        _ => format!("{input}.out"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_container_extension() {
        assert_eq!(default_output("logs/app.log.blz"), "logs/app.log");
        assert_eq!(default_output("ARCHIVE.BLZ"), "ARCHIVE");
    }

    #[test]
    fn appends_out_without_extension() {
        assert_eq!(default_output("data.bin"), "data.bin.out");
        assert_eq!(default_output(".blz"), ".blz.out");
    }

    #[test]
    fn stdin_decodes_to_stdout() {
        assert_eq!(default_output("stdin"), STDOUT);
    }
}
