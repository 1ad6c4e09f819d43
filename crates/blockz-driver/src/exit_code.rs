use std::fmt;

/// Process exit codes reported by a run.
///
/// The numeric values are stable and form part of the CLI contract.
///
/// ```text
/// ┌───────────────────┬──────┬──────────────────────────────────────────┐
/// │ Code              │ Value│ Raised when                              │
/// ├───────────────────┼──────┼──────────────────────────────────────────┤
/// │ Success           │   0  │ run completed and verified               │
/// │ DecoderInitFailed │   5  │ container header unreadable or invalid   │
/// │ OverwriteRefused  │   7  │ output exists, overwrite not allowed     │
/// │ CreateFailed      │   8  │ output cannot be created / is a dir      │
/// │ OpenFailed        │  10  │ input cannot be opened                   │
/// │ ReadFailed        │  11  │ raw input read failed (compression)      │
/// │ WriteFailed       │  12  │ output write or flush failed             │
/// │ ProcessFailed     │  13  │ block decode/encode or validation failed │
/// │ SameFile          │  20  │ input and output are the same file       │
/// └───────────────────┴──────┴──────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    DecoderInitFailed = 5,
    OverwriteRefused = 7,
    CreateFailed = 8,
    OpenFailed = 10,
    ReadFailed = 11,
    WriteFailed = 12,
    ProcessFailed = 13,
    SameFile = 20,
}

impl ExitCode {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == ExitCode::Success
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({})", self.code())
    }
}

/// Outcome of one run: an exit code and the bytes written to the output.
///
/// On failure `bytes` is what reached the sink before the failing step;
/// the sink content is then partial and must not be trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunResult {
    pub code: ExitCode,
    pub bytes: u64,
}

impl RunResult {
    #[must_use]
    pub fn success(bytes: u64) -> Self {
        Self {
            code: ExitCode::Success,
            bytes,
        }
    }

    #[must_use]
    pub fn failure(code: ExitCode, bytes: u64) -> Self {
        Self { code, bytes }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL: [ExitCode; 9] = [
        ExitCode::Success,
        ExitCode::DecoderInitFailed,
        ExitCode::OverwriteRefused,
        ExitCode::CreateFailed,
        ExitCode::OpenFailed,
        ExitCode::ReadFailed,
        ExitCode::WriteFailed,
        ExitCode::ProcessFailed,
        ExitCode::SameFile,
    ];

    #[test]
    fn codes_are_distinct_and_only_success_is_zero() {
        let values: HashSet<i32> = ALL.iter().map(|c| c.code()).collect();
        assert_eq!(values.len(), ALL.len());
        for code in ALL {
            assert_eq!(code.code() == 0, code.is_success());
        }
    }

    #[test]
    fn run_result_constructors() {
        assert_eq!(RunResult::success(6), RunResult { code: ExitCode::Success, bytes: 6 });
        assert!(!RunResult::failure(ExitCode::WriteFailed, 3).is_success());
    }

    #[test]
    fn display_includes_numeric_code() {
        assert_eq!(ExitCode::SameFile.to_string(), "SameFile (20)");
    }
}
