//! Process exit codes
//!
//! Scripts rely on these values, so existing codes must not change.

/// Exit status of a wasabi-push invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Every file was uploaded
    Success = 0,
    /// At least one file failed, or the directory could not be scanned
    GeneralError = 1,
    /// Invalid arguments or configuration
    UsageError = 2,
    /// The object store client could not be created
    NetworkError = 3,
}

impl ExitCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_u8(), 0);
        assert_eq!(ExitCode::GeneralError.as_u8(), 1);
        assert_eq!(ExitCode::UsageError.as_u8(), 2);
        assert_eq!(ExitCode::NetworkError.as_u8(), 3);
    }
}
