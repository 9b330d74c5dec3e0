use crate::arch::Arch;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParityError {
    #[error("Invalid dimension: expected {expected}, got {got}")]
    InvalidDimension {
        expected: usize,
        got: usize,
    },

    #[error("Architecture {0} is not supported on this host")]
    UnsupportedArch(Arch),

    #[error("Unknown architecture: {0}")]
    UnknownArch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Case {case} failed on {arch}: {reason}")]
    CaseFailed {
        case: String,
        arch: Arch,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ParityError>;

/// Checks that a kernel operand has the length of the first operand.
pub(crate) fn check_len(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(ParityError::InvalidDimension { expected, got });
    }
    Ok(())
}
