//! Storage error codes
//!
//! Storage results travel through the ABI as a single `u16`. Values at or
//! above `ERROR_ANY` are errors; anything below is a successful result
//! (a byte count, an entry count, an entry id...).

use core::fmt;

use crate::numbers::{ERROR_ANY, ERROR_EXISTS, ERROR_INVALID, ERROR_IO, ERROR_NOT_FOUND, ERROR_NO_SPACE};

/// Storage result type
pub type FsResult<T> = Result<T, FsError>;

/// Storage error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// Path or entry not found
    NotFound,
    /// Destination already exists
    Exists,
    /// No space left on the disk
    NoSpace,
    /// Disk I/O failure
    Io,
    /// Malformed path or argument
    Invalid,
    /// Any other code in the reserved range
    Other(u16),
}

impl FsError {
    /// Convert to the ABI error code
    pub fn code(&self) -> u16 {
        match self {
            FsError::NotFound => ERROR_NOT_FOUND,
            FsError::Exists => ERROR_EXISTS,
            FsError::NoSpace => ERROR_NO_SPACE,
            FsError::Io => ERROR_IO,
            FsError::Invalid => ERROR_INVALID,
            FsError::Other(code) => (*code).max(ERROR_ANY),
        }
    }

    /// Decode an ABI code, `None` if the code is a success value
    pub fn from_code(code: u16) -> Option<FsError> {
        match code {
            ERROR_NOT_FOUND => Some(FsError::NotFound),
            ERROR_EXISTS => Some(FsError::Exists),
            ERROR_NO_SPACE => Some(FsError::NoSpace),
            ERROR_IO => Some(FsError::Io),
            ERROR_INVALID => Some(FsError::Invalid),
            c if c >= ERROR_ANY => Some(FsError::Other(c)),
            _ => None,
        }
    }

    /// Split an ABI result into success value or error
    pub fn check(code: u16) -> FsResult<u16> {
        match FsError::from_code(code) {
            Some(err) => Err(err),
            None => Ok(code),
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::NotFound => write!(f, "not found"),
            FsError::Exists => write!(f, "already exists"),
            FsError::NoSpace => write!(f, "no space left"),
            FsError::Io => write!(f, "I/O error"),
            FsError::Invalid => write!(f, "invalid path or argument"),
            FsError::Other(code) => write!(f, "error {:#06x}", code),
        }
    }
}

/// Flatten a storage result into its ABI code
pub fn result_code(result: FsResult<u16>) -> u16 {
    match result {
        Ok(value) => value.min(ERROR_ANY - 1),
        Err(err) => err.code(),
    }
}
