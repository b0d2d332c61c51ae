use std::fmt;

use crate::constants::codes;

/// Outcome code delivered to a completion handler.
///
/// `0` is success. The adapter itself only ever produces [`ErrorCode::UNKNOWN`]
/// (for synchronous rejections); every other value comes from the primitive
/// and is passed through without interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    /// Success
    pub const NONE: ErrorCode = ErrorCode(codes::NONE);
    /// Unclassified failure, also used for synchronous rejection
    pub const UNKNOWN: ErrorCode = ErrorCode(codes::UNKNOWN);
    /// Acknowledgment was not received before the primitive's deadline
    pub const TIMEOUT: ErrorCode = ErrorCode(codes::TIMEOUT);

    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == codes::NONE
    }

    pub const fn is_timeout(self) -> bool {
        self.0 == codes::TIMEOUT
    }
}

impl From<i32> for ErrorCode {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorCode::NONE => write!(f, "none"),
            ErrorCode::TIMEOUT => write!(f, "timeout"),
            ErrorCode::UNKNOWN => write!(f, "unknown"),
            ErrorCode(raw) => write!(f, "error({raw})"),
        }
    }
}
