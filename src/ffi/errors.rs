//! # FFI Error Types
//!
//! Reasons a request can not be handed across the C boundary.

use std::ffi::NulError;

/// Error converting a publish request into C arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FfiError {
    /// Event name contains an interior NUL byte
    #[error("Event name is not a valid C string: {0}")]
    InvalidEventName(NulError),

    /// Event data contains an interior NUL byte
    #[error("Event data is not a valid C string: {0}")]
    InvalidEventData(NulError),

    /// TTL does not fit a C int
    #[error("TTL {0} exceeds the C int range")]
    TtlOutOfRange(u32),
}

/// Result type for FFI conversions
pub type FfiResult<T> = Result<T, FfiError>;
