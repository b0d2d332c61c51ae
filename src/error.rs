use crate::config::ConfigurationError;
use crate::ffi::FfiError;

/// Errors raised outside the completion path.
///
/// Publish outcomes never surface here; they reach the completion handler as
/// an [`ErrorCode`](crate::events::ErrorCode).
#[derive(Debug, thiserror::Error)]
pub enum PublishCallbackError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("No tokio runtime available: {0}")]
    RuntimeUnavailable(String),

    #[error("FFI error: {0}")]
    Ffi(#[from] FfiError),
}

pub type Result<T> = std::result::Result<T, PublishCallbackError>;
