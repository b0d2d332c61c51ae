//! # FFI Bindings
//!
//! Binding layer between C publish APIs and [`CompletionToken`](crate::completion::CompletionToken).
//! The pointer-identity bridging lives here; the completion adapter itself
//! never sees a raw pointer.

pub mod c_api;
pub mod errors;

// Re-export main types for convenience
pub use c_api::{
    completion_trampoline, CompletionCallbackFn, RawPublishPrimitive, SendEventData, SendEventFn,
};
pub use errors::{FfiError, FfiResult};
