#![allow(clippy::doc_markdown)] // Allow technical terms like tokio, FFI in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Publish Callback
//!
//! Publish through a fire-and-forget primitive and get the outcome back in a
//! handler, exactly once, without blocking or polling.
//!
//! ## Overview
//!
//! A publish primitive typically takes an event plus an opaque context and,
//! some time later, calls a static function with that context and an error
//! code. [`completion::PublishCallback`] wraps such a primitive: each publish
//! hands the primitive a [`completion::CompletionToken`], and whichever of
//! these happens first settles the publish:
//!
//! - the primitive rejects the publish up front, and the handler runs inline
//!   with [`events::ErrorCode::UNKNOWN`]
//! - the primitive accepts it and later completes the token, and the handler
//!   runs with the code and payload it reported
//!
//! ## Module Organization
//!
//! - [`completion`] - The adapter, the primitive trait, and completion tokens
//! - [`events`] - Error codes, publish flags, requests, and the loopback primitive
//! - [`ffi`] - Binding for C publish functions with a `void*` context
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Crate error type
//! - [`test_utils`] - Scripted primitive and handler spy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use publish_callback::completion::PublishCallback;
//! use publish_callback::events::{LoopbackPublisher, LoopbackSettings, PublishFlags};
//!
//! # async fn example() -> publish_callback::Result<()> {
//! let publisher = LoopbackPublisher::new(LoopbackSettings::default())?;
//! let callback = PublishCallback::new(publisher)
//!     .with_handler(|code, _payload| println!("callback called! err={code}"));
//!
//! if !callback.is_outstanding() {
//!     callback.publish_with_data("testEvent", b"counter=1", PublishFlags::PRIVATE | PublishFlags::WITH_ACK);
//! }
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ffi;
pub mod logging;
pub mod test_utils;

pub use completion::{Completion, CompletionToken, PublishCallback, PublishPrimitive, Submission};
pub use config::{ConfigManager, PublishCallbackConfig};
pub use error::{PublishCallbackError, Result};
pub use events::{ErrorCode, LoopbackPublisher, PublishFlags, PublishRequest};
