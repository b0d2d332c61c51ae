//! # Publish Callback Adapter
//!
//! Wraps a [`PublishPrimitive`] so that every publish ends in exactly one
//! handler call:
//!
//! ```text
//! publish_event()
//!       │
//!       ├── arm new generation (outstanding)
//!       │
//!       └── primitive.submit(request, token)
//!              │
//!              ├── false → handler(UNKNOWN, None) inline, settled
//!              │
//!              └── true  → return; later token.complete(code, payload)
//!                                   └── handler(code, payload), settled
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::token::{shared_handler, CompletionState, DeliveryPath, Phase};
use super::{CompletionToken, PublishPrimitive};
use crate::constants::DEFAULT_TTL_SECONDS;
use crate::events::{ErrorCode, PublishFlags, PublishRequest};

/// What the primitive did with a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Pending; the handler will run when the primitive completes it.
    Accepted,
    /// Rejected up front; the handler has already run with [`ErrorCode::UNKNOWN`].
    Rejected,
}

impl Submission {
    pub fn is_accepted(self) -> bool {
        matches!(self, Submission::Accepted)
    }
}

/// Publish with an asynchronous completion handler instead of blocking.
///
/// One adapter tracks one publish at a time. Wait for
/// [`is_outstanding`](Self::is_outstanding) to turn `false` before publishing
/// again, or use one adapter per concurrent publish.
///
/// The handler receives the error code (`0` on success,
/// [`ErrorCode::TIMEOUT`] when no ack arrived) and the optional payload the
/// primitive completed with.
///
/// ```rust
/// use publish_callback::completion::PublishCallback;
/// use publish_callback::events::{ErrorCode, PublishFlags};
/// use publish_callback::test_utils::ScriptedPrimitive;
///
/// let primitive = ScriptedPrimitive::accepting();
/// let callback = PublishCallback::new(primitive.clone())
///     .with_handler(|code, _payload| assert_eq!(code, ErrorCode::NONE));
///
/// callback.publish_with_data("testEvent", b"counter=1", PublishFlags::PRIVATE | PublishFlags::WITH_ACK);
/// assert!(callback.is_outstanding());
///
/// primitive.fire_next(ErrorCode::NONE, None);
/// assert!(!callback.is_outstanding());
/// ```
pub struct PublishCallback<P> {
    primitive: P,
    state: Arc<CompletionState>,
}

impl<P: PublishPrimitive> PublishCallback<P> {
    /// Adapter with no handler. Set one with [`with_handler`](Self::with_handler).
    pub fn new(primitive: P) -> Self {
        Self {
            primitive,
            state: Arc::new(CompletionState::new(None)),
        }
    }

    /// Replace the completion handler, builder style
    pub fn with_handler<F>(self, handler: F) -> Self
    where
        F: Fn(ErrorCode, Option<&[u8]>) + Send + Sync + 'static,
    {
        self.set_handler(handler);
        self
    }

    /// Replace the completion handler.
    ///
    /// Set it before publishing. Swapping it while a publish is outstanding is
    /// memory safe, but which handler observes that completion is unspecified.
    pub fn set_handler<F>(&self, handler: F) -> &Self
    where
        F: Fn(ErrorCode, Option<&[u8]>) + Send + Sync + 'static,
    {
        self.state.set_handler(Some(shared_handler(handler)));
        self
    }

    pub fn clear_handler(&self) {
        self.state.set_handler(None);
    }

    pub fn has_handler(&self) -> bool {
        self.state.has_handler()
    }

    /// Publish with no event data and the default TTL
    pub fn publish(&self, event_name: &str, flags: PublishFlags) -> Submission {
        self.publish_event(event_name, None, DEFAULT_TTL_SECONDS, flags)
    }

    /// Publish with event data and the default TTL
    pub fn publish_with_data(
        &self,
        event_name: &str,
        event_data: &[u8],
        flags: PublishFlags,
    ) -> Submission {
        self.publish_event(event_name, Some(event_data), DEFAULT_TTL_SECONDS, flags)
    }

    /// Publish with every parameter
    pub fn publish_event(
        &self,
        event_name: &str,
        event_data: Option<&[u8]>,
        ttl: u32,
        flags: PublishFlags,
    ) -> Submission {
        let request = PublishRequest {
            name: event_name,
            data: event_data,
            ttl,
            flags,
        };
        self.invoke(&request)
    }

    /// Hand `request` to the primitive and arrange for the handler to run
    /// exactly once with its outcome.
    pub fn invoke(&self, request: &PublishRequest<'_>) -> Submission {
        let generation = self.state.arm();
        let token = CompletionToken::new(Arc::clone(&self.state), generation);

        if self.primitive.submit(request, token) {
            debug!(
                event_name = request.name,
                generation,
                flags = request.flags.bits(),
                ttl = request.ttl,
                data_len = request.data_len(),
                "Publish accepted, awaiting completion"
            );
            Submission::Accepted
        } else {
            debug!(
                event_name = request.name,
                generation, "Publish rejected by primitive, completing inline"
            );
            // No-op when the primitive already dropped the token.
            self.state
                .deliver(generation, ErrorCode::UNKNOWN, None, DeliveryPath::Rejected);
            Submission::Rejected
        }
    }

    /// True while a publish has not yet reached its handler
    pub fn is_outstanding(&self) -> bool {
        self.state.phase() != Phase::Settled
    }

    /// Inverse of [`is_outstanding`](Self::is_outstanding)
    pub fn is_complete(&self) -> bool {
        !self.is_outstanding()
    }

    /// Number of publishes issued through this adapter
    pub fn invocations(&self) -> u64 {
        self.state.generation()
    }

    pub fn primitive(&self) -> &P {
        &self.primitive
    }
}

impl<P> fmt::Debug for PublishCallback<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishCallback")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<P> Drop for PublishCallback<P> {
    fn drop(&mut self) {
        if self.state.phase() != Phase::Settled {
            debug!(
                generation = self.state.generation(),
                "PublishCallback dropped while outstanding; pending completion keeps its state alive"
            );
        }
    }
}
