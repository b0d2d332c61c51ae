//! Per-invocation registration tokens and the settle state they resolve to.
//!
//! A [`CompletionToken`] is the capability a primitive holds while a publish
//! is pending. It owns a reference-counted handle to the adapter's state, so
//! the state outlives the adapter if the adapter is dropped first, and it is
//! consumed by [`CompletionToken::complete`], so a single token can not be
//! completed twice. A token dropped without being completed settles its
//! invocation with [`ErrorCode::UNKNOWN`]. Each token is stamped with the generation of the
//! invocation that created it; a token whose generation is no longer armed
//! is stale and never reaches the handler.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::events::ErrorCode;

/// Completion handler as stored by the adapter
pub(crate) type SharedHandler = Arc<dyn Fn(ErrorCode, Option<&[u8]>) + Send + Sync>;

pub(crate) fn shared_handler<F>(handler: F) -> SharedHandler
where
    F: Fn(ErrorCode, Option<&[u8]>) + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// Settle state of the current invocation.
/// State machine: `Settled -> Armed -> Delivering -> Settled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Waiting for the primitive (or the rejection fallback).
    Armed,
    /// The handler for this generation is running.
    Delivering,
    /// Handler has returned. Initial and terminal state.
    Settled,
}

/// Which path settled an invocation, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryPath {
    /// `submit` returned `false`; the adapter completed inline.
    Rejected,
    /// The primitive completed the token.
    Primitive,
    /// The token was dropped without being completed.
    Dropped,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    phase: Phase,
}

/// State shared between one adapter and every token it has issued
pub(crate) struct CompletionState {
    handler: Mutex<Option<SharedHandler>>,
    slot: Mutex<Slot>,
}

impl CompletionState {
    pub(crate) fn new(handler: Option<SharedHandler>) -> Self {
        Self {
            handler: Mutex::new(handler),
            slot: Mutex::new(Slot {
                generation: 0,
                phase: Phase::Settled,
            }),
        }
    }

    pub(crate) fn set_handler(&self, handler: Option<SharedHandler>) {
        *self.handler.lock() = handler;
    }

    pub(crate) fn has_handler(&self) -> bool {
        self.handler.lock().is_some()
    }

    pub(crate) fn phase(&self) -> Phase {
        self.slot.lock().phase
    }

    pub(crate) fn generation(&self) -> u64 {
        self.slot.lock().generation
    }

    /// Start a new invocation and return its generation.
    ///
    /// Re-arming while `Armed` supersedes the pending invocation; its token
    /// goes stale. Re-arming from inside a handler (`Delivering`) is allowed.
    pub(crate) fn arm(&self) -> u64 {
        let mut slot = self.slot.lock();
        if slot.phase == Phase::Armed {
            warn!(
                superseded_generation = slot.generation,
                "Publish invoked while a previous publish is still outstanding; its completion will be dropped"
            );
        }
        slot.generation = slot.generation.wrapping_add(1);
        slot.phase = Phase::Armed;
        slot.generation
    }

    /// Run the handler for `generation` if that generation is still armed.
    ///
    /// Returns `false` for stale deliveries.
    pub(crate) fn deliver(
        &self,
        generation: u64,
        code: ErrorCode,
        payload: Option<&[u8]>,
        path: DeliveryPath,
    ) -> bool {
        {
            let mut slot = self.slot.lock();
            if slot.generation != generation || slot.phase != Phase::Armed {
                // A rejected submit settles through both the dropped token and
                // the inline fallback; only primitive completions warn.
                if path == DeliveryPath::Primitive {
                    warn!(
                        generation,
                        current_generation = slot.generation,
                        phase = ?slot.phase,
                        code = %code,
                        "Dropping stale publish completion"
                    );
                } else {
                    debug!(
                        generation,
                        current_generation = slot.generation,
                        ?path,
                        "Publish already settled"
                    );
                }
                return false;
            }
            slot.phase = Phase::Delivering;
        }

        // Cloned out of the lock so the handler may re-enter the adapter.
        let handler = self.handler.lock().clone();
        let _settle = SettleGuard {
            state: self,
            generation,
        };

        debug!(
            generation,
            code = %code,
            ?path,
            has_payload = payload.is_some(),
            has_handler = handler.is_some(),
            "Delivering publish completion"
        );

        if let Some(handler) = handler {
            handler(code, payload);
        }
        true
    }

    fn settle(&self, generation: u64) {
        let mut slot = self.slot.lock();
        // A handler that re-invoked has already moved the slot on.
        if slot.generation == generation && slot.phase == Phase::Delivering {
            slot.phase = Phase::Settled;
        }
    }
}

impl fmt::Debug for CompletionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("CompletionState")
            .field("generation", &slot.generation)
            .field("phase", &slot.phase)
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// Settles on drop so a panicking handler still leaves the adapter settled.
struct SettleGuard<'a> {
    state: &'a CompletionState,
    generation: u64,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        self.state.settle(self.generation);
    }
}

/// Correlation token handed to a [`PublishPrimitive`](super::PublishPrimitive)
/// for one accepted publish.
///
/// The primitive completes it exactly once, from any thread, when the
/// outcome is known. Dropping it without completing delivers
/// [`ErrorCode::UNKNOWN`] instead, so a primitive that loses a token (a
/// rejected submit, a cancelled task, a runtime shutting down) still settles
/// the invocation.
#[must_use = "a pending publish settles with UNKNOWN when its token is dropped"]
pub struct CompletionToken {
    state: Arc<CompletionState>,
    generation: u64,
    completed: bool,
}

impl CompletionToken {
    pub(crate) fn new(state: Arc<CompletionState>, generation: u64) -> Self {
        Self {
            state,
            generation,
            completed: false,
        }
    }

    /// Invocation this token belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether completing this token would still reach the handler
    pub fn is_current(&self) -> bool {
        let slot = self.state.slot.lock();
        slot.generation == self.generation && slot.phase == Phase::Armed
    }

    /// Deliver the outcome of the publish.
    ///
    /// Runs the adapter's handler (if any) on the calling thread and then
    /// settles the invocation. Returns `false` if the token was stale and
    /// nothing ran.
    pub fn complete(mut self, code: ErrorCode, payload: Option<&[u8]>) -> bool {
        self.completed = true;
        self.state
            .deliver(self.generation, code, payload, DeliveryPath::Primitive)
    }

    /// True when both tokens refer to the same adapter state
    pub fn same_adapter(&self, other: &CompletionToken) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        if !self.completed {
            self.state.deliver(
                self.generation,
                ErrorCode::UNKNOWN,
                None,
                DeliveryPath::Dropped,
            );
        }
    }
}

impl fmt::Debug for CompletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionToken")
            .field("generation", &self.generation)
            .field("current", &self.is_current())
            .finish()
    }
}
