//! # Test Utilities
//!
//! In-memory stand-ins for a publish primitive and a completion handler, so
//! adapter behavior can be driven step by step without a runtime.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::completion::{CompletionToken, PublishPrimitive};
use crate::events::{ErrorCode, PublishRequest};

/// Owned copy of a request seen by [`ScriptedPrimitive`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedPublish {
    pub name: String,
    pub data: Option<Vec<u8>>,
    pub ttl: u32,
    /// Raw flag bits, as a primitive would see them
    pub flags: u32,
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct ScriptedInner {
    submissions: Vec<SubmittedPublish>,
    pending: VecDeque<CompletionToken>,
    retained_rejections: VecDeque<CompletionToken>,
}

/// Primitive whose accept/reject answer is set by the test and whose
/// completions are fired by hand.
///
/// Clones share state, so a test can keep one clone and give another to the
/// adapter.
#[derive(Debug, Clone)]
pub struct ScriptedPrimitive {
    accept: Arc<AtomicBool>,
    retain_rejected: Arc<AtomicBool>,
    inner: Arc<Mutex<ScriptedInner>>,
}

impl ScriptedPrimitive {
    fn with_answer(accept: bool) -> Self {
        Self {
            accept: Arc::new(AtomicBool::new(accept)),
            retain_rejected: Arc::new(AtomicBool::new(false)),
            inner: Arc::new(Mutex::new(ScriptedInner::default())),
        }
    }

    pub fn accepting() -> Self {
        Self::with_answer(true)
    }

    pub fn rejecting() -> Self {
        Self::with_answer(false)
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    /// Keep tokens of rejected submits instead of dropping them, imitating a
    /// primitive that calls back even though it said no.
    pub fn set_retain_rejected(&self, retain: bool) {
        self.retain_rejected.store(retain, Ordering::SeqCst);
    }

    pub fn submissions(&self) -> Vec<SubmittedPublish> {
        self.inner.lock().submissions.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Take the oldest pending token without completing it
    pub fn take_next(&self) -> Option<CompletionToken> {
        self.inner.lock().pending.pop_front()
    }

    /// Complete the oldest pending token.
    ///
    /// Returns what [`CompletionToken::complete`] returned, or `false` when
    /// nothing was pending.
    pub fn fire_next(&self, code: ErrorCode, payload: Option<&[u8]>) -> bool {
        // Released before completing so handlers can publish again.
        let token = self.inner.lock().pending.pop_front();
        token.is_some_and(|token| token.complete(code, payload))
    }

    /// Complete the oldest token kept from a rejected submit
    pub fn fire_retained_rejection(&self, code: ErrorCode) -> bool {
        let token = self.inner.lock().retained_rejections.pop_front();
        token.is_some_and(|token| token.complete(code, None))
    }
}

impl PublishPrimitive for ScriptedPrimitive {
    fn submit(&self, request: &PublishRequest<'_>, token: CompletionToken) -> bool {
        let accepted = self.accept.load(Ordering::SeqCst);
        let mut inner = self.inner.lock();
        inner.submissions.push(SubmittedPublish {
            name: request.name.to_string(),
            data: request.data.map(<[u8]>::to_vec),
            ttl: request.ttl,
            flags: request.flags.bits(),
            accepted,
        });

        if accepted {
            inner.pending.push_back(token);
        } else if self.retain_rejected.load(Ordering::SeqCst) {
            inner.retained_rejections.push_back(token);
        } else {
            // Dropping the token runs the handler, which may publish again.
            drop(inner);
            drop(token);
        }
        accepted
    }
}

/// Recorded handler invocation
pub type RecordedCall = (ErrorCode, Option<Vec<u8>>);

/// Records every call made to the handlers it hands out
#[derive(Debug, Clone, Default)]
pub struct HandlerSpy {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl HandlerSpy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self) -> impl Fn(ErrorCode, Option<&[u8]>) + Send + Sync + 'static {
        let calls = Arc::clone(&self.calls);
        move |code, payload| {
            calls.lock().push((code, payload.map(<[u8]>::to_vec)));
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::PublishCallback;
    use crate::events::PublishFlags;

    #[test]
    fn test_scripted_primitive_records_rejections() {
        let primitive = ScriptedPrimitive::rejecting();
        let callback = PublishCallback::new(primitive.clone());

        callback.publish("testEvent", PublishFlags::PRIVATE);

        let submissions = primitive.submissions();
        assert_eq!(submissions.len(), 1);
        assert!(!submissions[0].accepted);
        assert_eq!(primitive.pending_count(), 0);
    }

    #[test]
    fn test_handler_may_republish_from_rejection() {
        let primitive = ScriptedPrimitive::rejecting();
        let callback = Arc::new(PublishCallback::new(primitive.clone()));
        let weak = Arc::downgrade(&callback);
        callback.set_handler(move |_, _| {
            if let Some(callback) = weak.upgrade() {
                if callback.invocations() < 3 {
                    callback.publish("retry", PublishFlags::PRIVATE);
                }
            }
        });

        callback.publish("testEvent", PublishFlags::PRIVATE);

        assert_eq!(primitive.submissions().len(), 3);
        assert!(!callback.is_outstanding());
    }

    #[test]
    fn test_fire_next_without_pending() {
        let primitive = ScriptedPrimitive::accepting();
        assert!(!primitive.fire_next(ErrorCode::NONE, None));
        assert!(primitive.take_next().is_none());
    }

    #[test]
    fn test_handler_spy_copies_payloads() {
        let spy = HandlerSpy::new();
        let handler = spy.handler();
        handler(ErrorCode::NONE, Some(b"abc"));
        handler(ErrorCode::TIMEOUT, None);
        assert_eq!(
            spy.calls(),
            vec![
                (ErrorCode::NONE, Some(b"abc".to_vec())),
                (ErrorCode::TIMEOUT, None)
            ]
        );
    }
}
