//! Completion contract tests
//!
//! Drives a `PublishCallback` through a scripted primitive and checks when,
//! how often, and with what the handler runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use publish_callback::events::{ErrorCode, PublishFlags, PublishRequest};
use publish_callback::test_utils::{HandlerSpy, ScriptedPrimitive};
use publish_callback::{PublishCallback, Submission};

#[test]
fn rejected_publish_calls_handler_before_returning() {
    let primitive = ScriptedPrimitive::rejecting();
    let returned = Arc::new(AtomicBool::new(false));
    let observed_before_return = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&returned);
    let observed = Arc::clone(&observed_before_return);
    let callback = PublishCallback::new(primitive).with_handler(move |code, payload| {
        assert_eq!(code, ErrorCode::UNKNOWN);
        assert!(payload.is_none());
        observed.store(!flag.load(Ordering::SeqCst), Ordering::SeqCst);
    });

    let submission = callback.publish_with_data("testEvent", b"counter=1", PublishFlags::PRIVATE);
    returned.store(true, Ordering::SeqCst);

    assert_eq!(submission, Submission::Rejected);
    assert!(observed_before_return.load(Ordering::SeqCst));
    assert!(!callback.is_outstanding());
}

#[test]
fn accepted_publish_delivers_exact_outcome_later() {
    let primitive = ScriptedPrimitive::accepting();
    let spy = HandlerSpy::new();
    let callback = PublishCallback::new(primitive.clone()).with_handler(spy.handler());

    let submission = callback.publish("testEvent", PublishFlags::PRIVATE | PublishFlags::WITH_ACK);

    assert_eq!(submission, Submission::Accepted);
    assert!(callback.is_outstanding());
    assert!(spy.calls().is_empty(), "no synchronous call for an accepted publish");

    assert!(primitive.fire_next(ErrorCode::NONE, Some(b"ack-payload")));

    assert_eq!(spy.calls(), vec![(ErrorCode::NONE, Some(b"ack-payload".to_vec()))]);
    assert!(!callback.is_outstanding());
}

#[test]
fn completion_from_another_thread_settles_adapter() {
    let primitive = ScriptedPrimitive::accepting();
    let spy = HandlerSpy::new();
    let callback = PublishCallback::new(primitive.clone()).with_handler(spy.handler());

    callback.publish("testEvent", PublishFlags::WITH_ACK);
    let token = primitive.take_next().expect("token pending");

    thread::spawn(move || {
        assert!(token.complete(ErrorCode::TIMEOUT, None));
    })
    .join()
    .unwrap();

    assert_eq!(spy.calls(), vec![(ErrorCode::TIMEOUT, None)]);
    assert!(!callback.is_outstanding());
}

#[test]
fn no_handler_still_transitions_to_settled() {
    let primitive = ScriptedPrimitive::accepting();
    let callback = PublishCallback::new(primitive.clone());

    callback.publish("testEvent", PublishFlags::WITH_ACK);
    assert!(callback.is_outstanding());

    assert!(primitive.fire_next(ErrorCode::NONE, Some(b"ack-payload")));
    assert!(!callback.is_outstanding());
}

#[test]
fn republish_after_settlement_rearms() {
    let primitive = ScriptedPrimitive::accepting();
    let spy = HandlerSpy::new();
    let callback = PublishCallback::new(primitive.clone()).with_handler(spy.handler());

    callback.publish("first", PublishFlags::WITH_ACK);
    primitive.fire_next(ErrorCode::NONE, Some(b"first"));
    assert!(!callback.is_outstanding());

    callback.publish("second", PublishFlags::WITH_ACK);
    assert!(callback.is_outstanding());
    primitive.fire_next(ErrorCode::from_raw(-7), Some(b"second"));

    assert_eq!(
        spy.calls(),
        vec![
            (ErrorCode::NONE, Some(b"first".to_vec())),
            (ErrorCode::from_raw(-7), Some(b"second".to_vec())),
        ]
    );
    assert_eq!(callback.invocations(), 2);
}

#[test]
fn rejection_then_acceptance_alternate_cleanly() {
    let primitive = ScriptedPrimitive::rejecting();
    let spy = HandlerSpy::new();
    let callback = PublishCallback::new(primitive.clone()).with_handler(spy.handler());

    callback.publish("testEvent", PublishFlags::PRIVATE);
    primitive.set_accept(true);
    callback.publish("testEvent", PublishFlags::PRIVATE);
    primitive.fire_next(ErrorCode::NONE, None);

    assert_eq!(
        spy.calls(),
        vec![(ErrorCode::UNKNOWN, None), (ErrorCode::NONE, None)]
    );
}

#[test]
fn misbehaving_primitive_cannot_double_deliver() {
    let primitive = ScriptedPrimitive::rejecting();
    primitive.set_retain_rejected(true);
    let spy = HandlerSpy::new();
    let callback = PublishCallback::new(primitive.clone()).with_handler(spy.handler());

    callback.publish("testEvent", PublishFlags::PRIVATE);
    assert!(!primitive.fire_retained_rejection(ErrorCode::NONE));

    assert_eq!(spy.calls(), vec![(ErrorCode::UNKNOWN, None)]);
}

#[test]
fn invoke_accepts_prebuilt_request() {
    let primitive = ScriptedPrimitive::accepting();
    let callback = PublishCallback::new(primitive.clone());
    let request = PublishRequest::new("testEvent")
        .with_data(b"counter=9")
        .with_ttl(5)
        .with_flags(PublishFlags::NO_ACK);

    assert!(callback.invoke(&request).is_accepted());

    let submitted = &primitive.submissions()[0];
    assert_eq!(submitted.ttl, 5);
    assert_eq!(submitted.flags, PublishFlags::NO_ACK.bits());
}

#[test]
fn handler_replaced_before_publish_is_the_one_called() {
    let primitive = ScriptedPrimitive::rejecting();
    let first = HandlerSpy::new();
    let second = HandlerSpy::new();
    let callback = PublishCallback::new(primitive).with_handler(first.handler());

    callback.set_handler(second.handler());
    callback.publish("testEvent", PublishFlags::PRIVATE);

    assert_eq!(first.call_count(), 0);
    assert_eq!(second.call_count(), 1);
}

/// Adapter whose handler records what `is_outstanding` reported while it ran
fn observing_adapter(
    primitive: ScriptedPrimitive,
) -> (Arc<PublishCallback<ScriptedPrimitive>>, Arc<AtomicBool>) {
    let callback = Arc::new(PublishCallback::new(primitive));
    let seen = Arc::new(AtomicBool::new(false));

    let weak = Arc::downgrade(&callback);
    let record = Arc::clone(&seen);
    callback.set_handler(move |_, _| {
        if let Some(callback) = weak.upgrade() {
            record.store(callback.is_outstanding(), Ordering::SeqCst);
        }
    });
    (callback, seen)
}

#[test]
fn accepted_publish_is_outstanding_while_handler_runs() {
    let primitive = ScriptedPrimitive::accepting();
    let (callback, seen) = observing_adapter(primitive.clone());

    callback.publish("testEvent", PublishFlags::WITH_ACK);
    assert!(primitive.fire_next(ErrorCode::NONE, None));

    assert!(seen.load(Ordering::SeqCst), "handler saw the publish as outstanding");
    assert!(!callback.is_outstanding());
}

#[test]
fn rejected_publish_is_outstanding_while_handler_runs() {
    let (callback, seen) = observing_adapter(ScriptedPrimitive::rejecting());

    let submission = callback.publish("testEvent", PublishFlags::PRIVATE);

    assert_eq!(submission, Submission::Rejected);
    assert!(seen.load(Ordering::SeqCst), "handler saw the publish as outstanding");
    assert!(!callback.is_outstanding());
}

#[test]
fn rejected_publish_with_retained_token_is_outstanding_while_handler_runs() {
    let primitive = ScriptedPrimitive::rejecting();
    primitive.set_retain_rejected(true);
    let (callback, seen) = observing_adapter(primitive);

    callback.publish("testEvent", PublishFlags::PRIVATE);

    assert!(seen.load(Ordering::SeqCst));
    assert!(!callback.is_outstanding());
}

#[test]
fn lost_token_settles_with_unknown() {
    let primitive = ScriptedPrimitive::accepting();
    let spy = HandlerSpy::new();
    let callback = PublishCallback::new(primitive.clone()).with_handler(spy.handler());

    callback.publish("testEvent", PublishFlags::WITH_ACK);
    drop(primitive.take_next());

    assert_eq!(spy.calls(), vec![(ErrorCode::UNKNOWN, None)]);
    assert!(!callback.is_outstanding());
}
