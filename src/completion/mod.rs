//! # Completion Adapter
//!
//! Turns a fire-and-forget publish primitive into a publish whose outcome
//! reaches a caller supplied handler exactly once.
//!
//! - [`PublishCallback`]: the adapter callers hold
//! - [`PublishPrimitive`]: what the adapter publishes through
//! - [`CompletionToken`]: the per-publish capability a primitive completes
//! - [`Completion`]: owned snapshot of an outcome for async consumers

pub mod adapter;
pub mod primitive;
pub mod token;

pub use adapter::{PublishCallback, Submission};
pub use primitive::PublishPrimitive;
pub use token::CompletionToken;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::events::ErrorCode;

/// Owned outcome of a publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub code: ErrorCode,
    pub payload: Option<Vec<u8>>,
}

impl Completion {
    pub fn new(code: ErrorCode, payload: Option<&[u8]>) -> Self {
        Self {
            code,
            payload: payload.map(<[u8]>::to_vec),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Payload as UTF-8, if present and valid
    pub fn payload_str(&self) -> Option<&str> {
        self.payload
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Handler that forwards every outcome onto `sender`.
    ///
    /// Lets an async task `recv().await` completions that arrive on whatever
    /// thread the primitive uses. Outcomes sent after the receiver is gone are
    /// dropped.
    pub fn forwarding_handler(
        sender: mpsc::UnboundedSender<Completion>,
    ) -> impl Fn(ErrorCode, Option<&[u8]>) + Send + Sync + 'static {
        move |code, payload| {
            if sender.send(Completion::new(code, payload)).is_err() {
                debug!(code = %code, "Completion receiver dropped, discarding outcome");
            }
        }
    }
}

/// Receive up to `pending` completions from `receiver`, passing each to
/// `on_completion`, until `deadline`.
///
/// Returns how many arrived. Fewer than `pending` means the deadline passed or
/// every sender was dropped.
pub async fn drain_completions<F>(
    receiver: &mut mpsc::UnboundedReceiver<Completion>,
    pending: u64,
    deadline: Instant,
    mut on_completion: F,
) -> u64
where
    F: FnMut(&Completion),
{
    let mut received = 0;
    while received < pending {
        match tokio::time::timeout_at(deadline, receiver.recv()).await {
            Ok(Some(completion)) => {
                received += 1;
                on_completion(&completion);
            }
            Ok(None) | Err(_) => break,
        }
    }
    received
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::events::PublishFlags;
    use crate::test_utils::ScriptedPrimitive;

    #[test]
    fn test_payload_str() {
        let completion = Completion::new(ErrorCode::NONE, Some(b"ok"));
        assert!(completion.is_success());
        assert_eq!(completion.payload_str(), Some("ok"));

        let binary = Completion::new(ErrorCode::NONE, Some(&[0xff, 0xfe]));
        assert_eq!(binary.payload_str(), None);
        assert_eq!(Completion::new(ErrorCode::TIMEOUT, None).payload_str(), None);
    }

    #[tokio::test]
    async fn test_forwarding_handler_delivers_to_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = PublishCallback::new(ScriptedPrimitive::rejecting())
            .with_handler(Completion::forwarding_handler(tx));

        callback.publish("testEvent", PublishFlags::PRIVATE);

        let completion = rx.recv().await.expect("completion forwarded");
        assert_eq!(completion, Completion::new(ErrorCode::UNKNOWN, None));
    }

    #[tokio::test]
    async fn test_drain_waits_for_outstanding_completion() {
        let primitive = ScriptedPrimitive::accepting();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = PublishCallback::new(primitive.clone())
            .with_handler(Completion::forwarding_handler(tx));

        callback.publish("testEvent", PublishFlags::WITH_ACK);
        let token = primitive.take_next().expect("token pending");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.complete(ErrorCode::NONE, Some(b"ack-payload"));
        });

        let mut seen = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        let received = drain_completions(&mut rx, callback.invocations(), deadline, |c| {
            seen.push(c.clone())
        })
        .await;

        assert_eq!(received, 1);
        assert_eq!(seen, vec![Completion::new(ErrorCode::NONE, Some(b"ack-payload"))]);
        assert!(!callback.is_outstanding());
    }

    #[tokio::test]
    async fn test_drain_stops_at_deadline() {
        let primitive = ScriptedPrimitive::accepting();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = PublishCallback::new(primitive.clone())
            .with_handler(Completion::forwarding_handler(tx));
        callback.publish("testEvent", PublishFlags::WITH_ACK);

        let deadline = Instant::now() + Duration::from_millis(20);
        let received = drain_completions(&mut rx, 1, deadline, |_| {}).await;

        assert_eq!(received, 0);
        assert!(callback.is_outstanding());
    }

    #[test]
    fn test_forwarding_handler_tolerates_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let handler = Completion::forwarding_handler(tx);
        handler(ErrorCode::NONE, None);
    }
}
