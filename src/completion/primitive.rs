use std::sync::Arc;

use super::CompletionToken;
use crate::events::PublishRequest;

/// An external fire-and-forget publish primitive.
///
/// # Contract
///
/// - Returning `true` means the request was accepted for asynchronous
///   processing, not that it succeeded. The primitive must later call
///   [`CompletionToken::complete`] exactly once, from any thread.
/// - Returning `false` means the request was rejected before any
///   registration. The token should be dropped without completing it; the
///   handler then runs once with [`ErrorCode::UNKNOWN`](crate::events::ErrorCode::UNKNOWN)
///   before `invoke` returns.
/// - A token dropped after returning `true` also settles with `UNKNOWN`.
/// - Timeouts and acknowledgment are owned by the primitive, which reports
///   them through the code it completes the token with.
pub trait PublishPrimitive {
    fn submit(&self, request: &PublishRequest<'_>, token: CompletionToken) -> bool;
}

impl<P: PublishPrimitive + ?Sized> PublishPrimitive for &P {
    fn submit(&self, request: &PublishRequest<'_>, token: CompletionToken) -> bool {
        (**self).submit(request, token)
    }
}

impl<P: PublishPrimitive + ?Sized> PublishPrimitive for Arc<P> {
    fn submit(&self, request: &PublishRequest<'_>, token: CompletionToken) -> bool {
        (**self).submit(request, token)
    }
}

impl<P: PublishPrimitive + ?Sized> PublishPrimitive for Box<P> {
    fn submit(&self, request: &PublishRequest<'_>, token: CompletionToken) -> bool {
        (**self).submit(request, token)
    }
}
