//! # C-ABI Publish Binding
//!
//! Bridges a C publish function that takes a `void*` context and later calls
//! a static callback with that context back to [`CompletionToken`]s.
//!
//! ```text
//! RawPublishPrimitive::submit(request, token)
//!       │
//!       ├── Box<Registration { SendEventData, token }> → raw pointer
//!       │        handler_data = the registration's own address
//!       │
//!       └── send_event(name, data, ttl, flags, registration)
//!              │
//!              ├── false → Box reclaimed, token dropped unfired
//!              │
//!              └── true  → later: completion_trampoline(err, data, handler_data, _)
//!                                   └── Box reclaimed, token.complete(err, data)
//! ```
//!
//! Each publish gets its own heap registration, so its address is stable
//! while the C side holds it and it can not be shared between adapters.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::mem::size_of;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use tracing::{debug, warn};

use super::errors::{FfiError, FfiResult};
use crate::completion::{CompletionToken, PublishPrimitive};
use crate::events::{ErrorCode, PublishRequest};
use crate::logging::log_error;

/// Callback the C side invokes once per accepted publish
pub type CompletionCallbackFn = unsafe extern "C" fn(
    error: c_int,
    data: *const c_void,
    callback_data: *mut c_void,
    reserved: *mut c_void,
);

/// C publish entry point.
///
/// Returns `true` when the event was queued, in which case the
/// `handler_callback` of the [`SendEventData`] passed as `reserved` will be
/// called exactly once with its `handler_data`.
pub type SendEventFn = unsafe extern "C" fn(
    name: *const c_char,
    data: *const c_char,
    ttl: c_int,
    flags: u32,
    reserved: *mut c_void,
) -> bool;

/// Registration record the C side reads to find its completion callback
#[repr(C)]
#[derive(Debug)]
pub struct SendEventData {
    pub size: usize,
    pub handler_callback: CompletionCallbackFn,
    pub handler_data: *mut c_void,
}

/// `SendEventData` must stay first so the record and registration share an address.
#[repr(C)]
struct Registration {
    data: SendEventData,
    token: CompletionToken,
}

impl Registration {
    fn into_raw(token: CompletionToken) -> *mut Registration {
        let raw = Box::into_raw(Box::new(Registration {
            data: SendEventData {
                size: size_of::<SendEventData>(),
                handler_callback: completion_trampoline,
                handler_data: ptr::null_mut(),
            },
            token,
        }));
        // SAFETY: `raw` was just produced by Box::into_raw and is uniquely owned here.
        unsafe {
            (*raw).data.handler_data = raw.cast::<c_void>();
        }
        raw
    }
}

/// Publish arguments converted to C strings
struct CArguments {
    name: CString,
    data: Option<CString>,
    ttl: c_int,
}

impl CArguments {
    fn from_request(request: &PublishRequest<'_>) -> FfiResult<Self> {
        let name = CString::new(request.name).map_err(FfiError::InvalidEventName)?;
        let data = request
            .data
            .map(CString::new)
            .transpose()
            .map_err(FfiError::InvalidEventData)?;
        let ttl = c_int::try_from(request.ttl).map_err(|_| FfiError::TtlOutOfRange(request.ttl))?;
        Ok(Self { name, data, ttl })
    }

    fn data_ptr(&self) -> *const c_char {
        self.data.as_ref().map_or(ptr::null(), |data| data.as_ptr())
    }
}

/// [`PublishPrimitive`] over a C `send_event` function
#[derive(Debug, Clone, Copy)]
pub struct RawPublishPrimitive {
    send_event: SendEventFn,
}

impl RawPublishPrimitive {
    /// Wrap a C publish function.
    ///
    /// # Safety
    ///
    /// `send_event` must copy `name` and `data` before returning, and must
    /// honor the completion contract: when it returns `true` it calls the
    /// record's `handler_callback` exactly once with the record's
    /// `handler_data`; when it returns `false` it never does.
    pub unsafe fn new(send_event: SendEventFn) -> Self {
        Self { send_event }
    }
}

impl PublishPrimitive for RawPublishPrimitive {
    fn submit(&self, request: &PublishRequest<'_>, token: CompletionToken) -> bool {
        let arguments = match CArguments::from_request(request) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(event_name = request.name, error = %e, "Publish can not cross the C boundary");
                return false;
            }
        };

        let registration = Registration::into_raw(token);

        // SAFETY: the strings outlive the call, and the constructor's contract
        // covers what send_event does with the registration pointer.
        let accepted = unsafe {
            (self.send_event)(
                arguments.name.as_ptr(),
                arguments.data_ptr(),
                arguments.ttl,
                request.flags.bits(),
                registration.cast::<c_void>(),
            )
        };

        if !accepted {
            // SAFETY: a rejected send never calls back, so the registration is still ours.
            drop(unsafe { Box::from_raw(registration) });
        }
        debug!(event_name = request.name, accepted, "C publish submitted");
        accepted
    }
}

/// Static completion entry point stored in every [`SendEventData`].
///
/// Recovers the registration from `callback_data`, completes its token with
/// `error` and `data` (read as a nul-terminated string when non-null), and
/// frees the registration. Panics from the handler are caught here.
///
/// # Safety
///
/// `callback_data` must be the `handler_data` of a registration created by
/// [`RawPublishPrimitive`] whose send was accepted, and this must be the only
/// call for it. `data` must be null or a valid nul-terminated string for the
/// duration of the call.
pub unsafe extern "C" fn completion_trampoline(
    error: c_int,
    data: *const c_void,
    callback_data: *mut c_void,
    _reserved: *mut c_void,
) {
    if callback_data.is_null() {
        warn!(error, "Completion callback invoked without registration data");
        return;
    }

    // SAFETY: per the function contract this is a live, unclaimed registration.
    let registration = unsafe { Box::from_raw(callback_data.cast::<Registration>()) };
    let Registration { token, .. } = *registration;

    let payload = if data.is_null() {
        None
    } else {
        // SAFETY: per the function contract `data` is a valid C string.
        Some(unsafe { CStr::from_ptr(data.cast::<c_char>()) }.to_bytes())
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        token.complete(ErrorCode::from_raw(error), payload)
    }));
    if outcome.is_err() {
        log_error(
            "ffi",
            "completion_trampoline",
            "completion handler panicked",
            Some("panic contained at the C boundary"),
        );
    }
}
