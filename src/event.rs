//! Session event notifications (SPEC_FULL.md §6, §9).
//!
//! Grounded on `srtp.c`'s `asrtpa_event_data_t`/`asrtpa_handle_event`/
//! `asrtpa_install_event_handler`. The original carries a single
//! process-global handler function pointer; this implementation instead
//! gives each [`crate::session::Session`] its own handler field (a boxed
//! `FnMut`), and exposes a thin process-wide wrapper purely for API-shape
//! parity with the original (`init`/`deinit`/`install_event_handler`
//! below), guarded so repeated calls are idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

/// Notification delivered to a session's event handler.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A stream that was bound to one direction (sender or receiver) saw
    /// traffic in the other direction.
    SsrcCollision,
    /// A stream's key limiter crossed its soft-limit threshold.
    KeySoftLimit,
    /// A stream's key limiter reached its hard limit; the triggering
    /// `protect`/`unprotect` call also fails with `Error::KeyExpired`.
    KeyHardLimit,
    /// An RTCP sender index would have overflowed past 2^31 - 1.
    PacketIndexLimit,
}

/// A session's event handler: invoked synchronously from the data path
/// with the offending stream's SSRC and the event kind. Must not call
/// back into the session that invoked it (SPEC_FULL.md §5).
pub type EventHandler = Box<dyn FnMut(u32, Event)>;

static KERNEL_INITIALIZED: OnceLock<AtomicBool> = OnceLock::new();

fn flag() -> &'static AtomicBool {
    KERNEL_INITIALIZED.get_or_init(|| AtomicBool::new(false))
}

/// Process-wide lifecycle hook kept for API-shape parity with the
/// original `asrtpa_init(force)`. Idempotent unless `force` is set: a
/// second call with `force = false` while already initialized is a
/// no-op; `force = true` re-runs initialization regardless.
pub fn init(force: bool) {
    if force || !flag().load(Ordering::SeqCst) {
        flag().store(true, Ordering::SeqCst);
    }
}

/// Process-wide teardown hook kept for API-shape parity with the
/// original `asrtpa_deinit`. Also clears the process-wide event handler.
pub fn deinit() {
    flag().store(false, Ordering::SeqCst);
    clear_process_event_handler();
}

pub fn is_initialized() -> bool {
    flag().load(Ordering::SeqCst)
}

type GlobalEventHandler = Box<dyn FnMut(u32, Event) + Send>;

static PROCESS_EVENT_HANDLER: OnceLock<Mutex<Option<GlobalEventHandler>>> = OnceLock::new();

fn process_handler_slot() -> &'static Mutex<Option<GlobalEventHandler>> {
    PROCESS_EVENT_HANDLER.get_or_init(|| Mutex::new(None))
}

/// Install (or clear, with `None`) a process-wide event handler, for
/// callers that want the original's single-global-callback shape instead
/// of a per-[`crate::session::Session`] handler. Nothing in this crate's
/// data path invokes this handler; it exists purely as API-shape parity
/// with `asrtpa_install_event_handler`, same as the original's global
/// function pointer.
pub fn install_process_event_handler(handler: Option<impl FnMut(u32, Event) + Send + 'static>) {
    let mut slot = process_handler_slot().lock().expect("event handler mutex poisoned");
    *slot = handler.map(|h| Box::new(h) as GlobalEventHandler);
}

fn clear_process_event_handler() {
    install_process_event_handler(None::<fn(u32, Event)>);
}
