//! Min-changed notification handlers.
//!
//! # Re-entrancy
//!
//! Handlers run synchronously **inside** the scheduler's critical section.
//! A handler must never call back into the same `EventScheduler` (any
//! method): the lock is not re-entrant and the call deadlocks.  Read the
//! context, record what happened, and act on it after the scheduler call
//! returns.  [`LatestMin`] packages that pattern.

use std::sync::Arc;

use parking_lot::Mutex;

/// Observer for transitions of the scheduler's min-watermark.
///
/// Called with the scheduler's shared context and the event whose time moved
/// the watermark.  Not called on every mutation: only on transitions.
///
/// Any `Fn(&C, &E) + Send + Sync` closure is a handler.
pub trait MinChangedHandler<E, C>: Send + Sync {
    fn on_min_changed(&self, ctx: &C, event: &E);
}

impl<E, C, F> MinChangedHandler<E, C> for F
where
    F: Fn(&C, &E) + Send + Sync,
{
    #[inline]
    fn on_min_changed(&self, ctx: &C, event: &E) {
        self(ctx, event)
    }
}

/// A handler that ignores every notification.  The scheduler default.
pub struct NoopHandler;

impl<E, C> MinChangedHandler<E, C> for NoopHandler {
    #[inline]
    fn on_min_changed(&self, _ctx: &C, _event: &E) {}
}

/// One-slot latch holding the most recent event that moved the watermark.
///
/// Clone it, register one clone with the scheduler, and drain the other with
/// [`take`][Self::take] outside the scheduler lock.  Older notifications that
/// were never taken are overwritten.
///
/// ```rust,ignore
/// let latest = LatestMin::new();
/// let sched = EventScheduler::new(()).with_min_changed(latest.clone());
/// sched.schedule(ev);
/// if let Some(head) = latest.take() {
///     sched.unschedule(&head.tag); // safe: not inside the callback
/// }
/// ```
pub struct LatestMin<E> {
    slot: Arc<Mutex<Option<E>>>,
}

impl<E> LatestMin<E> {
    pub fn new() -> Self {
        Self { slot: Arc::new(Mutex::new(None)) }
    }

    /// Remove and return the latched event, if any.
    pub fn take(&self) -> Option<E> {
        self.slot.lock().take()
    }

    pub fn is_set(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl<E> Clone for LatestMin<E> {
    fn clone(&self) -> Self {
        Self { slot: Arc::clone(&self.slot) }
    }
}

impl<E> Default for LatestMin<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send, C> MinChangedHandler<E, C> for LatestMin<E> {
    fn on_min_changed(&self, _ctx: &C, event: &E) {
        *self.slot.lock() = Some(event.clone());
    }
}
