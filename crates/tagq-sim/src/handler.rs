//! The `EventHandler` trait and the directives it returns.

use tagq_core::Tick;
use tagq_sched::{Priority, ScheduledEvent};

/// Read-only facts about the step an event is being handled in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchContext {
    /// The tick every event in the batch is scheduled for.
    pub tick:               Tick,
    pub tick_duration_secs: u32,
    /// The run's master seed, for deriving per-event RNGs.
    pub seed:               u64,
}

/// A scheduler mutation requested by a handler.
///
/// Directives are collected from every handler in a batch and applied
/// sequentially afterwards, in ascending tag order.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive<E: ScheduledEvent> {
    /// Offer `E` to the scheduler.  Subject to the usual acceptance rule.
    Schedule(E),

    /// Drop whatever is pending for the tag.
    Unschedule(E::Tag),

    /// Clear the event's tag at `priority`, then schedule the event if the
    /// tag was clear.  A stronger pending claim wins and the event is dropped.
    Preempt {
        priority: Priority,
        event:    E,
    },
}

/// Pluggable interpretation of event payloads.
///
/// The driver owns time advancement; the handler owns meaning.  A handler
/// never touches the scheduler directly; it returns [`Directive`]s instead,
/// which keeps the handler phase free of side effects and safe to run in
/// parallel.
///
/// # Example
///
/// ```rust,ignore
/// struct Bounce;
///
/// impl EventHandler<Ev> for Bounce {
///     fn handle(&self, event: &Ev, ctx: &DispatchContext) -> Vec<Directive<Ev>> {
///         vec![Directive::Schedule(Event::new(event.tag, ctx.tick + 5, 0, ()))]
///     }
/// }
/// ```
pub trait EventHandler<E: ScheduledEvent>: Send + Sync + 'static {
    fn handle(&self, event: &E, ctx: &DispatchContext) -> Vec<Directive<E>>;
}

/// An [`EventHandler`] that consumes events and requests nothing.
pub struct NoopEventHandler;

impl<E: ScheduledEvent> EventHandler<E> for NoopEventHandler {
    fn handle(&self, _event: &E, _ctx: &DispatchContext) -> Vec<Directive<E>> {
        vec![]
    }
}
