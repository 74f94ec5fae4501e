//! Simulation observer trait for progress reporting and data collection.

use tagq_core::Tick;

/// What one step of the loop did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepReport {
    pub tick:                Tick,
    /// Events taken from the scheduler and handed to the handler.
    pub dispatched:          usize,
    /// Directives that changed the scheduler (accepted schedules, successful
    /// unschedules and preempts).
    pub applied:             usize,
    /// Directives the scheduler turned down, plus schedules for ticks that
    /// were not in the future.
    pub rejected:            usize,
    /// `EventScheduler::count()` after the step.  An upper bound: stale
    /// entries are included.
    pub pending_upper_bound: usize,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter;
///
/// impl<E> SimObserver<E> for ProgressPrinter {
///     fn on_step_end(&mut self, report: &StepReport) {
///         println!("{}: dispatched {}", report.tick, report.dispatched);
///     }
/// }
/// ```
pub trait SimObserver<E> {
    /// Called when the clock has moved to `tick`, before the batch is taken.
    fn on_step_start(&mut self, _tick: Tick) {}

    /// Called with the batch, sorted by tag, after the handler phase.
    fn on_dispatch(&mut self, _tick: Tick, _batch: &[E]) {}

    /// Called after every directive of the step has been applied.
    fn on_step_end(&mut self, _report: &StepReport) {}

    /// Called once when [`Sim::run`][crate::Sim::run] returns.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl<E> SimObserver<E> for NoopObserver {}
