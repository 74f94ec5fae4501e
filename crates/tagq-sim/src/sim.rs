//! The `Sim` struct and its event-driven loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tagq_core::{SimClock, SimConfig, Tick};
use tagq_sched::{EventScheduler, ScheduledEvent};

use crate::{Directive, DispatchContext, EventHandler, SimObserver, StepReport};

/// Totals for one call to a `run*` method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps:      u64,
    pub dispatched: u64,
    pub final_tick: Tick,
}

impl RunSummary {
    fn record(&mut self, report: &StepReport) {
        self.steps += 1;
        self.dispatched += report.dispatched as u64;
        self.final_tick = report.tick;
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The simulation driver.
///
/// Each step:
///
/// 1. **Advance**: peek the earliest live event; stop if none is left before
///    the limit, otherwise jump the clock to its tick.
/// 2. **Collect**: take every event at that tick and sort the batch by tag.
/// 3. **Handle** (parallel with the `parallel` feature): call
///    [`EventHandler::handle`] on each event.
/// 4. **Apply** (sequential, batch order): turn the returned directives into
///    `schedule` / `unschedule` / `preempt` calls.
///
/// The scheduler is held in an `Arc` so producers on other threads can feed
/// it while the loop runs.  Events they queue for a tick the clock has
/// already passed are dispatched late, at the current tick, with a warning.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<E, H, C = ()>
where
    E: ScheduledEvent<Time = Tick>,
    H: EventHandler<E>,
{
    pub config:    SimConfig,
    pub clock:     SimClock,
    pub scheduler: Arc<EventScheduler<E, C>>,
    pub handler:   H,
}

impl<E, H, C> Sim<E, H, C>
where
    E: ScheduledEvent<Time = Tick> + Send + Sync,
    E::Tag: Ord + Send + Sync,
    H: EventHandler<E>,
{
    // ── Public API ────────────────────────────────────────────────────────

    /// Run until no live event remains before `config.end_tick()`.
    pub fn run<O: SimObserver<E>>(&mut self, observer: &mut O) -> RunSummary {
        log::info!(
            "simulation starting at {} (end {}, {} queued)",
            self.clock.current_tick,
            self.config.end_tick(),
            self.scheduler.count(),
        );
        let summary = self.run_until(self.config.end_tick(), observer);
        observer.on_sim_end(self.clock.current_tick);
        log::info!(
            "simulation finished at {} after {} steps ({} events dispatched)",
            self.clock.current_tick,
            summary.steps,
            summary.dispatched,
        );
        summary
    }

    /// Dispatch every step strictly before `limit` (capped at the end tick),
    /// then move the clock to the limit.
    ///
    /// Useful for tests and incremental stepping.  Does not call
    /// `on_sim_end`.
    pub fn run_until<O: SimObserver<E>>(&mut self, limit: Tick, observer: &mut O) -> RunSummary {
        let limit = limit.min(self.config.end_tick());
        let mut summary = RunSummary { final_tick: self.clock.current_tick, ..RunSummary::default() };
        while let Some(report) = self.step_before(limit, observer) {
            summary.record(&report);
        }
        self.clock.advance_to(limit);
        summary.final_tick = self.clock.current_tick;
        summary
    }

    /// Keep stepping until the queue is exhausted or `budget` of wall-clock
    /// time has been spent.  The budget is checked between steps, never
    /// inside one.  Does not call `on_sim_end`.
    pub fn run_for<O: SimObserver<E>>(&mut self, budget: Duration, observer: &mut O) -> RunSummary {
        let started = Instant::now();
        let end = self.config.end_tick();
        let mut summary = RunSummary { final_tick: self.clock.current_tick, ..RunSummary::default() };
        while started.elapsed() < budget {
            match self.step_before(end, observer) {
                Some(report) => summary.record(&report),
                None => break,
            }
        }
        if started.elapsed() >= budget {
            log::debug!("wall-clock budget of {budget:?} spent at {}", self.clock.current_tick);
        }
        summary
    }

    /// Process the next tick that has a live event, if it is before the end
    /// tick.
    pub fn step<O: SimObserver<E>>(&mut self, observer: &mut O) -> Option<StepReport> {
        self.step_before(self.config.end_tick(), observer)
    }

    // ── Core step processing ──────────────────────────────────────────────

    fn step_before<O: SimObserver<E>>(&mut self, limit: Tick, observer: &mut O) -> Option<StepReport> {
        // ── Phase 1: advance ──────────────────────────────────────────────
        let (_, due) = self.scheduler.peek()?;
        if due >= limit {
            return None;
        }
        // A producer sharing the scheduler may have queued a tick the clock
        // has already passed.  The clock never moves back, so such a batch is
        // handled as of the current tick.
        let now = if due < self.clock.current_tick {
            log::warn!(
                "events due at {due} found behind the clock at {}; dispatching them late",
                self.clock.current_tick,
            );
            self.clock.current_tick
        } else {
            self.clock.advance_to(due);
            due
        };
        observer.on_step_start(now);

        // ── Phase 2: collect ──────────────────────────────────────────────
        //
        // Batch order out of the scheduler is unspecified; sorting by tag
        // makes the apply phase deterministic.
        let mut batch = self.scheduler.collect_events_at(due);
        batch.sort_by_key(|event| event.tag());

        // ── Phase 3: handle ───────────────────────────────────────────────
        let ctx = DispatchContext {
            tick:               now,
            tick_duration_secs: self.config.tick_duration_secs,
            seed:               self.config.seed,
        };
        let directives = self.compute_directives(&batch, &ctx);
        observer.on_dispatch(now, &batch);

        // ── Phase 4: apply ────────────────────────────────────────────────
        let mut report = StepReport {
            tick:                now,
            dispatched:          batch.len(),
            applied:             0,
            rejected:            0,
            pending_upper_bound: 0,
        };
        for directive in directives.into_iter().flatten() {
            if self.apply(directive, now) {
                report.applied += 1;
            } else {
                report.rejected += 1;
            }
        }
        report.pending_upper_bound = self.scheduler.count();

        log::debug!(
            "{now}: dispatched {}, applied {}, rejected {}, pending <= {}",
            report.dispatched,
            report.applied,
            report.rejected,
            report.pending_upper_bound,
        );
        observer.on_step_end(&report);
        Some(report)
    }

    /// Call the handler for every event in the batch.  Output order matches
    /// batch order even when run in parallel.
    fn compute_directives(&self, batch: &[E], ctx: &DispatchContext) -> Vec<Vec<Directive<E>>> {
        let handler = &self.handler;

        #[cfg(not(feature = "parallel"))]
        {
            batch.iter().map(|event| handler.handle(event, ctx)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            batch.par_iter().map(|event| handler.handle(event, ctx)).collect()
        }
    }

    /// Apply one directive.  Returns whether the scheduler changed.
    fn apply(&self, directive: Directive<E>, now: Tick) -> bool {
        match directive {
            Directive::Schedule(event) => {
                // Re-scheduling at or before `now` would be dispatched again
                // within this same tick sequence and can loop forever.
                if event.time() <= now {
                    log::trace!("dropping schedule for {:?} at {:?}: not after {now}", event.tag(), event.time());
                    return false;
                }
                self.scheduler.schedule(event)
            }

            Directive::Unschedule(tag) => self.scheduler.unschedule(&tag),

            Directive::Preempt { priority, event } => {
                if event.time() <= now {
                    log::trace!("dropping preempt for {:?} at {:?}: not after {now}", event.tag(), event.time());
                    return false;
                }
                if !self.scheduler.preempt(&event.tag(), priority) {
                    log::trace!("preempt for {:?} at priority {priority} lost to a stronger claim", event.tag());
                    return false;
                }
                self.scheduler.schedule(event)
            }
        }
    }
}
