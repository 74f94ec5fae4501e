//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use std::fmt::Display;

use tagq_core::{SimClock, SimConfig, Tick};
use tagq_sched::ScheduledEvent;
use tagq_sim::{SimObserver, StepReport};

use crate::row::{DispatchRow, StepSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes every dispatched event and periodic step
/// summaries to any [`OutputWriter`] backend.
///
/// Step summaries are throttled by `config.output_interval_ticks`: a summary
/// is written for a step only once at least that many ticks have passed since
/// the last one written.  Dispatch rows are never throttled.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:          W,
    clock:           SimClock,
    interval:        u64,
    next_summary_at: Tick,
    last_error:      Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` for wall-clock
    /// conversion and summary throttling.
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self {
            writer,
            clock:           config.make_clock(),
            interval:        config.output_interval_ticks.max(1),
            next_summary_at: Tick::ZERO,
            last_error:      None,
        }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                log::warn!("output write failed: {e}");
                self.last_error = Some(e);
            }
        }
    }
}

impl<E, W> SimObserver<E> for SimOutputObserver<W>
where
    E: ScheduledEvent,
    E::Tag: Display,
    W: OutputWriter,
{
    fn on_dispatch(&mut self, tick: Tick, batch: &[E]) {
        if batch.is_empty() {
            return;
        }
        let rows: Vec<DispatchRow> = batch
            .iter()
            .map(|event| DispatchRow {
                tick:     tick.0,
                tag:      event.tag().to_string(),
                priority: event.priority(),
            })
            .collect();
        let result = self.writer.write_dispatches(&rows);
        self.store_err(result);
    }

    fn on_step_end(&mut self, report: &StepReport) {
        if report.tick < self.next_summary_at {
            return;
        }
        self.next_summary_at = report.tick + self.interval;

        let row = StepSummaryRow {
            tick:                report.tick.0,
            unix_time_secs:      self.clock.unix_secs_at(report.tick),
            dispatched:          report.dispatched as u64,
            rejected:            report.rejected as u64,
            pending_upper_bound: report.pending_upper_bound as u64,
        };
        let result = self.writer.write_step_summary(&row);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        log::debug!("closing output at {final_tick}");
        let result = self.writer.finish();
        self.store_err(result);
    }
}
