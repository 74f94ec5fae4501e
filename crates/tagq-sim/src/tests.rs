//! Integration tests for tagq-sim.

use std::time::Duration;

use tagq_core::{SimConfig, Tick};
use tagq_sched::Event;

use crate::{
    Directive, DispatchContext, EventHandler, NoopEventHandler, NoopObserver, SimBuilder,
    SimObserver, StepReport,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

type Ev = Event<u32, Tick, &'static str>;

fn ev(tag: u32, tick: u64, priority: i32, name: &'static str) -> Ev {
    Event::new(tag, Tick(tick), priority, name)
}

fn test_config(total_ticks: u64) -> SimConfig {
    SimConfig {
        start_unix_secs:       0,
        tick_duration_secs:    3600,
        total_ticks,
        seed:                  42,
        output_interval_ticks: 1,
    }
}

/// Observer that records everything it sees.
#[derive(Default)]
struct Recorder {
    starts:   Vec<Tick>,
    batches:  Vec<(Tick, Vec<u32>)>,
    reports:  Vec<StepReport>,
    ended_at: Option<Tick>,
}

impl SimObserver<Ev> for Recorder {
    fn on_step_start(&mut self, tick: Tick) {
        self.starts.push(tick);
    }
    fn on_dispatch(&mut self, tick: Tick, batch: &[Ev]) {
        self.batches.push((tick, batch.iter().map(|e| e.tag).collect()));
    }
    fn on_step_end(&mut self, report: &StepReport) {
        self.reports.push(*report);
    }
    fn on_sim_end(&mut self, final_tick: Tick) {
        self.ended_at = Some(final_tick);
    }
}

/// Re-schedules every event `period` ticks later on the same tag.
struct Every {
    period: u64,
}

impl EventHandler<Ev> for Every {
    fn handle(&self, event: &Ev, ctx: &DispatchContext) -> Vec<Directive<Ev>> {
        vec![Directive::Schedule(Event::new(event.tag, ctx.tick + self.period, 0, event.payload))]
    }
}

// ── SimBuilder ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use parking_lot::Mutex;

    use super::*;

    #[test]
    fn builds_successfully_with_defaults() {
        let sim = SimBuilder::<Ev, _>::new(test_config(10), NoopEventHandler).build().unwrap();
        assert_eq!(sim.clock.current_tick, Tick(0));
        assert!(!sim.scheduler.any());
    }

    #[test]
    fn invalid_config_errors() {
        let mut cfg = test_config(10);
        cfg.tick_duration_secs = 0;
        let result = SimBuilder::<Ev, _>::new(cfg, NoopEventHandler).build();
        assert!(result.is_err());
    }

    #[test]
    fn initial_events_resolved_by_acceptance_rule() {
        let sim = SimBuilder::new(test_config(100), NoopEventHandler)
            .initial_events(vec![ev(1, 10, 0, "a"), ev(1, 5, 0, "b"), ev(1, 2, -1, "c")])
            .build()
            .unwrap();
        assert_eq!(sim.scheduler.scheduled(&1), Some((0, Tick(5))));
    }

    #[test]
    fn min_changed_handler_sees_context() {
        let sim = SimBuilder::<Ev, _, _>::with_context(test_config(100), NoopEventHandler, Mutex::new(Vec::new()))
            .min_changed(|seen: &Mutex<Vec<Tick>>, e: &Ev| seen.lock().push(e.time))
            .initial_events(vec![ev(1, 10, 0, "a"), ev(2, 4, 0, "b"), ev(3, 7, 0, "c")])
            .build()
            .unwrap();
        assert_eq!(*sim.scheduler.context().lock(), vec![Tick(10), Tick(4)]);
    }
}

// ── Basic run ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn dispatches_only_before_end_tick() {
        let mut sim = SimBuilder::new(test_config(10), NoopEventHandler)
            .initial_events(vec![ev(1, 3, 0, "a"), ev(2, 9, 0, "b"), ev(3, 10, 0, "late")])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        let summary = sim.run(&mut rec);

        assert_eq!(summary.steps, 2);
        assert_eq!(summary.dispatched, 2);
        assert_eq!(rec.starts, vec![Tick(3), Tick(9)]);
        assert_eq!(rec.ended_at, Some(Tick(10)));
        assert_eq!(sim.clock.current_tick, Tick(10));
        assert!(sim.scheduler.is_scheduled(&3), "event at end tick stays queued");
    }

    #[test]
    fn clock_jumps_over_empty_ticks() {
        let mut sim = SimBuilder::new(test_config(1_000), NoopEventHandler)
            .initial_events(vec![ev(1, 5, 0, "a"), ev(2, 500, 0, "b")])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec);
        assert_eq!(rec.starts, vec![Tick(5), Tick(500)]);
    }

    #[test]
    fn batch_is_sorted_by_tag() {
        let mut sim = SimBuilder::new(test_config(10), NoopEventHandler)
            .initial_events(vec![ev(3, 2, 0, "c"), ev(1, 2, 0, "a"), ev(2, 2, 0, "b")])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec);
        assert_eq!(rec.batches, vec![(Tick(2), vec![1, 2, 3])]);
    }

    #[test]
    fn periodic_handler_runs_to_end() {
        let mut sim = SimBuilder::new(test_config(100), Every { period: 10 })
            .initial_events(vec![ev(1, 0, 0, "tick")])
            .build()
            .unwrap();
        let summary = sim.run(&mut NoopObserver);
        // Ticks 0, 10, …, 90.
        assert_eq!(summary.dispatched, 10);
        assert_eq!(sim.scheduler.scheduled(&1), Some((0, Tick(100))));
    }

    #[test]
    fn step_returns_none_when_idle() {
        let mut sim = SimBuilder::<Ev, _>::new(test_config(10), NoopEventHandler).build().unwrap();
        assert!(sim.step(&mut NoopObserver).is_none());
    }

    #[test]
    fn run_until_stops_before_limit() {
        let mut sim = SimBuilder::new(test_config(100), Every { period: 10 })
            .initial_events(vec![ev(1, 0, 0, "tick")])
            .build()
            .unwrap();
        let summary = sim.run_until(Tick(25), &mut NoopObserver);
        assert_eq!(summary.dispatched, 3); // 0, 10, 20
        assert_eq!(sim.clock.current_tick, Tick(25));
        assert_eq!(summary.final_tick, Tick(25));

        let rest = sim.run_until(Tick(40), &mut NoopObserver);
        assert_eq!(rest.dispatched, 1); // 30
    }

    #[test]
    fn run_for_zero_budget_does_nothing() {
        let mut sim = SimBuilder::new(test_config(100), NoopEventHandler)
            .initial_events(vec![ev(1, 1, 0, "a")])
            .build()
            .unwrap();
        let summary = sim.run_for(Duration::ZERO, &mut NoopObserver);
        assert_eq!(summary.steps, 0);
        assert!(sim.scheduler.is_scheduled(&1));
    }

    #[test]
    fn run_for_generous_budget_drains_queue() {
        let mut sim = SimBuilder::new(test_config(100), NoopEventHandler)
            .initial_events(vec![ev(1, 1, 0, "a"), ev(2, 2, 0, "b")])
            .build()
            .unwrap();
        let summary = sim.run_for(Duration::from_secs(60), &mut NoopObserver);
        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.final_tick, Tick(2));
    }

    #[test]
    fn event_behind_clock_is_dispatched_at_current_tick() {
        let mut sim = SimBuilder::<Ev, _>::new(test_config(100), Every { period: 10 }).build().unwrap();
        sim.run_until(Tick(25), &mut NoopObserver);
        assert_eq!(sim.clock.current_tick, Tick(25));

        // Queued by a producer after the clock moved past its tick.
        sim.scheduler.schedule(ev(4, 10, 0, "late"));
        let mut rec = Recorder::default();
        let report = sim.step(&mut rec).unwrap();

        assert_eq!(report.tick, Tick(25));
        assert_eq!(rec.batches, vec![(Tick(25), vec![4])]);
        assert_eq!(sim.clock.current_tick, Tick(25));
        // The handler saw the clock tick, so the follow-up lands after it.
        assert_eq!(sim.scheduler.scheduled(&4), Some((0, Tick(35))));
    }

    #[test]
    fn external_producer_feeds_shared_scheduler() {
        let mut sim = SimBuilder::<Ev, _>::new(test_config(100), NoopEventHandler).build().unwrap();
        let scheduler = std::sync::Arc::clone(&sim.scheduler);
        std::thread::spawn(move || {
            for tag in 0..20 {
                scheduler.schedule(ev(tag, 1 + (tag as u64 % 4), 0, "ext"));
            }
        })
        .join()
        .unwrap();

        let summary = sim.run(&mut NoopObserver);
        assert_eq!(summary.dispatched, 20);
        assert_eq!(summary.steps, 4);
    }
}

// ── Directives ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod directive_tests {
    use super::*;

    /// Returns a fixed directive list for events tagged `0`; ignores others.
    struct Script(Vec<Directive<Ev>>);

    impl EventHandler<Ev> for Script {
        fn handle(&self, event: &Ev, _ctx: &DispatchContext) -> Vec<Directive<Ev>> {
            if event.tag == 0 { self.0.clone() } else { vec![] }
        }
    }

    fn run_script(script: Vec<Directive<Ev>>, pending: Vec<Ev>) -> (crate::Sim<Ev, Script>, StepReport) {
        let mut initial = vec![ev(0, 1, 0, "driver")];
        initial.extend(pending);
        let mut sim = SimBuilder::new(test_config(100), Script(script))
            .initial_events(initial)
            .build()
            .unwrap();
        let report = sim.step(&mut NoopObserver).unwrap();
        (sim, report)
    }

    #[test]
    fn schedule_in_the_past_is_dropped() {
        let (sim, report) = run_script(
            vec![Directive::Schedule(ev(5, 1, 0, "now")), Directive::Schedule(ev(6, 0, 0, "past"))],
            vec![],
        );
        assert_eq!(report.rejected, 2);
        assert!(!sim.scheduler.is_scheduled(&5));
        assert!(!sim.scheduler.is_scheduled(&6));
    }

    #[test]
    fn losing_schedule_is_counted_as_rejected() {
        let (sim, report) = run_script(
            vec![Directive::Schedule(ev(7, 50, 0, "worse"))],
            vec![ev(7, 20, 0, "incumbent")],
        );
        assert_eq!((report.applied, report.rejected), (0, 1));
        assert_eq!(sim.scheduler.scheduled(&7), Some((0, Tick(20))));
    }

    #[test]
    fn unschedule_directive_clears_tag() {
        let (sim, report) = run_script(vec![Directive::Unschedule(7)], vec![ev(7, 20, 0, "x")]);
        assert_eq!(report.applied, 1);
        assert!(!sim.scheduler.is_scheduled(&7));
    }

    #[test]
    fn preempt_loses_to_stronger_claim() {
        let (sim, report) = run_script(
            vec![Directive::Preempt { priority: 3, event: ev(7, 10, 3, "proposal") }],
            vec![ev(7, 20, 5, "strong")],
        );
        assert_eq!(report.rejected, 1);
        assert_eq!(sim.scheduler.scheduled(&7), Some((5, Tick(20))));
    }

    #[test]
    fn preempt_replaces_weaker_claim_even_with_later_time() {
        let (sim, report) = run_script(
            vec![Directive::Preempt { priority: 5, event: ev(7, 60, 5, "proposal") }],
            vec![ev(7, 20, 5, "incumbent")],
        );
        assert_eq!(report.applied, 1);
        assert_eq!(sim.scheduler.scheduled(&7), Some((5, Tick(60))));
    }

    #[test]
    fn report_counts_pending_upper_bound() {
        let (_, report) = run_script(
            vec![Directive::Schedule(ev(7, 10, 1, "better"))],
            vec![ev(7, 20, 0, "worse")],
        );
        // Tag 7's superseded Tick-20 copy is still in the heap.
        assert_eq!(report.pending_upper_bound, 2);
    }
}

// ── Determinism ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod determinism {
    use super::*;

    /// Tag-dependent fan-out: each event pushes its neighbour forward.
    struct Chain;

    impl EventHandler<Ev> for Chain {
        fn handle(&self, event: &Ev, ctx: &DispatchContext) -> Vec<Directive<Ev>> {
            let next = (event.tag + 1) % 8;
            let delay = 1 + (ctx.seed ^ event.tag as u64 ^ ctx.tick.0) % 5;
            vec![
                Directive::Schedule(Event::new(next, ctx.tick + delay, 0, "chain")),
                Directive::Schedule(Event::new(event.tag, ctx.tick + 7, 0, "self")),
            ]
        }
    }

    fn trace() -> Vec<(Tick, Vec<u32>)> {
        let initial = (0..8).map(|t| ev(t, t as u64, 0, "seed")).collect();
        let mut sim = SimBuilder::new(test_config(200), Chain)
            .initial_events(initial)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec);
        rec.batches
    }

    #[test]
    fn identical_runs_produce_identical_traces() {
        let a = trace();
        assert!(!a.is_empty());
        assert_eq!(a, trace());
    }

    #[test]
    fn no_tag_dispatched_twice_in_one_step() {
        for (tick, tags) in trace() {
            let mut sorted = tags.clone();
            sorted.dedup();
            assert_eq!(sorted, tags, "duplicate tag at {tick}");
        }
    }
}
