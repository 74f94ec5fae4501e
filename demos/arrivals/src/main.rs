//! arrivals — a small actor arrival/departure model on the tagq scheduler.
//!
//! Actors alternate between arriving and departing.  On arrival an actor may
//! open a proposal with a deadline shorter than its stay; when the proposal
//! expires it preempts the actor's pending departure at a higher priority
//! and forces it out on the next tick.
//!
//! Usage: `arrivals [config.json]`.  Output lands in `./output/arrivals`.

mod slot;

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use tagq_core::{AgentId, AgentRng, ProposalId, SimConfig, SimRng, Tick};
use tagq_output::{CsvWriter, SimOutputObserver};
use tagq_sched::{LatestMin, load_events_reader};
use tagq_sim::{Directive, DispatchContext, EventHandler, SimBuilder, SimObserver, StepReport};

use slot::{Action, Ev, PROPOSAL_PRIORITY, Slot, actor_event};

// ── Constants ─────────────────────────────────────────────────────────────────

const ACTOR_COUNT:          u32 = 12;
const SEED:                 u64 = 42;
const TICK_DURATION_SECS:   u32 = 900; // 1 tick = 15 minutes
const SIM_DAYS:             u64 = 2;
const PROPOSAL_PROBABILITY: f64 = 0.3;

// ── Seed CSV ──────────────────────────────────────────────────────────────────

// The first four actors have fixed opening arrivals.  The rest are drawn from
// the population RNG.  Actor 0 has a duplicate row that loses on time.
const SEED_CSV: &str = "\
tag,time,priority,kind\n\
0,2,0,arrive\n\
0,6,0,arrive\n\
1,2,0,arrive\n\
2,3,0,arrive\n\
3,5,0,arrive\n\
";

fn seed_events(seed: u64) -> Result<Vec<Ev>> {
    let mut events = Vec::new();
    for seeded in load_events_reader(Cursor::new(SEED_CSV))? {
        let action = match seeded.payload.as_str() {
            "arrive" => Action::Arrive,
            "depart" => Action::Depart,
            other => anyhow::bail!("unknown seed event kind {other:?} for {}", seeded.tag),
        };
        events.push(actor_event(seeded.tag, seeded.time, seeded.priority, action));
    }

    let mut population = SimRng::new(seed).child(1);
    for id in 4..ACTOR_COUNT {
        let at = Tick(population.gen_range(0..16));
        events.push(actor_event(AgentId(id), at, 0, Action::Arrive));
    }
    Ok(events)
}

// ── Handler ───────────────────────────────────────────────────────────────────

struct Arrivals;

impl EventHandler<Ev> for Arrivals {
    fn handle(&self, event: &Ev, ctx: &DispatchContext) -> Vec<Directive<Ev>> {
        match (event.tag, event.payload) {
            (Slot::Actor(agent), Action::Arrive) => {
                let mut rng = AgentRng::for_step(ctx.seed, agent, ctx.tick);
                let stay: u64 = rng.gen_range(2..=8);
                let mut out = vec![Directive::Schedule(actor_event(agent, ctx.tick + stay, 0, Action::Depart))];
                if rng.gen_bool(PROPOSAL_PROBABILITY) {
                    let deadline: u64 = rng.gen_range(1..stay);
                    out.push(Directive::Schedule(Ev::new(
                        Slot::Proposal(ProposalId(agent.0)),
                        ctx.tick + deadline,
                        0,
                        Action::Expire { actor: agent },
                    )));
                }
                out
            }

            (Slot::Actor(agent), Action::Depart) => {
                let mut rng = AgentRng::for_step(ctx.seed, agent, ctx.tick);
                let away: u64 = rng.gen_range(4..=16);
                vec![Directive::Schedule(actor_event(agent, ctx.tick + away, 0, Action::Arrive))]
            }

            (Slot::Proposal(_), Action::Expire { actor }) => vec![Directive::Preempt {
                priority: PROPOSAL_PRIORITY,
                event:    actor_event(actor, ctx.tick + 1, PROPOSAL_PRIORITY, Action::Depart),
            }],

            (slot, action) => {
                log::warn!("{slot}: unexpected {action:?}, ignored");
                vec![]
            }
        }
    }
}

// ── Observer wrapper to count rows ───────────────────────────────────────────

struct CountingObserver<W: tagq_output::OutputWriter> {
    inner:      SimOutputObserver<W>,
    watch:      LatestMin<Ev>,
    dispatched: usize,
    rejected:   usize,
}

impl<W: tagq_output::OutputWriter> SimObserver<Ev> for CountingObserver<W> {
    fn on_dispatch(&mut self, tick: Tick, batch: &[Ev]) {
        self.dispatched += batch.len();
        SimObserver::<Ev>::on_dispatch(&mut self.inner, tick, batch);
    }

    fn on_step_end(&mut self, report: &StepReport) {
        self.rejected += report.rejected;
        if let Some(head) = self.watch.take() {
            log::trace!("{}: queue head moved to {} at {}", report.tick, head.tag, head.time);
        }
        SimObserver::<Ev>::on_step_end(&mut self.inner, report);
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        SimObserver::<Ev>::on_sim_end(&mut self.inner, final_tick);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn load_config() -> Result<SimConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(SimConfig {
            start_unix_secs:       1_700_000_000,
            tick_duration_secs:    TICK_DURATION_SECS,
            total_ticks:           SIM_DAYS * 24 * 4,
            seed:                  SEED,
            output_interval_ticks: 4,
        });
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config = serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("arrivals=info,tagq_sim=info,warn"))
        .format_timestamp_millis()
        .init();

    let config = load_config()?;
    log::info!(
        "{ACTOR_COUNT} actors, {} ticks of {} s, seed {}",
        config.total_ticks,
        config.tick_duration_secs,
        config.seed,
    );

    let watch = LatestMin::new();
    let mut sim = SimBuilder::new(config.clone(), Arrivals)
        .min_changed(watch.clone())
        .initial_events(seed_events(config.seed)?)
        .build()?;

    let out_dir = Path::new("output/arrivals");
    let writer = CsvWriter::new(out_dir)?;
    let mut obs = CountingObserver {
        inner: SimOutputObserver::new(writer, &config),
        watch,
        dispatched: 0,
        rejected: 0,
    };

    let t0 = Instant::now();
    let summary = sim.run(&mut obs);
    let elapsed = t0.elapsed();

    if let Some(e) = obs.inner.take_error() {
        log::error!("output error: {e}");
    }

    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  steps               : {}", summary.steps);
    println!("  events dispatched   : {}", obs.dispatched);
    println!("  directives rejected : {}", obs.rejected);
    println!("  still pending       : {} slots (heap {})", pending_slots(&sim.scheduler), sim.scheduler.count());
    println!("  clock               : {}", sim.clock);
    println!("  output              : {}", out_dir.display());
    println!();

    println!("{:<10} {:<10}", "Actor", "Next");
    println!("{}", "-".repeat(24));
    for id in 0..ACTOR_COUNT {
        let next = match sim.scheduler.scheduled(&Slot::Actor(AgentId(id))) {
            Some((priority, at)) => format!("{at} (p{priority})"),
            None => "-".to_owned(),
        };
        println!("{:<10} {:<10}", id, next);
    }

    Ok(())
}

fn pending_slots(scheduler: &tagq_sched::EventScheduler<Ev>) -> usize {
    (0..ACTOR_COUNT)
        .flat_map(|id| [Slot::Actor(AgentId(id)), Slot::Proposal(ProposalId(id))])
        .filter(|slot| scheduler.is_scheduled(slot))
        .count()
}
