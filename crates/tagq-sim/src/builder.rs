//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use tagq_core::{SimConfig, Tick};
use tagq_sched::{EventScheduler, MinChangedHandler, ScheduledEvent};

use crate::{EventHandler, Sim, SimResult};

/// Fluent builder for [`Sim<E, H, C>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — total ticks, seed, tick duration, …
/// - `H: EventHandler<E>` — interprets dispatched events
///
/// # Optional inputs (have defaults)
///
/// | Method                   | Default                          |
/// |--------------------------|----------------------------------|
/// | `with_context(.., c)`    | `()`                             |
/// | `.min_changed(h)`        | `NoopHandler`                    |
/// | `.initial_events(v)`     | empty scheduler                  |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, MyHandler)
///     .initial_events(load_events_csv(path)?)
///     .build()?;
/// sim.run(&mut NoopObserver);
/// ```
pub struct SimBuilder<E, H, C = ()>
where
    E: ScheduledEvent<Time = Tick>,
    H: EventHandler<E>,
{
    config:    SimConfig,
    handler:   H,
    scheduler: EventScheduler<E, C>,
    initial:   Vec<E>,
}

impl<E, H> SimBuilder<E, H, ()>
where
    E: ScheduledEvent<Time = Tick>,
    H: EventHandler<E>,
{
    /// Create a builder whose scheduler carries no context.
    pub fn new(config: SimConfig, handler: H) -> Self {
        Self::with_context(config, handler, ())
    }
}

impl<E, H, C> SimBuilder<E, H, C>
where
    E: ScheduledEvent<Time = Tick>,
    H: EventHandler<E>,
{
    /// Create a builder whose scheduler threads `context` to the min-changed
    /// handler.
    pub fn with_context(config: SimConfig, handler: H, context: C) -> Self {
        Self {
            config,
            handler,
            scheduler: EventScheduler::new(context),
            initial:   Vec::new(),
        }
    }

    /// Register the scheduler's min-changed handler.
    ///
    /// The handler runs under the scheduler lock and must not call back into
    /// the scheduler (see `tagq_sched::notify`).
    pub fn min_changed<M>(mut self, handler: M) -> Self
    where
        M: MinChangedHandler<E, C> + 'static,
    {
        self.scheduler = self.scheduler.with_min_changed(handler);
        self
    }

    /// Events offered to the scheduler, in order, when the sim is built.
    ///
    /// Duplicates for one tag are resolved by the acceptance rule.
    pub fn initial_events(mut self, events: Vec<E>) -> Self {
        self.initial = events;
        self
    }

    /// Validate the config, seed the scheduler, and return a ready-to-run
    /// [`Sim`].
    pub fn build(self) -> SimResult<Sim<E, H, C>> {
        self.config.validate()?;

        let offered = self.initial.len();
        let accepted = self.scheduler.schedule_all(self.initial);
        if accepted < offered {
            log::debug!("{} of {offered} initial events superseded on load", offered - accepted);
        }

        Ok(Sim {
            clock:     self.config.make_clock(),
            config:    self.config,
            scheduler: Arc::new(self.scheduler),
            handler:   self.handler,
        })
    }
}
