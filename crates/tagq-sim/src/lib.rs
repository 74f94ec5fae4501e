//! `tagq-sim` — event-driven simulation loop over the tagq scheduler.
//!
//! # Step loop
//!
//! ```text
//! while let Some((_, t)) = scheduler.peek() and t < config.end_tick():
//!   ① Advance  — jump the clock to t.
//!   ② Collect  — scheduler.collect_events_at(t), sorted by tag.
//!   ③ Handle   — EventHandler::handle for each event
//!                (parallel with the `parallel` feature).
//!   ④ Apply    — for each directive in batch order:
//!                  Schedule(e)          → scheduler.schedule(e)
//!                  Unschedule(tag)      → scheduler.unschedule(tag)
//!                  Preempt{priority, e} → scheduler.preempt(tag, priority)
//!                                         then schedule(e) if clear
//! ```
//!
//! Unlike a fixed-step loop the clock never visits empty ticks.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the handle phase on Rayon's thread pool.          |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tagq_core::SimConfig;
//! use tagq_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config, MyHandler)
//!     .initial_events(seed_events)
//!     .build()?;
//! sim.run(&mut NoopObserver);
//! ```

pub mod builder;
pub mod error;
pub mod handler;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use handler::{Directive, DispatchContext, EventHandler, NoopEventHandler};
pub use observer::{NoopObserver, SimObserver, StepReport};
pub use sim::{RunSummary, Sim};
