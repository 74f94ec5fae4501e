//! `tagq-sched` — a thread-safe discrete-event scheduler that keeps at most
//! one pending event per tag.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`event`]      | `ScheduledEvent` contract, `Priority`, generic `Event`    |
//! | [`scheduler`]  | `EventScheduler` (heap + authority table + watermark)     |
//! | [`notify`]     | `MinChangedHandler`, `NoopHandler`, `LatestMin`           |
//! | [`loader`]     | `load_events_csv`, `load_events_reader`                   |
//! | [`error`]      | `ScheduleError`, `ScheduleResult<T>`                      |
//!
//! # Acceptance rule (summary)
//!
//! For an incumbent `(p0, t0)` and a challenger `(p1, t1)` on the same tag:
//!
//! ```text
//! accept  ⇔  p1 > p0  ∨  (p1 = p0 ∧ t1 < t0)
//! ```
//!
//! Priority only decides which event owns a tag.  Dequeue order across tags
//! is by time alone.
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                 |
//! |-----------|--------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for the authority table.     |
//! | `serde`   | Serde derives on `Event`.                              |

pub mod error;
pub mod event;
pub mod loader;
pub mod notify;
pub mod scheduler;


pub use error::{ScheduleError, ScheduleResult};
pub use event::{Event, Priority, ScheduledEvent};
pub use loader::{load_events_csv, load_events_reader, SeedEvent};
pub use notify::{LatestMin, MinChangedHandler, NoopHandler};
pub use scheduler::EventScheduler;
