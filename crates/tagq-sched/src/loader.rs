//! CSV loader for seeding a scheduler with an initial event population.
//!
//! # CSV format
//!
//! One row per event.  `tag` is an `AgentId`, `time` a `Tick`, and `kind` a
//! free-form label the consumer loop interprets.
//!
//! ```csv
//! tag,time,priority,kind
//! 0,8,0,arrive
//! 1,8,0,arrive
//! 0,17,5,depart
//! ```
//!
//! Rows are returned in file order.  Several rows may share a tag; the
//! scheduler's acceptance rule decides which one ends up pending when they
//! are passed to [`EventScheduler::schedule_all`][crate::EventScheduler::schedule_all].

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tagq_core::{AgentId, Tick};

use crate::{Event, Priority, ScheduleError, ScheduleResult};

/// The event type produced by the loader.
pub type SeedEvent = Event<AgentId, Tick, String>;

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct EventRecord {
    tag:      u32,
    time:     u64,
    priority: Priority,
    kind:     String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load seed events from a CSV file.
pub fn load_events_csv(path: &Path) -> ScheduleResult<Vec<SeedEvent>> {
    let file = std::fs::File::open(path).map_err(ScheduleError::Io)?;
    load_events_reader(file)
}

/// Like [`load_events_csv`] but accepts any `Read` source.
pub fn load_events_reader<R: Read>(reader: R) -> ScheduleResult<Vec<SeedEvent>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut events = Vec::new();

    for (line, result) in csv_reader.deserialize::<EventRecord>().enumerate() {
        let row = result.map_err(|e| ScheduleError::Parse(e.to_string()))?;
        let kind = row.kind.trim();
        if kind.is_empty() {
            // +2: one for the header row, one for 1-based line numbers.
            return Err(ScheduleError::Parse(format!(
                "row {}: empty event kind for tag {}",
                line + 2,
                row.tag,
            )));
        }
        events.push(Event::new(AgentId(row.tag), Tick(row.time), row.priority, kind.to_owned()));
    }

    log::debug!("loaded {} seed events", events.len());
    Ok(events)
}
