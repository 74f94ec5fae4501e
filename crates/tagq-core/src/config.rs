//! Top-level run configuration.

use crate::{CoreError, CoreResult, SimClock, Tick};

/// Run configuration for the simulation driver.
///
/// Applications typically load this from JSON (with the `serde` feature) and
/// pass it to `tagq_sim::SimBuilder`, which calls [`validate`][Self::validate].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Unix timestamp for tick 0.
    pub start_unix_secs: i64,

    /// Seconds per tick.  Default: 3600.
    pub tick_duration_secs: u32,

    /// Events at or after `Tick(total_ticks)` are never dispatched.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Write a step summary every N ticks.  0 disables summaries.
    pub output_interval_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_unix_secs:       0,
            tick_duration_secs:    3_600,
            total_ticks:           24 * 7,
            seed:                  42,
            output_interval_ticks: 1,
        }
    }
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_secs, self.tick_duration_secs)
    }

    /// Reject configurations the driver cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_duration_secs == 0 {
            return Err(CoreError::Config("tick_duration_secs must be non-zero".into()));
        }
        if self.total_ticks == 0 {
            return Err(CoreError::Config("total_ticks must be non-zero".into()));
        }
        Ok(())
    }
}
