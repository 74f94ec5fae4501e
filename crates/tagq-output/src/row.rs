//! Plain data row types written by output backends.

/// One dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRow {
    pub tick:     u64,
    /// The event's tag, rendered with `Display`.
    pub tag:      String,
    pub priority: i32,
}

/// Totals for one step of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSummaryRow {
    pub tick:                u64,
    pub unix_time_secs:      i64,
    pub dispatched:          u64,
    pub rejected:            u64,
    /// Heap size after the step; stale entries included.
    pub pending_upper_bound: u64,
}
