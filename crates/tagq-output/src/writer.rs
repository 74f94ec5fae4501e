//! The `OutputWriter` trait implemented by backend writers.

use crate::{DispatchRow, OutputResult, StepSummaryRow};

/// A sink for dispatch and step-summary rows.
///
/// From the observer's side every call is infallible; errors are stored and
/// retrieved with [`SimOutputObserver::take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Write the rows for one dispatched batch.
    fn write_dispatches(&mut self, rows: &[DispatchRow]) -> OutputResult<()>;

    /// Write one step summary row.
    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
