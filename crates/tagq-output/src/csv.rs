//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `dispatches.csv`
//! - `step_summaries.csv`

use std::fs::{self, File};
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{DispatchRow, OutputResult, StepSummaryRow};

/// Writes run output to two CSV files.
pub struct CsvWriter {
    dispatches: Writer<File>,
    summaries:  Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the two CSV files in it and write the
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;

        let mut dispatches = Writer::from_path(dir.join("dispatches.csv"))?;
        dispatches.write_record(["tick", "tag", "priority"])?;

        let mut summaries = Writer::from_path(dir.join("step_summaries.csv"))?;
        summaries.write_record(["tick", "unix_time_secs", "dispatched", "rejected", "pending_upper_bound"])?;

        log::debug!("CSV output opened in {}", dir.display());
        Ok(Self { dispatches, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_dispatches(&mut self, rows: &[DispatchRow]) -> OutputResult<()> {
        for row in rows {
            self.dispatches.write_record([row.tick.to_string(), row.tag.clone(), row.priority.to_string()])?;
        }
        Ok(())
    }

    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        self.summaries.write_record([
            row.tick.to_string(),
            row.unix_time_secs.to_string(),
            row.dispatched.to_string(),
            row.rejected.to_string(),
            row.pending_upper_bound.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.dispatches.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
