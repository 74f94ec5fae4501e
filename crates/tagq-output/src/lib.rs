//! `tagq-output` — run output writers for tagq simulations.
//!
//! | Backend | Files created                              |
//! |---------|--------------------------------------------|
//! | CSV     | `dispatches.csv`, `step_summaries.csv`     |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `tagq_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tagq_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer, &config);
//! sim.run(&mut obs);
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{DispatchRow, StepSummaryRow};
pub use writer::OutputWriter;
