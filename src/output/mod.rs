//! Output module for batch summaries and reports
//!
//! This module handles:
//! - Aggregating a result map into statistics
//! - Printing statistics to the terminal
//! - Writing a JSON report of a run

mod report;
pub mod stats;

pub use report::{write_json_report, BatchReport};
pub use stats::{collect_statistics, print_statistics, BatchStatistics};
