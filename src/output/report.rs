//! JSON run report
//!
//! A report records one batch run: when it ran, which configuration it used,
//! the statistics, and every item result sorted by ID.

use crate::item::ItemId;
use crate::output::stats::{collect_statistics, BatchStatistics};
use crate::state::ItemResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Serializable record of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: String,
    pub cancelled: bool,
    pub statistics: BatchStatistics,
    pub results: Vec<ItemResult>,
}

impl BatchReport {
    pub fn new(
        started_at: DateTime<Utc>,
        config_hash: impl Into<String>,
        cancelled: bool,
        results: &HashMap<ItemId, ItemResult>,
    ) -> Self {
        let mut sorted: Vec<ItemResult> = results.values().cloned().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            started_at,
            finished_at: Utc::now(),
            config_hash: config_hash.into(),
            cancelled,
            statistics: collect_statistics(results),
            results: sorted,
        }
    }
}

/// Writes the report as pretty-printed JSON
///
/// The file is written next to its destination and renamed into place, so
/// readers never observe a half-written report.
///
/// # Arguments
///
/// * `report` - The report to write
/// * `output_path` - Destination file
pub fn write_json_report(report: &BatchReport, output_path: &Path) -> std::io::Result<()> {
    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let json = serde_json::to_vec_pretty(report)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(&json)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(output_path).map_err(|e| e.error)?;

    Ok(())
}
