//! Statistics generation from batch results
//!
//! This module provides functionality for summarising and displaying the
//! result map returned by a batch run.

use crate::item::ItemId;
use crate::state::{ItemResult, ItemStatus};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Batch statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStatistics {
    /// Number of distinct items in the batch
    pub total: u64,

    pub success: u64,

    pub removed: u64,

    pub error: u64,

    /// Successes served from artifacts stored by an earlier run
    pub skipped: u64,

    /// Renderer invocations across all items
    pub attempts: u64,

    /// Bytes stored by this run
    pub bytes_written: u64,

    /// Error messages and how many items ended with each
    pub error_summary: BTreeMap<String, u64>,
}

impl BatchStatistics {
    /// Returns the count for one status
    pub fn count(&self, status: ItemStatus) -> u64 {
        match status {
            ItemStatus::Success => self.success,
            ItemStatus::Removed => self.removed,
            ItemStatus::Error => self.error,
        }
    }

    /// Percentage of items that ended in success
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.success as f64 / self.total as f64) * 100.0
    }
}

/// Collects statistics from a batch result map
pub fn collect_statistics(results: &HashMap<ItemId, ItemResult>) -> BatchStatistics {
    let mut stats = BatchStatistics {
        total: results.len() as u64,
        ..BatchStatistics::default()
    };

    for result in results.values() {
        stats.attempts += u64::from(result.attempts);

        match result.status {
            ItemStatus::Success => {
                stats.success += 1;
                if result.skipped {
                    stats.skipped += 1;
                } else {
                    stats.bytes_written += result.bytes.unwrap_or(0) as u64;
                }
            }
            ItemStatus::Removed => stats.removed += 1,
            ItemStatus::Error => {
                stats.error += 1;
                let message = result
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                *stats.error_summary.entry(message).or_insert(0) += 1;
            }
        }
    }

    stats
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &BatchStatistics) {
    println!("=== Batch Statistics ===\n");

    println!("Overview:");
    println!("  Items: {}", stats.total);
    println!("  Renderer attempts: {}", stats.attempts);
    println!("  Bytes written: {}", stats.bytes_written);
    println!();

    println!("Items by Status:");
    for status in ItemStatus::all() {
        let count = stats.count(status);
        let percentage = if stats.total > 0 {
            (count as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    if stats.skipped > 0 {
        println!("  (already saved: {})", stats.skipped);
    }
    println!();

    if !stats.error_summary.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = stats.error_summary.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (message, count) in error_counts {
            println!("  {}: {}", message, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} items)",
        stats.success_rate(),
        stats.success,
        stats.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FetchOutcome;

    fn id(raw: &str) -> ItemId {
        ItemId::new(raw).unwrap()
    }

    fn results() -> HashMap<ItemId, ItemResult> {
        [
            ItemResult::from_outcome(id("a"), FetchOutcome::Success { bytes_written: 100 }, 1),
            ItemResult::already_saved(id("b"), Some(40)),
            ItemResult::from_outcome(
                id("c"),
                FetchOutcome::Removed {
                    reason: "404 Not Found".to_string(),
                },
                1,
            ),
            ItemResult::from_outcome(id("d"), FetchOutcome::retryable("timeout"), 4),
            ItemResult::cancelled(id("e"), 0),
            ItemResult::cancelled(id("f"), 2),
        ]
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect()
    }

    #[test]
    fn test_collect_statistics() {
        let stats = collect_statistics(&results());

        assert_eq!(stats.total, 6);
        assert_eq!(stats.success, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.error, 3);
        assert_eq!(stats.attempts, 8);
        assert_eq!(stats.bytes_written, 100);
        assert_eq!(stats.error_summary.get("cancelled"), Some(&2));
        assert_eq!(stats.error_summary.get("timeout"), Some(&1));
    }

    #[test]
    fn test_success_rate() {
        let stats = collect_statistics(&results());
        assert!((stats.success_rate() - 33.333).abs() < 0.01);

        assert_eq!(BatchStatistics::default().success_rate(), 0.0);
    }
}
