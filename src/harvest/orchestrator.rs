//! Batch orchestrator - drives a whole batch of item fetches
//!
//! A run goes through three phases:
//! - Validate and deduplicate the input IDs and build their URLs
//! - Partition IDs into already-saved and pending
//! - Run a fixed pool of workers over the pending queue, collecting one
//!   result per ID over a channel

use crate::harvest::fetcher::ItemFetcher;
use crate::harvest::options::BatchOptions;
use crate::harvest::scheduler::{QueuedItem, Scheduler};
use crate::item::{dedup_ids, ItemId, UrlTemplate};
use crate::state::{FetchOutcome, ItemResult};
use crate::HarvestError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const WORKER_FAILED_MESSAGE: &str = "worker failed during fetch";

/// Runs batches of item fetches
pub struct Orchestrator {
    fetcher: Arc<ItemFetcher>,
    options: BatchOptions,
}

impl Orchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher shared by all workers
    /// * `options` - Batch tuning
    pub fn new(fetcher: ItemFetcher, options: BatchOptions) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            options,
        }
    }

    /// Fetches every ID in `ids`
    ///
    /// Duplicate IDs are collapsed. IDs with a stored artifact are reported
    /// as skipped successes without a render unless `force` is set. The rest
    /// are fetched with retry until they succeed, are found removed, fail
    /// fatally, or exhaust `max_retries`.
    ///
    /// Cancelling `cancel` stops new attempts; in-flight attempts get
    /// `cancel_grace` to finish. Unfinished IDs are reported as errors with
    /// the message `"cancelled"`.
    ///
    /// # Returns
    ///
    /// * `Ok(HashMap)` - Exactly one result per distinct input ID
    /// * `Err(HarvestError)` - Invalid ID or template (nothing was fetched),
    ///   or the store could not be queried
    pub async fn run<I, S>(
        &self,
        ids: I,
        template: &UrlTemplate,
        cancel: CancellationToken,
    ) -> Result<HashMap<ItemId, ItemResult>, HarvestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = dedup_ids(ids)?;
        let mut queued = Vec::with_capacity(ids.len());
        for id in &ids {
            let url = template.resolve(id)?;
            queued.push(QueuedItem::new(id.clone(), url));
        }

        let mut results = HashMap::with_capacity(ids.len());
        let pending = self.partition_saved(queued, &mut results)?;

        tracing::info!(
            "Starting batch: {} items, {} already saved, {} to fetch",
            ids.len(),
            results.len(),
            pending.len()
        );

        if !pending.is_empty() {
            self.run_workers(pending, cancel.clone(), &mut results)
                .await;
        }

        // Anything without a result never got a final outcome
        for id in ids {
            results
                .entry(id.clone())
                .or_insert_with(|| ItemResult::cancelled(id, 0));
        }

        let succeeded = results.values().filter(|r| r.is_success()).count();
        tracing::info!(
            "Batch finished: {}/{} succeeded{}",
            succeeded,
            results.len(),
            if cancel.is_cancelled() {
                " (cancelled)"
            } else {
                ""
            }
        );

        Ok(results)
    }

    /// Moves IDs with a stored artifact into `results`, returning the rest
    fn partition_saved(
        &self,
        queued: Vec<QueuedItem>,
        results: &mut HashMap<ItemId, ItemResult>,
    ) -> Result<Vec<QueuedItem>, HarvestError> {
        if self.options.force {
            return Ok(queued);
        }

        let store = self.fetcher.store();
        let mut pending = Vec::with_capacity(queued.len());

        for item in queued {
            if store.exists(&item.id)? {
                tracing::debug!("{} already saved, skipping", item.id);
                let bytes = store.size(&item.id)?;
                results.insert(item.id.clone(), ItemResult::already_saved(item.id, bytes));
            } else {
                pending.push(item);
            }
        }

        Ok(pending)
    }

    async fn run_workers(
        &self,
        pending: Vec<QueuedItem>,
        cancel: CancellationToken,
        results: &mut HashMap<ItemId, ItemResult>,
    ) {
        let total = pending.len();
        let worker_count = self.options.concurrency.clamp(1, total);
        let scheduler = Arc::new(Scheduler::new(pending, cancel.clone()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handles: Vec<_> = (0..worker_count)
            .map(|worker_id| {
                let worker = Worker {
                    id: worker_id,
                    fetcher: Arc::clone(&self.fetcher),
                    scheduler: Arc::clone(&scheduler),
                    options: self.options.clone(),
                    results: tx.clone(),
                    cancel: cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(tx);

        let start_time = Instant::now();
        let mut finished = 0;

        while let Some(result) = rx.recv().await {
            finished += 1;
            if finished % 10 == 0 {
                tracing::info!(
                    "Progress: {}/{} items finished, {:.2} items/sec",
                    finished,
                    total,
                    finished as f64 / start_time.elapsed().as_secs_f64()
                );
            }
            results.insert(result.id.clone(), result);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Fetch worker failed: {}", e);
            }
        }

        for item in scheduler.drain() {
            tracing::debug!("{} not finished before cancellation", item.id);
            results.insert(
                item.id.clone(),
                ItemResult::cancelled(item.id, item.attempts),
            );
        }
    }
}

/// One member of the worker pool
struct Worker {
    id: usize,
    fetcher: Arc<ItemFetcher>,
    scheduler: Arc<Scheduler>,
    options: BatchOptions,
    results: mpsc::UnboundedSender<ItemResult>,
    cancel: CancellationToken,
}

impl Worker {
    /// Loops dequeue, fetch, report, pace until the queue is exhausted
    async fn run(self) {
        while let Some(mut item) = self.scheduler.next_item().await {
            item.attempts += 1;
            tracing::debug!(
                "Worker {} attempt {}/{} for {}",
                self.id,
                item.attempts,
                self.options.max_attempts(),
                item.id
            );

            let claim = Claim::new(&self, &item);
            let fetched = tokio::select! {
                outcome = self.fetcher.fetch_url(&item.id, &item.url) => Some(outcome),
                _ = self.grace_expired() => None,
            };
            claim.release();

            let Some(outcome) = fetched else {
                tracing::warn!("Abandoned in-flight attempt for {} after cancellation", item.id);
                self.report(ItemResult::cancelled(item.id, item.attempts));
                self.scheduler.complete();
                break;
            };

            self.settle(item, outcome);

            if !self.pace().await {
                break;
            }
        }

        tracing::debug!("Worker {} finished", self.id);
    }

    /// Reports a final outcome or puts the item back for another attempt
    fn settle(&self, item: QueuedItem, outcome: FetchOutcome) {
        if outcome.is_retryable() && item.attempts < self.options.max_attempts() {
            let backoff = self.options.backoff_delay(item.attempts);
            tracing::warn!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                item.attempts,
                item.id,
                error_message(&outcome),
                backoff
            );
            // Backoff is counted from the end of this worker's pacing
            self.scheduler
                .retry(item, self.options.inter_request_delay.saturating_add(backoff));
            return;
        }

        match &outcome {
            FetchOutcome::Error { message, .. } => {
                tracing::error!(
                    "{} failed after {} attempt(s): {}",
                    item.id,
                    item.attempts,
                    message
                )
            }
            _ => tracing::info!("{} finished: {}", item.id, outcome.status()),
        }

        self.report(ItemResult::from_outcome(item.id, outcome, item.attempts));
        self.scheduler.complete();
    }

    fn report(&self, result: ItemResult) {
        if self.results.send(result).is_err() {
            tracing::debug!("Worker {} result dropped, batch no longer listening", self.id);
        }
    }

    /// Resolves once the batch is cancelled and the grace period has elapsed
    async fn grace_expired(&self) {
        self.cancel.cancelled().await;
        tokio::time::sleep(self.options.cancel_grace).await;
    }

    /// Waits the inter-request delay, returning false if cancelled meanwhile
    async fn pace(&self) -> bool {
        if self.options.inter_request_delay.is_zero() {
            return !self.cancel.is_cancelled();
        }

        tokio::select! {
            _ = tokio::time::sleep(self.options.inter_request_delay) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}

/// Marks an item as held by a worker for the length of one attempt
///
/// If the attempt unwinds (a renderer panic), dropping the claim reports the
/// item as failed and releases its scheduler slot so the rest of the batch
/// can finish.
struct Claim<'a> {
    worker: &'a Worker,
    held: Option<(ItemId, u32)>,
}

impl<'a> Claim<'a> {
    fn new(worker: &'a Worker, item: &QueuedItem) -> Self {
        Self {
            worker,
            held: Some((item.id.clone(), item.attempts)),
        }
    }

    /// The attempt returned normally; the worker settles the item itself
    fn release(mut self) {
        self.held = None;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let Some((id, attempts)) = self.held.take() else {
            return;
        };

        tracing::error!("Worker {} died while fetching {}", self.worker.id, id);
        self.worker.report(ItemResult::from_outcome(
            id,
            FetchOutcome::fatal(WORKER_FAILED_MESSAGE),
            attempts,
        ));
        self.worker.scheduler.complete();
    }
}

fn error_message(outcome: &FetchOutcome) -> &str {
    match outcome {
        FetchOutcome::Error { message, .. } => message.as_str(),
        _ => "",
    }
}
