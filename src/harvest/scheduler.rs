//! Shared work queue for batch workers
//!
//! Items waiting for a retry stay in the queue with a `ready_at` deadline.
//! A worker asking for work takes the first ready item; if none is ready it
//! sleeps until the earliest deadline or until another worker changes the
//! queue. The queue is drained once it is empty and nothing is in flight,
//! or as soon as the batch is cancelled.

use crate::item::ItemId;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Upper bound on how long an idle worker sleeps before re-checking the queue
const IDLE_WAIT: Duration = Duration::from_millis(100);

/// An item waiting for its next attempt
#[derive(Debug, Clone)]
pub struct QueuedItem {
    pub id: ItemId,
    pub url: Url,
    /// Attempts already made for this item
    pub attempts: u32,
    ready_at: Instant,
}

impl QueuedItem {
    pub fn new(id: ItemId, url: Url) -> Self {
        Self {
            id,
            url,
            attempts: 0,
            ready_at: Instant::now(),
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    queue: VecDeque<QueuedItem>,
    in_flight: usize,
}

/// Work queue shared by all workers of a batch
pub struct Scheduler {
    state: Mutex<QueueState>,
    changed: Notify,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Creates a scheduler holding `items`, all immediately ready
    pub fn new(items: Vec<QueuedItem>, cancel: CancellationToken) -> Self {
        Self {
            state: Mutex::new(QueueState {
                queue: items.into(),
                in_flight: 0,
            }),
            changed: Notify::new(),
            cancel,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Takes the next ready item, waiting for one if necessary
    ///
    /// # Returns
    ///
    /// * `Some(QueuedItem)` - An item the caller now owns; it must hand it
    ///   back with [`Scheduler::complete`] or [`Scheduler::retry`]
    /// * `None` - No more work: the queue is exhausted or the batch was
    ///   cancelled
    pub async fn next_item(&self) -> Option<QueuedItem> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            let wait;
            let changed;
            {
                let mut state = self.lock();
                let now = Instant::now();

                if let Some(pos) = state.queue.iter().position(|item| item.ready_at <= now) {
                    if let Some(item) = state.queue.remove(pos) {
                        state.in_flight += 1;
                        return Some(item);
                    }
                }

                if state.queue.is_empty() && state.in_flight == 0 {
                    return None;
                }

                // Nothing ready, wait for the earliest backoff to expire
                wait = state
                    .queue
                    .iter()
                    .map(|item| item.ready_at.saturating_duration_since(now))
                    .min()
                    .unwrap_or(IDLE_WAIT)
                    .min(IDLE_WAIT);

                // Registered under the lock so a wakeup between unlock and poll is not lost
                changed = self.changed.notified();
            }

            tracing::trace!("No item ready, waiting up to {:?}", wait);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = changed => {}
                _ = self.cancel.cancelled() => return None,
            }
        }
    }

    /// Marks an item taken with `next_item` as finished
    pub fn complete(&self) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.changed.notify_waiters();
    }

    /// Puts an item back, eligible again after `delay`
    pub fn retry(&self, mut item: QueuedItem, delay: Duration) {
        item.ready_at = Instant::now() + delay;
        {
            let mut state = self.lock();
            state.queue.push_back(item);
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.changed.notify_waiters();
    }

    /// Removes and returns every item still queued
    pub fn drain(&self) -> Vec<QueuedItem> {
        self.lock().queue.drain(..).collect()
    }
}
