use crate::config::FetchConfig;
use std::time::Duration;

/// Tuning for a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Number of fetch workers
    pub concurrency: usize,

    /// Pause each worker takes after every attempt
    pub inter_request_delay: Duration,

    /// Additional attempts allowed after a retryable failure
    pub max_retries: u32,

    /// Backoff before the first retry
    pub backoff_base: Duration,

    /// Upper bound for the retry backoff
    pub backoff_cap: Duration,

    /// Time allowed for a single render
    pub render_timeout: Duration,

    /// Time in-flight attempts get to finish after cancellation
    pub cancel_grace: Duration,

    /// Fetch every ID even if an artifact already exists
    pub force: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            inter_request_delay: Duration::from_millis(2000),
            max_retries: 3,
            backoff_base: Duration::from_millis(1000),
            backoff_cap: Duration::from_millis(30_000),
            render_timeout: Duration::from_millis(30_000),
            cancel_grace: Duration::from_millis(5000),
            force: false,
        }
    }
}

impl From<&FetchConfig> for BatchOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1) as usize,
            inter_request_delay: Duration::from_millis(config.inter_request_delay),
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base),
            backoff_cap: Duration::from_millis(config.backoff_cap),
            render_timeout: Duration::from_millis(config.render_timeout),
            cancel_grace: Duration::from_millis(config.cancel_grace),
            force: false,
        }
    }
}

impl BatchOptions {
    /// Delay before retrying an item whose `attempt`-th attempt failed
    ///
    /// Doubles from `backoff_base` with each attempt and never exceeds
    /// `backoff_cap`.
    ///
    /// # Example
    ///
    /// ```
    /// use page_harvest::BatchOptions;
    /// use std::time::Duration;
    ///
    /// let options = BatchOptions {
    ///     backoff_base: Duration::from_millis(100),
    ///     backoff_cap: Duration::from_millis(500),
    ///     ..BatchOptions::default()
    /// };
    ///
    /// assert_eq!(options.backoff_delay(1), Duration::from_millis(100));
    /// assert_eq!(options.backoff_delay(3), Duration::from_millis(400));
    /// assert_eq!(options.backoff_delay(4), Duration::from_millis(500));
    /// ```
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);

        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_cap)
            .min(self.backoff_cap)
    }

    /// Maximum number of renderer invocations per item
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
