//! Engine configuration.

use std::time::Duration;

use bookingsync_core::DEFAULT_COLOR_ID;

/// Backoff policy for retryable calendar errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt; doubles on each further one.
    pub base_delay: Duration,
    /// Attempts before giving up, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns the delay that follows failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Total time spent backing off when every attempt fails.
    pub fn worst_case_wait(&self) -> Duration {
        (1..=self.max_attempts).map(|a| self.delay_for(a)).sum()
    }
}

/// Options for a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub retry: RetryPolicy,
    /// Color for units without one.
    pub default_color_id: String,
    /// Calendar for units without one; such units are skipped when unset.
    pub default_calendar_id: Option<String>,
    /// Deletions issued concurrently when collapsing duplicates or sweeping.
    pub delete_batch_size: usize,
    /// Calendars reconciled concurrently. Units sharing a calendar always run
    /// one after another.
    pub unit_concurrency: usize,
    /// Persist resolved event ids back onto bookings.
    pub write_back_event_ids: bool,
    /// Insert with ids derived from booking ids.
    pub deterministic_event_ids: bool,
    /// Decide and report without mutating anything.
    pub dry_run: bool,
    /// Calendars no unit maps to any more that are still swept for tagged
    /// events, e.g. the calendar a unit moved away from.
    pub sweep_calendars: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            default_color_id: DEFAULT_COLOR_ID.to_string(),
            default_calendar_id: None,
            delete_batch_size: 10,
            unit_concurrency: 1,
            write_back_event_ids: true,
            deterministic_event_ids: false,
            dry_run: false,
            sweep_calendars: Vec::new(),
        }
    }
}

impl SyncOptions {
    /// Builder: set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builder: set the default color.
    pub fn with_default_color(mut self, color_id: impl Into<String>) -> Self {
        self.default_color_id = color_id.into();
        self
    }

    /// Builder: set the fallback calendar.
    pub fn with_default_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.default_calendar_id = Some(calendar_id.into());
        self
    }

    /// Builder: set the deletion batch size (at least 1).
    pub fn with_delete_batch_size(mut self, size: usize) -> Self {
        self.delete_batch_size = size.max(1);
        self
    }

    /// Builder: set how many calendars run concurrently (at least 1).
    pub fn with_unit_concurrency(mut self, concurrency: usize) -> Self {
        self.unit_concurrency = concurrency.max(1);
        self
    }

    /// Builder: enable or disable event id write-back.
    pub fn with_write_back(mut self, enabled: bool) -> Self {
        self.write_back_event_ids = enabled;
        self
    }

    /// Builder: enable or disable deterministic event ids.
    pub fn with_deterministic_ids(mut self, enabled: bool) -> Self {
        self.deterministic_event_ids = enabled;
        self
    }

    /// Builder: set the sweep-only calendars.
    pub fn with_sweep_calendars<I, S>(mut self, calendars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sweep_calendars = calendars.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: enable or disable dry run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
