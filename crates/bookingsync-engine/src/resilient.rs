//! Retrying wrapper around a [`CalendarProvider`].
//!
//! Every calendar call the engine makes goes through [`ResilientCalendar`],
//! so one backoff policy applies everywhere. Retryable errors (throttling,
//! timeouts, 5xx) are retried with exponential backoff up to the attempt
//! ceiling; anything else is returned on the first failure.
//!
//! Two "not found" answers are state transitions rather than failures:
//! deleting a missing event succeeds, and updating one falls back to insert.

use std::sync::Arc;

use bookingsync_core::EventContent;
use bookingsync_providers::{
    BoxFuture, CalendarProvider, EventQuery, ProviderResult, RemoteEvent,
};
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::{SyncError, SyncResult};

/// How a write landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Written {
    Inserted(RemoteEvent),
    Updated(RemoteEvent),
}

impl Written {
    /// The event as stored.
    pub fn event(&self) -> &RemoteEvent {
        match self {
            Self::Inserted(event) | Self::Updated(event) => event,
        }
    }
}

/// A [`CalendarProvider`] with retry and race handling.
#[derive(Clone)]
pub struct ResilientCalendar {
    inner: Arc<dyn CalendarProvider>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ResilientCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientCalendar")
            .field("provider", &self.inner.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ResilientCalendar {
    /// Wraps `inner` with `policy`.
    pub fn new(inner: Arc<dyn CalendarProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Runs `call` until it succeeds, fails permanently, or runs out of attempts.
    ///
    /// Each retryable failure is followed by its backoff delay, the last one
    /// included, before the next attempt or the `Exhausted` error.
    async fn retry<'a, T>(
        &'a self,
        operation: &'static str,
        call: impl Fn(&'a dyn CalendarProvider) -> BoxFuture<'a, ProviderResult<T>>,
    ) -> SyncResult<T> {
        let mut attempt = 1;
        loop {
            let err = match call(self.inner.as_ref()).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(SyncError::Provider(err)),
            };

            let delay = self.policy.delay_for(attempt);
            warn!(
                operation,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "retryable calendar error, backing off"
            );
            tokio::time::sleep(delay).await;

            if attempt >= self.policy.max_attempts {
                return Err(SyncError::Exhausted {
                    operation,
                    attempts: attempt,
                    last: err,
                });
            }
            attempt += 1;
        }
    }

    /// Lists events matching `query`.
    pub async fn list(&self, calendar_id: &str, query: &EventQuery) -> SyncResult<Vec<RemoteEvent>> {
        self.retry("list", |p| p.list_events(calendar_id, query)).await
    }

    /// Fetches one event; `None` if it no longer exists.
    pub async fn get(&self, calendar_id: &str, event_id: &str) -> SyncResult<Option<RemoteEvent>> {
        match self.retry("get", |p| p.get_event(calendar_id, event_id)).await {
            Ok(event) => Ok(Some(event)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Creates an event.
    ///
    /// With a caller-supplied id, a conflict means an earlier attempt already
    /// created the event, so it is overwritten instead.
    pub async fn insert(
        &self,
        calendar_id: &str,
        content: &EventContent,
        event_id: Option<&str>,
    ) -> SyncResult<Written> {
        match self
            .retry("insert", |p| p.insert_event(calendar_id, content, event_id))
            .await
        {
            Ok(event) => Ok(Written::Inserted(event)),
            Err(err) if err.is_conflict() => {
                let Some(event_id) = event_id else {
                    return Err(err);
                };
                debug!(event_id, "event id already taken, updating instead");
                self.retry("update", |p| p.update_event(calendar_id, event_id, content))
                    .await
                    .map(Written::Updated)
            }
            Err(err) => Err(err),
        }
    }

    /// Overwrites an event, inserting it again if it was deleted meanwhile.
    pub async fn update_or_insert(
        &self,
        calendar_id: &str,
        event_id: &str,
        content: &EventContent,
        insert_id: Option<&str>,
    ) -> SyncResult<Written> {
        match self
            .retry("update", |p| p.update_event(calendar_id, event_id, content))
            .await
        {
            Ok(event) => Ok(Written::Updated(event)),
            Err(err) if err.is_not_found() => {
                debug!(event_id, "event vanished before update, inserting");
                self.insert(calendar_id, content, insert_id).await
            }
            Err(err) => Err(err),
        }
    }

    /// Deletes an event; an already missing event counts as deleted.
    pub async fn delete(&self, calendar_id: &str, event_id: &str) -> SyncResult<()> {
        match self.retry("delete", |p| p.delete_event(calendar_id, event_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!(event_id, "event already gone");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
