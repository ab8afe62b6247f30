//! Periodic reconciliation.
//!
//! Passes run on an interval with jitter. A pass that cannot read the source
//! pushes the next attempt out with exponential backoff; a partial pass counts
//! as a success and its failures are picked up by the next regular tick.
//! The outcome of each pass lives in the [`SyncService`](crate::SyncService),
//! the scheduler only remembers how many passes in a row have failed.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::SyncResult;
use crate::report::PassReport;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between passes when the previous one read the source.
    pub sync_interval: Duration,
    /// Fraction of the interval, 0.0 to 1.0, added or removed at random.
    pub jitter_fraction: f64,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(15 * 60))
    }
}

impl SchedulerConfig {
    pub fn new(sync_interval: Duration) -> Self {
        Self {
            sync_interval,
            jitter_fraction: 0.1,
            initial_backoff: Duration::from_secs(30),
            max_backoff: sync_interval.max(Duration::from_secs(30)),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    /// Wait before the next pass, given the current failure streak.
    pub fn delay_after(&self, failures: u32) -> Duration {
        if failures == 0 {
            let spread = self.sync_interval.as_secs_f64() * self.jitter_fraction;
            let secs = self.sync_interval.as_secs_f64() + spread * clock_noise();
            return Duration::from_secs_f64(secs.max(0.0));
        }

        let exponent = i32::try_from(failures - 1).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_backoff.as_secs_f64()))
    }
}

/// A value in [-1, 1] taken from the sub-second part of the wall clock.
fn clock_noise() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos) / 500_000_000.0 - 1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Run a pass now; the regular cadence restarts afterwards.
    SyncNow,
    Stop,
}

/// Runs passes until told to stop.
pub struct Scheduler {
    config: SchedulerConfig,
    failures: Arc<AtomicU32>,
    commands: mpsc::Receiver<SchedulerCommand>,
    sender: mpsc::Sender<SchedulerCommand>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (sender, commands) = mpsc::channel(8);
        Self {
            config,
            failures: Arc::new(AtomicU32::new(0)),
            commands,
            sender,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            sender: self.sender.clone(),
            failures: self.failures.clone(),
        }
    }

    /// Runs an immediate pass, then one per tick until [`SchedulerHandle::stop`].
    pub async fn run<F, Fut>(mut self, pass: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SyncResult<PassReport>> + Send,
    {
        info!(interval_secs = self.config.sync_interval.as_secs(), "scheduler started");
        self.tick(&pass).await;

        loop {
            let failures = self.failures.load(Ordering::SeqCst);
            let delay = self.config.delay_after(failures);
            debug!(delay_secs = delay.as_secs(), failures, "next pass scheduled");

            tokio::select! {
                () = tokio::time::sleep(delay) => self.tick(&pass).await,
                command = self.commands.recv() => match command {
                    Some(SchedulerCommand::SyncNow) => {
                        debug!("pass requested");
                        self.tick(&pass).await;
                    }
                    Some(SchedulerCommand::Stop) | None => break,
                },
            }
        }
        info!("scheduler stopped");
    }

    async fn tick<F, Fut>(&self, pass: &F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = SyncResult<PassReport>>,
    {
        match pass().await {
            Ok(_) => self.failures.store(0, Ordering::SeqCst),
            Err(e) => {
                let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(error = %e, failures, "scheduled pass failed");
            }
        }
    }
}

/// Cloneable control handle for a running [`Scheduler`].
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
    failures: Arc<AtomicU32>,
}

impl SchedulerHandle {
    pub async fn sync_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.sender.send(SchedulerCommand::SyncNow).await
    }

    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.sender.send(SchedulerCommand::Stop).await
    }

    /// Passes in a row that could not read the source.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::report::Tally;
    use bookingsync_providers::ProviderError;
    use chrono::Utc;

    fn report() -> PassReport {
        PassReport::new(Utc::now(), 0, false, Tally::default())
    }

    #[test]
    fn jittered_interval_stays_in_range() {
        let config = SchedulerConfig::new(Duration::from_secs(60)).with_jitter(0.1);
        for _ in 0..20 {
            let secs = config.delay_after(0).as_secs_f64();
            assert!((54.0..=66.0).contains(&secs), "{secs}");
        }
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let config = SchedulerConfig::default().with_backoff(
            Duration::from_secs(5),
            Duration::from_secs(300),
            2.0,
        );
        assert_eq!(config.delay_after(1), Duration::from_secs(5));
        assert_eq!(config.delay_after(3), Duration::from_secs(20));
        assert_eq!(config.delay_after(10), Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn sync_now_then_stop() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(3600)));
        let handle = scheduler.handle();
        let passes = Arc::new(AtomicU32::new(0));
        let counter = passes.clone();

        let task = tokio::spawn(scheduler.run(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(report())
            }
        }));

        handle.sync_now().await.unwrap();
        handle.stop().await.unwrap();
        task.await.unwrap();

        assert_eq!(passes.load(Ordering::SeqCst), 2);
        assert_eq!(handle.consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_source_backs_off() {
        let config = SchedulerConfig::new(Duration::from_secs(3600)).with_backoff(
            Duration::from_secs(10),
            Duration::from_secs(60),
            2.0,
        );
        let scheduler = Scheduler::new(config);
        let handle = scheduler.handle();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let task = tokio::spawn(scheduler.run(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(SyncError::Source(ProviderError::network("down")))
            }
        }));

        // Immediate pass, then 10 s and 20 s later.
        tokio::time::sleep(Duration::from_secs(31)).await;
        handle.stop().await.unwrap();
        task.await.unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(handle.consecutive_failures(), 3);
    }
}
