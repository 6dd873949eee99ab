//! Pacing between browser navigations.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::TimingConfig;

/// Points in the crawl where the crawler idles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After a listing page has been processed
    AfterListing,
    /// After navigating to an author profile, before waiting for it
    ProfileSettle,
    /// After returning to the listing page from a profile
    AfterBack,
}

/// Fixed pause durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    pub after_listing: Duration,
    pub profile_settle: Duration,
    pub after_back: Duration,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self {
            after_listing: Duration::from_secs(3),
            profile_settle: Duration::from_secs(3),
            after_back: Duration::from_secs(3),
        }
    }
}

impl DelayPolicy {
    /// A policy that never pauses
    pub fn none() -> Self {
        Self {
            after_listing: Duration::ZERO,
            profile_settle: Duration::ZERO,
            after_back: Duration::ZERO,
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            after_listing: secs(timing.after_listing_secs),
            profile_settle: secs(timing.profile_settle_secs),
            after_back: secs(timing.back_settle_secs),
        }
    }

    pub fn delay_for(&self, pause: Pause) -> Duration {
        match pause {
            Pause::AfterListing => self.after_listing,
            Pause::ProfileSettle => self.profile_settle,
            Pause::AfterBack => self.after_back,
        }
    }
}

/// Convert configured seconds, treating negative or non-finite values as zero
pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Something the crawler can sleep on
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Records requested pauses without sleeping
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested pause, in order
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Sum of all requested pauses
    pub fn total(&self) -> Duration {
        self.recorded().into_iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut guard) = self.slept.lock() {
            guard.push(duration);
        }
    }
}
