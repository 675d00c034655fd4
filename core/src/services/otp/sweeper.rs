//! Background removal of expired challenges
//!
//! Best effort: verification removes expired records lazily, so a missed or
//! failed sweep only delays reclaiming space.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::otp::OtpStore;

use super::clock::{Clock, SystemClock};

/// Configuration for the sweeper
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Seconds between sweeps
    pub interval_seconds: u64,
    pub enabled: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            enabled: true,
        }
    }
}

impl SweeperConfig {
    /// An interval of zero disables sweeping
    pub fn from_interval(interval_seconds: u64) -> Self {
        Self {
            interval_seconds,
            enabled: interval_seconds > 0,
        }
    }
}

/// Result of one sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepResult {
    pub purged: usize,
}

pub struct OtpSweeper {
    store: Arc<dyn OtpStore>,
    clock: Arc<dyn Clock>,
    config: SweeperConfig,
}

impl OtpSweeper {
    pub fn new(store: Arc<dyn OtpStore>, config: SweeperConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run a single sweep
    pub async fn run_once(&self) -> Result<SweepResult, DomainError> {
        if !self.config.enabled {
            return Ok(SweepResult::default());
        }

        let purged = self.store.purge_expired(self.clock.now()).await?;
        if purged > 0 {
            info!(purged = purged, event = "otp_sweep", "Purged expired one-time codes");
        }
        Ok(SweepResult { purged })
    }

    /// Spawn a tokio task that sweeps at the configured interval.
    /// Returns `None` when sweeping is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("One-time code sweeper is disabled");
            return None;
        }

        let interval = Duration::from_secs(self.config.interval_seconds);

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = self.config.interval_seconds,
                "One-time code sweeper started"
            );

            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.run_once().await {
                    error!(error = %e, "One-time code sweep failed");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ChallengeKey, OtpPurpose, OtpRecord, StoredCode};
    use crate::repositories::otp::InMemoryOtpStore;
    use crate::services::otp::clock::ManualClock;
    use chrono::Utc;

    async fn seeded_store(clock: &ManualClock) -> InMemoryOtpStore {
        let store = InMemoryOtpStore::new();
        for (email, ttl) in [("a@example.com", 60), ("b@example.com", 600)] {
            let record = OtpRecord::new(
                &ChallengeKey::new(email, OtpPurpose::SignIn),
                StoredCode::Plain {
                    code: "123456".to_string(),
                },
                clock.now(),
                chrono::Duration::seconds(ttl),
                3,
            );
            store.replace(&record).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_run_once_purges_expired_only() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = seeded_store(&clock).await;
        let sweeper = OtpSweeper::new(Arc::new(store.clone()), SweeperConfig::default())
            .with_clock(clock.clone());

        assert_eq!(sweeper.run_once().await.unwrap().purged, 0);

        clock.advance(chrono::Duration::seconds(60));
        assert_eq!(sweeper.run_once().await.unwrap().purged, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_disabled_sweeper_does_nothing() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = seeded_store(&clock).await;
        clock.advance(chrono::Duration::seconds(3600));

        let sweeper = Arc::new(
            OtpSweeper::new(Arc::new(store.clone()), SweeperConfig::from_interval(0))
                .with_clock(clock.clone()),
        );

        assert_eq!(sweeper.run_once().await.unwrap(), SweepResult::default());
        assert!(sweeper.start_background_task().is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_task_sweeps() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = seeded_store(&clock).await;
        clock.advance(chrono::Duration::seconds(3600));

        let sweeper = Arc::new(
            OtpSweeper::new(Arc::new(store.clone()), SweeperConfig::from_interval(30))
                .with_clock(clock.clone()),
        );
        let handle = sweeper.start_background_task().unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(store.is_empty().await);
        handle.abort();
    }
}
