//! Periodic eviction of idle clients.
//!
//! The sweeper runs as a tokio task that wakes every `period` and calls
//! [`RateLimiterRegistry::sweep`]. It stops when its handle is stopped or
//! dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::registry::RateLimiterRegistry;

/// Handle to a running sweeper task.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Spawns the sweeper on the current runtime. The first sweep runs one
    /// `period` after spawning.
    pub fn spawn(
        registry: Arc<RateLimiterRegistry>,
        period: Duration,
        idle_threshold: Duration,
    ) -> Self {
        let (shutdown, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = registry.sweep(idle_threshold);
                        if evicted > 0 {
                            debug!(evicted, remaining = registry.len(), "swept idle clients");
                        }
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("limiter sweeper stopped");
        });

        Self { shutdown, task }
    }

    /// Signals the task and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "limiter sweeper ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::registry::ClientKey;

    fn client() -> ClientKey {
        ClientKey::parse("198.51.100.4").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_after_threshold() {
        let registry = Arc::new(RateLimiterRegistry::new(2.0, 4));
        registry.admit(&client());

        let sweeper = SweeperHandle::spawn(
            Arc::clone(&registry),
            Duration::from_secs(60),
            Duration::from_secs(180),
        );

        // Ticks at 60, 120, 180 see an idle time <= 180.
        tokio::time::sleep(Duration::from_secs(181)).await;
        assert!(registry.contains(&client()));

        // The tick at 240 sees 240s of idleness.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!registry.contains(&client()));

        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_spares_active_client() {
        let registry = Arc::new(RateLimiterRegistry::new(2.0, 4));
        let sweeper = SweeperHandle::spawn(
            Arc::clone(&registry),
            Duration::from_secs(60),
            Duration::from_secs(180),
        );

        for _ in 0..10 {
            registry.admit(&client());
            tokio::time::sleep(Duration::from_secs(100)).await;
        }
        assert!(registry.contains(&client()));

        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_task() {
        let registry = Arc::new(RateLimiterRegistry::new(2.0, 4));
        let sweeper = SweeperHandle::spawn(
            Arc::clone(&registry),
            Duration::from_secs(60),
            Duration::from_secs(180),
        );
        assert!(!sweeper.is_finished());
        sweeper.stop().await;
    }
}
