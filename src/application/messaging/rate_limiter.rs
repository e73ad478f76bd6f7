//! Leaky-bucket admission control keyed by (scope owner, subject)
//!
//! Every accepted request adds one unit of usage to its key. A background
//! replenisher removes one unit from every key per interval, so an accepted
//! request stops counting against its key one interval after it leaked out
//! rather than the bucket refilling all at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::domain::entities::Snowflake;
use crate::infrastructure::config::RateLimitConfig;

/// (scope owner, subject), e.g. (guild, user) or (guild, channel)
pub type LimiterKey = (Snowflake, Snowflake);

pub struct RateLimiter {
    scope: &'static str,
    usage: Mutex<HashMap<LimiterKey, u32>>,
    capacity: u32,
    interval: Duration,
    evict_drained: bool,
}

impl RateLimiter {
    pub fn new(scope: &'static str, capacity: u32, interval: Duration) -> Self {
        Self {
            scope,
            usage: Mutex::new(HashMap::new()),
            capacity,
            interval,
            evict_drained: false,
        }
    }

    pub fn from_config(scope: &'static str, config: &RateLimitConfig) -> Self {
        Self::new(scope, config.capacity, config.interval()).with_eviction(config.evict_drained)
    }

    /// Remove keys from the table once their usage drains to zero
    pub fn with_eviction(mut self, evict_drained: bool) -> Self {
        self.evict_drained = evict_drained;
        self
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // A panic while holding the lock cannot leave a counter half-updated,
    // so a poisoned table is still consistent.
    fn table(&self) -> MutexGuard<'_, HashMap<LimiterKey, u32>> {
        self.usage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take one unit of capacity for the key. Returns false, leaving the
    /// usage untouched, when the key is already at capacity.
    pub fn allocate(&self, owner: Snowflake, subject: Snowflake) -> bool {
        let mut table = self.table();
        let used = table.entry((owner, subject)).or_insert(0);

        if *used < self.capacity {
            *used += 1;
            true
        } else {
            false
        }
    }

    /// One replenishment tick: every key leaks one unit, floored at zero
    pub fn leak(&self) {
        let mut table = self.table();
        for used in table.values_mut() {
            *used = used.saturating_sub(1);
        }
        if self.evict_drained {
            table.retain(|_, used| *used > 0);
        }
    }

    /// Current usage for a key, `None` if the key was never allocated
    #[cfg(test)]
    pub fn usage(&self, owner: Snowflake, subject: Snowflake) -> Option<u32> {
        self.table().get(&(owner, subject)).copied()
    }

    /// Number of tracked keys
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.table().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Start the background task that calls [`RateLimiter::leak`] once per
    /// interval. The first tick happens one interval from now.
    pub fn spawn_replenisher(self: &Arc<Self>) -> Replenisher {
        let limiter = Arc::clone(self);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let period = limiter.interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => limiter.leak(),
                    _ = &mut stop_rx => break,
                }
            }
            tracing::debug!(scope = limiter.scope, "replenisher stopped");
        });

        Replenisher {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running replenisher task. Dropping it aborts the task.
pub struct Replenisher {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Replenisher {
    /// Stop ticking and wait for the task to finish
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "replenisher task ended abnormally");
            }
        }
    }
}

impl Drop for Replenisher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: Snowflake = Snowflake(1);
    const ALICE: Snowflake = Snowflake(10);
    const BOB: Snowflake = Snowflake(11);

    fn limiter(capacity: u32) -> RateLimiter {
        RateLimiter::new("test", capacity, Duration::from_secs(10))
    }

    #[test]
    fn sixth_request_is_denied() {
        let limiter = limiter(5);
        let results: Vec<bool> = (0..6).map(|_| limiter.allocate(GUILD, ALICE)).collect();
        assert_eq!(results, [true, true, true, true, true, false]);
        assert_eq!(limiter.usage(GUILD, ALICE), Some(5));
    }

    #[test]
    fn denied_request_leaves_usage_alone() {
        let limiter = limiter(1);
        assert!(limiter.allocate(GUILD, ALICE));
        assert!(!limiter.allocate(GUILD, ALICE));
        assert!(!limiter.allocate(GUILD, ALICE));
        assert_eq!(limiter.usage(GUILD, ALICE), Some(1));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter(2);
        assert!(limiter.allocate(GUILD, ALICE));
        assert!(limiter.allocate(GUILD, ALICE));
        assert!(!limiter.allocate(GUILD, ALICE));

        assert_eq!(limiter.usage(GUILD, BOB), None);
        assert!(limiter.allocate(GUILD, BOB));
        assert!(limiter.allocate(Snowflake(2), ALICE));
        assert_eq!(limiter.usage(GUILD, ALICE), Some(2));
        assert_eq!(limiter.usage(GUILD, BOB), Some(1));
    }

    #[test]
    fn leak_drains_one_unit_per_tick() {
        let limiter = limiter(5);
        for _ in 0..3 {
            limiter.allocate(GUILD, ALICE);
        }
        limiter.allocate(GUILD, BOB);

        limiter.leak();
        assert_eq!(limiter.usage(GUILD, ALICE), Some(2));
        assert_eq!(limiter.usage(GUILD, BOB), Some(0));

        limiter.leak();
        assert_eq!(limiter.usage(GUILD, ALICE), Some(1));
        assert_eq!(limiter.usage(GUILD, BOB), Some(0));
    }

    #[test]
    fn full_bucket_empties_after_capacity_ticks() {
        let limiter = limiter(5);
        while limiter.allocate(GUILD, ALICE) {}

        for _ in 0..5 {
            limiter.leak();
        }
        assert_eq!(limiter.usage(GUILD, ALICE), Some(0));
        assert!(limiter.allocate(GUILD, ALICE));
    }

    #[test]
    fn one_tick_frees_exactly_one_slot() {
        let limiter = limiter(2);
        assert!(limiter.allocate(GUILD, ALICE));
        assert!(limiter.allocate(GUILD, ALICE));
        limiter.leak();
        assert!(limiter.allocate(GUILD, ALICE));
        assert!(!limiter.allocate(GUILD, ALICE));
    }

    #[test]
    fn drained_keys_are_kept_by_default() {
        let limiter = limiter(3);
        limiter.allocate(GUILD, ALICE);
        limiter.leak();
        limiter.leak();
        assert_eq!(limiter.len(), 1);
        assert_eq!(limiter.usage(GUILD, ALICE), Some(0));
    }

    #[test]
    fn eviction_drops_drained_keys() {
        let limiter = limiter(3).with_eviction(true);
        limiter.allocate(GUILD, ALICE);
        limiter.allocate(GUILD, BOB);
        limiter.allocate(GUILD, BOB);

        limiter.leak();
        assert_eq!(limiter.usage(GUILD, ALICE), None);
        assert_eq!(limiter.usage(GUILD, BOB), Some(1));
        assert_eq!(limiter.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_allocations_never_exceed_capacity() {
        let limiter = Arc::new(limiter(5));
        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.allocate(GUILD, ALICE) })
            })
            .collect();

        let mut allowed = 0;
        for task in tasks {
            if task.await.expect("allocation task") {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
        assert_eq!(limiter.usage(GUILD, ALICE), Some(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_leaks_and_allocations_stay_in_bounds() {
        let limiter = Arc::new(limiter(3));
        let mut tasks = Vec::new();
        for i in 0..200 {
            let limiter = Arc::clone(&limiter);
            tasks.push(tokio::spawn(async move {
                if i % 4 == 0 {
                    limiter.leak();
                } else {
                    limiter.allocate(GUILD, ALICE);
                }
                let used = limiter.usage(GUILD, ALICE).unwrap_or(0);
                assert!(used <= 3, "usage {used} over capacity");
            }));
        }
        for task in tasks {
            task.await.expect("task");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replenisher_ticks_every_interval() {
        let limiter = Arc::new(limiter(5));
        for _ in 0..3 {
            limiter.allocate(GUILD, ALICE);
        }

        let replenisher = limiter.spawn_replenisher();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(limiter.usage(GUILD, ALICE), Some(3));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(limiter.usage(GUILD, ALICE), Some(2));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(limiter.usage(GUILD, ALICE), Some(0));

        replenisher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_timer() {
        let limiter = Arc::new(limiter(5));
        let replenisher = limiter.spawn_replenisher();
        replenisher.shutdown().await;

        limiter.allocate(GUILD, ALICE);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(limiter.usage(GUILD, ALICE), Some(1));
        // the task owned the only other clone
        assert_eq!(Arc::strong_count(&limiter), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_aborts_the_task() {
        let limiter = Arc::new(limiter(5));
        drop(limiter.spawn_replenisher());

        limiter.allocate(GUILD, ALICE);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(limiter.usage(GUILD, ALICE), Some(1));
    }
}
