//! Background eviction of expired window records.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::clock::Clock;
use super::limiter::RateLimiter;

/// Spawn a task that periodically evicts expired records from `limiter`.
///
/// The first sweep runs one full `period` after spawning. Abort the
/// returned handle to stop sweeping.
pub fn spawn_sweeper<C>(limiter: Arc<RateLimiter<C>>, period: Duration) -> JoinHandle<()>
where
    C: Clock + 'static,
{
    info!(period_secs = period.as_secs_f64(), "Starting record sweeper");

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = limiter.evict_expired();
            if evicted > 0 {
                debug!(
                    evicted = evicted,
                    tracked = limiter.tracked_identifiers(),
                    "Evicted expired records"
                );
            }
        }
    })
}
