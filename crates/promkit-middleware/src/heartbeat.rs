//! Uptime heartbeat.
//!
//! One tokio task per recorder increments an uptime counter once per tick
//! until its cancellation token fires. The first increment happens one full
//! period after start, so `n` elapsed periods yield exactly `n` increments.

use std::time::Duration;

use promkit_core::Counter;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Uptime resolution.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(1);

/// Spawn the heartbeat loop on the current tokio runtime.
pub fn spawn_heartbeat(
    counter: Counter,
    service: String,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_heartbeat(counter, service, period, cancel))
}

async fn run_heartbeat(counter: Counter, service: String, period: Duration, cancel: CancellationToken) {
    let mut tick = time::interval_at(Instant::now() + period, period);
    // Burst keeps the count equal to elapsed periods if the runtime stalls.
    tick.set_missed_tick_behavior(MissedTickBehavior::Burst);

    tracing::debug!(%service, ?period, "heartbeat started");
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tick.tick() => counter.inc(),
        }
    }
    tracing::debug!(%service, total = counter.get(), "heartbeat stopped");
}
