//! Periodic server-time synchronisation.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;

use super::{ClockOffset, ClockSyncError, LocalClock, SharedClockOffset, SystemClock, TimeSource};
use crate::config::ClockConfig;
use crate::simulation::SimulationError;

/// Keeps a viewer's estimate of server time up to date.
///
/// The offset starts at [`ClockOffset::default`] and is replaced wholesale
/// after every successful fetch. Failed fetches leave it untouched.
pub struct ClockSync<S, C = SystemClock> {
    source: S,
    clock: C,
    offset: SharedClockOffset,
    config: ClockConfig,
}

impl<S: TimeSource, C: LocalClock> ClockSync<S, C> {
    pub fn new(source: S, clock: C, config: ClockConfig) -> Self {
        Self {
            source,
            clock,
            offset: SharedClockOffset::default(),
            config,
        }
    }

    /// Current offset record.
    pub fn offset(&self) -> ClockOffset {
        self.offset.load()
    }

    pub fn local_now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Ticks elapsed since the server epoch, as of now.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidTick` - If the local clock is behind the epoch
    pub fn ticks_now(&self, ticks_per_second: f64) -> Result<i64, SimulationError> {
        self.offset().ticks_at(self.clock.now_ms(), ticks_per_second)
    }

    /// Fetches one time reference and stores the resulting offset.
    ///
    /// The local clock is sampled once the response has arrived.
    ///
    /// # Errors
    ///
    /// - `ClockSyncError` - If the fetch fails; the previous offset is kept
    pub async fn sync_once(&self) -> Result<ClockOffset, ClockSyncError> {
        let reference = self.source.fetch().await?;
        let offset = ClockOffset::from_reference(reference, self.clock.now_ms());
        self.offset.store(offset);

        tracing::debug!(
            epoch = offset.epoch,
            local_offset_ms = offset.local_offset_ms,
            "Clock synchronised"
        );
        Ok(offset)
    }

    /// Syncs once and logs instead of returning failures.
    ///
    /// Returns whether the offset was refreshed.
    pub async fn sync_or_keep(&self) -> bool {
        match self.sync_once().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kept_offset_ms = self.offset().local_offset_ms,
                    "Time sync failed, keeping previous offset"
                );
                false
            }
        }
    }
}

impl<S, C> ClockSync<S, C>
where
    S: TimeSource + 'static,
    C: LocalClock + 'static,
{
    /// Starts the background sync loop.
    ///
    /// Syncs immediately, then forever waits a jittered delay between
    /// attempts. The loop runs for the lifetime of the runtime.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.sync_or_keep().await;
            loop {
                let delay = next_sync_delay(&self.config, &mut rand::rng());
                tracing::trace!(delay_ms = delay.as_millis() as u64, "Next time sync scheduled");
                tokio::time::sleep(delay).await;
                self.sync_or_keep().await;
            }
        })
    }
}

/// Picks a delay in `[sync_interval, sync_interval + sync_jitter)`.
///
/// Spreading attempts keeps many viewers from polling in lockstep.
pub fn next_sync_delay<R: Rng>(config: &ClockConfig, rng: &mut R) -> Duration {
    let jitter_ms = config.sync_jitter.as_millis() as u64;
    if jitter_ms == 0 {
        return config.sync_interval;
    }
    config.sync_interval + Duration::from_millis(rng.random_range(0..jitter_ms))
}
