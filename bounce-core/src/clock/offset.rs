//! Server-time offset and the tick count derived from it.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::TimeReference;
use crate::simulation::SimulationError;

/// Correction from local time to server time, plus the server's tick zero.
///
/// The default value (epoch 0, no offset) is what viewers run on before the
/// first successful sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockOffset {
    /// Server-chosen tick zero, milliseconds since the Unix epoch.
    pub epoch: i64,
    /// `server_time - local_time` at the moment of the last sync.
    pub local_offset_ms: i64,
}

impl ClockOffset {
    /// Builds an offset from a time reference received at `local_now_ms`.
    pub fn from_reference(reference: TimeReference, local_now_ms: i64) -> Self {
        Self {
            epoch: reference.epoch,
            local_offset_ms: reference.time.saturating_sub(local_now_ms),
        }
    }

    /// Estimated server time at the given local time.
    pub fn server_now_ms(&self, local_now_ms: i64) -> i64 {
        local_now_ms.saturating_add(self.local_offset_ms)
    }

    /// Milliseconds of server time elapsed since the epoch.
    pub fn elapsed_ms(&self, local_now_ms: i64) -> i64 {
        self.server_now_ms(local_now_ms).saturating_sub(self.epoch)
    }

    /// Converts local time into a simulation tick.
    ///
    /// Computes `floor((elapsed_ms / 1000) * ticks_per_second)`.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidTick` - If the result is negative, not finite, or out of range
    pub fn ticks_at(
        &self,
        local_now_ms: i64,
        ticks_per_second: f64,
    ) -> Result<i64, SimulationError> {
        let seconds = self.elapsed_ms(local_now_ms) as f64 / 1_000.0;
        let ticks = (seconds * ticks_per_second).floor();

        if !ticks.is_finite() {
            return Err(SimulationError::InvalidTick {
                reason: format!("tick count is not finite ({ticks})"),
            });
        }
        if ticks < 0.0 {
            return Err(SimulationError::InvalidTick {
                reason: format!("local time {local_now_ms} precedes epoch {}", self.epoch),
            });
        }
        if ticks >= i64::MAX as f64 {
            return Err(SimulationError::InvalidTick {
                reason: format!("tick count {ticks} out of range"),
            });
        }

        Ok(ticks as i64)
    }
}

/// Offset record shared between the sync task and frame readers.
///
/// Writers always replace the whole record, so readers see either the old or
/// the new offset and never a mix of the two.
#[derive(Debug, Clone, Default)]
pub struct SharedClockOffset {
    inner: Arc<RwLock<ClockOffset>>,
}

impl SharedClockOffset {
    /// Returns a copy of the current record.
    pub fn load(&self) -> ClockOffset {
        *self.inner.read()
    }

    /// Replaces the current record.
    pub fn store(&self, offset: ClockOffset) {
        *self.inner.write() = offset;
    }
}
