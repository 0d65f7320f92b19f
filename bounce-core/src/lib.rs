//! Bounce Core - Synchronised bouncing-logo trajectories
//!
//! This crate provides the pieces every viewer needs to draw the same
//! bouncing logo at the same instant without talking to other viewers:
//! a closed-form trajectory engine, seed-derived starting states, server
//! clock synchronisation, and configuration management.

pub mod clock;
pub mod config;
pub mod screensaver;
pub mod simulation;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use clock::{ClockOffset, ClockSync, ClockSyncError, HttpTimeSource, TimeReference};
pub use config::BounceConfig;
pub use screensaver::{Frame, LogoSet, Screensaver};
pub use simulation::{Arena, BounceSimulator, InitialState, SimResult, SimulationError};

/// Core errors that can bubble up from any Bounce subsystem.
///
/// High-level error types representing failures in core functionality.
#[derive(Debug, thiserror::Error)]
pub enum BounceError {
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Clock sync error: {0}")]
    ClockSync(#[from] ClockSyncError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BounceError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            BounceError::Simulation(e) => match e {
                SimulationError::InvalidArena { .. } => {
                    "The logo does not fit inside the canvas".to_string()
                }
                SimulationError::InitialStateOutOfBounds { .. } => {
                    "The starting position lies outside the canvas".to_string()
                }
                SimulationError::InvalidTick { reason } => format!("Invalid time: {reason}"),
            },
            BounceError::ClockSync(e) => match e {
                ClockSyncError::InvalidUrl { url, .. } => format!("Invalid timer URL: {url}"),
                _ => "Could not reach the time server".to_string(),
            },
            BounceError::Configuration { reason } => format!("Configuration error: {reason}"),
            BounceError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BounceError::Configuration { .. }
                | BounceError::Simulation(SimulationError::InvalidArena { .. })
                | BounceError::Simulation(SimulationError::InitialStateOutOfBounds { .. })
                | BounceError::ClockSync(ClockSyncError::InvalidUrl { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, BounceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_are_classified() {
        let arena: BounceError = SimulationError::InvalidArena {
            width: 0,
            height: 5,
        }
        .into();
        assert!(arena.is_user_error());
        assert_eq!(arena.user_message(), "The logo does not fit inside the canvas");

        let tick: BounceError = SimulationError::InvalidTick {
            reason: "tick -1 is negative".to_string(),
        }
        .into();
        assert!(!tick.is_user_error());

        let payload: BounceError = ClockSyncError::MalformedPayload {
            reason: "missing field".to_string(),
        }
        .into();
        assert!(!payload.is_user_error());
        assert_eq!(payload.user_message(), "Could not reach the time server");
    }
}
