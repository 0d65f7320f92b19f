//! Bounce trajectory computation
//!
//! Closed-form position and collision counting for an object bouncing inside a
//! rectangular arena, plus deterministic derivation of the starting state from
//! a seed string.

pub mod arena;
pub mod number_theory;
pub mod seed;
pub mod simulator;

pub use arena::{Arena, Direction, InitialState};
pub use number_theory::{BezoutSolution, extended_euclidean, lcm};
pub use seed::{derive_initial_state, hash_seed};
pub use simulator::{BounceSimulator, CornerSchedule, SimResult};

/// Errors from building or querying a trajectory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Invalid arena {width}x{height}: both dimensions must be positive")]
    InvalidArena { width: i64, height: i64 },

    #[error("Initial position ({x}, {y}) lies outside the {width}x{height} arena")]
    InitialStateOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("Invalid tick: {reason}")]
    InvalidTick { reason: String },
}
