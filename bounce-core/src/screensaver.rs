//! Viewer-side composition of seed, simulator and synchronised clock.
//!
//! Painting is left to the caller; this module only decides what should be
//! on screen at a given instant.

use serde::{Deserialize, Serialize};

use crate::clock::ClockOffset;
use crate::config::DisplayConfig;
use crate::simulation::{Arena, BounceSimulator, InitialState, SimResult, derive_initial_state};
use crate::{BounceError, Result};

/// An ordered set of equally sized logos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoSet {
    pub count: u32,
    pub width: u32,
    pub height: u32,
}

impl LogoSet {
    /// # Errors
    ///
    /// - `BounceError::Configuration` - If `count` is zero
    pub fn new(count: u32, width: u32, height: u32) -> Result<Self> {
        if count == 0 {
            return Err(BounceError::Configuration {
                reason: "at least one logo is required".to_string(),
            });
        }
        Ok(Self {
            count,
            width,
            height,
        })
    }

    /// Logo set described by the display configuration.
    ///
    /// # Errors
    ///
    /// - `BounceError::Configuration` - If the configured logo count is zero
    pub fn from_display(display: &DisplayConfig) -> Result<Self> {
        Self::new(display.logo_count, display.logo_width, display.logo_height)
    }

    /// Index of the logo to draw after `walls_hit` reflections.
    pub fn logo_index(&self, walls_hit: u64) -> u32 {
        (walls_hit % u64::from(self.count)) as u32
    }
}

/// What a viewer draws at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: i64,
    pub x: u32,
    pub y: u32,
    pub walls_hit: u64,
    pub corners_hit: u64,
    pub logo_index: u32,
}

/// Seeded bouncing-logo viewer state.
///
/// Built once per seed and display geometry; every frame afterwards is a
/// pure function of the synchronised clock.
#[derive(Debug, Clone)]
pub struct Screensaver {
    simulator: BounceSimulator,
    logos: LogoSet,
    ticks_per_second: f64,
}

impl Screensaver {
    /// Derives the starting state from `seed` and builds the simulator.
    ///
    /// # Errors
    ///
    /// - `BounceError::Simulation` - If the logo does not fit inside the canvas
    /// - `BounceError::Configuration` - If the tick rate is not a positive finite number
    pub fn new(display: &DisplayConfig, seed: &str, logos: LogoSet) -> Result<Self> {
        let arena = Arena::from_canvas(
            display.canvas_width,
            display.canvas_height,
            logos.width,
            logos.height,
        )?;
        let initial = derive_initial_state(seed, arena);
        Self::with_initial_state(display, arena, initial, logos)
    }

    /// Builds a viewer from an explicit starting state.
    ///
    /// # Errors
    ///
    /// - `BounceError::Simulation` - If `initial` lies outside `arena`
    /// - `BounceError::Configuration` - If the tick rate is not a positive finite number
    pub fn with_initial_state(
        display: &DisplayConfig,
        arena: Arena,
        initial: InitialState,
        logos: LogoSet,
    ) -> Result<Self> {
        let rate = display.ticks_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(BounceError::Configuration {
                reason: format!("ticks_per_second must be positive, got {rate}"),
            });
        }

        let simulator = BounceSimulator::new(arena, initial)?;
        tracing::info!(
            arena_width = arena.width(),
            arena_height = arena.height(),
            x = initial.x,
            y = initial.y,
            x_dir = ?initial.x_dir,
            y_dir = ?initial.y_dir,
            can_hit_corner = simulator.can_hit_corner(),
            "Screensaver initialised"
        );

        Ok(Self {
            simulator,
            logos,
            ticks_per_second: rate,
        })
    }

    /// Frame for an explicit tick.
    ///
    /// # Errors
    ///
    /// - `BounceError::Simulation` - If `tick` is negative
    pub fn frame_at_tick(&self, tick: i64) -> Result<Frame> {
        let SimResult {
            x,
            y,
            walls_hit,
            corners_hit,
        } = self.simulator.simulate(tick)?;

        Ok(Frame {
            tick,
            x,
            y,
            walls_hit,
            corners_hit,
            logo_index: self.logos.logo_index(walls_hit),
        })
    }

    /// Frame for the given local time under `offset`.
    ///
    /// # Errors
    ///
    /// - `BounceError::Simulation` - If the synchronised time precedes the epoch
    pub fn frame_at(&self, offset: ClockOffset, local_now_ms: i64) -> Result<Frame> {
        let tick = offset.ticks_at(local_now_ms, self.ticks_per_second)?;
        self.frame_at_tick(tick)
    }

    pub fn simulator(&self) -> &BounceSimulator {
        &self.simulator
    }
}
