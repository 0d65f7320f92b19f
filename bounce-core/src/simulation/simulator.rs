//! Closed-form bounce trajectory.
//!
//! Each axis is an independent reflection cycle: after relabeling so that the
//! object always starts moving forward, the distance travelled at tick `t` is
//! `start + t`, the number of walls touched is `distance / extent`, and the
//! visible coordinate mirrors on every odd wall count. Corners are the ticks
//! where both cycles touch a wall together, i.e. integer solutions of
//! `width * k - height * j = x_start - y_start`, which recur every
//! `lcm(width, height)` ticks.

use serde::{Deserialize, Serialize};

use super::number_theory::{extended_euclidean, lcm};
use super::{Arena, Direction, InitialState, SimulationError};

/// Position and cumulative event counts at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimResult {
    pub x: u32,
    pub y: u32,
    /// Wall reflections on either axis up to and including this tick.
    pub walls_hit: u64,
    /// Ticks where both axes reflected together, up to and including this tick.
    pub corners_hit: u64,
}

/// When corners happen, for trajectories that reach one at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CornerSchedule {
    /// Ticks between consecutive corner hits.
    pub period: u64,
    /// Tick of the first corner hit, in `[0, period]`.
    pub first: u64,
}

/// One axis after direction normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisTrack {
    start: i64,
    extent: i64,
    /// Wall-count parity on which the coordinate is mirrored.
    flip: i64,
}

impl AxisTrack {
    fn new(extent: u32, position: u32, direction: Direction) -> Self {
        let extent = i64::from(extent);
        let position = i64::from(position);
        match direction {
            Direction::Backward => Self {
                start: extent - position,
                extent,
                flip: 0,
            },
            Direction::Forward => Self {
                start: position,
                extent,
                flip: 1,
            },
        }
    }

    /// Returns `(coordinate, walls_hit)` at `tick`.
    fn locate(&self, tick: i64) -> Result<(i64, i64), SimulationError> {
        let distance =
            self.start
                .checked_add(tick)
                .ok_or_else(|| SimulationError::InvalidTick {
                    reason: format!("tick {tick} overflows travelled distance"),
                })?;

        let walls_hit = distance / self.extent;
        let mut coordinate = distance % self.extent;
        if walls_hit % 2 == self.flip {
            coordinate = self.extent - coordinate;
        }
        Ok((coordinate, walls_hit))
    }
}

/// Analytic position calculator for one arena and starting state.
///
/// Immutable after construction, so a single instance can be shared across
/// threads and queried for any tick in constant time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BounceSimulator {
    arena: Arena,
    initial: InitialState,
    x_axis: AxisTrack,
    y_axis: AxisTrack,
    corners: Option<CornerSchedule>,
}

impl BounceSimulator {
    /// Builds the simulator and precomputes the corner schedule.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InitialStateOutOfBounds` - If the start lies outside the arena
    pub fn new(arena: Arena, initial: InitialState) -> Result<Self, SimulationError> {
        initial.validate(arena)?;

        let x_axis = AxisTrack::new(arena.width(), initial.x, initial.x_dir);
        let y_axis = AxisTrack::new(arena.height(), initial.y, initial.y_dir);
        let corners = Self::schedule_corners(&x_axis, &y_axis);

        tracing::debug!(
            width = arena.width(),
            height = arena.height(),
            x = initial.x,
            y = initial.y,
            ?corners,
            "Bounce simulator constructed"
        );

        Ok(Self {
            arena,
            initial,
            x_axis,
            y_axis,
            corners,
        })
    }

    fn schedule_corners(x_axis: &AxisTrack, y_axis: &AxisTrack) -> Option<CornerSchedule> {
        let (width, height) = (x_axis.extent, y_axis.extent);
        let solution = extended_euclidean(width, height);
        let offset = x_axis.start - y_axis.start;

        if offset % solution.gcd != 0 {
            return None;
        }

        // Scale the identity w*s + h*t = gcd up to w*k + h*j = offset; any k
        // gives a corner at w*k - x_start, so reduce it modulo the period.
        let k = i128::from(solution.coefficient_for(width, height))
            * i128::from(offset / solution.gcd);
        let period = lcm(width, height);
        let candidate = k * i128::from(width) - i128::from(x_axis.start);
        let mut first = candidate.rem_euclid(i128::from(period)) as u64;

        // Distance zero is the starting point, not a wall contact.
        if first == 0 && (x_axis.start == 0 || y_axis.start == 0) {
            first = period;
        }

        Some(CornerSchedule { period, first })
    }

    /// Computes the state at `tick` without visiting intermediate ticks.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidTick` - If `tick` is negative or too large to represent
    pub fn simulate(&self, tick: i64) -> Result<SimResult, SimulationError> {
        if tick < 0 {
            return Err(SimulationError::InvalidTick {
                reason: format!("tick {tick} is negative"),
            });
        }

        let (x, x_walls) = self.x_axis.locate(tick)?;
        let (y, y_walls) = self.y_axis.locate(tick)?;

        let corners_hit = match self.corners {
            Some(CornerSchedule { period, first }) => {
                let period = i128::from(period);
                ((i128::from(tick) + period - i128::from(first)) / period) as u64
            }
            None => 0,
        };

        Ok(SimResult {
            x: x as u32,
            y: y as u32,
            walls_hit: (x_walls + y_walls) as u64,
            corners_hit,
        })
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    pub fn initial_state(&self) -> InitialState {
        self.initial
    }

    /// Whether the trajectory ever reaches a corner.
    pub fn can_hit_corner(&self) -> bool {
        self.corners.is_some()
    }

    pub fn corner_schedule(&self) -> Option<CornerSchedule> {
        self.corners
    }
}
