//! Arena geometry and starting conditions.

use serde::{Deserialize, Serialize};

use super::SimulationError;

/// Rectangle of positions the object's reference corner can occupy.
///
/// Both dimensions are strictly positive; zero-sized axes are rejected at
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arena {
    width: u32,
    height: u32,
}

impl Arena {
    /// Creates an arena of the given travel extent.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidArena` - If either dimension is zero
    pub fn new(width: u32, height: u32) -> Result<Self, SimulationError> {
        if width == 0 || height == 0 {
            return Err(SimulationError::InvalidArena {
                width: i64::from(width),
                height: i64::from(height),
            });
        }
        Ok(Self { width, height })
    }

    /// Derives the arena from canvas and object sizes.
    ///
    /// The usable extent is `canvas - object` on each axis.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidArena` - If the object fills or exceeds the canvas on an axis
    pub fn from_canvas(
        canvas_width: u32,
        canvas_height: u32,
        object_width: u32,
        object_height: u32,
    ) -> Result<Self, SimulationError> {
        let width = i64::from(canvas_width) - i64::from(object_width);
        let height = i64::from(canvas_height) - i64::from(object_height);

        match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok(Self {
                width: w,
                height: h,
            }),
            _ => Err(SimulationError::InvalidArena { width, height }),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Direction of travel along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards increasing coordinates (right or down).
    Forward,
    /// Towards decreasing coordinates (left or up).
    Backward,
}

/// Starting position and heading, fixed for the lifetime of a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InitialState {
    pub x: u32,
    pub y: u32,
    pub x_dir: Direction,
    pub y_dir: Direction,
}

impl InitialState {
    /// Checks that the starting position lies inside `arena`, edges included.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InitialStateOutOfBounds` - If `x > width` or `y > height`
    pub fn validate(&self, arena: Arena) -> Result<(), SimulationError> {
        if self.x > arena.width() || self.y > arena.height() {
            return Err(SimulationError::InitialStateOutOfBounds {
                x: self.x,
                y: self.y,
                width: arena.width(),
                height: arena.height(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_rejects_zero_dimensions() {
        assert!(matches!(
            Arena::new(0, 10),
            Err(SimulationError::InvalidArena { width: 0, height: 10 })
        ));
        assert!(Arena::new(10, 0).is_err());
        assert!(Arena::new(1, 1).is_ok());
    }

    #[test]
    fn test_arena_from_canvas() {
        let arena = Arena::from_canvas(640, 360, 100, 50).unwrap();
        assert_eq!(arena.width(), 540);
        assert_eq!(arena.height(), 310);
    }

    #[test]
    fn test_arena_from_canvas_rejects_filled_or_oversized_object() {
        assert!(matches!(
            Arena::from_canvas(640, 360, 640, 50),
            Err(SimulationError::InvalidArena { width: 0, height: 310 })
        ));
        assert!(matches!(
            Arena::from_canvas(640, 360, 100, 400),
            Err(SimulationError::InvalidArena { width: 540, height: -40 })
        ));
    }

    #[test]
    fn test_initial_state_bounds() {
        let arena = Arena::new(10, 5).unwrap();
        let edge = InitialState {
            x: 10,
            y: 5,
            x_dir: Direction::Forward,
            y_dir: Direction::Backward,
        };
        assert!(edge.validate(arena).is_ok());

        let outside = InitialState { x: 11, ..edge };
        assert!(matches!(
            outside.validate(arena),
            Err(SimulationError::InitialStateOutOfBounds { x: 11, .. })
        ));
    }
}
