//! Discrete grid coordinates
//!
//! Gameplay objects live on integer cells `(x, 0, z)`. Continuous positions
//! are mapped onto cells with [`grid_round`], which rounds half-values to the
//! nearest even integer (so `0.5 -> 0`, `1.5 -> 2`, `-2.5 -> -2`).

use glam::{IVec3, Vec2};
use serde::{Deserialize, Serialize};

/// A grid cell. `y` is always 0 for gameplay objects.
pub type GridPos = IVec3;

/// Build a grid cell on the gameplay plane
#[inline]
pub const fn cell(x: i32, z: i32) -> GridPos {
    IVec3::new(x, 0, z)
}

/// Round a continuous coordinate to the nearest grid line (ties to even)
#[inline]
pub fn grid_round(v: f32) -> i32 {
    v.round_ties_even() as i32
}

/// Snap a planar `(x, z)` position to its grid cell
#[inline]
pub fn snap(xz: Vec2) -> GridPos {
    cell(grid_round(xz.x), grid_round(xz.y))
}

/// One of the four world-aligned push directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// -Z (yaw 0)
    North,
    /// +Z (yaw 180)
    South,
    /// +X (yaw 90)
    East,
    /// -X (yaw 270)
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit step as `(dir_x, dir_z)`
    #[inline]
    pub const fn xz(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Unit step as a grid offset
    #[inline]
    pub const fn offset(self) -> GridPos {
        let (x, z) = self.xz();
        cell(x, z)
    }

    /// Inverse of [`Direction::xz`]
    pub const fn from_xz(x: i32, z: i32) -> Option<Self> {
        match (x, z) {
            (0, -1) => Some(Direction::North),
            (0, 1) => Some(Direction::South),
            (1, 0) => Some(Direction::East),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }
}
