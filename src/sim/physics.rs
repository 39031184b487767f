//! Collision detection and movement resolution on the grid
//!
//! The player is a circle in the XZ plane; every wall and box is an
//! axis-aligned square cell. Planar positions are `Vec2` holding world
//! `(x, z)`.

use glam::Vec2;

use super::grid::{Direction, GridPos};
use crate::consts::CELL_HALF_EXTENT;

/// Result of a movement resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    /// Best position reached
    pub pos: Vec2,
    /// Whether any displacement happened
    pub moved: bool,
}

impl MoveResult {
    pub fn stay(pos: Vec2) -> Self {
        Self { pos, moved: false }
    }
}

/// Exact circle vs. square test
///
/// The cell is a square of side `2 * half_extent` centred on `(cell.x, cell.z)`.
/// The closest point of the square to `p` is found by clamping, and the circle
/// hits iff that point is strictly closer than `radius`.
pub fn circle_intersects_cell(p: Vec2, cell: GridPos, half_extent: f32, radius: f32) -> bool {
    let center = Vec2::new(cell.x as f32, cell.z as f32);
    let min = center - Vec2::splat(half_extent);
    let max = center + Vec2::splat(half_extent);

    let closest = p.clamp(min, max);
    (p - closest).length_squared() < radius * radius
}

/// True if the circle hits at least one of the cells (stops at the first hit)
pub fn intersects_any<'a>(
    p: Vec2,
    cells: impl IntoIterator<Item = &'a GridPos>,
    radius: f32,
) -> bool {
    cells
        .into_iter()
        .any(|c| circle_intersects_cell(p, *c, CELL_HALF_EXTENT, radius))
}

/// True if a circle at `p` touches no wall and no box
pub fn can_occupy(p: Vec2, walls: &[GridPos], boxes: &[GridPos], radius: f32) -> bool {
    !intersects_any(p, walls, radius) && !intersects_any(p, boxes, radius)
}

/// Snap a planar forward vector to a cardinal direction
///
/// The axis with the larger magnitude wins. Equal magnitudes (exact
/// diagonals) fall through to the Z axis.
pub fn cardinal_from_forward(forward: Vec2) -> Direction {
    if forward.x.abs() > forward.y.abs() {
        if forward.x > 0.0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if forward.y > 0.0 {
        Direction::South
    } else {
        Direction::North
    }
}

/// Forward vector `(sin(yaw), -cos(yaw))` for a yaw in degrees
#[inline]
pub fn forward_from_yaw(yaw_degrees: f32) -> Vec2 {
    let yaw = yaw_degrees.to_radians();
    Vec2::new(yaw.sin(), -yaw.cos())
}

/// Cardinal direction the camera is looking along
pub fn cardinal_from_yaw(yaw_degrees: f32) -> Direction {
    cardinal_from_forward(forward_from_yaw(yaw_degrees))
}

/// Move toward `target` at `speed`, sliding along obstacles
///
/// The displacement is normalized and scaled by `speed * dt`. If the full
/// move is blocked, X alone and then Z alone are retried at
/// `slide_factor` of the displacement; both may succeed.
#[allow(clippy::too_many_arguments)]
pub fn resolve_move(
    current: Vec2,
    target: Vec2,
    walls: &[GridPos],
    boxes: &[GridPos],
    dt: f32,
    speed: f32,
    radius: f32,
    slide_factor: f32,
) -> MoveResult {
    let dir = (target - current).normalize_or_zero();
    if dir == Vec2::ZERO {
        return MoveResult::stay(current);
    }
    let step = dir * speed * dt;

    let full = current + step;
    if can_occupy(full, walls, boxes, radius) {
        return MoveResult {
            pos: full,
            moved: full != current,
        };
    }

    let mut pos = current;
    let mut moved = false;

    let slide_x = Vec2::new(pos.x + step.x * slide_factor, pos.y);
    if can_occupy(slide_x, walls, boxes, radius) {
        pos = slide_x;
        moved = true;
    }

    let slide_z = Vec2::new(pos.x, pos.y + step.y * slide_factor);
    if can_occupy(slide_z, walls, boxes, radius) {
        pos = slide_z;
        moved = true;
    }

    // A zero-length axis component still "succeeds"; only report real motion
    MoveResult {
        pos,
        moved: moved && pos != current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{PLAYER_RADIUS, SLIDING_FRICTION_FACTOR};
    use crate::sim::grid::cell;
    use proptest::prelude::*;

    #[test]
    fn test_circle_at_cell_center() {
        assert!(circle_intersects_cell(Vec2::ZERO, cell(0, 0), 0.5, 0.35));
    }

    #[test]
    fn test_circle_far_away() {
        assert!(!circle_intersects_cell(Vec2::new(2.0, 2.0), cell(0, 0), 0.5, 0.35));
    }

    #[test]
    fn test_circle_near_edge() {
        assert!(circle_intersects_cell(Vec2::new(0.7, 0.0), cell(0, 0), 0.5, 0.35));
        assert!(!circle_intersects_cell(Vec2::new(0.9, 0.0), cell(0, 0), 0.5, 0.35));
    }

    #[test]
    fn test_circle_corner() {
        assert!(circle_intersects_cell(Vec2::new(0.6, 0.6), cell(0, 0), 0.5, 0.35));
        assert!(!circle_intersects_cell(Vec2::new(1.0, 1.0), cell(0, 0), 0.5, 0.35));
    }

    #[test]
    fn test_circle_touching_is_not_hit() {
        // Distance exactly equal to the radius is not an intersection
        assert!(!circle_intersects_cell(Vec2::new(1.0, 0.0), cell(0, 0), 0.5, 0.5));
        assert!(circle_intersects_cell(Vec2::new(1.0, 0.0), cell(0, 0), 0.5, 0.6));
    }

    #[test]
    fn test_intersects_any_and_can_occupy() {
        let walls = [cell(3, 0), cell(0, 3)];
        let boxes = [cell(-2, 0)];
        assert!(!intersects_any(Vec2::ZERO, &walls, PLAYER_RADIUS));
        assert!(intersects_any(Vec2::new(2.7, 0.0), &walls, PLAYER_RADIUS));
        assert!(can_occupy(Vec2::ZERO, &walls, &boxes, PLAYER_RADIUS));
        assert!(!can_occupy(Vec2::new(-1.4, 0.0), &walls, &boxes, PLAYER_RADIUS));
        assert!(!intersects_any(Vec2::ZERO, &[], PLAYER_RADIUS));
    }

    #[test]
    fn test_cardinal_from_yaw() {
        assert_eq!(cardinal_from_yaw(0.0), Direction::North);
        assert_eq!(cardinal_from_yaw(90.0), Direction::East);
        assert_eq!(cardinal_from_yaw(180.0), Direction::South);
        assert_eq!(cardinal_from_yaw(270.0), Direction::West);
        assert_eq!(cardinal_from_yaw(360.0), Direction::North);
        assert_eq!(cardinal_from_yaw(-90.0), Direction::West);
        assert_eq!(cardinal_from_yaw(30.0), Direction::North);
        assert_eq!(cardinal_from_yaw(60.0), Direction::East);
    }

    #[test]
    fn test_cardinal_tie_prefers_z_axis() {
        // Equal magnitudes are not "greater", so the Z branch is taken
        assert_eq!(cardinal_from_forward(Vec2::new(0.5, -0.5)), Direction::North);
        assert_eq!(cardinal_from_forward(Vec2::new(-0.5, 0.5)), Direction::South);
        assert_eq!(cardinal_from_forward(Vec2::ZERO), Direction::North);
    }

    #[test]
    fn test_cardinal_at_45_degrees_is_one_of_neighbours() {
        let dir = cardinal_from_yaw(45.0);
        assert!(dir == Direction::North || dir == Direction::East);
        // Deterministic for repeated calls
        assert_eq!(cardinal_from_yaw(45.0), dir);
    }

    #[test]
    fn test_resolve_move_free() {
        let result = resolve_move(
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            &[],
            &[],
            0.1,
            3.0,
            PLAYER_RADIUS,
            SLIDING_FRICTION_FACTOR,
        );
        assert!(result.moved);
        assert!((result.pos.x - 0.3).abs() < 1e-5);
        assert_eq!(result.pos.y, 0.0);
    }

    #[test]
    fn test_resolve_move_zero_displacement() {
        let start = Vec2::new(1.0, 2.0);
        let result = resolve_move(start, start, &[], &[], 0.1, 3.0, 0.35, 0.6);
        assert_eq!(result, MoveResult::stay(start));
    }

    #[test]
    fn test_resolve_move_slides_along_wall() {
        // Wall directly east; moving north-east should slide north
        let walls = [cell(1, 0)];
        let start = Vec2::new(0.14, 0.0);
        let target = start + Vec2::new(1.0, -1.0);
        let result = resolve_move(start, target, &walls, &[], 0.1, 3.0, PLAYER_RADIUS, 0.6);

        assert!(result.moved);
        assert!(result.pos.y < start.y, "should slide along -Z");
        assert!(can_occupy(result.pos, &walls, &[], PLAYER_RADIUS));
    }

    #[test]
    fn test_resolve_move_blocked_head_on() {
        let walls = [cell(1, 0)];
        let start = Vec2::new(0.14, 0.0);
        let result = resolve_move(
            start,
            Vec2::new(5.0, 0.0),
            &walls,
            &[],
            0.1,
            3.0,
            PLAYER_RADIUS,
            0.6,
        );
        assert!(!result.moved);
        assert_eq!(result.pos, start);
    }

    #[test]
    fn test_resolve_move_boxes_block_too() {
        let boxes = [cell(0, -1)];
        let start = Vec2::new(0.0, -0.14);
        let result = resolve_move(
            start,
            Vec2::new(0.0, -5.0),
            &[],
            &boxes,
            0.1,
            3.0,
            PLAYER_RADIUS,
            0.6,
        );
        assert!(!result.moved);
    }

    proptest! {
        #[test]
        fn prop_cardinal_is_unit_axis(yaw in -720.0f32..720.0) {
            let (x, z) = cardinal_from_yaw(yaw).xz();
            prop_assert_eq!(x.abs() + z.abs(), 1);
        }

        #[test]
        fn prop_collision_symmetric_under_reflection(dx in -2.0f32..2.0, dz in -2.0f32..2.0) {
            let c = cell(0, 0);
            let hit = circle_intersects_cell(Vec2::new(dx, dz), c, 0.5, 0.35);
            prop_assert_eq!(hit, circle_intersects_cell(Vec2::new(-dx, dz), c, 0.5, 0.35));
            prop_assert_eq!(hit, circle_intersects_cell(Vec2::new(dx, -dz), c, 0.5, 0.35));
            prop_assert_eq!(hit, circle_intersects_cell(Vec2::new(-dx, -dz), c, 0.5, 0.35));
        }

        #[test]
        fn prop_resolve_move_never_enters_wall(
            sx in -0.1f32..0.1,
            sz in -0.1f32..0.1,
            angle in 0.0f32..std::f32::consts::TAU,
            dt in 0.001f32..0.033,
        ) {
            let walls = [cell(1, 0), cell(-1, 0), cell(0, 1), cell(1, -1)];
            let start = Vec2::new(sx, sz);
            prop_assume!(can_occupy(start, &walls, &[], PLAYER_RADIUS));
            let target = start + Vec2::new(angle.cos(), angle.sin());
            let result = resolve_move(start, target, &walls, &[], dt, 4.95, PLAYER_RADIUS, 0.6);
            prop_assert!(can_occupy(result.pos, &walls, &[], PLAYER_RADIUS));
        }
    }
}
