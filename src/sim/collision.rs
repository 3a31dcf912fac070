//! Collision detection against the tile grid and between entities
//!
//! Tanks are axis-aligned squares: a move is legal only when all four
//! footprint corners land in passable cells. Bullets are points tested
//! against tank centers with a circular threshold.

use glam::Vec2;

use super::grid::{Grid, cell_at};
use super::state::Tank;
use crate::consts::{HIT_RADIUS, TANK_HALF_EXTENT};

/// Footprint corners of a tank centered at `center`
pub fn footprint_corners(center: Vec2, half_extent: f32) -> [Vec2; 4] {
    [
        center + Vec2::new(-half_extent, -half_extent),
        center + Vec2::new(half_extent, -half_extent),
        center + Vec2::new(-half_extent, half_extent),
        center + Vec2::new(half_extent, half_extent),
    ]
}

/// Whether a tank footprint centered at `proposed` fits on the grid
pub fn can_move_to(grid: &Grid, proposed: Vec2) -> bool {
    footprint_corners(proposed, TANK_HALF_EXTENT).iter().all(|&corner| {
        let (col, row) = cell_at(corner);
        !grid.is_solid(col, row)
    })
}

/// Move `tank` one step along `heading` if the destination is free.
/// Returns whether the tank moved; a rejected move leaves the position as is.
pub fn try_advance(grid: &Grid, tank: &mut Tank) -> bool {
    let proposed = tank.pos + tank.heading.unit() * tank.speed;
    if can_move_to(grid, proposed) {
        tank.pos = proposed;
        true
    } else {
        false
    }
}

/// Circular proximity test between a bullet and a tank center
#[inline]
pub fn bullet_hits_tank(bullet_pos: Vec2, tank_pos: Vec2) -> bool {
    bullet_pos.distance_squared(tank_pos) < HIT_RADIUS * HIT_RADIUS
}
