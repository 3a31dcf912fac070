//! Arena grid: the 26x26 destructible tile map
//!
//! Cell (0, 0) is the top-left corner. Coordinates are `(col, row)` as
//! signed integers so callers can ask about cells outside the arena, which
//! always count as solid.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{GRID_SIZE, TILE_PX};

/// Terrain kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Empty,
    Brick,
    Steel,
    Water,
    Bush,
    Base,
}

impl TileKind {
    /// Whether tanks are blocked by this tile
    pub fn blocks_tanks(self) -> bool {
        matches!(self, TileKind::Brick | TileKind::Steel | TileKind::Base)
    }

    /// Whether a single bullet removes this tile
    pub fn destructible(self) -> bool {
        self == TileKind::Brick
    }
}

/// Base cells as `(col, row)`
pub const BASE_CELLS: [(i32, i32); 4] = [(12, 24), (13, 24), (12, 25), (13, 25)];

/// Brick wall around the Base as `(col, row)`
pub const BASE_WALL: [(i32, i32); 8] = [
    (11, 23),
    (12, 23),
    (13, 23),
    (14, 23),
    (11, 24),
    (14, 24),
    (11, 25),
    (14, 25),
];

/// First and one-past-last randomized rows
pub const TERRAIN_ROWS: std::ops::Range<i32> = 2..22;

/// Ordered terrain table. Each entry claims its own probability band, so the
/// bands never shadow each other; whatever is left over stays Empty.
pub const TERRAIN_TABLE: [(TileKind, f32); 4] = [
    (TileKind::Brick, 0.22),
    (TileKind::Steel, 0.06),
    (TileKind::Water, 0.04),
    (TileKind::Bush, 0.04),
];

/// Pick a tile from the terrain table for a roll in [0, 1)
pub fn terrain_for_roll(roll: f32) -> TileKind {
    let mut upper = 0.0;
    for (kind, probability) in TERRAIN_TABLE {
        upper += probability;
        if roll < upper {
            return kind;
        }
    }
    TileKind::Empty
}

/// The tile map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    tiles: Vec<TileKind>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Grid {
    /// All-empty grid (no Base, no wall)
    pub fn empty() -> Self {
        Self {
            tiles: vec![TileKind::Empty; GRID_SIZE * GRID_SIZE],
        }
    }

    /// Empty grid with only the Base and its wall in place
    pub fn with_base() -> Self {
        let mut grid = Self::empty();
        for (col, row) in BASE_CELLS {
            grid.set(col, row, TileKind::Base);
        }
        for (col, row) in BASE_WALL {
            grid.set(col, row, TileKind::Brick);
        }
        grid
    }

    fn index(col: i32, row: i32) -> Option<usize> {
        let size = GRID_SIZE as i32;
        if (0..size).contains(&col) && (0..size).contains(&row) {
            Some(row as usize * GRID_SIZE + col as usize)
        } else {
            None
        }
    }

    /// Tile at a cell, `None` outside the arena
    pub fn get(&self, col: i32, row: i32) -> Option<TileKind> {
        Self::index(col, row).map(|i| self.tiles[i])
    }

    /// Overwrite a cell. Out-of-range writes are ignored.
    pub fn set(&mut self, col: i32, row: i32, kind: TileKind) {
        if let Some(i) = Self::index(col, row) {
            self.tiles[i] = kind;
        }
    }

    /// Tanks cannot enter this cell (out of bounds is solid)
    pub fn is_solid(&self, col: i32, row: i32) -> bool {
        self.get(col, row).is_none_or(TileKind::blocks_tanks)
    }

    /// Iterate `(col, row, kind)` in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, TileKind)> + '_ {
        self.tiles.iter().enumerate().map(|(i, &kind)| {
            ((i % GRID_SIZE) as i32, (i / GRID_SIZE) as i32, kind)
        })
    }

    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|&&t| t == kind).count()
    }
}

/// Cell containing a world position
#[inline]
pub fn cell_at(pos: Vec2) -> (i32, i32) {
    ((pos.x / TILE_PX).floor() as i32, (pos.y / TILE_PX).floor() as i32)
}

/// Top-left corner of a cell in world units
#[inline]
pub fn cell_origin(col: i32, row: i32) -> Vec2 {
    Vec2::new(col as f32 * TILE_PX, row as f32 * TILE_PX)
}

/// Generate the grid for a level
pub fn generate<R: Rng>(level: u32, rng: &mut R) -> Grid {
    let mut grid = Grid::with_base();

    for row in TERRAIN_ROWS {
        for col in 0..GRID_SIZE as i32 {
            if grid.get(col, row) != Some(TileKind::Empty) {
                continue;
            }
            let roll: f32 = rng.random();
            grid.set(col, row, terrain_for_roll(roll));
        }
    }

    log::debug!(
        "Level {} grid: {} brick, {} steel, {} water, {} bush",
        level,
        grid.count(TileKind::Brick),
        grid.count(TileKind::Steel),
        grid.count(TileKind::Water),
        grid.count(TileKind::Bush),
    );

    grid
}
