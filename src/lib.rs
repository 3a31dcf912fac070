//! Tank Strike - A tile-grid arcade tank combat game
//!
//! Core modules:
//! - `sim`: Arena simulation (grid, entities, collision, step)
//! - `session`: Match controller driving the simulation from host frames
//! - `render`: Display list generation and the Canvas 2D painter
//! - `input`: Keys-held map and key bindings
//! - `audio`: Sound cue capability and the Web Audio backend
//! - `persistence`: Key-value storage, saved games, profiles
//! - `progression`: XP, victory points, level-ups and military ranks
//! - `ranking`: Leaderboard synced from user profiles

pub mod audio;
pub mod input;
pub mod persistence;
pub mod progression;
pub mod ranking;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;

pub use session::{MatchConfig, MatchController};
pub use settings::{QualityPreset, Settings, TimestepMode};

/// Game configuration constants
pub mod consts {
    /// Reference simulation timestep (speeds are per-step at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Grid dimensions (cells per side)
    pub const GRID_SIZE: usize = 26;
    /// Side of one grid cell in world units
    pub const TILE_PX: f32 = 20.0;
    /// Arena side in world units
    pub const ARENA_PX: f32 = GRID_SIZE as f32 * TILE_PX;

    /// Base tank speed (world units per step)
    pub const TANK_SPEED: f32 = 2.4;
    /// Half extent of a tank's collision footprint
    pub const TANK_HALF_EXTENT: f32 = 8.5;
    /// Center distance below which a bullet hits a tank
    pub const HIT_RADIUS: f32 = 18.0;
    /// Muzzle offset from tank center along its heading
    pub const MUZZLE_OFFSET: f32 = 18.0;

    /// Bullet speed (world units per step)
    pub const BULLET_SPEED: f32 = 7.5;
    pub const BULLET_SIZE: f32 = 5.0;
    pub const BULLET_DAMAGE: u8 = 1;
    /// Bullets older than this many steps are culled
    pub const BULLET_MAX_AGE: u32 = 100;
    /// Minimum time between two shots of the same tank
    pub const FIRE_COOLDOWN_MS: f64 = 450.0;

    /// Player spawn point (world units)
    pub const PLAYER_SPAWN: (f32, f32) = (180.0, 500.0);
    /// Enemy spawn x positions, cycled modulo 3
    pub const ENEMY_SPAWN_X: [f32; 3] = [20.0, 260.0, 500.0];
    pub const ENEMY_SPAWN_Y: f32 = 20.0;
    pub const MAX_ENEMIES: u32 = 8;

    /// Per-step probability that an enemy picks a new heading
    pub const AI_TURN_CHANCE: f32 = 0.018;
    /// Per-step probability that an enemy tries to fire
    pub const AI_FIRE_CHANCE: f32 = 0.018;

    pub const START_LIVES: u8 = 5;
    /// Highest level a saved game may carry; anything above is treated as corrupt
    pub const MAX_SAVED_LEVEL: u32 = 999;
    pub const SCORE_PER_KILL: u64 = 100;

    /// Life lost by a particle each step
    pub const PARTICLE_DECAY: f32 = 0.045;
}
