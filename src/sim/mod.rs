//! Deterministic arena simulation
//!
//! All gameplay logic lives here. Given the same seed, the same inputs and
//! the same host timestamps, a match plays out identically:
//! - Seeded RNG only: one `Pcg32` for gameplay, a second stream for particles
//! - Stable iteration order (enemies and bullets by index)
//! - No rendering or platform dependencies; audio is an injected capability

pub mod collision;
pub mod grid;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod weapon;

pub use collision::{bullet_hits_tank, can_move_to, try_advance};
pub use grid::{Grid, TileKind, cell_at, generate};
pub use spawn::{enemy_count, enemy_speed, spawn_enemies};
pub use state::{
    AiTuning, Bullet, GameEvent, GameOverCause, Heading, MatchOutcome, MatchPhase, Owner,
    Particle, Session, SimulationState, Tank,
};
pub use tick::{TickInput, advance_level, player_hit, tick};
pub use weapon::{FireOutcome, Shooter, fire};
