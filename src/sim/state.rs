//! Simulation state and entity records
//!
//! Everything a running match mutates lives in [`SimulationState`], owned by
//! the match controller and passed by reference into the step functions.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{self, Grid};
use super::spawn::spawn_enemies;
use crate::consts::*;

/// One of the four cardinal headings (screen space, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::Right, Heading::Down, Heading::Left, Heading::Up];

    /// Rotation in radians (0 = right, π/2 = down)
    pub fn radians(self) -> f32 {
        use std::f32::consts::{FRAC_PI_2, PI};
        match self {
            Heading::Right => 0.0,
            Heading::Down => FRAC_PI_2,
            Heading::Left => PI,
            Heading::Up => -FRAC_PI_2,
        }
    }

    /// Exact unit vector for this heading
    pub fn unit(self) -> Vec2 {
        match self {
            Heading::Right => Vec2::X,
            Heading::Down => Vec2::Y,
            Heading::Left => Vec2::NEG_X,
            Heading::Up => Vec2::NEG_Y,
        }
    }

    /// Rotate 90° clockwise on screen
    pub fn turned_clockwise(self) -> Self {
        match self {
            Heading::Right => Heading::Down,
            Heading::Down => Heading::Left,
            Heading::Left => Heading::Up,
            Heading::Up => Heading::Right,
        }
    }

    /// Uniformly random heading
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Which side a tank or bullet belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// A tank (player or enemy)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub pos: Vec2,
    pub heading: Heading,
    pub health: u8,
    /// World units per step
    pub speed: f32,
    /// Host timestamp (ms) of the last accepted fire attempt
    pub last_shot_ms: Option<f64>,
}

impl Tank {
    pub fn new(pos: Vec2, heading: Heading, speed: f32) -> Self {
        Self {
            pos,
            heading,
            health: 1,
            speed,
            last_shot_ms: None,
        }
    }

    /// The player's tank at its spawn point
    pub fn player() -> Self {
        Self::new(player_spawn(), Heading::Up, TANK_SPEED)
    }

    pub fn rotation(&self) -> f32 {
        self.heading.radians()
    }

    /// Where a shot leaves the barrel
    pub fn muzzle(&self) -> Vec2 {
        self.pos + self.heading.unit() * MUZZLE_OFFSET
    }

    /// Cooldown has elapsed at `now_ms`
    pub fn can_fire(&self, now_ms: f64) -> bool {
        self.last_shot_ms
            .is_none_or(|last| now_ms - last >= FIRE_COOLDOWN_MS)
    }
}

#[inline]
pub fn player_spawn() -> Vec2 {
    Vec2::new(PLAYER_SPAWN.0, PLAYER_SPAWN.1)
}

/// A projectile
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub owner: Owner,
    pub size: f32,
    pub damage: u8,
    /// Steps since the bullet was fired
    pub age: u32,
}

impl Bullet {
    pub fn new(pos: Vec2, heading: Heading, owner: Owner) -> Self {
        Self {
            pos,
            vel: heading.unit() * BULLET_SPEED,
            owner,
            size: BULLET_SIZE,
            damage: BULLET_DAMAGE,
            age: 0,
        }
    }

    pub fn advance(&mut self) {
        self.pos += self.vel;
        self.age += 1;
    }

    /// Left the arena or lived too long
    pub fn expired(&self) -> bool {
        self.pos.x < 0.0
            || self.pos.x > ARENA_PX
            || self.pos.y < 0.0
            || self.pos.y > ARENA_PX
            || self.age > BULLET_MAX_AGE
    }
}

/// RGBA color, components in 0..=1
pub type Color = [f32; 4];

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32, // 1 -> 0
    pub color: Color,
    pub size: f32,
}

/// Default cap on live particles
pub const MAX_PARTICLES: usize = 512;

/// Enemy behavior probabilities, rolled once per enemy per step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiTuning {
    pub turn_chance: f32,
    pub fire_chance: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            turn_chance: AI_TURN_CHANCE,
            fire_chance: AI_FIRE_CHANCE,
        }
    }
}

impl AiTuning {
    /// Enemies never turn on their own and never fire
    pub fn passive() -> Self {
        Self {
            turn_chance: 0.0,
            fire_chance: 0.0,
        }
    }
}

/// Why a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverCause {
    BaseDestroyed,
    LivesExhausted,
}

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Running,
    GameOver(GameOverCause),
}

/// Result reported to the progression layer when a match ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub player_won: bool,
    pub final_score: u64,
    pub levels_cleared: u32,
}

/// Lives, score and level for the running match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub level: u32,
    pub lives: u8,
    pub score: u64,
    pub base_alive: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            level: 1,
            lives: START_LIVES,
            score: 0,
            base_alive: true,
        }
    }
}

impl Session {
    pub fn levels_cleared(&self) -> u32 {
        self.level.saturating_sub(1)
    }
}

/// Notable things that happened during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    BrickDestroyed { col: i32, row: i32 },
    EnemyDestroyed { score: u64 },
    PlayerHit { lives_left: u8 },
    LevelCleared { new_level: u32 },
    BaseDestroyed,
    GameOver(MatchOutcome),
}

/// PCG stream for the particle generator
const FX_STREAM: u64 = 0xf0;

/// Complete mutable state of one match
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Match seed for reproducibility
    pub seed: u64,
    /// Gameplay randomness: terrain and enemy AI
    pub rng: Pcg32,
    /// Particle randomness, kept apart so the particle cap never shifts gameplay rolls
    pub fx_rng: Pcg32,
    pub grid: Grid,
    pub player: Tank,
    pub enemies: Vec<Tank>,
    pub bullets: Vec<Bullet>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub max_particles: usize,
    pub ai: AiTuning,
    pub session: Session,
    pub phase: MatchPhase,
    /// Steps simulated so far
    pub steps: u64,
    /// Events since the controller last drained them
    pub events: Vec<GameEvent>,
}

impl SimulationState {
    /// Fresh match at level 1
    pub fn new(seed: u64) -> Self {
        Self::with_session(seed, Session::default())
    }

    /// Match starting from existing session counters (used when resuming)
    pub fn with_session(seed: u64, session: Session) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let grid = grid::generate(session.level, &mut rng);
        let enemies = spawn_enemies(session.level);
        Self {
            seed,
            rng,
            fx_rng: Pcg32::new(seed, FX_STREAM),
            grid,
            player: Tank::player(),
            enemies,
            bullets: Vec::new(),
            particles: Vec::new(),
            max_particles: MAX_PARTICLES,
            ai: AiTuning::default(),
            session,
            phase: MatchPhase::Running,
            steps: 0,
            events: Vec::new(),
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, MatchPhase::GameOver(_))
    }

    pub fn outcome(&self) -> MatchOutcome {
        MatchOutcome {
            player_won: false,
            final_score: self.session.score,
            levels_cleared: self.session.levels_cleared(),
        }
    }

    /// Latch game over. Only the first call records the outcome.
    pub fn end_match(&mut self, cause: GameOverCause) {
        if self.is_over() {
            return;
        }
        self.phase = MatchPhase::GameOver(cause);
        let outcome = self.outcome();
        log::info!(
            "Match over ({:?}): score {}, levels cleared {}",
            cause,
            outcome.final_score,
            outcome.levels_cleared
        );
        self.events.push(GameEvent::GameOver(outcome));
    }

    /// Spawn a burst of particles, dropping any beyond the cap
    pub fn burst(&mut self, at: Vec2, color: Color, count: usize, size_mult: f32) {
        let room = self.max_particles.saturating_sub(self.particles.len());
        for _ in 0..count.min(room) {
            let vel = Vec2::new(
                (self.fx_rng.random::<f32>() - 0.5) * 6.0,
                (self.fx_rng.random::<f32>() - 0.5) * 6.0,
            );
            let size = (self.fx_rng.random::<f32>() * 3.0 + 2.0) * size_mult;
            self.particles.push(Particle {
                pos: at,
                vel,
                life: 1.0,
                color,
                size,
            });
        }
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_clockwise_cycle() {
        let mut h = Heading::Right;
        for expected in [Heading::Down, Heading::Left, Heading::Up, Heading::Right] {
            h = h.turned_clockwise();
            assert_eq!(h, expected);
        }
    }

    #[test]
    fn test_heading_unit_matches_radians() {
        for h in Heading::ALL {
            let from_angle = Vec2::new(h.radians().cos(), h.radians().sin());
            assert!((from_angle - h.unit()).length() < 1e-5);
        }
    }

    #[test]
    fn test_new_state_defaults() {
        let state = SimulationState::new(1);
        assert_eq!(state.session.level, 1);
        assert_eq!(state.session.lives, START_LIVES);
        assert_eq!(state.session.score, 0);
        assert!(state.session.base_alive);
        assert_eq!(state.enemies.len(), 4);
        assert_eq!(state.player.pos, player_spawn());
        assert_eq!(state.player.heading, Heading::Up);
        assert_eq!(state.phase, MatchPhase::Running);
    }

    #[test]
    fn test_end_match_records_once() {
        let mut state = SimulationState::new(1);
        state.session.score = 300;
        state.end_match(GameOverCause::BaseDestroyed);
        state.session.score = 900;
        state.end_match(GameOverCause::LivesExhausted);
        let events = state.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            GameEvent::GameOver(MatchOutcome {
                player_won: false,
                final_score: 300,
                levels_cleared: 0,
            })
        );
        assert_eq!(state.phase, MatchPhase::GameOver(GameOverCause::BaseDestroyed));
    }

    #[test]
    fn test_burst_respects_cap() {
        let mut state = SimulationState::new(1);
        state.max_particles = 10;
        state.burst(Vec2::ZERO, [1.0; 4], 8, 1.0);
        state.burst(Vec2::ZERO, [1.0; 4], 8, 1.0);
        assert_eq!(state.particles.len(), 10);
    }

    #[test]
    fn test_cooldown() {
        let mut tank = Tank::player();
        assert!(tank.can_fire(0.0));
        tank.last_shot_ms = Some(1000.0);
        assert!(!tank.can_fire(1449.0));
        assert!(tank.can_fire(1450.0));
    }
}
