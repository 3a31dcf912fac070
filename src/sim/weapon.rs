//! Fire control: cooldown, point-blank terrain and bullet creation

use super::grid::{TileKind, cell_at};
use super::state::{Bullet, Color, GameEvent, GameOverCause, Owner, SimulationState};
use crate::audio::AudioCues;

/// Particle colors for destruction bursts
pub mod debris {
    use super::Color;

    pub const BRICK: Color = [0.698, 0.133, 0.133, 1.0];
    pub const STEEL: Color = [0.667, 0.667, 0.667, 1.0];
    pub const BASE: Color = [1.0, 0.0, 0.0, 1.0];
    pub const ENEMY: Color = [1.0, 1.0, 0.0, 1.0];
    pub const PLAYER: Color = [1.0, 0.0, 0.0, 1.0];
}

/// Which tank pulls the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shooter {
    Player,
    Enemy(usize),
}

impl Shooter {
    pub fn owner(self) -> Owner {
        match self {
            Shooter::Player => Owner::Player,
            Shooter::Enemy(_) => Owner::Enemy,
        }
    }
}

/// What a fire attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Cooldown not elapsed (or no such tank); nothing changed
    CoolingDown,
    /// Muzzle inside Steel; shot swallowed
    Absorbed,
    /// Muzzle inside Brick; tile cleared, no bullet
    BrickDestroyed,
    /// Muzzle inside the Base; match lost
    BaseDestroyed,
    /// A bullet is now in flight
    Launched,
}

/// Attempt to fire from `shooter` at host time `now_ms`
pub fn fire(
    state: &mut SimulationState,
    shooter: Shooter,
    now_ms: f64,
    audio: &mut dyn AudioCues,
) -> FireOutcome {
    let tank = match shooter {
        Shooter::Player => &mut state.player,
        Shooter::Enemy(i) => match state.enemies.get_mut(i) {
            Some(tank) => tank,
            None => return FireOutcome::CoolingDown,
        },
    };
    if !tank.can_fire(now_ms) {
        return FireOutcome::CoolingDown;
    }
    tank.last_shot_ms = Some(now_ms);
    let muzzle = tank.muzzle();
    let heading = tank.heading;

    let (col, row) = cell_at(muzzle);
    match state.grid.get(col, row) {
        Some(TileKind::Brick) => {
            state.grid.set(col, row, TileKind::Empty);
            state.burst(muzzle, debris::BRICK, 10, 1.0);
            state.events.push(GameEvent::BrickDestroyed { col, row });
            audio.play_hit();
            FireOutcome::BrickDestroyed
        }
        Some(TileKind::Steel) => FireOutcome::Absorbed,
        Some(TileKind::Base) => {
            state.session.base_alive = false;
            state.events.push(GameEvent::BaseDestroyed);
            audio.play_explosion();
            state.end_match(GameOverCause::BaseDestroyed);
            FireOutcome::BaseDestroyed
        }
        _ => {
            let owner = shooter.owner();
            state.bullets.push(Bullet::new(muzzle, heading, owner));
            if owner == Owner::Player {
                audio.play_shot();
            }
            FireOutcome::Launched
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CueLog, SoundEffect};
    use crate::sim::grid::Grid;
    use crate::sim::state::{Heading, MatchPhase, Tank};
    use glam::Vec2;

    /// Open arena with the player at (100, 100) facing right
    fn open_state() -> SimulationState {
        let mut state = SimulationState::new(5);
        state.grid = Grid::empty();
        state.enemies.clear();
        state.player = Tank::new(Vec2::new(100.0, 100.0), Heading::Right, 2.4);
        state
    }

    #[test]
    fn test_open_space_launches_bullet() {
        let mut state = open_state();
        let mut audio = CueLog::default();
        assert_eq!(fire(&mut state, Shooter::Player, 0.0, &mut audio), FireOutcome::Launched);
        assert_eq!(state.bullets.len(), 1);
        let bullet = state.bullets[0];
        assert_eq!(bullet.owner, Owner::Player);
        assert_eq!(bullet.pos, Vec2::new(118.0, 100.0));
        assert_eq!(bullet.vel, Vec2::new(7.5, 0.0));
        assert_eq!(audio.cues, vec![SoundEffect::Shot]);
    }

    #[test]
    fn test_cooldown_allows_one_bullet() {
        let mut state = open_state();
        let mut audio = CueLog::default();
        fire(&mut state, Shooter::Player, 1000.0, &mut audio);
        assert_eq!(
            fire(&mut state, Shooter::Player, 1449.0, &mut audio),
            FireOutcome::CoolingDown
        );
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(
            fire(&mut state, Shooter::Player, 1450.0, &mut audio),
            FireOutcome::Launched
        );
        assert_eq!(state.bullets.len(), 2);
    }

    #[test]
    fn test_point_blank_brick_consumes_shot() {
        let mut state = open_state();
        // Muzzle at (118, 100) lies in cell (5, 5)
        state.grid.set(5, 5, TileKind::Brick);
        let mut audio = CueLog::default();

        let outcome = fire(&mut state, Shooter::Player, 0.0, &mut audio);
        assert_eq!(outcome, FireOutcome::BrickDestroyed);
        assert!(state.bullets.is_empty());
        assert_eq!(state.grid.get(5, 5), Some(TileKind::Empty));
        assert_eq!(state.particles.len(), 10);
        assert_eq!(audio.cues, vec![SoundEffect::Hit]);

        // The consumed shot still started the cooldown
        assert_eq!(
            fire(&mut state, Shooter::Player, 200.0, &mut audio),
            FireOutcome::CoolingDown
        );
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_point_blank_steel_absorbs() {
        let mut state = open_state();
        state.grid.set(5, 5, TileKind::Steel);
        let mut audio = CueLog::default();
        assert_eq!(fire(&mut state, Shooter::Player, 0.0, &mut audio), FireOutcome::Absorbed);
        assert!(state.bullets.is_empty());
        assert_eq!(state.grid.get(5, 5), Some(TileKind::Steel));
        assert!(audio.cues.is_empty());
        assert_eq!(state.player.last_shot_ms, Some(0.0));
    }

    #[test]
    fn test_enemy_shot_into_base_loses_match() {
        let mut state = open_state();
        state.grid.set(5, 5, TileKind::Base);
        state
            .enemies
            .push(Tank::new(Vec2::new(100.0, 100.0), Heading::Right, 1.5));
        let mut audio = CueLog::default();

        let outcome = fire(&mut state, Shooter::Enemy(0), 0.0, &mut audio);
        assert_eq!(outcome, FireOutcome::BaseDestroyed);
        assert!(!state.session.base_alive);
        assert_eq!(state.phase, MatchPhase::GameOver(GameOverCause::BaseDestroyed));
        assert_eq!(audio.count(SoundEffect::Explosion), 1);
    }

    #[test]
    fn test_enemy_shots_are_silent() {
        let mut state = open_state();
        state
            .enemies
            .push(Tank::new(Vec2::new(300.0, 300.0), Heading::Down, 1.5));
        let mut audio = CueLog::default();
        assert_eq!(fire(&mut state, Shooter::Enemy(0), 0.0, &mut audio), FireOutcome::Launched);
        assert_eq!(state.bullets[0].owner, Owner::Enemy);
        assert!(audio.cues.is_empty());
    }

    #[test]
    fn test_missing_enemy_is_noop() {
        let mut state = open_state();
        let mut audio = CueLog::default();
        assert_eq!(fire(&mut state, Shooter::Enemy(3), 0.0, &mut audio), FireOutcome::CoolingDown);
        assert!(state.bullets.is_empty());
    }
}
