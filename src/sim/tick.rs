//! Simulation step
//!
//! Core game loop that advances the match by one step.

use rand::Rng;

use super::collision::{bullet_hits_tank, can_move_to, try_advance};
use super::grid::{self, Grid, TileKind, cell_at};
use super::spawn::spawn_enemies;
use super::state::{
    GameEvent, GameOverCause, Heading, Owner, SimulationState, Tank, player_spawn,
};
use super::weapon::{Shooter, debris, fire};
use crate::audio::AudioCues;
use crate::consts::*;

/// Input commands for a single step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Movement direction, already resolved to one cardinal heading
    pub direction: Option<Heading>,
    /// Fire held
    pub fire: bool,
}

/// Advance the match by one step at host time `now_ms`
pub fn tick(state: &mut SimulationState, input: &TickInput, now_ms: f64, audio: &mut dyn AudioCues) {
    if state.is_over() {
        return;
    }
    state.steps += 1;

    // Player movement: heading always follows input, position only if free
    if let Some(heading) = input.direction {
        state.player.heading = heading;
        try_advance(&state.grid, &mut state.player);
    }

    if input.fire {
        fire(state, Shooter::Player, now_ms, audio);
        if state.is_over() {
            return;
        }
    }

    update_enemies(state, now_ms, audio);
    if state.is_over() {
        return;
    }

    update_bullets(state, audio);
    if state.is_over() {
        return;
    }

    update_particles(state);
}

/// Random-walk AI: occasional new heading, turn right when blocked, occasional shot
fn update_enemies(state: &mut SimulationState, now_ms: f64, audio: &mut dyn AudioCues) {
    let ai = state.ai;
    for i in 0..state.enemies.len() {
        if state.rng.random::<f32>() < ai.turn_chance {
            state.enemies[i].heading = Heading::random(&mut state.rng);
        }

        advance_or_turn(&state.grid, &mut state.enemies[i]);

        if state.rng.random::<f32>() < ai.fire_chance {
            fire(state, Shooter::Enemy(i), now_ms, audio);
            if state.is_over() {
                return;
            }
        }
    }
}

/// Move bullets, resolve terrain and tank hits, cull expired ones
fn update_bullets(state: &mut SimulationState, audio: &mut dyn AudioCues) {
    let mut i = state.bullets.len();
    while i > 0 {
        i -= 1;
        let mut bullet = state.bullets[i];
        bullet.advance();
        state.bullets[i] = bullet;

        let (col, row) = cell_at(bullet.pos);
        match state.grid.get(col, row) {
            Some(TileKind::Brick) => {
                state.grid.set(col, row, TileKind::Empty);
                state.burst(bullet.pos, debris::BRICK, 8, 1.0);
                state.events.push(GameEvent::BrickDestroyed { col, row });
                audio.play_hit();
                state.bullets.remove(i);
                continue;
            }
            Some(TileKind::Steel) => {
                state.burst(bullet.pos, debris::STEEL, 4, 1.0);
                audio.play_hit();
                state.bullets.remove(i);
                continue;
            }
            Some(TileKind::Base) => {
                state.burst(bullet.pos, debris::BASE, 40, 2.5);
                audio.play_explosion();
                state.session.base_alive = false;
                state.events.push(GameEvent::BaseDestroyed);
                state.bullets.remove(i);
                state.end_match(GameOverCause::BaseDestroyed);
                return;
            }
            _ => {}
        }

        match bullet.owner {
            Owner::Player => {
                let target = state
                    .enemies
                    .iter()
                    .position(|enemy| bullet_hits_tank(bullet.pos, enemy.pos));
                if let Some(idx) = target {
                    let wreck = state.enemies.remove(idx).pos;
                    state.bullets.remove(i);
                    state.burst(wreck, debris::ENEMY, 15, 1.5);
                    audio.play_explosion();
                    state.session.score += SCORE_PER_KILL;
                    state.events.push(GameEvent::EnemyDestroyed {
                        score: state.session.score,
                    });
                    if state.enemies.is_empty() {
                        advance_level(state);
                        // Bullets were cleared with the old level
                        return;
                    }
                    continue;
                }
            }
            Owner::Enemy => {
                if bullet_hits_tank(bullet.pos, state.player.pos) {
                    state.bullets.remove(i);
                    let wreck = state.player.pos;
                    state.burst(wreck, debris::PLAYER, 25, 1.8);
                    audio.play_explosion();
                    player_hit(state);
                    if state.is_over() {
                        return;
                    }
                    continue;
                }
            }
        }

        if bullet.expired() {
            state.bullets.remove(i);
        }
    }
}

/// Step forward, or rotate 90° clockwise in place when blocked
pub fn advance_or_turn(grid: &Grid, tank: &mut Tank) {
    if !try_advance(grid, tank) {
        tank.heading = tank.heading.turned_clockwise();
    }
}

fn update_particles(state: &mut SimulationState) {
    for particle in state.particles.iter_mut() {
        particle.pos += particle.vel;
        particle.life -= PARTICLE_DECAY;
    }
    state.particles.retain(|p| p.life > 0.0);
}

/// Take one life from the player, ending the match when none remain
pub fn player_hit(state: &mut SimulationState) {
    state.session.lives = state.session.lives.saturating_sub(1);
    state.events.push(GameEvent::PlayerHit {
        lives_left: state.session.lives,
    });
    if state.session.lives == 0 {
        state.end_match(GameOverCause::LivesExhausted);
        return;
    }
    respawn_player(state);
}

fn respawn_player(state: &mut SimulationState) {
    state.player.pos = player_spawn();
    state.player.heading = Heading::Up;
}

/// Wave cleared: next level with a fresh grid and enemy wave
pub fn advance_level(state: &mut SimulationState) {
    state.session.level = state.session.level.saturating_add(1);
    let level = state.session.level;
    state.grid = grid::generate(level, &mut state.rng);
    state.enemies = spawn_enemies(level);
    state.bullets.clear();
    respawn_player(state);
    debug_assert!(can_move_to(&state.grid, state.player.pos));
    log::info!("Level {} reached (score {})", level, state.session.score);
    state.events.push(GameEvent::LevelCleared { new_level: level });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CueLog, Silent, SoundEffect};
    use crate::sim::state::{AiTuning, Bullet, MAX_PARTICLES, MatchOutcome, MatchPhase};
    use glam::Vec2;

    /// Open arena, passive AI, no enemies unless added
    fn open_state() -> SimulationState {
        let mut state = SimulationState::new(11);
        state.grid = Grid::empty();
        state.enemies.clear();
        state.ai = AiTuning::passive();
        state
    }

    /// A motionless enemy centered in a cell
    fn parked_enemy(state: &mut SimulationState, col: i32, row: i32) -> Vec2 {
        let pos = Vec2::new(col as f32 * 20.0 + 10.0, row as f32 * 20.0 + 10.0);
        state.enemies.push(Tank::new(pos, Heading::Down, 0.0));
        pos
    }

    #[test]
    fn test_player_moves_and_turns() {
        let mut state = open_state();
        let start = state.player.pos;
        let input = TickInput {
            direction: Some(Heading::Left),
            fire: false,
        };
        tick(&mut state, &input, 0.0, &mut Silent);
        assert_eq!(state.player.heading, Heading::Left);
        assert!((state.player.pos.x - (start.x - TANK_SPEED)).abs() < 1e-4);
        assert_eq!(state.player.pos.y, start.y);
    }

    #[test]
    fn test_blocked_player_still_rotates() {
        let mut state = open_state();
        state.player.pos = Vec2::new(110.0, 110.0);
        state.grid.set(6, 5, TileKind::Steel);
        let input = TickInput {
            direction: Some(Heading::Right),
            fire: false,
        };
        tick(&mut state, &input, 0.0, &mut Silent);
        assert_eq!(state.player.heading, Heading::Right);
        assert_eq!(state.player.pos, Vec2::new(110.0, 110.0));
    }

    #[test]
    fn test_blocked_enemy_turns_clockwise() {
        let grid = Grid::empty();
        // Against the bottom edge facing down
        let mut tank = Tank::new(Vec2::new(250.0, 510.0), Heading::Down, 2.0);
        advance_or_turn(&grid, &mut tank);
        assert_eq!(tank.pos, Vec2::new(250.0, 510.0));
        assert_eq!(tank.heading, Heading::Left);

        advance_or_turn(&grid, &mut tank);
        assert_eq!(tank.pos, Vec2::new(248.0, 510.0));
        assert_eq!(tank.heading, Heading::Left);
    }

    #[test]
    fn test_passive_enemies_walk_straight() {
        let mut state = open_state();
        state.enemies.push(Tank::new(Vec2::new(250.0, 100.0), Heading::Down, 2.0));
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        }
        assert!((state.enemies[0].pos.y - 120.0).abs() < 1e-3);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_player_bullet_kills_enemy_and_scores() {
        let mut state = open_state();
        let target = parked_enemy(&mut state, 10, 10);
        parked_enemy(&mut state, 20, 5);
        state.bullets.push(Bullet::new(target - Vec2::new(0.0, 30.0), Heading::Down, Owner::Player));
        let mut audio = CueLog::default();

        for _ in 0..4 {
            tick(&mut state, &TickInput::default(), 0.0, &mut audio);
        }

        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.session.score, 100);
        assert!(audio.count(SoundEffect::Explosion) >= 1);
        assert!(state
            .drain_events()
            .contains(&GameEvent::EnemyDestroyed { score: 100 }));
    }

    #[test]
    fn test_enemy_bullet_never_hits_enemy() {
        let mut state = open_state();
        let target = parked_enemy(&mut state, 10, 10);
        state.bullets.push(Bullet::new(target - Vec2::new(0.0, 30.0), Heading::Down, Owner::Enemy));

        for _ in 0..4 {
            tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        }
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.session.score, 0);
    }

    #[test]
    fn test_player_bullet_never_hits_player() {
        let mut state = open_state();
        parked_enemy(&mut state, 2, 5);
        let player = state.player.pos;
        state.bullets.push(Bullet::new(player - Vec2::new(0.0, 30.0), Heading::Down, Owner::Player));

        for _ in 0..4 {
            tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        }
        assert_eq!(state.session.lives, START_LIVES);
    }

    #[test]
    fn test_last_kill_advances_level() {
        let mut state = open_state();
        let target = parked_enemy(&mut state, 10, 10);
        state.player.pos = Vec2::new(300.0, 300.0);
        state.bullets.push(Bullet::new(target - Vec2::new(0.0, 30.0), Heading::Down, Owner::Player));
        state.bullets.push(Bullet::new(Vec2::new(60.0, 60.0), Heading::Right, Owner::Enemy));

        for _ in 0..4 {
            tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        }

        assert_eq!(state.session.level, 2);
        assert_eq!(state.session.score, 100);
        assert_eq!(state.enemies.len(), 5);
        assert!(state.bullets.is_empty());
        assert_eq!(state.player.pos, player_spawn());
        assert_eq!(state.grid.count(TileKind::Base), 4);
        assert!(state
            .drain_events()
            .contains(&GameEvent::LevelCleared { new_level: 2 }));
    }

    #[test]
    fn test_enemy_bullet_costs_life_and_respawns() {
        let mut state = open_state();
        parked_enemy(&mut state, 2, 5);
        state.player.pos = Vec2::new(300.0, 300.0);
        state.bullets.push(Bullet::new(Vec2::new(300.0, 270.0), Heading::Down, Owner::Enemy));

        for _ in 0..3 {
            tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        }
        assert_eq!(state.session.lives, START_LIVES - 1);
        assert_eq!(state.player.pos, player_spawn());
        assert_eq!(state.phase, MatchPhase::Running);
    }

    #[test]
    fn test_last_life_ends_match_once() {
        let mut state = open_state();
        parked_enemy(&mut state, 2, 5);
        state.session.lives = 1;
        state.session.score = 700;
        state.player.pos = Vec2::new(300.0, 300.0);
        state.bullets.push(Bullet::new(Vec2::new(300.0, 270.0), Heading::Down, Owner::Enemy));

        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        }
        assert_eq!(state.session.lives, 0);
        assert_eq!(state.phase, MatchPhase::GameOver(GameOverCause::LivesExhausted));
        let overs: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver(_)))
            .collect();
        assert_eq!(
            overs,
            vec![GameEvent::GameOver(MatchOutcome {
                player_won: false,
                final_score: 700,
                levels_cleared: 0,
            })]
        );
    }

    #[test]
    fn test_bullet_into_base_ends_match() {
        let mut state = open_state();
        parked_enemy(&mut state, 2, 5);
        state.grid.set(12, 24, TileKind::Base);
        // Player bullet, which still counts: the Base rule ignores ownership
        state.bullets.push(Bullet::new(Vec2::new(250.0, 460.0), Heading::Down, Owner::Player));

        for _ in 0..5 {
            tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        }
        assert!(!state.session.base_alive);
        assert_eq!(state.phase, MatchPhase::GameOver(GameOverCause::BaseDestroyed));
    }

    #[test]
    fn test_bullet_destroys_brick() {
        let mut state = open_state();
        parked_enemy(&mut state, 2, 5);
        state.grid.set(15, 10, TileKind::Brick);
        state.bullets.push(Bullet::new(Vec2::new(310.0, 180.0), Heading::Down, Owner::Player));
        let mut audio = CueLog::default();

        for _ in 0..5 {
            tick(&mut state, &TickInput::default(), 0.0, &mut audio);
        }
        assert_eq!(state.grid.get(15, 10), Some(TileKind::Empty));
        assert!(state.bullets.is_empty());
        assert_eq!(audio.count(SoundEffect::Hit), 1);
    }

    #[test]
    fn test_bullet_leaves_arena() {
        let mut state = open_state();
        parked_enemy(&mut state, 2, 5);
        state.bullets.push(Bullet::new(Vec2::new(515.0, 300.0), Heading::Right, Owner::Player));
        tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_particles_decay_and_cull() {
        let mut state = open_state();
        parked_enemy(&mut state, 2, 5);
        state.burst(Vec2::new(200.0, 200.0), [1.0; 4], 5, 1.0);
        tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        assert!(state.particles.iter().all(|p| (p.life - (1.0 - PARTICLE_DECAY)).abs() < 1e-5));
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), 0.0, &mut Silent);
        }
        assert!(state.particles.is_empty());
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut state = open_state();
        parked_enemy(&mut state, 2, 5);
        state.end_match(GameOverCause::BaseDestroyed);
        state.bullets.push(Bullet::new(Vec2::new(200.0, 200.0), Heading::Down, Owner::Player));
        let steps = state.steps;
        let input = TickInput {
            direction: Some(Heading::Left),
            fire: true,
        };
        tick(&mut state, &input, 5000.0, &mut Silent);
        assert_eq!(state.steps, steps);
        assert_eq!(state.bullets[0].pos, Vec2::new(200.0, 200.0));
        assert_eq!(state.player.pos, player_spawn());
    }

    #[test]
    fn test_particle_cap_does_not_change_gameplay() {
        let run = |max_particles: usize| {
            let mut state = SimulationState::new(2024);
            state.max_particles = max_particles;
            let target = state.enemies[0].pos;
            state.bullets.push(Bullet::new(target + Vec2::new(0.0, 5.0), Heading::Down, Owner::Player));
            state.burst(Vec2::new(260.0, 260.0), [1.0; 4], 30, 1.0);
            for step in 0..200 {
                tick(&mut state, &TickInput::default(), step as f64 * 16.0, &mut Silent);
            }
            state
        };

        let full = run(MAX_PARTICLES);
        let none = run(0);
        assert_eq!(full.session.score, 100);
        assert!(none.particles.is_empty());
        assert_eq!(full.session, none.session);
        assert_eq!(full.grid, none.grid);
        let positions = |s: &SimulationState| s.enemies.iter().map(|e| (e.pos, e.heading)).collect::<Vec<_>>();
        assert_eq!(positions(&full), positions(&none));
        assert_eq!(full.bullets.len(), none.bullets.len());
    }

    #[test]
    fn test_level_counter_saturates() {
        let mut state = open_state();
        state.session.level = u32::MAX;
        advance_level(&mut state);
        assert_eq!(state.session.level, u32::MAX);
        assert_eq!(state.enemies.len(), MAX_ENEMIES as usize);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = SimulationState::new(99999);
        let mut state2 = SimulationState::new(99999);

        let inputs = [
            TickInput {
                direction: Some(Heading::Up),
                fire: true,
            },
            TickInput {
                direction: Some(Heading::Left),
                fire: false,
            },
            TickInput::default(),
        ];

        for step in 0..300 {
            let input = &inputs[step % inputs.len()];
            let now = step as f64 * 16.0;
            tick(&mut state1, input, now, &mut Silent);
            tick(&mut state2, input, now, &mut Silent);
        }

        assert_eq!(state1.steps, state2.steps);
        assert_eq!(state1.grid, state2.grid);
        assert_eq!(state1.session, state2.session);
        assert_eq!(state1.enemies.len(), state2.enemies.len());
        assert_eq!(state1.player.pos, state2.player.pos);
    }
}
