//! Enemy wave spawning

use glam::Vec2;

use super::state::{Heading, Tank};
use crate::consts::{ENEMY_SPAWN_X, ENEMY_SPAWN_Y, MAX_ENEMIES, TANK_SPEED};

/// Number of enemies in a level's wave
pub fn enemy_count(level: u32) -> u32 {
    level.saturating_add(3).min(MAX_ENEMIES)
}

/// Enemy speed for a level
pub fn enemy_speed(level: u32) -> f32 {
    TANK_SPEED * (0.55 + level as f32 * 0.05)
}

/// Create the enemy wave for a level, lined up along the top edge facing down
pub fn spawn_enemies(level: u32) -> Vec<Tank> {
    let speed = enemy_speed(level);
    let enemies: Vec<Tank> = (0..enemy_count(level) as usize)
        .map(|i| {
            let pos = Vec2::new(ENEMY_SPAWN_X[i % ENEMY_SPAWN_X.len()], ENEMY_SPAWN_Y);
            Tank::new(pos, Heading::Down, speed)
        })
        .collect();
    log::debug!("Spawned {} enemies at speed {:.2}", enemies.len(), speed);
    enemies
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_levels() {
        assert_eq!(spawn_enemies(1).len(), 4);
        assert_eq!(spawn_enemies(5).len(), 8);
        assert_eq!(spawn_enemies(40).len(), 8);
        assert_eq!(enemy_count(u32::MAX), 8);
    }

    #[test]
    fn test_positions_cycle() {
        let enemies = spawn_enemies(3);
        let xs: Vec<f32> = enemies.iter().map(|e| e.pos.x).collect();
        assert_eq!(xs, vec![20.0, 260.0, 500.0, 20.0, 260.0, 500.0]);
        assert!(enemies.iter().all(|e| e.pos.y == ENEMY_SPAWN_Y));
        assert!(enemies.iter().all(|e| e.heading == Heading::Down));
    }

    proptest! {
        #[test]
        fn prop_count_and_speed_formula(level in 1u32..200) {
            let enemies = spawn_enemies(level);
            prop_assert_eq!(enemies.len() as u32, (3 + level).min(8));
            let expected = TANK_SPEED * (0.55 + 0.05 * level as f32);
            for e in &enemies {
                prop_assert!((e.speed - expected).abs() < 1e-4);
                prop_assert_eq!(e.health, 1);
            }
        }

        #[test]
        fn prop_count_monotonic(level in 1u32..100) {
            prop_assert!(enemy_count(level + 1) >= enemy_count(level));
            prop_assert!(enemy_speed(level + 1) > enemy_speed(level));
        }
    }
}
