//! Hit and damage resolution
//!
//! The formulas are pure functions of explicit random rolls so they can be
//! checked exactly; [`enemy_attempt_hit_player`] draws the rolls.

use std::f32::consts::FRAC_PI_3;

use fastrand::Rng;
use glam::{IVec2, Vec2};

use crate::ai::Enemy;
use crate::player::Player;
use crate::world::World;

/// Reach of a melee attack in world units
pub const MELEE_RANGE: f32 = 1.5;
/// Rolls below this bite
const MELEE_HIT_ROLL: u8 = 180;
/// Half-angle within which a target counts as facing the shooter
const FACING_HALF_ANGLE: f32 = FRAC_PI_3;

/// Chebyshev distance between two cells
#[must_use]
pub fn cell_distance(a: IVec2, b: IVec2) -> i32 {
    (a - b).abs().max_element()
}

/// Whether a viewer at `position` facing `angle` looks at `target` within `half_angle`
#[must_use]
pub fn is_facing(position: Vec2, angle: f32, target: Vec2, half_angle: f32) -> bool {
    let to_target = target - position;
    if to_target.length_squared() <= f32::EPSILON {
        return true;
    }
    Vec2::from_angle(angle).angle_to(to_target).abs() <= half_angle
}

/// Hit threshold out of 256 for a ranged shot
#[must_use]
pub fn hit_chance(distance: i32, running: bool, target_faces_shooter: bool, accuracy: f32) -> i32 {
    let base = if running { 160 } else { 256 };
    let falloff = if target_faces_shooter { 16 } else { 8 };
    let chance = base - distance * falloff;
    (chance as f32 * accuracy).floor() as i32
}

fn distance_shift(distance: i32) -> u32 {
    if distance < 2 {
        2
    } else if distance < 4 {
        3
    } else {
        4
    }
}

/// Damage of a ranged hit
#[must_use]
pub fn ranged_damage(distance: i32, roll: u8, damage_min: i32, damage_max: i32) -> i32 {
    let shifted = i32::from(roll >> distance_shift(distance));
    let damage = shifted * (damage_min + damage_max) / 32;
    damage.clamp(1, (3 * damage_max).max(1))
}

/// Whether a bite lands
#[must_use]
pub const fn melee_hits(roll: u8) -> bool {
    roll < MELEE_HIT_ROLL
}

/// Damage of a bite
#[must_use]
pub fn melee_damage(roll: u8, damage_min: i32, damage_max: i32) -> i32 {
    i32::from(roll >> 4).clamp(damage_min, damage_max.max(damage_min))
}

/// Damage of the player's weapon against an enemy
#[must_use]
pub fn player_shot_damage(distance: i32, roll: u8) -> i32 {
    i32::from(roll >> distance_shift(distance)).max(1)
}

/// Roll an enemy's attack against the player.
///
/// Returns the damage dealt, or `None` on a miss or when the player is out of
/// reach or out of sight.
pub fn enemy_attempt_hit_player(enemy: &Enemy, world: &World, player: &Player, rng: &mut Rng) -> Option<i32> {
    if !world.has_line_of_sight_at(enemy.position, enemy.floor_height, player.position, player.floor_height) {
        return None;
    }

    if enemy.flags().melee {
        if enemy.position.distance(player.position) > MELEE_RANGE {
            return None;
        }
        if !melee_hits(rng.u8(..)) {
            return None;
        }
        return Some(melee_damage(rng.u8(..), enemy.combat.damage_min, enemy.combat.damage_max));
    }

    let distance = cell_distance(enemy.cell, crate::world::world_to_cell(player.position));
    let faces = is_facing(player.position, player.angle, enemy.position, FACING_HALF_ANGLE);
    let chance = hit_chance(distance, player.running, faces, enemy.combat.accuracy);
    if i32::from(rng.u8(..)) >= chance {
        return None;
    }
    Some(ranged_damage(distance, rng.u8(..), enemy.combat.damage_min, enemy.combat.damage_max))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::ai::EnemyKind;
    use crate::core::Difficulty;
    use crate::world::{WorldGrid, cell_center};

    #[test]
    fn test_cell_distance_is_chebyshev() {
        assert_eq!(cell_distance(IVec2::new(0, 0), IVec2::new(3, 1)), 3);
        assert_eq!(cell_distance(IVec2::new(5, 5), IVec2::new(2, 9)), 4);
        assert_eq!(cell_distance(IVec2::new(5, 5), IVec2::new(5, 5)), 0);
    }

    #[rstest]
    #[case(0, false, false, 1.0, 256)]
    #[case(3, false, false, 1.0, 232)]
    #[case(3, false, true, 1.0, 208)]
    #[case(3, true, true, 1.0, 112)]
    #[case(3, false, false, 0.75, 174)]
    #[case(20, true, true, 1.0, -160)]
    fn test_hit_chance(
        #[case] distance: i32,
        #[case] running: bool,
        #[case] facing: bool,
        #[case] accuracy: f32,
        #[case] expected: i32,
    ) {
        assert_eq!(hit_chance(distance, running, facing, accuracy), expected);
    }

    #[rstest]
    #[case(1, 255, 3, 10, 25)] // 63 * 13 / 32
    #[case(3, 255, 3, 10, 12)] // 31 * 13 / 32
    #[case(8, 255, 3, 10, 6)] // 15 * 13 / 32
    #[case(8, 0, 3, 10, 1)] // clamped up to 1
    #[case(0, 255, 8, 20, 55)] // 63 * 28 / 32
    fn test_ranged_damage(
        #[case] distance: i32,
        #[case] roll: u8,
        #[case] min: i32,
        #[case] max: i32,
        #[case] expected: i32,
    ) {
        assert_eq!(ranged_damage(distance, roll, min, max), expected);
    }

    #[test]
    fn test_ranged_damage_upper_clamp() {
        // 63 * 60 / 32 = 118, clamped to 3 * 20
        assert_eq!(ranged_damage(0, 255, 40, 20), 60);
    }

    #[test]
    fn test_melee() {
        assert!(melee_hits(179));
        assert!(!melee_hits(180));
        assert_eq!(melee_damage(0, 3, 8), 3);
        assert_eq!(melee_damage(96, 3, 8), 6);
        assert_eq!(melee_damage(255, 3, 8), 8);
    }

    #[test]
    fn test_player_shot_damage() {
        assert_eq!(player_shot_damage(1, 200), 50);
        assert_eq!(player_shot_damage(5, 200), 12);
        assert_eq!(player_shot_damage(5, 3), 1);
    }

    #[test]
    fn test_facing() {
        let origin = Vec2::ZERO;
        assert!(is_facing(origin, 0.0, Vec2::new(5.0, 1.0), FACING_HALF_ANGLE));
        assert!(!is_facing(origin, 0.0, Vec2::new(-5.0, 0.0), FACING_HALF_ANGLE));
        assert!(!is_facing(origin, 0.0, Vec2::new(1.0, 5.0), FACING_HALF_ANGLE));
    }

    #[test]
    fn test_attack_needs_sight() {
        let mut world = World::new(WorldGrid::new());
        world.grid.set_code(IVec2::new(5, 3), 1);
        let enemy = Enemy::new(EnemyKind::Guard, IVec2::new(3, 3), 0.0, Difficulty::Medium.scale());
        let player = Player::new(cell_center(IVec2::new(7, 3)), 0.0);
        let mut rng = Rng::with_seed(1);

        for _ in 0..50 {
            assert!(enemy_attempt_hit_player(&enemy, &world, &player, &mut rng).is_none());
        }
    }

    #[test]
    fn test_melee_needs_range() {
        let world = World::new(WorldGrid::new());
        let dog = Enemy::new(EnemyKind::Dog, IVec2::new(3, 3), 0.0, Difficulty::Medium.scale());
        let far = Player::new(cell_center(IVec2::new(5, 3)), 0.0);
        let mut rng = Rng::with_seed(9);
        for _ in 0..50 {
            assert!(enemy_attempt_hit_player(&dog, &world, &far, &mut rng).is_none());
        }

        let near = Player::new(dog.position + Vec2::new(1.0, 0.0), 0.0);
        let hits = (0..200)
            .filter_map(|_| enemy_attempt_hit_player(&dog, &world, &near, &mut rng))
            .inspect(|&damage| assert!((3..=8).contains(&damage)))
            .count();
        assert!(hits > 0);
    }
}
