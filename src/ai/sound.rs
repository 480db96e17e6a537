//! Sound propagation
//!
//! Noise spreads cell by cell from its origin through open floor and doors
//! that are open far enough, up to a hop limit derived from its radius. Any
//! idle or searching enemy standing in a reached cell goes to investigate.

use std::collections::VecDeque;

use glam::{IVec2, Vec2};
use rustc_hash::FxHashSet;

use crate::ai::Enemy;
use crate::ai::fsm::{AiContext, hear_sound};
use crate::world::{CELL_SIZE, CellKind, STORY_HEIGHT, World, world_to_cell};

/// Enemies further than this from the sound's floor height do not hear it
pub const SOUND_FLOOR_TOLERANCE: f32 = STORY_HEIGHT * 0.5;
/// Loudness of the player's weapon in world units
pub const GUNFIRE_RADIUS: f32 = 24.0;

const NEIGHBOR_OFFSETS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
];

fn carries_sound(world: &World, cell: IVec2) -> bool {
    match world.grid.kind(cell) {
        Some(CellKind::Empty) => true,
        Some(CellKind::Door) => world.doors.get(cell).is_some_and(|door| door.passes_sound()),
        Some(CellKind::Wall(_)) | None => false,
    }
}

/// Cells a noise at `origin` with `radius` reaches
#[must_use]
pub fn flood_fill(world: &World, origin: IVec2, radius: f32) -> FxHashSet<IVec2> {
    let mut reached = FxHashSet::default();
    if world.grid.kind(origin).is_none() {
        return reached;
    }
    let max_hops = (radius.max(0.0) / CELL_SIZE).ceil() as u32;

    let mut queue = VecDeque::new();
    reached.insert(origin);
    queue.push_back((origin, 0));

    while let Some((cell, hops)) = queue.pop_front() {
        if hops >= max_hops {
            continue;
        }
        for offset in NEIGHBOR_OFFSETS {
            let next = cell + offset;
            if !reached.contains(&next) && carries_sound(world, next) {
                reached.insert(next);
                queue.push_back((next, hops + 1));
            }
        }
    }

    reached
}

/// Alert every enemy within earshot of a noise.
///
/// Returns the number of enemies that went to investigate.
pub fn propagate_sound(
    enemies: &mut [Enemy],
    origin: Vec2,
    radius: f32,
    floor_height: f32,
    ctx: &mut AiContext,
) -> usize {
    let reached = flood_fill(ctx.world, world_to_cell(origin), radius);
    let multi_story = ctx.world.grid.is_multi_story();

    let mut alerted = 0;
    for (index, enemy) in enemies.iter_mut().enumerate() {
        if !reached.contains(&enemy.cell) {
            continue;
        }
        if multi_story && (enemy.floor_height - floor_height).abs() > SOUND_FLOOR_TOLERANCE {
            continue;
        }
        ctx.index = index;
        if hear_sound(enemy, origin, ctx) {
            alerted += 1;
        }
    }

    if alerted > 0 {
        log::debug!("noise at {origin} alerted {alerted} enemies");
    }
    ctx.stats.sound_alerts += alerted as u64;
    alerted
}

#[cfg(test)]
mod tests {
    use fastrand::Rng;

    use super::*;
    use crate::ai::{AiState, EnemyKind, PathCache};
    use crate::core::{Difficulty, EventQueue, SimStats};
    use crate::player::Player;
    use crate::world::{Door, DoorKind, DoorOrientation, StoryLayers, WorldGrid, cell_center};

    fn door_corridor() -> World {
        // Corridor along z = 5 split by a door at (5, 5)
        let mut world = World::new(WorldGrid::new());
        for x in 0..12 {
            world.grid.set_code(IVec2::new(x, 4), 1);
            world.grid.set_code(IVec2::new(x, 6), 1);
        }
        world.grid.set_code(IVec2::new(12, 5), 1);
        world.add_door(Door::new(IVec2::new(5, 5), DoorKind::Normal, DoorOrientation::AlongZ, 0.0));
        world
    }

    fn alert(world: &mut World, enemies: &mut [Enemy], origin: Vec2, floor: f32) -> usize {
        let mut player = Player::default();
        let mut paths = PathCache::new();
        let mut rng = Rng::with_seed(5);
        let mut events = EventQueue::new();
        let mut stats = SimStats::new();
        let mut ctx = AiContext {
            world,
            player: &mut player,
            paths: &mut paths,
            rng: &mut rng,
            events: &mut events,
            stats: &mut stats,
            delta_time: 0.05,
            drop_ammo: true,
            index: 0,
        };
        propagate_sound(enemies, origin, GUNFIRE_RADIUS, floor, &mut ctx)
    }

    #[test]
    fn test_flood_respects_hop_limit() {
        let world = World::new(WorldGrid::new());
        let reached = flood_fill(&world, IVec2::new(30, 30), 4.0);
        // Two hops: a diamond of 13 cells
        assert_eq!(reached.len(), 13);
        assert!(reached.contains(&IVec2::new(32, 30)));
        assert!(!reached.contains(&IVec2::new(33, 30)));
        assert!(!reached.contains(&IVec2::new(31, 32)));
    }

    #[test]
    fn test_wall_ring_contains_sound() {
        let mut world = World::new(WorldGrid::new());
        for i in 0..5 {
            world.grid.set_code(IVec2::new(10 + i, 10), 1);
            world.grid.set_code(IVec2::new(10 + i, 14), 1);
            world.grid.set_code(IVec2::new(10, 10 + i), 1);
            world.grid.set_code(IVec2::new(14, 10 + i), 1);
        }
        let reached = flood_fill(&world, IVec2::new(12, 12), 100.0);
        assert_eq!(reached.len(), 9);
        assert!(reached.iter().all(|c| (11..=13).contains(&c.x) && (11..=13).contains(&c.y)));
    }

    #[test]
    fn test_closed_door_blocks_then_open_door_carries() {
        let mut world = door_corridor();
        let origin = cell_center(IVec2::new(3, 5));
        let mut enemies = vec![Enemy::new(EnemyKind::Guard, IVec2::new(7, 5), 0.0, Difficulty::Medium.scale())];

        assert_eq!(alert(&mut world, &mut enemies, origin, 0.0), 0);
        assert_eq!(enemies[0].state, AiState::Stand);

        world.doors.get_mut(IVec2::new(5, 5)).unwrap().open_amount = 0.29;
        assert_eq!(alert(&mut world, &mut enemies, origin, 0.0), 0);

        world.doors.get_mut(IVec2::new(5, 5)).unwrap().open_amount = 0.3;
        assert_eq!(alert(&mut world, &mut enemies, origin, 0.0), 1);
        assert_eq!(enemies[0].state, AiState::Investigate);
        assert_eq!(enemies[0].investigate_target, Some(origin));
    }

    #[test]
    fn test_engaged_enemies_ignore_noise() {
        let mut world = World::new(WorldGrid::new());
        let origin = cell_center(IVec2::new(10, 10));
        let mut enemies: Vec<Enemy> = (0..3)
            .map(|i| Enemy::new(EnemyKind::Ss, IVec2::new(11 + i, 10), 0.0, Difficulty::Medium.scale()))
            .collect();
        enemies[0].state = AiState::Chase;
        enemies[1].state = AiState::Dead;

        assert_eq!(alert(&mut world, &mut enemies, origin, 0.0), 1);
        assert_eq!(enemies[0].state, AiState::Chase);
        assert_eq!(enemies[1].state, AiState::Dead);
        assert_eq!(enemies[2].state, AiState::Investigate);
    }

    #[test]
    fn test_other_floor_does_not_hear() {
        let mut world = World::new(WorldGrid::new().with_stories(StoryLayers::flat()));
        let origin = cell_center(IVec2::new(10, 10));
        let mut enemies = vec![
            Enemy::new(EnemyKind::Guard, IVec2::new(12, 10), 0.0, Difficulty::Medium.scale()),
            Enemy::new(EnemyKind::Guard, IVec2::new(13, 10), 0.0, Difficulty::Medium.scale()),
        ];
        enemies[1].floor_height = 2.0;

        assert_eq!(alert(&mut world, &mut enemies, origin, 0.0), 1);
        assert_eq!(enemies[1].state, AiState::Stand);
    }
}
