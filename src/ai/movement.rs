//! Grid-constrained enemy locomotion
//!
//! Enemies move in small steps validated against the collision oracle. When
//! the direct step is blocked, [`move_enemy_toward`] falls back in order to:
//! opening the blocking door, sliding along one axis, the pathfinder's next
//! cell, and finally a random sidestep so an agent never freezes in place.

use glam::{IVec2, Vec2};

use crate::ai::Enemy;
use crate::ai::fsm::AiContext;
use crate::world::{CellKind, DoorOpenOutcome, World, cell_center, world_to_cell};

/// Distance below which a target counts as reached
const ARRIVE_EPSILON: f32 = 1e-3;

/// Result of a movement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Took a step
    Moved,
    /// Triggered a door and should wait for it
    OpenedDoor(IVec2),
    /// Already at the target
    Arrived,
    /// Nothing worked this tick
    Stuck,
}

/// Move by `step` if the body fits at the destination
pub(crate) fn try_step(enemy: &mut Enemy, step: Vec2, world: &World) -> bool {
    if step.length_squared() <= f32::EPSILON * f32::EPSILON {
        return false;
    }
    let next = enemy.position + step;
    if !world.can_occupy(next, enemy.floor_height) {
        return false;
    }
    enemy.set_position(next);
    enemy.floor_height = world.grid.surface_height(enemy.cell, enemy.floor_height);
    enemy.angle = step.y.atan2(step.x);
    true
}

/// Open the door in `cell` if there is a closed one and the enemy may use it
pub(crate) fn try_door(enemy: &mut Enemy, cell: IVec2, ctx: &mut AiContext) -> Option<MoveOutcome> {
    if ctx.world.grid.kind(cell) != Some(CellKind::Door) {
        return None;
    }
    if ctx.world.doors.get(cell).is_some_and(|door| door.is_passable()) {
        return None;
    }

    match ctx
        .world
        .doors
        .enemy_try_open(cell, enemy.flags().opens_doors, ctx.events)
    {
        DoorOpenOutcome::Opening | DoorOpenOutcome::AlreadyOpen => {
            enemy.door_wait_cell = Some(cell);
            Some(MoveOutcome::OpenedDoor(cell))
        }
        DoorOpenOutcome::Refused | DoorOpenOutcome::Locked(_) | DoorOpenOutcome::NoDoor => None,
    }
}

/// Step toward `target` at `speed`, falling back through the navigation chain
pub fn move_enemy_toward(enemy: &mut Enemy, target: Vec2, speed: f32, ctx: &mut AiContext) -> MoveOutcome {
    let to_target = target - enemy.position;
    let distance = to_target.length();
    if distance <= ARRIVE_EPSILON {
        return MoveOutcome::Arrived;
    }
    let step_len = (speed * ctx.delta_time).min(distance);
    if step_len <= 0.0 {
        return MoveOutcome::Stuck;
    }
    let step = to_target / distance * step_len;

    // Direct
    if try_step(enemy, step, ctx.world) {
        return MoveOutcome::Moved;
    }

    // Door in the way
    if let Some(cell) = ctx.world.blocked_door_cell(enemy.position + step, enemy.floor_height) {
        if let Some(outcome) = try_door(enemy, cell, ctx) {
            return outcome;
        }
    }

    // Slide along one axis
    if try_step(enemy, Vec2::new(step.x, 0.0), ctx.world) || try_step(enemy, Vec2::new(0.0, step.y), ctx.world) {
        return MoveOutcome::Moved;
    }

    // Pathfinder
    let goal = world_to_cell(target);
    let next_cell = ctx
        .paths
        .find(ctx.world, enemy.cell, goal)
        .and_then(|path| path.next_cell());
    if let Some(next) = next_cell {
        if let Some(outcome) = try_door(enemy, next, ctx) {
            return outcome;
        }
        let to_waypoint = cell_center(next) - enemy.position;
        let waypoint_step = to_waypoint.normalize_or_zero() * step_len.min(to_waypoint.length());
        if try_step(enemy, waypoint_step, ctx.world)
            || try_step(enemy, Vec2::new(waypoint_step.x, 0.0), ctx.world)
            || try_step(enemy, Vec2::new(0.0, waypoint_step.y), ctx.world)
        {
            return MoveOutcome::Moved;
        }
    } else {
        log::trace!("no path {} -> {goal}, sidestepping", enemy.cell);
    }

    // Random sidestep
    let side = if ctx.rng.bool() { step.perp() } else { -step.perp() };
    if try_step(enemy, side, ctx.world) || try_step(enemy, -side, ctx.world) {
        return MoveOutcome::Moved;
    }
    MoveOutcome::Stuck
}
