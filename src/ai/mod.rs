//! AI and navigation module
//!
//! Enemy agents, their state machine, grid pathfinding, locomotion, sound
//! propagation and combat resolution.

mod combat;
mod enemy;
mod fsm;
mod movement;
mod pathfinding;
mod sound;

pub use combat::{
    MELEE_RANGE, cell_distance, enemy_attempt_hit_player, hit_chance, is_facing, melee_damage,
    melee_hits, player_shot_damage, ranged_damage,
};
pub use enemy::{
    AiState, AttackPhase, BehaviorFlags, CombatStats, Enemy, EnemyKind, EnemyStats,
    HIT_FLASH_TICKS, MUZZLE_FLASH_TICKS,
};
pub use fsm::{
    AiContext, PATROL_TIME_MAX, PATROL_TIME_MIN, STAND_TIME_MAX, STAND_TIME_MIN, Transition,
    change_state, damage_enemy, hear_sound, start_state, update_enemy,
};
pub use movement::{MoveOutcome, move_enemy_toward};
pub use pathfinding::{
    CLOSED_DOOR_COST, MAX_EXPANSIONS, PATH_CACHE_TICKS, PathCache, PathResult, STEP_COST, find_path,
};
pub use sound::{GUNFIRE_RADIUS, SOUND_FLOOR_TOLERANCE, flood_fill, propagate_sound};
