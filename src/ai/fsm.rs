//! Finite State Machine for Enemy Behavior
//!
//! Every enemy runs the same state machine over [`AiState`]. Each state has an
//! `enter` hook (timers, cues) and an `update` step returning a [`Transition`];
//! the machine applies transitions by running the next state's `enter`.
//!
//! # Design Principles
//!
//! - **Plain data**: the state lives on the [`Enemy`] as an enum that the
//!   renderer can read directly
//! - **Sequential**: agents update one after another against the shared world,
//!   each completing its transition and movement before the next
//! - **Countdowns only**: all waiting is a timer checked once per tick
//!
//! # Example
//!
//! ```ignore
//! let (enemies, mut ctx) = sim.ai_context(dt);
//! for (index, enemy) in enemies.iter_mut().enumerate() {
//!     ctx.index = index;
//!     update_enemy(enemy, &mut ctx);
//! }
//! ```

use fastrand::Rng;
use glam::Vec2;

use crate::ai::combat::enemy_attempt_hit_player;
use crate::ai::movement::{MoveOutcome, move_enemy_toward, try_door, try_step};
use crate::ai::pathfinding::PathCache;
use crate::ai::{AiState, AttackPhase, Enemy, EnemyKind, HIT_FLASH_TICKS, MUZZLE_FLASH_TICKS};
use crate::core::{EventQueue, SimEvent, SimStats, SoundCue};
use crate::player::Player;
use crate::world::{Door, Pickup, PickupKind, World};

// ============================================================================
// Timings
// ============================================================================

/// Shortest idle before patrolling
pub const STAND_TIME_MIN: f32 = 3.0;
/// Longest idle before patrolling
pub const STAND_TIME_MAX: f32 = 7.0;
/// Shortest patrol leg
pub const PATROL_TIME_MIN: f32 = 2.0;
/// Longest patrol leg
pub const PATROL_TIME_MAX: f32 = 5.0;
/// Patrol speed relative to full speed
pub const PATROL_SPEED_FACTOR: f32 = 0.5;
/// Shortest alert pause
pub const ALERT_TIME_MIN: f32 = 0.3;
/// Longest alert pause
pub const ALERT_TIME_MAX: f32 = 0.7;
/// Seconds before an investigation is abandoned
pub const INVESTIGATE_TIMEOUT: f32 = 6.0;
/// Investigation speed relative to full speed
pub const INVESTIGATE_SPEED_FACTOR: f32 = 0.75;
/// Distance at which an investigated point counts as reached
pub const ARRIVAL_RADIUS: f32 = 0.6;
/// Seconds out of sight before a chase turns into an investigation
pub const LOST_SIGHT_TIMEOUT: f32 = 3.0;
/// Reaching the last sighting without seeing the player ends the chase
pub const BLIND_CLOSE_DISTANCE: f32 = 1.0;
/// Shortest dodge
pub const DODGE_TIME_MIN: f32 = 0.5;
/// Longest dodge
pub const DODGE_TIME_MAX: f32 = 1.0;
/// Dodge speed relative to full speed
pub const DODGE_SPEED_FACTOR: f32 = 0.6;
/// Probability per second of a dodge while chasing
pub const CHASE_DODGE_CHANCE: f32 = 0.5;
/// Probability of a dodge after an attack
pub const POST_ATTACK_DODGE_CHANCE: f32 = 0.35;
/// Seconds spent aiming
pub const AIM_TIME: f32 = 0.35;
/// Seconds the fire pose is held
pub const FIRE_TIME: f32 = 0.2;
/// Shortest flinch
pub const PAIN_TIME_MIN: f32 = 0.2;
/// Longest flinch
pub const PAIN_TIME_MAX: f32 = 0.4;
/// Longest wait for a door
pub const DOOR_WAIT_TIMEOUT: f32 = 2.0;
/// Seconds each death frame is held
pub const DEATH_FRAME_TIME: f32 = 0.12;
/// Shooters stop closing in at this fraction of their shoot distance
pub const HOLD_DISTANCE_FACTOR: f32 = 0.4;
/// Rushers close in to this distance
pub const RUSH_DISTANCE: f32 = 1.0;

// ============================================================================
// Context and Transition
// ============================================================================

/// Everything an agent may read or change while it updates.
///
/// Borrowed field by field from the simulation so the agent list itself can be
/// iterated mutably at the same time.
#[derive(Debug)]
pub struct AiContext<'a> {
    /// Shared world (doors are opened through it)
    pub world: &'a mut World,
    /// The player
    pub player: &'a mut Player,
    /// Shared path cache
    pub paths: &'a mut PathCache,
    /// Simulation random stream
    pub rng: &'a mut Rng,
    /// Outbound events
    pub events: &'a mut EventQueue,
    /// Counters
    pub stats: &'a mut SimStats,
    /// Clamped tick delta
    pub delta_time: f32,
    /// Killed enemies other than dogs leave a clip behind
    pub drop_ammo: bool,
    /// Index of the enemy being updated
    pub index: usize,
}

impl AiContext<'_> {
    /// Uniform random value in `[min, max)`
    pub fn roll_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.rng.f32() * (max - min)
    }

    /// Whether the enemy has an unobstructed view of the living player
    #[must_use]
    pub fn player_in_sight(&self, enemy: &Enemy) -> bool {
        self.player.is_alive()
            && self.world.has_line_of_sight_at(
                enemy.position,
                enemy.floor_height,
                self.player.position,
                self.player.floor_height,
            )
    }

    /// Whether a passive enemy notices the player
    #[must_use]
    pub fn notices_player(&self, enemy: &Enemy) -> bool {
        enemy.position.distance(self.player.position) <= enemy.stats().alert_distance
            && self.player_in_sight(enemy)
    }

    fn sound(&mut self, cue: SoundCue, position: Vec2) {
        self.events.push(SimEvent::PlaySound { cue, position });
    }
}

/// Outcome of a state's update step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Stay in the current state
    None,
    /// Switch to another state
    To(AiState),
}

// ============================================================================
// State Machine
// ============================================================================

/// Run one tick of an enemy's behaviour
pub fn update_enemy(enemy: &mut Enemy, ctx: &mut AiContext) {
    enemy.moved_this_tick = false;
    if enemy.state == AiState::Dead {
        return;
    }
    enemy.attack_cooldown = (enemy.attack_cooldown - ctx.delta_time).max(0.0);

    let transition = match enemy.state {
        AiState::Stand => update_stand(enemy, ctx),
        AiState::Patrol => update_patrol(enemy, ctx),
        AiState::Alert => update_alert(enemy, ctx),
        AiState::Investigate => update_investigate(enemy, ctx),
        AiState::Chase => update_chase(enemy, ctx),
        AiState::Dodge => update_dodge(enemy, ctx),
        AiState::Attack(AttackPhase::Aim) => update_aim(enemy, ctx),
        AiState::Attack(AttackPhase::Fire) => update_fire(enemy, ctx),
        AiState::Pain => update_pain(enemy, ctx),
        AiState::DoorWait => update_door_wait(enemy, ctx),
        AiState::Dying => update_dying(enemy, ctx),
        AiState::Dead => Transition::None,
    };

    if let Transition::To(next) = transition {
        change_state(enemy, next, ctx);
    }
}

/// Switch an enemy to `next` and run its entry hook
pub fn change_state(enemy: &mut Enemy, next: AiState, ctx: &mut AiContext) {
    log::debug!(
        "{} #{}: {} -> {}",
        enemy.kind.name(),
        ctx.index,
        enemy.state.name(),
        next.name()
    );
    enemy.state = next;
    enter(enemy, ctx);
}

/// Run the entry hook of the state an enemy was spawned in
pub fn start_state(enemy: &mut Enemy, ctx: &mut AiContext) {
    enter(enemy, ctx);
}

fn enter(enemy: &mut Enemy, ctx: &mut AiContext) {
    match enemy.state {
        AiState::Stand => {
            enemy.state_timer = ctx.roll_range(STAND_TIME_MIN, STAND_TIME_MAX);
        }
        AiState::Patrol => {
            enemy.state_timer = ctx.roll_range(PATROL_TIME_MIN, PATROL_TIME_MAX);
            if enemy.patrol_dir == Vec2::ZERO {
                enemy.patrol_dir = enemy.forward();
            }
        }
        AiState::Alert => {
            enemy.state_timer = ctx.roll_range(ALERT_TIME_MIN, ALERT_TIME_MAX);
            enemy.alerted = true;
            enemy.face(ctx.player.position);
            ctx.sound(SoundCue::Alert(enemy.kind), enemy.position);
        }
        AiState::Investigate => {
            enemy.state_timer = INVESTIGATE_TIMEOUT;
        }
        AiState::Chase => {
            enemy.lost_sight_timer = 0.0;
            enemy.alerted = true;
            enemy.door_wait_cell = None;
        }
        AiState::Dodge => {
            enemy.state_timer = ctx.roll_range(DODGE_TIME_MIN, DODGE_TIME_MAX);
            let side = (ctx.player.position - enemy.position).normalize_or_zero().perp();
            enemy.dodge_dir = if ctx.rng.bool() { side } else { -side };
        }
        AiState::Attack(AttackPhase::Aim) => {
            enemy.state_timer = AIM_TIME;
            enemy.did_fire = false;
            enemy.face(ctx.player.position);
        }
        AiState::Attack(AttackPhase::Fire) => {
            enemy.state_timer = FIRE_TIME;
        }
        AiState::Pain => {
            enemy.state_timer = ctx.roll_range(PAIN_TIME_MIN, PAIN_TIME_MAX);
            ctx.sound(SoundCue::Pain(enemy.kind), enemy.position);
        }
        AiState::DoorWait => {
            enemy.state_timer = DOOR_WAIT_TIMEOUT;
        }
        AiState::Dying => {
            enemy.death_frame = 0;
            enemy.state_timer = DEATH_FRAME_TIME;
        }
        AiState::Dead => {
            enemy.death_frame = enemy.stats().death_frames.saturating_sub(1);
        }
    }
}

/// Noticed the player: silent kinds skip the alert pause
fn spotted(enemy: &mut Enemy, ctx: &AiContext) -> Transition {
    if enemy.flags().silent {
        enemy.last_seen = Some(ctx.player.position);
        Transition::To(AiState::Chase)
    } else {
        Transition::To(AiState::Alert)
    }
}

fn after_move(outcome: MoveOutcome) -> Transition {
    match outcome {
        MoveOutcome::OpenedDoor(_) => Transition::To(AiState::DoorWait),
        MoveOutcome::Moved | MoveOutcome::Arrived | MoveOutcome::Stuck => Transition::None,
    }
}

// ============================================================================
// States
// ============================================================================

fn update_stand(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    if ctx.notices_player(enemy) {
        return spotted(enemy, ctx);
    }
    enemy.state_timer -= ctx.delta_time;
    if enemy.state_timer <= 0.0 {
        Transition::To(AiState::Patrol)
    } else {
        Transition::None
    }
}

fn update_patrol(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    if ctx.notices_player(enemy) {
        return spotted(enemy, ctx);
    }
    enemy.state_timer -= ctx.delta_time;
    if enemy.state_timer <= 0.0 {
        return Transition::To(AiState::Stand);
    }

    let step = enemy.patrol_dir * enemy.combat.speed * PATROL_SPEED_FACTOR * ctx.delta_time;
    if step == Vec2::ZERO || try_step(enemy, step, ctx.world) {
        return Transition::None;
    }

    if let Some(cell) = ctx.world.blocked_door_cell(enemy.position + step, enemy.floor_height) {
        if let Some(outcome) = try_door(enemy, cell, ctx) {
            return after_move(outcome);
        }
    }

    // Reflect off whatever is in the way
    let floor = enemy.floor_height;
    let blocked_x = !ctx.world.can_occupy(enemy.position + Vec2::new(step.x, 0.0), floor);
    let blocked_z = !ctx.world.can_occupy(enemy.position + Vec2::new(0.0, step.y), floor);
    let mut dir = enemy.patrol_dir;
    if blocked_x && step.x != 0.0 {
        dir.x = -dir.x;
    }
    if blocked_z && step.y != 0.0 {
        dir.y = -dir.y;
    }
    if dir == enemy.patrol_dir {
        dir = -dir;
    }
    enemy.patrol_dir = dir;
    enemy.angle = dir.y.atan2(dir.x);
    Transition::None
}

fn update_alert(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    enemy.face(ctx.player.position);
    enemy.state_timer -= ctx.delta_time;
    if enemy.state_timer <= 0.0 {
        enemy.last_seen = Some(ctx.player.position);
        Transition::To(AiState::Chase)
    } else {
        Transition::None
    }
}

fn update_investigate(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    if ctx.notices_player(enemy) {
        enemy.last_seen = Some(ctx.player.position);
        return Transition::To(AiState::Chase);
    }

    enemy.state_timer -= ctx.delta_time;
    let Some(target) = enemy.investigate_target else {
        return Transition::To(AiState::Stand);
    };
    if enemy.state_timer <= 0.0 || enemy.position.distance(target) <= ARRIVAL_RADIUS {
        enemy.investigate_target = None;
        return Transition::To(AiState::Stand);
    }

    let speed = enemy.combat.speed * INVESTIGATE_SPEED_FACTOR;
    after_move(move_enemy_toward(enemy, target, speed, ctx))
}

fn update_chase(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    let player_pos = ctx.player.position;
    let speed = enemy.combat.speed;

    if ctx.player_in_sight(enemy) {
        enemy.last_seen = Some(player_pos);
        enemy.lost_sight_timer = 0.0;

        let distance = enemy.position.distance(player_pos);
        let stats = enemy.stats();
        if distance <= stats.shoot_distance && enemy.attack_cooldown <= 0.0 {
            return Transition::To(AiState::Attack(AttackPhase::Aim));
        }
        if stats.flags.dodges && ctx.rng.f32() < CHASE_DODGE_CHANCE * ctx.delta_time {
            return Transition::To(AiState::Dodge);
        }

        let hold = if stats.flags.rushes {
            RUSH_DISTANCE
        } else {
            stats.shoot_distance * HOLD_DISTANCE_FACTOR
        };
        if distance <= hold {
            enemy.face(player_pos);
            return Transition::None;
        }
        return after_move(move_enemy_toward(enemy, player_pos, speed, ctx));
    }

    enemy.lost_sight_timer += ctx.delta_time;
    let target = enemy
        .last_seen
        .or(enemy.investigate_target)
        .unwrap_or(enemy.position);
    if enemy.lost_sight_timer > LOST_SIGHT_TIMEOUT || enemy.position.distance(target) < BLIND_CLOSE_DISTANCE {
        enemy.investigate_target = Some(target);
        return Transition::To(AiState::Investigate);
    }
    after_move(move_enemy_toward(enemy, target, speed, ctx))
}

fn update_dodge(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    let player_pos = ctx.player.position;
    if ctx.player_in_sight(enemy) {
        enemy.last_seen = Some(player_pos);
        if enemy.attack_cooldown <= 0.0
            && enemy.position.distance(player_pos) <= enemy.stats().shoot_distance
        {
            return Transition::To(AiState::Attack(AttackPhase::Aim));
        }
    }

    enemy.state_timer -= ctx.delta_time;
    if enemy.state_timer <= 0.0 {
        return Transition::To(AiState::Chase);
    }

    let step = enemy.dodge_dir * enemy.combat.speed * DODGE_SPEED_FACTOR * ctx.delta_time;
    if !try_step(enemy, step, ctx.world) {
        enemy.dodge_dir = -enemy.dodge_dir;
        try_step(enemy, -step, ctx.world);
    }
    enemy.face(player_pos);
    Transition::None
}

fn update_aim(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    enemy.face(ctx.player.position);
    enemy.state_timer -= ctx.delta_time;
    if enemy.state_timer <= 0.0 {
        Transition::To(AiState::Attack(AttackPhase::Fire))
    } else {
        Transition::None
    }
}

fn update_fire(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    if !enemy.did_fire {
        enemy.did_fire = true;
        resolve_attack(enemy, ctx);
    }

    enemy.state_timer -= ctx.delta_time;
    if enemy.state_timer > 0.0 {
        return Transition::None;
    }
    if enemy.flags().dodges && ctx.rng.f32() < POST_ATTACK_DODGE_CHANCE {
        Transition::To(AiState::Dodge)
    } else {
        Transition::To(AiState::Chase)
    }
}

/// The single damage roll of an attack cycle
fn resolve_attack(enemy: &mut Enemy, ctx: &mut AiContext) {
    ctx.stats.enemy_attacks += 1;
    ctx.sound(SoundCue::Attack(enemy.kind), enemy.position);
    if !enemy.flags().melee {
        enemy.muzzle_flash_ticks = MUZZLE_FLASH_TICKS;
    }
    enemy.attack_cooldown = ctx.roll_range(enemy.combat.cooldown_min, enemy.combat.cooldown_max);

    if !ctx.player.is_alive() {
        return;
    }
    if let Some(amount) = enemy_attempt_hit_player(enemy, ctx.world, ctx.player, ctx.rng) {
        ctx.player.take_damage(amount);
        log::debug!("{} #{} hit the player for {amount}", enemy.kind.name(), ctx.index);
        ctx.events.push(SimEvent::PlayerDamaged {
            amount,
            attacker: ctx.index,
        });
    }
}

fn update_pain(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    enemy.state_timer -= ctx.delta_time;
    if enemy.state_timer <= 0.0 {
        Transition::To(AiState::Chase)
    } else {
        Transition::None
    }
}

fn update_door_wait(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    enemy.state_timer -= ctx.delta_time;
    let passable = enemy
        .door_wait_cell
        .and_then(|cell| ctx.world.doors.get(cell))
        .is_none_or(Door::is_passable);

    if !passable && enemy.state_timer > 0.0 {
        return Transition::None;
    }
    enemy.door_wait_cell = None;
    if enemy.alerted {
        Transition::To(AiState::Chase)
    } else {
        Transition::To(AiState::Patrol)
    }
}

fn update_dying(enemy: &mut Enemy, ctx: &mut AiContext) -> Transition {
    enemy.state_timer -= ctx.delta_time;
    if enemy.state_timer > 0.0 {
        return Transition::None;
    }
    enemy.death_frame += 1;
    if enemy.death_frame >= enemy.stats().death_frames {
        Transition::To(AiState::Dead)
    } else {
        enemy.state_timer += DEATH_FRAME_TIME;
        Transition::None
    }
}

// ============================================================================
// External Stimuli
// ============================================================================

/// Apply damage to an enemy. Returns `true` if this hit killed it.
///
/// Dying and dead enemies ignore damage.
pub fn damage_enemy(enemy: &mut Enemy, amount: i32, ctx: &mut AiContext) -> bool {
    if !enemy.is_alive() || amount <= 0 {
        return false;
    }

    enemy.health -= amount;
    enemy.hit_flash_ticks = HIT_FLASH_TICKS;
    enemy.alerted = true;
    enemy.last_seen = Some(ctx.player.position);

    if enemy.health <= 0 {
        enemy.health = 0;
        kill(enemy, ctx);
        return true;
    }

    if !enemy.flags().no_pain {
        change_state(enemy, AiState::Pain, ctx);
    } else if !enemy.state.is_engaged() {
        change_state(enemy, AiState::Chase, ctx);
    }
    false
}

fn kill(enemy: &mut Enemy, ctx: &mut AiContext) {
    change_state(enemy, AiState::Dying, ctx);
    log::debug!("{} #{} killed", enemy.kind.name(), ctx.index);
    ctx.sound(SoundCue::Death(enemy.kind), enemy.position);
    ctx.events.push(SimEvent::EnemyKilled {
        enemy: ctx.index,
        kind: enemy.kind,
    });
    ctx.player.score += enemy.stats().score;

    if ctx.drop_ammo && enemy.kind != EnemyKind::Dog {
        ctx.world.pickups.push(Pickup::new(PickupKind::DroppedClip, enemy.position));
        ctx.events.push(SimEvent::PickupDropped {
            kind: PickupKind::DroppedClip,
            position: enemy.position,
        });
    }
}

/// React to a noise heard at `origin`.
///
/// Engaged, dying and dead enemies are not distracted. Returns `true` if the
/// enemy went to investigate.
pub fn hear_sound(enemy: &mut Enemy, origin: Vec2, ctx: &mut AiContext) -> bool {
    if !enemy.is_alive() || enemy.state.is_engaged() {
        return false;
    }
    enemy.investigate_target = Some(origin);
    enemy.last_seen = Some(origin);
    enemy.alerted = true;
    enemy.door_wait_cell = None;
    change_state(enemy, AiState::Investigate, ctx);
    if !enemy.flags().silent {
        ctx.sound(SoundCue::Alert(enemy.kind), enemy.position);
    }
    true
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;
    use crate::core::Difficulty;
    use crate::world::{DoorKind, DoorOrientation, WorldGrid, cell_center};

    struct Harness {
        world: World,
        player: Player,
        paths: PathCache,
        rng: Rng,
        events: EventQueue,
        stats: SimStats,
    }

    impl Harness {
        fn new(player_cell: IVec2) -> Self {
            Self {
                world: World::new(WorldGrid::new()),
                player: Player::new(cell_center(player_cell), 0.0),
                paths: PathCache::new(),
                rng: Rng::with_seed(42),
                events: EventQueue::new(),
                stats: SimStats::new(),
            }
        }

        fn ctx(&mut self, dt: f32) -> AiContext<'_> {
            AiContext {
                world: &mut self.world,
                player: &mut self.player,
                paths: &mut self.paths,
                rng: &mut self.rng,
                events: &mut self.events,
                stats: &mut self.stats,
                delta_time: dt,
                drop_ammo: true,
                index: 0,
            }
        }
    }

    fn enemy(kind: EnemyKind, cell: IVec2) -> Enemy {
        Enemy::new(kind, cell, 0.0, Difficulty::Medium.scale())
    }

    #[test]
    fn test_stand_to_alert_to_chase() {
        let mut h = Harness::new(IVec2::new(14, 10));
        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));

        update_enemy(&mut guard, &mut h.ctx(0.05));
        assert_eq!(guard.state, AiState::Alert);
        assert!(guard.last_seen.is_none());

        // Player steps aside during the alert pause
        h.player.position = cell_center(IVec2::new(14, 12));
        for _ in 0..20 {
            if guard.state != AiState::Alert {
                break;
            }
            update_enemy(&mut guard, &mut h.ctx(0.05));
        }
        assert_eq!(guard.state, AiState::Chase);
        assert_eq!(guard.last_seen, Some(cell_center(IVec2::new(14, 12))));
    }

    #[test]
    fn test_silent_kind_skips_alert() {
        let mut h = Harness::new(IVec2::new(14, 10));
        let mut mutant = enemy(EnemyKind::Mutant, IVec2::new(10, 10));

        update_enemy(&mut mutant, &mut h.ctx(0.05));
        assert_eq!(mutant.state, AiState::Chase);
        assert_eq!(mutant.last_seen, Some(h.player.position));
    }

    #[test]
    fn test_out_of_range_player_unnoticed() {
        let mut h = Harness::new(IVec2::new(30, 10));
        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));
        update_enemy(&mut guard, &mut h.ctx(0.05));
        assert!(guard.state.is_passive());
    }

    #[test]
    fn test_attack_fires_exactly_once() {
        let mut h = Harness::new(IVec2::new(12, 10));
        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));
        change_state(&mut guard, AiState::Chase, &mut h.ctx(0.05));

        let mut fire_ticks = 0;
        for _ in 0..40 {
            let before = h.stats.enemy_attacks;
            update_enemy(&mut guard, &mut h.ctx(0.05));
            if h.stats.enemy_attacks > before {
                fire_ticks += 1;
            }
            if matches!(guard.state, AiState::Chase | AiState::Dodge) && fire_ticks > 0 {
                break;
            }
        }
        assert_eq!(fire_ticks, 1);
        assert!(guard.attack_cooldown > 0.0);

        // The damage events match the single attack
        let damage_events = h
            .events
            .pending()
            .filter(|e| matches!(e, SimEvent::PlayerDamaged { .. }))
            .count();
        assert!(damage_events <= 1);
    }

    #[test]
    fn test_death_sequence_and_idempotence() {
        let mut h = Harness::new(IVec2::new(30, 30));
        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));

        assert!(damage_enemy(&mut guard, 100, &mut h.ctx(0.07)));
        assert_eq!(guard.state, AiState::Dying);
        assert_eq!(h.player.score, 100);
        assert_eq!(h.world.pickups.len(), 1);

        // Five frames of 0.12s: dead after 0.6s, i.e. on the 9th tick of 0.07s
        for tick in 1..=9 {
            update_enemy(&mut guard, &mut h.ctx(0.07));
            if tick < 9 {
                assert_eq!(guard.state, AiState::Dying, "tick {tick}");
            }
        }
        assert_eq!(guard.state, AiState::Dead);
        assert_eq!(guard.death_frame, 4);

        // Further damage is ignored
        assert!(!damage_enemy(&mut guard, 100, &mut h.ctx(0.07)));
        assert_eq!(h.player.score, 100);
        assert_eq!(h.world.pickups.len(), 1);
        let kills = h
            .events
            .pending()
            .filter(|e| matches!(e, SimEvent::EnemyKilled { .. }))
            .count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn test_dog_drops_nothing() {
        let mut h = Harness::new(IVec2::new(30, 30));
        let mut dog = enemy(EnemyKind::Dog, IVec2::new(10, 10));
        assert!(damage_enemy(&mut dog, 5, &mut h.ctx(0.05)));
        assert!(h.world.pickups.is_empty());
    }

    #[test]
    fn test_pain_and_no_pain() {
        let mut h = Harness::new(IVec2::new(30, 30));
        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));
        assert!(!damage_enemy(&mut guard, 5, &mut h.ctx(0.05)));
        assert_eq!(guard.state, AiState::Pain);
        assert_eq!(guard.hit_flash_ticks, HIT_FLASH_TICKS);

        let mut boss = enemy(EnemyKind::Boss, IVec2::new(20, 20));
        assert!(!damage_enemy(&mut boss, 5, &mut h.ctx(0.05)));
        assert_eq!(boss.state, AiState::Chase);
    }

    #[test]
    fn test_sound_does_not_downgrade_engaged() {
        let mut h = Harness::new(IVec2::new(30, 30));
        let origin = Vec2::new(3.0, 3.0);
        for state in [
            AiState::Chase,
            AiState::Dodge,
            AiState::Attack(AttackPhase::Aim),
            AiState::Attack(AttackPhase::Fire),
            AiState::Pain,
            AiState::Dying,
            AiState::Dead,
        ] {
            let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));
            guard.state = state;
            assert!(!hear_sound(&mut guard, origin, &mut h.ctx(0.05)));
            assert_eq!(guard.state, state);
        }

        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));
        assert!(hear_sound(&mut guard, origin, &mut h.ctx(0.05)));
        assert_eq!(guard.state, AiState::Investigate);
        assert_eq!(guard.investigate_target, Some(origin));
        assert_eq!(guard.state_timer, INVESTIGATE_TIMEOUT);
    }

    #[test]
    fn test_investigate_arrival_returns_to_stand() {
        let mut h = Harness::new(IVec2::new(40, 40));
        h.world.grid.set_code(IVec2::new(20, 20), 1);
        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));
        let target = cell_center(IVec2::new(12, 10));
        hear_sound(&mut guard, target, &mut h.ctx(0.05));

        for _ in 0..200 {
            update_enemy(&mut guard, &mut h.ctx(0.05));
            if guard.state == AiState::Stand {
                break;
            }
        }
        assert_eq!(guard.state, AiState::Stand);
        assert!(guard.position.distance(target) <= ARRIVAL_RADIUS + 0.1);
    }

    #[test]
    fn test_chase_loses_sight() {
        let mut h = Harness::new(IVec2::new(20, 10));
        // Wall between the guard and the player
        for z in 0..20 {
            h.world.grid.set_code(IVec2::new(15, z), 1);
        }
        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));
        guard.last_seen = Some(cell_center(IVec2::new(10, 12)));
        change_state(&mut guard, AiState::Chase, &mut h.ctx(0.05));

        for _ in 0..100 {
            update_enemy(&mut guard, &mut h.ctx(0.05));
            if guard.state != AiState::Chase {
                break;
            }
        }
        assert_eq!(guard.state, AiState::Investigate);
        assert_eq!(guard.investigate_target, guard.last_seen);
    }

    #[test]
    fn test_patrol_reflects_off_walls() {
        let mut h = Harness::new(IVec2::new(60, 60));
        h.world.grid.set_code(IVec2::new(11, 10), 1);
        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));
        change_state(&mut guard, AiState::Patrol, &mut h.ctx(0.05));
        guard.state_timer = 100.0;

        for _ in 0..40 {
            update_enemy(&mut guard, &mut h.ctx(0.05));
        }
        assert!(guard.patrol_dir.x < 0.0, "heading reversed after hitting the wall");
        assert!(h.world.can_occupy(guard.position, 0.0));
    }

    #[test]
    fn test_dodge_strafes_and_reverses() {
        let mut h = Harness::new(IVec2::new(20, 10));
        let mut officer = enemy(EnemyKind::Officer, IVec2::new(10, 10));
        officer.attack_cooldown = 100.0;
        change_state(&mut officer, AiState::Dodge, &mut h.ctx(0.05));
        let dir = officer.dodge_dir;
        assert_eq!(dir.x, 0.0, "strafe is perpendicular to the player");
        assert_eq!(dir.y.abs(), 1.0);

        let start = officer.position;
        update_enemy(&mut officer, &mut h.ctx(0.05));
        let expected = officer.combat.speed * DODGE_SPEED_FACTOR * 0.05;
        approx::assert_relative_eq!(officer.position.x, start.x);
        approx::assert_relative_eq!(officer.position.y, start.y + dir.y * expected, epsilon = 1e-4);

        // Wall on the strafe side: the dodge reverses
        let side = IVec2::new(10, 10 + dir.y as i32);
        h.world.grid.set_code(side, 1);
        officer.set_position(cell_center(IVec2::new(10, 10)) + dir * 0.6);
        let before = officer.position;
        update_enemy(&mut officer, &mut h.ctx(0.05));
        assert_eq!(officer.dodge_dir, -dir);
        assert!((officer.position.y - before.y) * dir.y < 0.0);

        for _ in 0..40 {
            if officer.state != AiState::Dodge {
                break;
            }
            update_enemy(&mut officer, &mut h.ctx(0.05));
        }
        assert_eq!(officer.state, AiState::Chase);
    }

    #[test]
    fn test_dodge_can_fire() {
        let mut h = Harness::new(IVec2::new(14, 10));
        let mut officer = enemy(EnemyKind::Officer, IVec2::new(10, 10));
        change_state(&mut officer, AiState::Dodge, &mut h.ctx(0.05));

        update_enemy(&mut officer, &mut h.ctx(0.05));
        assert_eq!(officer.state, AiState::Attack(AttackPhase::Aim));
        assert_eq!(officer.last_seen, Some(h.player.position));
    }

    #[test]
    fn test_door_wait_exits() {
        let mut h = Harness::new(IVec2::new(40, 40));
        let door_cell = IVec2::new(11, 10);
        h.world.add_door(Door::new(door_cell, DoorKind::Normal, DoorOrientation::AlongZ, 0.0));

        // Alerted: leaves as soon as the door is passable
        let mut guard = enemy(EnemyKind::Guard, IVec2::new(10, 10));
        guard.alerted = true;
        guard.door_wait_cell = Some(door_cell);
        change_state(&mut guard, AiState::DoorWait, &mut h.ctx(0.05));
        assert_eq!(guard.state_timer, DOOR_WAIT_TIMEOUT);
        update_enemy(&mut guard, &mut h.ctx(0.05));
        assert_eq!(guard.state, AiState::DoorWait);
        assert!(!guard.moved_this_tick);

        h.world.doors.get_mut(door_cell).unwrap().open_amount = 0.8;
        update_enemy(&mut guard, &mut h.ctx(0.05));
        assert_eq!(guard.state, AiState::Chase);
        assert_eq!(guard.door_wait_cell, None);

        // Unalerted and the door never opens: gives up after the timeout
        h.world.doors.get_mut(door_cell).unwrap().open_amount = 0.0;
        let mut sentry = enemy(EnemyKind::Guard, IVec2::new(10, 10));
        sentry.door_wait_cell = Some(door_cell);
        change_state(&mut sentry, AiState::DoorWait, &mut h.ctx(0.5));
        for _ in 0..3 {
            update_enemy(&mut sentry, &mut h.ctx(0.5));
            assert_eq!(sentry.state, AiState::DoorWait);
        }
        update_enemy(&mut sentry, &mut h.ctx(0.5));
        assert_eq!(sentry.state, AiState::Patrol);
    }
}
