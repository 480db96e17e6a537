//! Enemy kinds, stat blocks and per-agent state

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::animation::WalkCycle;
use crate::core::DifficultyScale;
use crate::world::{cell_center, world_to_cell};

/// Ticks an enemy flashes after being hit
pub const HIT_FLASH_TICKS: u8 = 3;
/// Ticks a muzzle flash stays visible
pub const MUZZLE_FLASH_TICKS: u8 = 2;

// ============================================================================
// Kinds and Stats
// ============================================================================

/// Enemy type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Brown-uniformed pistol guard
    Guard,
    /// Fast officer
    Officer,
    /// Machine-gun SS
    Ss,
    /// Attack dog
    Dog,
    /// Silent mutant
    Mutant,
    /// Boss
    Boss,
}

/// Typed behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BehaviorFlags {
    /// Bites instead of shooting
    pub melee: bool,
    /// Never announces itself; skips the alert pause
    pub silent: bool,
    /// Never flinches
    pub no_pain: bool,
    /// Strafes sideways in combat
    pub dodges: bool,
    /// Closes in instead of holding distance
    pub rushes: bool,
    /// May open doors
    pub opens_doors: bool,
}

/// Immutable stat block of an enemy kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    /// Starting health
    pub health: i32,
    /// Movement speed in world units per second
    pub speed: f32,
    /// Smallest damage per hit
    pub damage_min: i32,
    /// Largest damage per hit
    pub damage_max: i32,
    /// Distance at which the player is noticed
    pub alert_distance: f32,
    /// Distance from which the enemy attacks
    pub shoot_distance: f32,
    /// Shortest pause between attacks in seconds
    pub cooldown_min: f32,
    /// Longest pause between attacks in seconds
    pub cooldown_max: f32,
    /// Hit accuracy multiplier
    pub accuracy: f32,
    /// Behaviour flags
    pub flags: BehaviorFlags,
    /// Frames in the death animation
    pub death_frames: u8,
    /// Score awarded for the kill
    pub score: u32,
}

const DOORS: BehaviorFlags = BehaviorFlags {
    melee: false,
    silent: false,
    no_pain: false,
    dodges: false,
    rushes: false,
    opens_doors: true,
};

static GUARD: EnemyStats = EnemyStats {
    health: 25,
    speed: 2.4,
    damage_min: 3,
    damage_max: 10,
    alert_distance: 20.0,
    shoot_distance: 14.0,
    cooldown_min: 1.0,
    cooldown_max: 2.0,
    accuracy: 0.75,
    flags: DOORS,
    death_frames: 5,
    score: 100,
};

static OFFICER: EnemyStats = EnemyStats {
    health: 50,
    speed: 3.6,
    damage_min: 4,
    damage_max: 12,
    alert_distance: 22.0,
    shoot_distance: 16.0,
    cooldown_min: 0.7,
    cooldown_max: 1.4,
    accuracy: 0.85,
    flags: BehaviorFlags { dodges: true, ..DOORS },
    death_frames: 5,
    score: 400,
};

static SS: EnemyStats = EnemyStats {
    health: 100,
    speed: 3.0,
    damage_min: 5,
    damage_max: 15,
    alert_distance: 22.0,
    shoot_distance: 18.0,
    cooldown_min: 0.5,
    cooldown_max: 1.2,
    accuracy: 0.9,
    flags: BehaviorFlags { dodges: true, ..DOORS },
    death_frames: 5,
    score: 500,
};

static DOG: EnemyStats = EnemyStats {
    health: 1,
    speed: 4.4,
    damage_min: 3,
    damage_max: 8,
    alert_distance: 16.0,
    shoot_distance: 1.5,
    cooldown_min: 0.6,
    cooldown_max: 1.0,
    accuracy: 1.0,
    flags: BehaviorFlags {
        melee: true,
        silent: false,
        no_pain: true,
        dodges: false,
        rushes: true,
        opens_doors: false,
    },
    death_frames: 4,
    score: 200,
};

static MUTANT: EnemyStats = EnemyStats {
    health: 45,
    speed: 2.8,
    damage_min: 4,
    damage_max: 12,
    alert_distance: 20.0,
    shoot_distance: 14.0,
    cooldown_min: 0.6,
    cooldown_max: 1.2,
    accuracy: 0.8,
    flags: BehaviorFlags {
        silent: true,
        rushes: true,
        ..DOORS
    },
    death_frames: 5,
    score: 700,
};

static BOSS: EnemyStats = EnemyStats {
    health: 850,
    speed: 2.2,
    damage_min: 8,
    damage_max: 20,
    alert_distance: 26.0,
    shoot_distance: 20.0,
    cooldown_min: 0.3,
    cooldown_max: 0.8,
    accuracy: 0.95,
    flags: BehaviorFlags { no_pain: true, ..DOORS },
    death_frames: 4,
    score: 5000,
};

impl EnemyKind {
    /// All kinds
    pub const ALL: [Self; 6] = [
        Self::Guard,
        Self::Officer,
        Self::Ss,
        Self::Dog,
        Self::Mutant,
        Self::Boss,
    ];

    /// Stat block for this kind
    #[must_use]
    pub fn stats(self) -> &'static EnemyStats {
        match self {
            Self::Guard => &GUARD,
            Self::Officer => &OFFICER,
            Self::Ss => &SS,
            Self::Dog => &DOG,
            Self::Mutant => &MUTANT,
            Self::Boss => &BOSS,
        }
    }

    /// Human readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Guard => "guard",
            Self::Officer => "officer",
            Self::Ss => "ss",
            Self::Dog => "dog",
            Self::Mutant => "mutant",
            Self::Boss => "boss",
        }
    }
}

/// Combat numbers after the difficulty scale has been applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatStats {
    /// Movement speed
    pub speed: f32,
    /// Smallest damage per hit
    pub damage_min: i32,
    /// Largest damage per hit
    pub damage_max: i32,
    /// Shortest attack pause
    pub cooldown_min: f32,
    /// Longest attack pause
    pub cooldown_max: f32,
    /// Hit accuracy multiplier
    pub accuracy: f32,
}

impl CombatStats {
    /// Scale a kind's stat block
    #[must_use]
    pub fn scaled(stats: &EnemyStats, scale: DifficultyScale) -> Self {
        let damage = |value: i32| ((value as f32 * scale.damage).round() as i32).max(1);
        Self {
            speed: stats.speed * scale.speed,
            damage_min: damage(stats.damage_min),
            damage_max: damage(stats.damage_max),
            cooldown_min: stats.cooldown_min * scale.cooldown,
            cooldown_max: stats.cooldown_max * scale.cooldown,
            accuracy: stats.accuracy * scale.accuracy,
        }
    }
}

// ============================================================================
// AI State
// ============================================================================

/// Sub-phase of an attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackPhase {
    /// Raising the weapon
    Aim,
    /// Shot (or bite) goes off
    Fire,
}

/// Enemy behaviour state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiState {
    /// Idle in place
    Stand,
    /// Wandering
    Patrol,
    /// Just spotted the player
    Alert,
    /// Heading to a noise or last sighting
    Investigate,
    /// Pursuing the player
    Chase,
    /// Strafing sideways
    Dodge,
    /// Attacking
    Attack(AttackPhase),
    /// Flinching from a hit
    Pain,
    /// Waiting for a door it opened
    DoorWait,
    /// Playing the death animation
    Dying,
    /// Corpse
    Dead,
}

impl AiState {
    /// State name for debugging and logging
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stand => "Stand",
            Self::Patrol => "Patrol",
            Self::Alert => "Alert",
            Self::Investigate => "Investigate",
            Self::Chase => "Chase",
            Self::Dodge => "Dodge",
            Self::Attack(AttackPhase::Aim) => "Attack(Aim)",
            Self::Attack(AttackPhase::Fire) => "Attack(Fire)",
            Self::Pain => "Pain",
            Self::DoorWait => "DoorWait",
            Self::Dying => "Dying",
            Self::Dead => "Dead",
        }
    }

    /// Fighting the player; sound does not distract these states
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        matches!(self, Self::Chase | Self::Attack(_) | Self::Dodge | Self::Pain)
    }

    /// Not dying and not dead
    #[must_use]
    pub const fn is_alive(self) -> bool {
        !matches!(self, Self::Dying | Self::Dead)
    }

    /// Not yet aware of the player
    #[must_use]
    pub const fn is_passive(self) -> bool {
        matches!(self, Self::Stand | Self::Patrol)
    }
}

// ============================================================================
// Enemy
// ============================================================================

/// One enemy agent
#[derive(Debug, Clone)]
pub struct Enemy {
    /// Kind
    pub kind: EnemyKind,
    /// Difficulty-scaled combat numbers
    pub combat: CombatStats,
    /// Position on the XZ plane
    pub position: Vec2,
    /// Cell derived from `position`
    pub cell: IVec2,
    /// Floor height the enemy stands on
    pub floor_height: f32,
    /// Facing in radians
    pub angle: f32,
    /// Remaining health
    pub health: i32,
    /// Behaviour state
    pub state: AiState,
    /// Countdown for the current state
    pub state_timer: f32,
    /// Seconds until the next attack is allowed
    pub attack_cooldown: f32,
    /// The current attack has already resolved
    pub did_fire: bool,
    /// Has ever noticed the player
    pub alerted: bool,
    /// Last known player position
    pub last_seen: Option<Vec2>,
    /// Point being investigated
    pub investigate_target: Option<Vec2>,
    /// Seconds the player has been out of sight while chasing
    pub lost_sight_timer: f32,
    /// Strafe direction while dodging
    pub dodge_dir: Vec2,
    /// Wander heading while patrolling
    pub patrol_dir: Vec2,
    /// Door the enemy is waiting on
    pub door_wait_cell: Option<IVec2>,
    /// Current death animation frame
    pub death_frame: u8,
    /// Took at least one step this tick
    pub moved_this_tick: bool,
    /// Walk animation progress
    pub walk: WalkCycle,
    /// Ticks of hit flash left
    pub hit_flash_ticks: u8,
    /// Ticks of muzzle flash left
    pub muzzle_flash_ticks: u8,
}

impl Enemy {
    /// Spawn an enemy at the center of a cell
    #[must_use]
    pub fn new(kind: EnemyKind, cell: IVec2, angle: f32, scale: DifficultyScale) -> Self {
        let stats = kind.stats();
        Self {
            kind,
            combat: CombatStats::scaled(stats, scale),
            position: cell_center(cell),
            cell,
            floor_height: 0.0,
            angle,
            health: stats.health,
            state: AiState::Stand,
            state_timer: 0.0,
            attack_cooldown: 0.0,
            did_fire: false,
            alerted: false,
            last_seen: None,
            investigate_target: None,
            lost_sight_timer: 0.0,
            dodge_dir: Vec2::ZERO,
            patrol_dir: Vec2::from_angle(angle),
            door_wait_cell: None,
            death_frame: 0,
            moved_this_tick: false,
            walk: WalkCycle::default(),
            hit_flash_ticks: 0,
            muzzle_flash_ticks: 0,
        }
    }

    /// Kind stat block
    #[must_use]
    pub fn stats(&self) -> &'static EnemyStats {
        self.kind.stats()
    }

    /// Behaviour flags
    #[must_use]
    pub fn flags(&self) -> BehaviorFlags {
        self.kind.stats().flags
    }

    /// Not dying and not dead
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state.is_alive()
    }

    /// Unit facing vector
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Turn to face a point
    pub fn face(&mut self, target: Vec2) {
        let dir = target - self.position;
        if dir.length_squared() > f32::EPSILON {
            self.angle = dir.y.atan2(dir.x);
        }
    }

    /// Move to a new position, keeping the cell in sync
    pub fn set_position(&mut self, position: Vec2) {
        let moved = self.position.distance(position);
        self.position = position;
        self.cell = world_to_cell(position);
        if moved > 0.0 {
            self.moved_this_tick = true;
            self.walk.advance(moved);
        }
    }
}
