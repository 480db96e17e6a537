//! Outbound events
//!
//! The simulation never calls into audio, HUD or rendering code. It records
//! [`SimEvent`]s instead, and collaborators read a whole tick's worth after
//! [`crate::core::LevelSimulation::tick`] returns:
//!
//! ```ignore
//! sim.tick(dt);
//! for event in sim.events().iter() {
//!     if let SimEvent::PlaySound { cue, position } = event {
//!         mixer.play(cue.key(), *position);
//!     }
//! }
//! ```

use glam::{IVec2, Vec2};

use crate::ai::EnemyKind;
use crate::player::KeyKind;
use crate::world::PickupKind;

// ============================================================================
// Event Types
// ============================================================================

/// Sound effects the simulation asks the audio layer to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Enemy spotted or heard the player
    Alert(EnemyKind),
    /// Enemy fired or bit
    Attack(EnemyKind),
    /// Enemy died
    Death(EnemyKind),
    /// Enemy got hurt
    Pain(EnemyKind),
    /// Door started opening
    DoorOpen,
    /// Door started closing
    DoorClose,
    /// Player tried a door without the key
    DoorLocked,
    /// Player weapon discharge
    PlayerFire,
}

impl SoundCue {
    /// Stable type key for the audio layer's sound table
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Alert(kind) => match kind {
                EnemyKind::Guard => "guard_alert",
                EnemyKind::Officer => "officer_alert",
                EnemyKind::Ss => "ss_alert",
                EnemyKind::Dog => "dog_bark",
                EnemyKind::Mutant => "mutant_alert",
                EnemyKind::Boss => "boss_alert",
            },
            Self::Attack(kind) => match kind {
                EnemyKind::Dog => "dog_bite",
                EnemyKind::Ss | EnemyKind::Boss => "machine_gun",
                _ => "pistol",
            },
            Self::Death(kind) => match kind {
                EnemyKind::Guard => "guard_death",
                EnemyKind::Officer => "officer_death",
                EnemyKind::Ss => "ss_death",
                EnemyKind::Dog => "dog_death",
                EnemyKind::Mutant => "mutant_death",
                EnemyKind::Boss => "boss_death",
            },
            Self::Pain(_) => "enemy_pain",
            Self::DoorOpen => "door_open",
            Self::DoorClose => "door_close",
            Self::DoorLocked => "door_locked",
            Self::PlayerFire => "player_fire",
        }
    }
}

/// Things that happened in the simulation.
///
/// The `#[non_exhaustive]` attribute allows adding new variants without
/// breaking downstream code that uses wildcard patterns.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SimEvent {
    // -------------------------------------------------------------------------
    // Audio Events
    // -------------------------------------------------------------------------
    /// Request to play a sound effect at a world position.
    PlaySound {
        /// Which sound
        cue: SoundCue,
        /// Emitter position on the XZ plane
        position: Vec2,
    },

    // -------------------------------------------------------------------------
    // Combat Events
    // -------------------------------------------------------------------------
    /// The player was hit.
    PlayerDamaged {
        /// Health removed
        amount: i32,
        /// Index of the enemy that hit
        attacker: usize,
    },

    /// An enemy's health dropped to zero.
    EnemyKilled {
        /// Enemy index
        enemy: usize,
        /// Enemy kind
        kind: EnemyKind,
    },

    // -------------------------------------------------------------------------
    // Item Events
    // -------------------------------------------------------------------------
    /// An item was dropped onto the floor.
    PickupDropped {
        /// Item kind
        kind: PickupKind,
        /// Where it landed
        position: Vec2,
    },

    /// The player picked an item up.
    PickupCollected {
        /// Item kind
        kind: PickupKind,
    },

    // -------------------------------------------------------------------------
    // Door Events
    // -------------------------------------------------------------------------
    /// The player tried a locked door without its key.
    DoorLocked {
        /// Door cell
        cell: IVec2,
        /// Key that would open it
        requires: KeyKind,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Outbound events, double-buffered per tick.
///
/// Writers push into the back buffer while readers see the front buffer, which
/// holds everything from the last completed tick.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    back: Vec<SimEvent>,
    front: Vec<SimEvent>,
}

impl EventQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event for the tick in progress
    pub fn push(&mut self, event: SimEvent) {
        self.back.push(event);
    }

    /// Publish the tick in progress and drop the previous one
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.back, &mut self.front);
        self.back.clear();
    }

    /// Events of the last completed tick
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.front.iter()
    }

    /// Events recorded so far in the tick in progress
    pub fn pending(&self) -> impl Iterator<Item = &SimEvent> {
        self.back.iter()
    }

    /// Whether the last completed tick produced nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.front.is_empty()
    }

    /// Number of events from the last completed tick
    #[must_use]
    pub fn len(&self) -> usize {
        self.front.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
