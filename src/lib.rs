//! Enemy AI and world simulation for a grid-based first-person shooter
//!
//! This crate provides:
//! - A 64x64 tile world with sliding doors, props and optional second story
//! - Collision and line-of-sight queries over that grid
//! - Enemy agents driven by a finite state machine with A* pathfinding
//! - Sound propagation by flood fill through open doors
//! - Sprite pose selection for billboarded enemies
//!
//! Rendering, audio playback and input are left to the host; the simulation
//! reports what happened through [`core::SimEvent`]s.

pub mod ai;
pub mod animation;
pub mod core;
pub mod physics;
pub mod player;
pub mod world;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{AiState, AttackPhase, Enemy, EnemyKind, PathCache, find_path};
    pub use crate::animation::{SpritePose, SpriteSelector};
    pub use crate::core::{
        Difficulty, EventQueue, LevelDescriptor, LevelError, LevelPack, LevelSimulation, SimConfig,
        SimEvent, SimStats, SoundCue,
    };
    pub use crate::player::{KeyKind, Player, PlayerIntent};
    pub use crate::world::{Door, DoorKind, PickupKind, World, cell_center, world_to_cell};
    pub use glam::{IVec2, Vec2};
}
