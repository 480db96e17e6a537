//! Core simulation module
//!
//! Level loading, configuration, the tick clock, the event queue and the
//! [`LevelSimulation`] that drives everything else once per tick.

mod config;
mod debug;
mod events;
mod level;
mod simulation;
mod time;

pub use config::{Difficulty, DifficultyScale, SimConfig};
pub use debug::SimStats;
pub use events::{EventQueue, SimEvent, SoundCue};
pub use level::{
    DoorPlacement, EnemyPlacement, LevelDescriptor, LevelError, LevelPack, PlayerSpawn,
    StaticPlacement, StoryData,
};
pub use simulation::{AIM_TOLERANCE, INTERACT_DISTANCE, LevelSimulation, PICKUP_RADIUS, WEAPON_RANGE};
pub use time::{MAX_TICK_DELTA, TickClock};
