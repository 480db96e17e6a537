//! Simulation configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ai::PATH_CACHE_TICKS;
use crate::core::LevelError;

/// Skill level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// "Can I play, Daddy?"
    Baby,
    /// "Don't hurt me."
    Easy,
    /// "Bring 'em on!"
    #[default]
    Medium,
    /// "I am Death incarnate!"
    Hard,
}

/// Multipliers a difficulty applies to enemy stats at spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyScale {
    /// Movement speed
    pub speed: f32,
    /// Damage dealt
    pub damage: f32,
    /// Attack cooldown
    pub cooldown: f32,
    /// Hit accuracy
    pub accuracy: f32,
}

impl Difficulty {
    /// Stat multipliers for this difficulty
    #[must_use]
    pub const fn scale(self) -> DifficultyScale {
        let (speed, damage, cooldown, accuracy) = match self {
            Self::Baby => (0.8, 0.5, 1.4, 0.7),
            Self::Easy => (0.9, 0.75, 1.2, 0.85),
            Self::Medium => (1.0, 1.0, 1.0, 1.0),
            Self::Hard => (1.1, 1.25, 0.85, 1.1),
        };
        DifficultyScale {
            speed,
            damage,
            cooldown,
            accuracy,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Skill level applied to enemies at spawn
    pub difficulty: Difficulty,
    /// Seed for the simulation's random stream
    pub seed: u64,
    /// Whether killed enemies (other than dogs) drop an ammo clip
    pub drop_ammo: bool,
    /// Ticks a cached path stays valid
    pub path_cache_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            seed: 0x5EED,
            drop_ammo: true,
            path_cache_ticks: PATH_CACHE_TICKS,
        }
    }
}

impl SimConfig {
    /// Set the difficulty
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set the random seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable ammo drops
    #[must_use]
    pub fn with_drop_ammo(mut self, drop_ammo: bool) -> Self {
        self.drop_ammo = drop_ammo;
        self
    }

    /// Set the path cache window
    #[must_use]
    pub fn with_path_cache_ticks(mut self, ticks: u64) -> Self {
        self.path_cache_ticks = ticks;
        self
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Parse a config from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config
    pub fn from_ron_str(content: &str) -> Result<Self, LevelError> {
        ron::from_str(content).map_err(|e| LevelError::Parse(e.to_string()))
    }
}
