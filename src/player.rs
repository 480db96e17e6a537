//! Player state as seen by the simulation
//!
//! The player controller owns input; each tick it hands the simulation a
//! [`PlayerIntent`] and the simulation keeps the authoritative [`Player`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Starting and maximum health
pub const MAX_HEALTH: i32 = 100;
/// Rounds the player spawns with
pub const STARTING_AMMO: u32 = 8;
/// Largest ammo count the player can carry
pub const MAX_AMMO: u32 = 99;

/// Door key colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    /// Opens gold doors
    Gold,
    /// Opens silver doors
    Silver,
}

/// Keys the player holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyRing {
    gold: bool,
    silver: bool,
}

impl KeyRing {
    /// Check for a key
    #[must_use]
    pub const fn has(&self, key: KeyKind) -> bool {
        match key {
            KeyKind::Gold => self.gold,
            KeyKind::Silver => self.silver,
        }
    }

    /// Add a key
    pub fn give(&mut self, key: KeyKind) {
        match key {
            KeyKind::Gold => self.gold = true,
            KeyKind::Silver => self.silver = true,
        }
    }
}

/// The player
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Position on the XZ plane
    pub position: Vec2,
    /// Facing angle in radians (0 = +X, counter-clockwise towards +Z)
    pub angle: f32,
    /// Floor height the player stands on
    pub floor_height: f32,
    /// Running makes the player harder to hit
    pub running: bool,
    /// Remaining health
    pub health: i32,
    /// Rounds left
    pub ammo: u32,
    /// Score from kills
    pub score: u32,
    /// Keys held
    pub keys: KeyRing,
}

impl Player {
    /// Spawn a player at a position and facing
    #[must_use]
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            position,
            angle,
            floor_height: 0.0,
            running: false,
            health: MAX_HEALTH,
            ammo: STARTING_AMMO,
            score: 0,
            keys: KeyRing::default(),
        }
    }

    /// Unit facing vector
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Check if the player is alive
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Restore health, capped at the maximum
    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount).min(MAX_HEALTH);
    }

    /// Add ammo, capped at the maximum
    pub fn add_ammo(&mut self, amount: u32) {
        self.ammo = (self.ammo + amount).min(MAX_AMMO);
    }

    /// Remove health; never goes below zero
    pub fn take_damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }
}

/// What the player controller wants this tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerIntent {
    /// New position
    pub position: Vec2,
    /// New facing angle
    pub angle: f32,
    /// New floor height
    pub floor_height: f32,
    /// Running this tick
    pub running: bool,
    /// Pull the trigger
    pub fire: bool,
    /// Use the door ahead
    pub interact: bool,
}

impl PlayerIntent {
    /// Intent that keeps the player where they are
    #[must_use]
    pub fn hold(player: &Player) -> Self {
        Self {
            position: player.position,
            angle: player.angle,
            floor_height: player.floor_height,
            running: player.running,
            fire: false,
            interact: false,
        }
    }

    /// Set the fire flag
    #[must_use]
    pub fn with_fire(mut self, fire: bool) -> Self {
        self.fire = fire;
        self
    }

    /// Set the interact flag
    #[must_use]
    pub fn with_interact(mut self, interact: bool) -> Self {
        self.interact = interact;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ring() {
        let mut keys = KeyRing::default();
        assert!(!keys.has(KeyKind::Gold));
        keys.give(KeyKind::Gold);
        assert!(keys.has(KeyKind::Gold));
        assert!(!keys.has(KeyKind::Silver));
    }

    #[test]
    fn test_health_and_ammo_caps() {
        let mut player = Player::default();
        player.take_damage(30);
        assert_eq!(player.health, 70);
        player.heal(50);
        assert_eq!(player.health, MAX_HEALTH);
        player.take_damage(500);
        assert_eq!(player.health, 0);
        assert!(!player.is_alive());

        player.add_ammo(200);
        assert_eq!(player.ammo, MAX_AMMO);
    }

    #[test]
    fn test_forward() {
        let player = Player::new(Vec2::ZERO, std::f32::consts::FRAC_PI_2);
        approx::assert_relative_eq!(player.forward().y, 1.0);
        approx::assert_abs_diff_eq!(player.forward().x, 0.0, epsilon = 1e-6);
    }
}
