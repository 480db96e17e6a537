//! Enemy sprite selection
//!
//! Enemies are drawn as billboards with eight view rotations. The renderer
//! only needs to know which pose, rotation and frame to draw.

use std::f32::consts::{FRAC_PI_4, FRAC_PI_8, TAU};

use glam::Vec2;

use crate::ai::{AiState, AttackPhase, Enemy};

/// Frames in the walk cycle
pub const WALK_FRAMES: u8 = 4;
/// World units walked per walk frame
pub const WALK_FRAME_DISTANCE: f32 = 0.5;
/// Number of view rotations
pub const ROTATIONS: u8 = 8;

/// Distance-driven walk animation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WalkCycle {
    frame: u8,
    distance: f32,
}

impl WalkCycle {
    /// Advance by distance actually walked
    pub fn advance(&mut self, distance: f32) {
        self.distance += distance.max(0.0);
        while self.distance >= WALK_FRAME_DISTANCE {
            self.distance -= WALK_FRAME_DISTANCE;
            self.frame = (self.frame + 1) % WALK_FRAMES;
        }
    }

    /// Current walk frame
    #[must_use]
    pub const fn frame(&self) -> u8 {
        self.frame
    }

    /// Distance walked into the current frame
    #[must_use]
    pub const fn distance(&self) -> f32 {
        self.distance
    }
}

/// Which set of sprites to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpritePose {
    /// Standing still
    Stand,
    /// Walking
    Walk,
    /// Weapon raised
    Aim,
    /// Weapon firing
    Fire,
    /// Flinching
    Pain,
    /// Falling; frame index into the death sequence
    Dying(u8),
    /// Corpse
    Dead,
}

impl SpritePose {
    /// Whether this pose is drawn from eight directions
    #[must_use]
    pub const fn is_rotated(self) -> bool {
        matches!(self, Self::Stand | Self::Walk)
    }
}

/// Sprite to draw for one enemy from one viewpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSelector {
    /// Pose
    pub pose: SpritePose,
    /// View rotation, 0 = facing the viewer, counting counter-clockwise
    pub rotation: u8,
    /// Walk frame
    pub frame: u8,
    /// Draw with the hit flash
    pub hit_flash: bool,
    /// Draw the muzzle flash
    pub muzzle_flash: bool,
}

/// Rotation index of an entity facing `angle` at `position` seen from `viewer`
#[must_use]
pub fn view_rotation(position: Vec2, angle: f32, viewer: Vec2) -> u8 {
    let to_viewer = viewer - position;
    if to_viewer.length_squared() <= f32::EPSILON {
        return 0;
    }
    let relative = (to_viewer.y.atan2(to_viewer.x) - angle).rem_euclid(TAU);
    (((relative + FRAC_PI_8) / FRAC_PI_4) as u8) % ROTATIONS
}

impl SpriteSelector {
    /// Choose the sprite for `enemy` as seen from `viewer`
    #[must_use]
    pub fn select(enemy: &Enemy, viewer: Vec2) -> Self {
        let pose = match enemy.state {
            AiState::Dead => SpritePose::Dead,
            AiState::Dying => SpritePose::Dying(enemy.death_frame),
            AiState::Pain => SpritePose::Pain,
            AiState::Attack(AttackPhase::Aim) => SpritePose::Aim,
            AiState::Attack(AttackPhase::Fire) => SpritePose::Fire,
            _ if enemy.moved_this_tick => SpritePose::Walk,
            _ => SpritePose::Stand,
        };
        let rotation = if pose.is_rotated() {
            view_rotation(enemy.position, enemy.angle, viewer)
        } else {
            0
        };
        let frame = if pose == SpritePose::Walk { enemy.walk.frame() } else { 0 };

        Self {
            pose,
            rotation,
            frame,
            hit_flash: enemy.hit_flash_ticks > 0,
            muzzle_flash: enemy.muzzle_flash_ticks > 0,
        }
    }
}
