//! Animation module
//!
//! Sprite selection for billboarded enemies.

mod sprite;

pub use sprite::{
    ROTATIONS, SpritePose, SpriteSelector, WALK_FRAME_DISTANCE, WALK_FRAMES, WalkCycle,
    view_rotation,
};
