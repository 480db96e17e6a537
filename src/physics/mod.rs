//! Collision and visibility oracle
//!
//! Grid-based blocking and line-of-sight queries over a [`crate::world::World`],
//! in single-story and multi-story flavours.

mod collision;
mod visibility;

pub use collision::{BODY_RADIUS, MAX_STEP_UP};
pub use visibility::{LOS_MAX_HEIGHT_DIFF, LOS_STEP};
