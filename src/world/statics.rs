//! Static props and pickups
//!
//! Props come from the level's static placement list. Some block movement with
//! a circular footprint around their cell center, some are pickups.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::world::grid::cell_center;

/// Radius of a blocking prop's footprint in world units
pub const STATIC_BLOCK_RADIUS: f32 = 0.6;

/// Prop type indices that block movement (barrels, tables, lamps, pillars, ...)
const BLOCKING_STATIC_TYPES: [u16; 20] = [
    1, 2, 3, 5, 7, 8, 10, 11, 12, 13, 16, 17, 18, 22, 35, 36, 37, 39, 45, 46,
];

/// Collectable item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    /// Gold door key
    GoldKey,
    /// Silver door key
    SilverKey,
    /// Small health item
    Food,
    /// Large health item
    FirstAid,
    /// Full ammo clip placed in the level
    Clip,
    /// Half clip dropped by a dead enemy
    DroppedClip,
}

impl PickupKind {
    /// Pickup for a static type index, if that type is collectable
    #[must_use]
    pub const fn from_static_type(kind: u16) -> Option<Self> {
        match kind {
            20 => Some(Self::GoldKey),
            21 => Some(Self::SilverKey),
            24 => Some(Self::Food),
            25 => Some(Self::FirstAid),
            26 => Some(Self::Clip),
            _ => None,
        }
    }
}

/// A decorative or blocking prop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticProp {
    /// Cell the prop stands in
    pub cell: IVec2,
    /// Prop type index from the level data
    pub kind: u16,
    /// Whether the prop's footprint blocks movement
    pub blocking: bool,
}

impl StaticProp {
    /// Create a prop, deriving its blocking flag from the type index
    #[must_use]
    pub fn new(cell: IVec2, kind: u16) -> Self {
        Self {
            cell,
            kind,
            blocking: BLOCKING_STATIC_TYPES.contains(&kind),
        }
    }

    /// Whether a world point lies inside this prop's blocking footprint
    #[must_use]
    pub fn blocks_point(&self, point: Vec2) -> bool {
        self.blocking && cell_center(self.cell).distance_squared(point) < STATIC_BLOCK_RADIUS * STATIC_BLOCK_RADIUS
    }
}

/// An item lying on the floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    /// Item kind
    pub kind: PickupKind,
    /// World position
    pub position: Vec2,
    /// Already collected
    pub taken: bool,
}

impl Pickup {
    /// Create an untaken pickup
    #[must_use]
    pub const fn new(kind: PickupKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            taken: false,
        }
    }
}
