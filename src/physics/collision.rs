//! Point collision queries against the world grid
//!
//! Collision is coarse and grid based: a point is blocked by the cell it falls
//! in (wall, unopened door, out of bounds) or by a blocking prop footprint.
//! The multi-story variant additionally looks at the height the querying
//! entity stands on.

use glam::{IVec2, Vec2};

use crate::world::{
    CellKind, Door, SECOND_STORY_THRESHOLD, World, is_upper_story, world_to_cell,
};

/// Largest floor-height rise an entity can step onto
pub const MAX_STEP_UP: f32 = 0.55;
/// Radius of an enemy body for movement probes
pub const BODY_RADIUS: f32 = 0.35;

const PROBE_OFFSETS: [Vec2; 5] = [
    Vec2::ZERO,
    Vec2::new(BODY_RADIUS, 0.0),
    Vec2::new(-BODY_RADIUS, 0.0),
    Vec2::new(0.0, BODY_RADIUS),
    Vec2::new(0.0, -BODY_RADIUS),
];

fn same_story(a: f32, b: f32) -> bool {
    is_upper_story(a) == is_upper_story(b)
}

impl World {
    /// Whether a world point is blocked, ignoring heights.
    #[must_use]
    pub fn is_blocked(&self, pos: Vec2) -> bool {
        let cell = world_to_cell(pos);
        match self.grid.kind(cell) {
            None | Some(CellKind::Wall(_)) => true,
            Some(CellKind::Door) => !self.door_passable(cell),
            Some(CellKind::Empty) => self.static_blocks(pos),
        }
    }

    /// Whether a world point is blocked for an entity standing at `from_floor`.
    ///
    /// Falls back to [`World::is_blocked`] on single-story grids.
    #[must_use]
    pub fn is_blocked_at(&self, pos: Vec2, from_floor: f32) -> bool {
        if !self.grid.is_multi_story() {
            return self.is_blocked(pos);
        }

        let cell = world_to_cell(pos);
        let upper = is_upper_story(from_floor);
        match self.grid.kind(cell) {
            None => true,
            Some(CellKind::Wall(_)) => {
                let top = self.grid.ceiling_height(cell);
                let walks_over = upper && top <= SECOND_STORY_THRESHOLD;
                !walks_over || self.grid.upper_wall(cell) > 0 || top - from_floor > MAX_STEP_UP
            }
            Some(CellKind::Door) => match self.doors.get(cell) {
                None => true,
                Some(door) if same_story(door.floor_height, from_floor) => {
                    !door.is_passable() || door.floor_height - from_floor > MAX_STEP_UP
                }
                Some(_) => upper && self.grid.upper_wall(cell) > 0,
            },
            Some(CellKind::Empty) => {
                (upper && self.grid.upper_wall(cell) > 0)
                    || self.grid.floor_height(cell) - from_floor > MAX_STEP_UP
                    || self.static_blocks(pos)
            }
        }
    }

    /// Whether an enemy body centred at `pos` fits, probing its radius along both axes.
    #[must_use]
    pub fn can_occupy(&self, pos: Vec2, floor: f32) -> bool {
        self.first_blocked_cell(pos, floor).is_none()
    }

    /// Cell of the first body probe that is blocked, if any
    #[must_use]
    pub fn first_blocked_cell(&self, pos: Vec2, floor: f32) -> Option<IVec2> {
        PROBE_OFFSETS
            .iter()
            .map(|&offset| pos + offset)
            .find(|&probe| self.is_blocked_at(probe, floor))
            .map(world_to_cell)
    }

    /// Door cell among the blocked body probes, if any.
    ///
    /// A step scraping a wall corner next to a door still finds the door.
    #[must_use]
    pub fn blocked_door_cell(&self, pos: Vec2, floor: f32) -> Option<IVec2> {
        PROBE_OFFSETS
            .iter()
            .map(|&offset| pos + offset)
            .filter(|&probe| self.is_blocked_at(probe, floor))
            .map(world_to_cell)
            .find(|&cell| self.grid.kind(cell) == Some(CellKind::Door))
    }

    fn door_passable(&self, cell: IVec2) -> bool {
        self.doors.get(cell).is_some_and(Door::is_passable)
    }

    fn static_blocks(&self, pos: Vec2) -> bool {
        self.statics.iter().any(|prop| prop.blocks_point(pos))
    }
}
