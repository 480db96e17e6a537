//! Line-of-sight queries
//!
//! Sight is traced by sampling the segment at a fixed step and looking up the
//! cell under each sample, which keeps it consistent with the coarse collision
//! model. The endpoints' own cells never occlude, so an entity standing in a
//! doorway can still see out of it.

use glam::{IVec2, Vec2};

use crate::world::{
    CellKind, Door, SECOND_STORY_THRESHOLD, STORY_HEIGHT, World, WorldGrid, is_upper_story,
    world_to_cell,
};

/// Distance between sight samples in world units
pub const LOS_STEP: f32 = 0.4;
/// Points closer than this always see each other
const SAME_POINT_DISTANCE: f32 = 0.1;
/// Largest height difference across which two points can see each other
pub const LOS_MAX_HEIGHT_DIFF: f32 = STORY_HEIGHT * 0.6;

impl World {
    /// Whether `from` can see `to`, ignoring heights.
    #[must_use]
    pub fn has_line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        self.trace_sight(from, to, |cell| self.blocks_sight(cell))
    }

    /// Whether `from` standing at `from_floor` can see `to` standing at `to_floor`.
    ///
    /// Falls back to [`World::has_line_of_sight`] on single-story grids.
    #[must_use]
    pub fn has_line_of_sight_at(&self, from: Vec2, from_floor: f32, to: Vec2, to_floor: f32) -> bool {
        if !self.grid.is_multi_story() {
            return self.has_line_of_sight(from, to);
        }
        if from.distance(to) < SAME_POINT_DISTANCE {
            return true;
        }
        if (from_floor - to_floor).abs() > LOS_MAX_HEIGHT_DIFF {
            return false;
        }

        if is_upper_story(from_floor) && is_upper_story(to_floor) {
            self.trace_sight(from, to, |cell| self.blocks_upper_sight(cell))
        } else {
            self.trace_sight(from, to, |cell| self.blocks_sight(cell))
        }
    }

    fn trace_sight(&self, from: Vec2, to: Vec2, blocks: impl Fn(IVec2) -> bool) -> bool {
        let distance = from.distance(to);
        if distance < SAME_POINT_DISTANCE {
            return true;
        }

        let start = world_to_cell(from);
        let end = world_to_cell(to);
        if !WorldGrid::in_bounds(start) || !WorldGrid::in_bounds(end) {
            return false;
        }

        let direction = (to - from) / distance;
        let mut travelled = LOS_STEP;
        while travelled < distance {
            let cell = world_to_cell(from + direction * travelled);
            if cell != start && cell != end && blocks(cell) {
                return false;
            }
            travelled += LOS_STEP;
        }

        true
    }

    /// Occlusion for viewers on the ground floor (or mixed floors)
    fn blocks_sight(&self, cell: IVec2) -> bool {
        match self.grid.kind(cell) {
            None | Some(CellKind::Wall(_)) => true,
            Some(CellKind::Door) => !self.doors.get(cell).is_some_and(Door::is_passable),
            Some(CellKind::Empty) => false,
        }
    }

    /// Occlusion when both viewers stand on the second story: they look over
    /// short walls and ground-floor doors, but upper walls and upper doors block.
    fn blocks_upper_sight(&self, cell: IVec2) -> bool {
        if self.grid.upper_wall(cell) > 0 {
            return true;
        }
        match self.grid.kind(cell) {
            None => true,
            Some(CellKind::Wall(_)) => self.grid.ceiling_height(cell) > SECOND_STORY_THRESHOLD,
            Some(CellKind::Door) => match self.doors.get(cell) {
                Some(door) => is_upper_story(door.floor_height) && !door.is_passable(),
                None => true,
            },
            Some(CellKind::Empty) => false,
        }
    }
}
