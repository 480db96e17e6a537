//! World state module
//!
//! The mutable per-level world: wall grid, doors, props and floor items.
//! Collision and sight queries over it live in `physics`.

mod door;
mod grid;
mod statics;

pub use door::{
    DOOR_CLOSE_DELAY, DOOR_PASSABLE_THRESHOLD, DOOR_SOUND_THRESHOLD, DOOR_SPEED, Door, DoorKind,
    DoorOpenOutcome, DoorOrientation, DoorSet,
};
pub use grid::{
    CELL_COUNT, CELL_SIZE, CellKind, DOOR_CODE, EMPTY_CODE, GRID_SIZE, SECOND_STORY_THRESHOLD,
    STORY_HEIGHT, StoryLayers, WorldGrid, cell_center, is_upper_story, world_to_cell,
};
pub use statics::{Pickup, PickupKind, STATIC_BLOCK_RADIUS, StaticProp};

/// Everything the collision oracle, pathfinder and sound flood read
#[derive(Debug, Clone, Default)]
pub struct World {
    /// Wall grid
    pub grid: WorldGrid,
    /// Doors, indexed by cell
    pub doors: DoorSet,
    /// Static props
    pub statics: Vec<StaticProp>,
    /// Items on the floor
    pub pickups: Vec<Pickup>,
}

impl World {
    /// Create a world around a grid with no doors or props
    #[must_use]
    pub fn new(grid: WorldGrid) -> Self {
        Self {
            grid,
            ..Default::default()
        }
    }

    /// Place a door, marking its cell in the grid
    pub fn add_door(&mut self, door: Door) {
        self.grid.set_code(door.cell, DOOR_CODE);
        self.doors.insert(door);
    }

    /// Place a static prop
    pub fn add_static(&mut self, prop: StaticProp) {
        self.statics.push(prop);
    }
}
