//! Level grid
//!
//! Fixed 64×64 cell map holding wall codes and door markers, with optional
//! multi-story layers (floor heights, ceiling heights, upper-story walls).

use glam::{IVec2, Vec2};

/// Cells along each side of the grid
pub const GRID_SIZE: i32 = 64;
/// Total number of cells in one layer
pub const CELL_COUNT: usize = (GRID_SIZE * GRID_SIZE) as usize;
/// Cell size in world units
pub const CELL_SIZE: f32 = 2.0;
/// Height of one story in world units
pub const STORY_HEIGHT: f32 = 2.0;
/// Floor height at or above which an entity stands on the second story
pub const SECOND_STORY_THRESHOLD: f32 = STORY_HEIGHT * 0.5;
/// Cell code marking a door cell
pub const DOOR_CODE: i16 = -1;
/// Cell code marking open floor
pub const EMPTY_CODE: i16 = 0;

/// Decoded meaning of a cell code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Open floor
    Empty,
    /// Solid wall with its material index
    Wall(i16),
    /// Door cell (animation state lives on the door)
    Door,
}

impl CellKind {
    /// Decode a raw cell code
    #[must_use]
    pub const fn from_code(code: i16) -> Self {
        if code > 0 {
            Self::Wall(code)
        } else if code == DOOR_CODE {
            Self::Door
        } else {
            Self::Empty
        }
    }
}

/// Whether a floor height counts as standing on the second story.
#[must_use]
pub fn is_upper_story(height: f32) -> bool {
    height >= SECOND_STORY_THRESHOLD
}

/// Convert a world position (XZ plane) to its cell
#[must_use]
pub fn world_to_cell(pos: Vec2) -> IVec2 {
    IVec2::new(
        (pos.x / CELL_SIZE).floor() as i32,
        (pos.y / CELL_SIZE).floor() as i32,
    )
}

/// World position of a cell's center
#[must_use]
pub fn cell_center(cell: IVec2) -> Vec2 {
    Vec2::new(
        (cell.x as f32 + 0.5) * CELL_SIZE,
        (cell.y as f32 + 0.5) * CELL_SIZE,
    )
}

/// Multi-story layers laid over the base grid.
#[derive(Debug, Clone)]
pub struct StoryLayers {
    /// Floor height per cell
    floor: Vec<f32>,
    /// Ceiling height per cell (wall top for wall cells)
    ceiling: Vec<f32>,
    /// Upper-story wall codes
    upper_walls: Vec<i16>,
}

impl StoryLayers {
    /// Flat layers: ground floor everywhere, full two-story ceilings, no upper walls
    #[must_use]
    pub fn flat() -> Self {
        Self {
            floor: vec![0.0; CELL_COUNT],
            ceiling: vec![STORY_HEIGHT * 2.0; CELL_COUNT],
            upper_walls: vec![EMPTY_CODE; CELL_COUNT],
        }
    }

    /// Build layers from raw arrays.
    ///
    /// Returns `None` unless every array holds exactly one value per cell.
    #[must_use]
    pub fn from_parts(floor: Vec<f32>, ceiling: Vec<f32>, upper_walls: Vec<i16>) -> Option<Self> {
        if floor.len() != CELL_COUNT || ceiling.len() != CELL_COUNT || upper_walls.len() != CELL_COUNT
        {
            return None;
        }
        Some(Self {
            floor,
            ceiling,
            upper_walls,
        })
    }
}

/// The per-level wall grid
#[derive(Debug, Clone)]
pub struct WorldGrid {
    /// Cell codes, row-major by z then x
    cells: Vec<i16>,
    /// Optional multi-story layers
    stories: Option<StoryLayers>,
}

impl WorldGrid {
    /// Create an all-empty single-story grid
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: vec![EMPTY_CODE; CELL_COUNT],
            stories: None,
        }
    }

    /// Create a grid from raw cell codes.
    ///
    /// Missing trailing cells are filled with solid wall; surplus entries are dropped.
    #[must_use]
    pub fn from_cells(mut cells: Vec<i16>) -> Self {
        cells.resize(CELL_COUNT, 1);
        Self {
            cells,
            stories: None,
        }
    }

    /// Attach multi-story layers
    #[must_use]
    pub fn with_stories(mut self, stories: StoryLayers) -> Self {
        self.stories = Some(stories);
        self
    }

    /// Whether this grid carries multi-story layers
    #[must_use]
    pub fn is_multi_story(&self) -> bool {
        self.stories.is_some()
    }

    /// Check if a cell lies inside the grid
    #[must_use]
    pub fn in_bounds(cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < GRID_SIZE && cell.y < GRID_SIZE
    }

    fn index(cell: IVec2) -> Option<usize> {
        Self::in_bounds(cell).then(|| (cell.y * GRID_SIZE + cell.x) as usize)
    }

    /// Raw code of a cell, `None` outside the grid
    #[must_use]
    pub fn code(&self, cell: IVec2) -> Option<i16> {
        Self::index(cell).map(|i| self.cells[i])
    }

    /// Decoded kind of a cell, `None` outside the grid
    #[must_use]
    pub fn kind(&self, cell: IVec2) -> Option<CellKind> {
        self.code(cell).map(CellKind::from_code)
    }

    /// Overwrite a cell's code (ignored outside the grid)
    pub fn set_code(&mut self, cell: IVec2, code: i16) {
        if let Some(i) = Self::index(cell) {
            self.cells[i] = code;
        }
    }

    /// Solid wall or outside the grid
    #[must_use]
    pub fn is_solid(&self, cell: IVec2) -> bool {
        self.code(cell).is_none_or(|code| code > 0)
    }

    /// Floor height of a cell (0 on single-story grids)
    #[must_use]
    pub fn floor_height(&self, cell: IVec2) -> f32 {
        match (&self.stories, Self::index(cell)) {
            (Some(stories), Some(i)) => stories.floor[i],
            _ => 0.0,
        }
    }

    /// Ceiling height of a cell; for wall cells this is the wall top
    #[must_use]
    pub fn ceiling_height(&self, cell: IVec2) -> f32 {
        match (&self.stories, Self::index(cell)) {
            (Some(stories), Some(i)) => stories.ceiling[i],
            _ => STORY_HEIGHT * 2.0,
        }
    }

    /// Upper-story wall code (0 when absent)
    #[must_use]
    pub fn upper_wall(&self, cell: IVec2) -> i16 {
        match (&self.stories, Self::index(cell)) {
            (Some(stories), Some(i)) => stories.upper_walls[i],
            _ => EMPTY_CODE,
        }
    }

    /// Set a cell's floor height (no-op on single-story grids)
    pub fn set_floor_height(&mut self, cell: IVec2, height: f32) {
        if let (Some(stories), Some(i)) = (&mut self.stories, Self::index(cell)) {
            stories.floor[i] = height;
        }
    }

    /// Set a cell's ceiling height (no-op on single-story grids)
    pub fn set_ceiling_height(&mut self, cell: IVec2, height: f32) {
        if let (Some(stories), Some(i)) = (&mut self.stories, Self::index(cell)) {
            stories.ceiling[i] = height;
        }
    }

    /// Set a cell's upper-story wall code (no-op on single-story grids)
    pub fn set_upper_wall(&mut self, cell: IVec2, code: i16) {
        if let (Some(stories), Some(i)) = (&mut self.stories, Self::index(cell)) {
            stories.upper_walls[i] = code;
        }
    }

    /// Surface an entity ends up standing on when entering `cell` from `from_height`.
    ///
    /// Second-story entities walking over a short wall stand on its top.
    #[must_use]
    pub fn surface_height(&self, cell: IVec2, from_height: f32) -> f32 {
        if !self.is_multi_story() {
            return 0.0;
        }
        match self.kind(cell) {
            Some(CellKind::Wall(_)) if is_upper_story(from_height) => self.ceiling_height(cell),
            _ => self.floor_height(cell),
        }
    }
}

impl Default for WorldGrid {
    fn default() -> Self {
        Self::new()
    }
}
