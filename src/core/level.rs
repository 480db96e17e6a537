//! Level descriptors and loading
//!
//! A level arrives as plain data (wall grid, door/enemy/static placements,
//! player spawn, optional story layers) in RON or JSON. Loading validates the
//! data and copies it into a fresh mutable [`World`].

use std::fs;
use std::path::Path;

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::EnemyKind;
use crate::core::Difficulty;
use crate::world::{
    CELL_COUNT, CellKind, DOOR_CODE, Door, DoorKind, DoorOrientation, EMPTY_CODE, GRID_SIZE,
    Pickup, PickupKind, StaticProp, StoryLayers, World, WorldGrid, cell_center,
};

/// Errors that can occur while loading level or config data
#[derive(Debug, Error)]
pub enum LevelError {
    /// Requested level index is not in the pack
    #[error("level {index} not found (pack holds {count})")]
    MissingLevel { index: usize, count: usize },
    /// A per-cell array has the wrong length
    #[error("{layer} layer has {found} cells, expected {expected}")]
    LayerSize {
        layer: &'static str,
        found: usize,
        expected: usize,
    },
    /// A placement references a cell outside the grid
    #[error("{what} placement at {cell} lies outside the grid")]
    OutOfBounds { what: &'static str, cell: IVec2 },
    /// A cell is coded as a door but no door is placed there
    #[error("cell {0} is marked as a door but has no door placement")]
    OrphanDoorCell(IVec2),
    /// ASCII map contains a character with no meaning
    #[error("unknown tile {tile:?} at row {row}")]
    UnknownTile { row: usize, tile: char },
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Deserialization error
    #[error("parse error: {0}")]
    Parse(String),
}

/// Door placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoorPlacement {
    /// Cell the door occupies
    pub cell: IVec2,
    /// Lock type
    #[serde(default)]
    pub kind: DoorKind,
    /// Slide axis
    #[serde(default)]
    pub orientation: DoorOrientation,
}

/// Enemy placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyPlacement {
    /// Spawn cell
    pub cell: IVec2,
    /// Enemy kind
    pub kind: EnemyKind,
    /// Initial facing in radians
    #[serde(default)]
    pub facing: f32,
    /// Start out patrolling instead of standing
    #[serde(default)]
    pub patrol: bool,
    /// Lowest difficulty this enemy appears on
    #[serde(default)]
    pub min_difficulty: Option<Difficulty>,
}

impl EnemyPlacement {
    /// Standing enemy facing +X, present on every difficulty
    #[must_use]
    pub const fn new(cell: IVec2, kind: EnemyKind) -> Self {
        Self {
            cell,
            kind,
            facing: 0.0,
            patrol: false,
            min_difficulty: None,
        }
    }

    /// Whether this enemy spawns on `difficulty`
    #[must_use]
    pub fn spawns_on(&self, difficulty: Difficulty) -> bool {
        self.min_difficulty.is_none_or(|min| difficulty >= min)
    }
}

/// Static prop placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPlacement {
    /// Cell the prop stands in
    pub cell: IVec2,
    /// Prop type index
    pub kind: u16,
}

/// Where the player starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpawn {
    /// Spawn cell
    pub cell: IVec2,
    /// Facing in radians
    #[serde(default)]
    pub facing: f32,
}

/// Raw multi-story arrays, one entry per cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryData {
    /// Floor heights
    pub floor: Vec<f32>,
    /// Ceiling heights
    pub ceiling: Vec<f32>,
    /// Upper-story wall codes
    pub upper_walls: Vec<i16>,
}

/// A serializable level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    /// Level name
    pub name: String,
    /// Cell codes, row-major by z then x
    pub walls: Vec<i16>,
    /// Doors
    #[serde(default)]
    pub doors: Vec<DoorPlacement>,
    /// Enemies
    #[serde(default)]
    pub enemies: Vec<EnemyPlacement>,
    /// Static props and items
    #[serde(default)]
    pub statics: Vec<StaticPlacement>,
    /// Player spawn
    pub player: PlayerSpawn,
    /// Multi-story layers
    #[serde(default)]
    pub stories: Option<StoryData>,
}

impl LevelDescriptor {
    /// Build a level from ASCII rows, one character per cell.
    ///
    /// Row index is z, column index is x. Cells beyond the given rows are wall.
    ///
    /// | char | meaning |
    /// |---|---|
    /// | `#` | wall (material 1) |
    /// | `1`-`9` | wall with that material |
    /// | `.` or space | open floor |
    /// | `-` / `\|` | plain door sliding along X / Z |
    /// | `G` `S` `E` | gold / silver / elevator door |
    /// | `g` `o` `s` `d` `m` `b` | guard, officer, ss, dog, mutant, boss |
    /// | `P` | player spawn |
    ///
    /// # Errors
    ///
    /// Returns an error for unknown characters or rows that do not fit the grid
    pub fn from_rows(name: impl Into<String>, rows: &[&str]) -> Result<Self, LevelError> {
        let mut level = Self {
            name: name.into(),
            walls: vec![1; CELL_COUNT],
            doors: Vec::new(),
            enemies: Vec::new(),
            statics: Vec::new(),
            player: PlayerSpawn {
                cell: IVec2::ZERO,
                facing: 0.0,
            },
            stories: None,
        };

        if rows.len() > GRID_SIZE as usize {
            return Err(LevelError::LayerSize {
                layer: "rows",
                found: rows.len(),
                expected: GRID_SIZE as usize,
            });
        }

        for (z, row) in rows.iter().enumerate() {
            if row.chars().count() > GRID_SIZE as usize {
                return Err(LevelError::LayerSize {
                    layer: "columns",
                    found: row.chars().count(),
                    expected: GRID_SIZE as usize,
                });
            }
            for (x, tile) in row.chars().enumerate() {
                let cell = IVec2::new(x as i32, z as i32);
                let index = z * GRID_SIZE as usize + x;
                let mut code = EMPTY_CODE;
                match tile {
                    '#' => code = 1,
                    '1'..='9' => code = tile.to_digit(10).map_or(1, |digit| digit as i16),
                    '.' | ' ' => {}
                    '-' | '|' | 'G' | 'S' | 'E' => {
                        code = DOOR_CODE;
                        let (kind, orientation) = match tile {
                            '|' => (DoorKind::Normal, DoorOrientation::AlongZ),
                            'G' => (DoorKind::Gold, DoorOrientation::AlongX),
                            'S' => (DoorKind::Silver, DoorOrientation::AlongX),
                            'E' => (DoorKind::Elevator, DoorOrientation::AlongX),
                            _ => (DoorKind::Normal, DoorOrientation::AlongX),
                        };
                        level.doors.push(DoorPlacement {
                            cell,
                            kind,
                            orientation,
                        });
                    }
                    'P' => level.player.cell = cell,
                    other => {
                        let kind = match other {
                            'g' => EnemyKind::Guard,
                            'o' => EnemyKind::Officer,
                            's' => EnemyKind::Ss,
                            'd' => EnemyKind::Dog,
                            'm' => EnemyKind::Mutant,
                            'b' => EnemyKind::Boss,
                            _ => return Err(LevelError::UnknownTile { row: z, tile: other }),
                        };
                        level.enemies.push(EnemyPlacement::new(cell, kind));
                    }
                }
                level.walls[index] = code;
            }
        }

        Ok(level)
    }

    /// Add an enemy placement
    #[must_use]
    pub fn with_enemy(mut self, placement: EnemyPlacement) -> Self {
        self.enemies.push(placement);
        self
    }

    /// Add a static placement
    #[must_use]
    pub fn with_static(mut self, cell: IVec2, kind: u16) -> Self {
        self.statics.push(StaticPlacement { cell, kind });
        self
    }

    /// Attach multi-story layers
    #[must_use]
    pub fn with_stories(mut self, stories: StoryData) -> Self {
        self.stories = Some(stories);
        self
    }

    /// Check array sizes, placement bounds and door cells
    ///
    /// # Errors
    ///
    /// Returns the first problem found
    pub fn validate(&self) -> Result<(), LevelError> {
        check_layer("walls", self.walls.len())?;
        if let Some(stories) = &self.stories {
            check_layer("floor", stories.floor.len())?;
            check_layer("ceiling", stories.ceiling.len())?;
            check_layer("upper wall", stories.upper_walls.len())?;
        }

        check_bounds("player", self.player.cell)?;
        for door in &self.doors {
            check_bounds("door", door.cell)?;
        }
        for enemy in &self.enemies {
            check_bounds("enemy", enemy.cell)?;
        }
        for prop in &self.statics {
            check_bounds("static", prop.cell)?;
        }

        for (index, &code) in self.walls.iter().enumerate() {
            if code == DOOR_CODE {
                let cell = IVec2::new(index as i32 % GRID_SIZE, index as i32 / GRID_SIZE);
                if !self.doors.iter().any(|door| door.cell == cell) {
                    return Err(LevelError::OrphanDoorCell(cell));
                }
            }
        }

        Ok(())
    }

    /// Validate and build the mutable world for this level
    ///
    /// # Errors
    ///
    /// Returns an error if the level data is malformed
    pub fn build_world(&self) -> Result<World, LevelError> {
        if let Err(err) = self.validate() {
            log::error!("level '{}' rejected: {err}", self.name);
            return Err(err);
        }

        let mut grid = WorldGrid::from_cells(self.walls.clone());
        if let Some(data) = &self.stories {
            let layers =
                StoryLayers::from_parts(data.floor.clone(), data.ceiling.clone(), data.upper_walls.clone())
                    .ok_or(LevelError::LayerSize {
                        layer: "story",
                        found: data.floor.len(),
                        expected: CELL_COUNT,
                    })?;
            grid = grid.with_stories(layers);
        }

        let mut world = World::new(grid);
        for placement in &self.doors {
            let floor = world.grid.floor_height(placement.cell);
            world.add_door(Door::new(placement.cell, placement.kind, placement.orientation, floor));
        }

        for placement in &self.statics {
            if let Some(kind) = PickupKind::from_static_type(placement.kind) {
                world.pickups.push(Pickup::new(kind, cell_center(placement.cell)));
            } else if matches!(world.grid.kind(placement.cell), Some(CellKind::Empty)) {
                world.add_static(StaticProp::new(placement.cell, placement.kind));
            } else {
                log::warn!("static {} at {} is not on open floor, skipped", placement.kind, placement.cell);
            }
        }

        log::info!(
            "level '{}' built: {} doors, {} props, {} pickups",
            self.name,
            world.doors.len(),
            world.statics.len(),
            world.pickups.len()
        );
        Ok(world)
    }
}

fn check_layer(layer: &'static str, found: usize) -> Result<(), LevelError> {
    if found == CELL_COUNT {
        Ok(())
    } else {
        Err(LevelError::LayerSize {
            layer,
            found,
            expected: CELL_COUNT,
        })
    }
}

fn check_bounds(what: &'static str, cell: IVec2) -> Result<(), LevelError> {
    if WorldGrid::in_bounds(cell) {
        Ok(())
    } else {
        Err(LevelError::OutOfBounds { what, cell })
    }
}

/// An ordered collection of levels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelPack {
    /// Levels in play order
    pub levels: Vec<LevelDescriptor>,
}

impl LevelPack {
    /// Level by index
    ///
    /// # Errors
    ///
    /// Returns an error if the pack has no level at `index`
    pub fn level(&self, index: usize) -> Result<&LevelDescriptor, LevelError> {
        self.levels.get(index).ok_or_else(|| {
            let err = LevelError::MissingLevel {
                index,
                count: self.levels.len(),
            };
            log::error!("{err}");
            err
        })
    }

    /// Load a pack from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let content = fs::read_to_string(path)?;
        ron::from_str(&content).map_err(|e| LevelError::Parse(e.to_string()))
    }

    /// Load a pack from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| LevelError::Parse(e.to_string()))
    }

    /// Save the pack to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), LevelError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| LevelError::Parse(e.to_string()))?;
        fs::write(path, ron_string)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_level() -> LevelDescriptor {
        LevelDescriptor::from_rows(
            "test",
            &[
                "#######", //
                "#P..|g#",
                "#.....#",
                "###G###",
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows() {
        let level = small_level();
        assert_eq!(level.walls.len(), CELL_COUNT);
        assert_eq!(level.player.cell, IVec2::new(1, 1));
        assert_eq!(level.doors.len(), 2);
        assert_eq!(level.doors[0].orientation, DoorOrientation::AlongZ);
        assert_eq!(level.doors[1].kind, DoorKind::Gold);
        assert_eq!(level.enemies.len(), 1);
        assert_eq!(level.enemies[0].kind, EnemyKind::Guard);
        // Padding is solid
        assert_eq!(level.walls[GRID_SIZE as usize * 10 + 10], 1);
    }

    #[test]
    fn test_unknown_tile() {
        let err = LevelDescriptor::from_rows("bad", &["#?#"]).unwrap_err();
        assert!(matches!(err, LevelError::UnknownTile { row: 0, tile: '?' }));
    }

    #[test]
    fn test_build_world() {
        let level = small_level().with_static(IVec2::new(2, 2), 1).with_static(IVec2::new(3, 2), 24);
        let world = level.build_world().unwrap();

        assert_eq!(world.grid.code(IVec2::new(4, 1)), Some(DOOR_CODE));
        assert!(world.doors.get(IVec2::new(4, 1)).is_some());
        assert_eq!(world.statics.len(), 1);
        assert_eq!(world.pickups.len(), 1);
        assert_eq!(world.pickups[0].kind, PickupKind::Food);
    }

    #[test]
    fn test_wrong_layer_size() {
        let mut level = small_level();
        level.walls.truncate(100);
        assert!(matches!(
            level.build_world(),
            Err(LevelError::LayerSize { layer: "walls", found: 100, .. })
        ));
    }

    #[test]
    fn test_placement_out_of_bounds() {
        let level = small_level().with_enemy(EnemyPlacement::new(IVec2::new(64, 3), EnemyKind::Dog));
        assert!(matches!(level.validate(), Err(LevelError::OutOfBounds { what: "enemy", .. })));
    }

    #[test]
    fn test_orphan_door_cell() {
        let mut level = small_level();
        level.doors.clear();
        assert!(matches!(level.validate(), Err(LevelError::OrphanDoorCell(_))));
    }

    #[test]
    fn test_missing_level() {
        let pack = LevelPack {
            levels: vec![small_level()],
        };
        assert!(pack.level(0).is_ok());
        assert!(matches!(pack.level(3), Err(LevelError::MissingLevel { index: 3, count: 1 })));
    }

    #[test]
    fn test_difficulty_gate() {
        let mut placement = EnemyPlacement::new(IVec2::ONE, EnemyKind::Ss);
        assert!(placement.spawns_on(Difficulty::Baby));
        placement.min_difficulty = Some(Difficulty::Medium);
        assert!(!placement.spawns_on(Difficulty::Easy));
        assert!(placement.spawns_on(Difficulty::Hard));
    }

    #[test]
    fn test_pack_serialization_ron() {
        let pack = LevelPack {
            levels: vec![small_level()],
        };

        let ron_str = ron::ser::to_string_pretty(&pack, ron::ser::PrettyConfig::default()).unwrap();
        assert!(ron_str.contains("test"));

        let loaded: LevelPack = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, pack);
    }

    #[test]
    fn test_pack_serialization_json() {
        let pack = LevelPack {
            levels: vec![small_level()],
        };

        let json_str = serde_json::to_string(&pack).unwrap();
        let loaded: LevelPack = serde_json::from_str(&json_str).unwrap();
        assert_eq!(loaded.levels[0].doors, pack.levels[0].doors);
    }
}
