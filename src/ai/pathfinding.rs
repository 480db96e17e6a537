//! A* pathfinding on the world grid
//!
//! Door-aware grid navigation for enemies whose direct and sliding moves are
//! blocked. Results are shared between agents through a short-lived cache.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::IVec2;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::world::{CellKind, World};

/// Nodes expanded before a search gives up
pub const MAX_EXPANSIONS: usize = 200;
/// Cost of entering an open cell
pub const STEP_COST: u32 = 1;
/// Cost of entering a cell holding a door that is not yet passable
pub const CLOSED_DOOR_COST: u32 = 3;
/// Ticks a cached path stays valid
pub const PATH_CACHE_TICKS: u64 = 15;

const NEIGHBOR_OFFSETS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
];

/// Result of pathfinding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResult {
    /// Cells to walk through, start excluded, goal included
    pub cells: Vec<IVec2>,
    /// Total step cost
    pub cost: u32,
}

impl PathResult {
    /// First cell to step into
    #[must_use]
    pub fn next_cell(&self) -> Option<IVec2> {
        self.cells.first().copied()
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the path has no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A* node for priority queue
#[derive(Debug, Clone, Copy)]
struct Node {
    cell: IVec2,
    g_cost: u32, // Cost from start
    f_cost: u32, // g_cost + heuristic
    h_cost: u32,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap, prefer nodes closer to the goal on ties
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn manhattan(a: IVec2, b: IVec2) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// Cost of stepping into `cell`, `None` when impassable
fn entry_cost(world: &World, cell: IVec2, goal: IVec2) -> Option<u32> {
    match world.grid.kind(cell)? {
        CellKind::Wall(_) => None,
        CellKind::Door => match world.doors.get(cell) {
            Some(door) if door.is_passable() => Some(STEP_COST),
            Some(_) => Some(CLOSED_DOOR_COST),
            None => None,
        },
        CellKind::Empty => {
            let prop_in_cell = cell != goal
                && world
                    .statics
                    .iter()
                    .any(|prop| prop.blocking && prop.cell == cell);
            (!prop_in_cell).then_some(STEP_COST)
        }
    }
}

fn neighbors(cell: IVec2) -> SmallVec<[IVec2; 4]> {
    NEIGHBOR_OFFSETS.iter().map(|&offset| cell + offset).collect()
}

/// Find a path between two cells with the default expansion budget
#[must_use]
pub fn find_path(world: &World, start: IVec2, goal: IVec2) -> Option<PathResult> {
    search(world, start, goal, MAX_EXPANSIONS).0
}

/// A* search; also returns the number of nodes expanded
fn search(world: &World, start: IVec2, goal: IVec2, budget: usize) -> (Option<PathResult>, usize) {
    if start == goal || world.grid.kind(goal).is_none() || world.grid.kind(start).is_none() {
        return (None, 0);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: FxHashMap<IVec2, IVec2> = FxHashMap::default();
    let mut g_score: FxHashMap<IVec2, u32> = FxHashMap::default();
    let mut expansions = 0;

    g_score.insert(start, 0);
    let h = manhattan(start, goal);
    open_set.push(Node {
        cell: start,
        g_cost: 0,
        f_cost: h,
        h_cost: h,
    });

    while let Some(current) = open_set.pop() {
        // Skip stale heap entries
        if g_score.get(&current.cell).is_some_and(|&g| g < current.g_cost) {
            continue;
        }

        if current.cell == goal {
            // Reconstruct path
            let mut cells = vec![goal];
            let mut curr = goal;
            while let Some(&prev) = came_from.get(&curr) {
                if prev == start {
                    break;
                }
                cells.push(prev);
                curr = prev;
            }
            cells.reverse();

            return (
                Some(PathResult {
                    cells,
                    cost: current.g_cost,
                }),
                expansions,
            );
        }

        if expansions >= budget {
            log::trace!("path {start} -> {goal} exhausted its budget");
            return (None, expansions);
        }
        expansions += 1;

        for next in neighbors(current.cell) {
            let Some(cost) = entry_cost(world, next, goal) else {
                continue;
            };
            let tentative_g = current.g_cost + cost;

            if tentative_g < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                came_from.insert(next, current.cell);
                g_score.insert(next, tentative_g);

                let h = manhattan(next, goal);
                open_set.push(Node {
                    cell: next,
                    g_cost: tentative_g,
                    f_cost: tentative_g + h,
                    h_cost: h,
                });
            }
        }
    }

    // No path found
    (None, expansions)
}

// ============================================================================
// Path Cache
// ============================================================================

/// Search results shared by all agents for a short window of ticks.
///
/// The simulation calls [`PathCache::begin_tick`] with its tick counter; once
/// the window has elapsed every entry is dropped at once, since doors and
/// agents have moved since the searches ran. Failed searches are cached too.
#[derive(Debug, Clone)]
pub struct PathCache {
    entries: FxHashMap<(IVec2, IVec2), Option<PathResult>>,
    /// Tick the current window started on
    window_start: u64,
    /// Window length in ticks
    window: u64,
    hits: u64,
    misses: u64,
    expansions: u64,
}

impl PathCache {
    /// Create a cache with the default window
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(PATH_CACHE_TICKS)
    }

    /// Create a cache invalidated every `window` ticks
    #[must_use]
    pub fn with_window(window: u64) -> Self {
        Self {
            entries: FxHashMap::default(),
            window_start: 0,
            window: window.max(1),
            hits: 0,
            misses: 0,
            expansions: 0,
        }
    }

    /// Drop every entry once the window has elapsed
    pub fn begin_tick(&mut self, tick: u64) {
        if tick.saturating_sub(self.window_start) >= self.window {
            if !self.entries.is_empty() {
                log::trace!("path cache cleared ({} entries)", self.entries.len());
            }
            self.entries.clear();
            self.window_start = tick;
        }
    }

    /// Cached path between two cells, searching on a miss
    pub fn find(&mut self, world: &World, start: IVec2, goal: IVec2) -> Option<&PathResult> {
        let key = (start, goal);
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            let (result, expansions) = search(world, start, goal, MAX_EXPANSIONS);
            self.expansions += expansions as u64;
            self.entries.insert(key, result);
        }
        self.entries.get(&key).and_then(Option::as_ref)
    }

    /// Drop everything immediately
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached searches
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that ran a search
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Total nodes expanded by searches run through this cache
    #[must_use]
    pub const fn expansions(&self) -> u64 {
        self.expansions
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Door, DoorKind, DoorOrientation, WorldGrid};

    fn open_world() -> World {
        World::new(WorldGrid::new())
    }

    fn is_connected(start: IVec2, path: &PathResult) -> bool {
        let mut prev = start;
        path.cells.iter().all(|&cell| {
            let ok = manhattan(prev, cell) == 1;
            prev = cell;
            ok
        })
    }

    #[test]
    fn test_grid_pathfinding() {
        let mut world = open_world();

        // Create a wall
        for y in 2..8 {
            world.grid.set_code(IVec2::new(5, y), 1);
        }

        let start = IVec2::new(2, 5);
        let path = find_path(&world, start, IVec2::new(8, 5)).unwrap();

        assert!(is_connected(start, &path));
        assert_eq!(path.cells.last(), Some(&IVec2::new(8, 5)));
        assert!(path.len() > 6); // Should go around the wall
    }

    #[test]
    fn test_direct_path() {
        let world = open_world();

        let path = find_path(&world, IVec2::new(0, 0), IVec2::new(3, 0)).unwrap();

        assert_eq!(path.len(), 3); // start excluded
        assert_eq!(path.cost, 3);
        assert_eq!(path.next_cell(), Some(IVec2::new(1, 0)));
    }

    #[test]
    fn test_no_path() {
        let mut world = open_world();

        // Block everything around goal
        world.grid.set_code(IVec2::new(3, 2), 1);
        world.grid.set_code(IVec2::new(3, 4), 1);
        world.grid.set_code(IVec2::new(2, 3), 1);
        world.grid.set_code(IVec2::new(4, 3), 1);

        assert!(find_path(&world, IVec2::new(0, 0), IVec2::new(3, 3)).is_none());
    }

    #[test]
    fn test_same_cell_has_no_path() {
        let world = open_world();
        assert!(find_path(&world, IVec2::new(4, 4), IVec2::new(4, 4)).is_none());
    }

    #[test]
    fn test_out_of_bounds_goal() {
        let world = open_world();
        assert!(find_path(&world, IVec2::new(4, 4), IVec2::new(70, 4)).is_none());
    }

    #[test]
    fn test_closed_door_costs_extra() {
        let mut world = open_world();
        // Wall across x=5 with a single door in it
        for y in 0..64 {
            world.grid.set_code(IVec2::new(5, y), 1);
        }
        world.add_door(Door::new(IVec2::new(5, 5), DoorKind::Normal, DoorOrientation::AlongZ, 0.0));

        let start = IVec2::new(3, 5);
        let goal = IVec2::new(7, 5);
        let closed = find_path(&world, start, goal).unwrap();
        assert_eq!(closed.cost, manhattan(start, goal) + (CLOSED_DOOR_COST - STEP_COST));
        assert!(closed.cells.contains(&IVec2::new(5, 5)));

        world.doors.get_mut(IVec2::new(5, 5)).unwrap().open_amount = 1.0;
        let open = find_path(&world, start, goal).unwrap();
        assert_eq!(open.cost, manhattan(start, goal));
    }

    #[test]
    fn test_closed_door_detour_when_cheaper() {
        let mut world = open_world();
        // Closed door straight ahead, open gap one row down
        for y in 0..64 {
            world.grid.set_code(IVec2::new(5, y), 1);
        }
        world.add_door(Door::new(IVec2::new(5, 5), DoorKind::Normal, DoorOrientation::AlongZ, 0.0));
        world.grid.set_code(IVec2::new(5, 6), 0);

        let path = find_path(&world, IVec2::new(3, 5), IVec2::new(7, 5)).unwrap();
        // Through the door: 4 + 2 = 6, via the gap: 4 + 2 = 6; either is optimal
        assert_eq!(path.cost, 6);
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut world = open_world();
        // Long serpentine walls force a huge search
        for x in (2..62).step_by(2) {
            for y in 0..63 {
                let y = if (x / 2) % 2 == 0 { y } else { y + 1 };
                world.grid.set_code(IVec2::new(x, y), 1);
            }
        }
        assert!(find_path(&world, IVec2::new(0, 0), IVec2::new(63, 0)).is_none());
    }

    #[test]
    fn test_blocking_prop_routes_around() {
        let mut world = open_world();
        for y in 0..64 {
            if y != 5 && y != 6 {
                world.grid.set_code(IVec2::new(5, y), 1);
            }
        }
        world.add_static(crate::world::StaticProp::new(IVec2::new(5, 5), 1));

        let path = find_path(&world, IVec2::new(3, 5), IVec2::new(7, 5)).unwrap();
        assert!(!path.cells.contains(&IVec2::new(5, 5)));
        assert!(path.cells.contains(&IVec2::new(5, 6)));
    }

    #[test]
    fn test_cache_hits_and_invalidation() {
        let mut world = open_world();
        let mut cache = PathCache::new();
        let start = IVec2::new(1, 1);
        let goal = IVec2::new(6, 1);

        cache.begin_tick(1);
        assert!(cache.find(&world, start, goal).is_some());
        assert!(cache.find(&world, start, goal).is_some());
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);

        // A wall appears; the stale path is still served inside the window
        world.grid.set_code(IVec2::new(3, 0), 1);
        world.grid.set_code(IVec2::new(3, 1), 1);
        world.grid.set_code(IVec2::new(3, 2), 1);
        world.grid.set_code(IVec2::new(2, 2), 1);
        world.grid.set_code(IVec2::new(1, 2), 1);
        world.grid.set_code(IVec2::new(0, 2), 1);
        cache.begin_tick(14);
        assert!(cache.find(&world, start, goal).is_some());

        // Window elapsed: searches again and finds the enclosure
        cache.begin_tick(15);
        assert!(cache.is_empty());
        assert!(cache.find(&world, start, goal).is_none());
        assert_eq!(cache.misses(), 2);

        // Failures are cached as well
        assert!(cache.find(&world, start, goal).is_none());
        assert_eq!(cache.hits(), 3);
    }
}
