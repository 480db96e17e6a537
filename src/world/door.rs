//! Door controller
//!
//! Doors slide open continuously; collision, sight and pathfinding only care
//! whether the open amount has crossed the passable threshold, sound only
//! whether it has crossed the (much lower) sound threshold.

use glam::IVec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{EventQueue, SimEvent, SoundCue};
use crate::player::{KeyKind, KeyRing};
use crate::world::grid::cell_center;

/// Open fraction at which a door stops blocking movement and sight
pub const DOOR_PASSABLE_THRESHOLD: f32 = 0.8;
/// Open fraction at which a door stops muffling sound
pub const DOOR_SOUND_THRESHOLD: f32 = 0.3;
/// Open fraction gained per second while opening (and lost while closing)
pub const DOOR_SPEED: f32 = 1.25;
/// Seconds a fully open door waits before closing
pub const DOOR_CLOSE_DELAY: f32 = 4.5;

/// Door material / lock type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DoorKind {
    /// Plain door
    #[default]
    Normal,
    /// Needs the gold key
    Gold,
    /// Needs the silver key
    Silver,
    /// Elevator door (opens like a plain door)
    Elevator,
}

impl DoorKind {
    /// Key the player must hold to open this door
    #[must_use]
    pub const fn required_key(self) -> Option<KeyKind> {
        match self {
            Self::Gold => Some(KeyKind::Gold),
            Self::Silver => Some(KeyKind::Silver),
            Self::Normal | Self::Elevator => None,
        }
    }
}

/// Axis a door panel slides along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DoorOrientation {
    /// Panel slides along the X axis
    #[default]
    AlongX,
    /// Panel slides along the Z axis
    AlongZ,
}

/// Result of an open request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorOpenOutcome {
    /// The door started (or resumed) opening
    Opening,
    /// The door was already open or opening; its close delay was refreshed
    AlreadyOpen,
    /// The door needs a key the requester does not hold
    Locked(KeyKind),
    /// The requester is not allowed to operate doors
    Refused,
    /// There is no door in that cell
    NoDoor,
}

/// A sliding door occupying one grid cell
#[derive(Debug, Clone)]
pub struct Door {
    /// Grid cell the door occupies
    pub cell: IVec2,
    /// Lock type
    pub kind: DoorKind,
    /// Slide axis
    pub orientation: DoorOrientation,
    /// Open fraction in [0, 1]
    pub open_amount: f32,
    /// Currently animating open
    pub opening: bool,
    /// Currently animating closed
    pub closing: bool,
    /// Fully open and waiting to close
    pub open: bool,
    /// Seconds left before a fully open door starts closing
    pub close_timer: f32,
    /// Floor height the door stands on
    pub floor_height: f32,
}

impl Door {
    /// Create a closed door
    #[must_use]
    pub fn new(cell: IVec2, kind: DoorKind, orientation: DoorOrientation, floor_height: f32) -> Self {
        Self {
            cell,
            kind,
            orientation,
            open_amount: 0.0,
            opening: false,
            closing: false,
            open: false,
            close_timer: 0.0,
            floor_height,
        }
    }

    /// Open far enough to walk and see through
    #[must_use]
    pub fn is_passable(&self) -> bool {
        self.open_amount >= DOOR_PASSABLE_THRESHOLD
    }

    /// Open far enough to let sound through
    #[must_use]
    pub fn passes_sound(&self) -> bool {
        self.open_amount >= DOOR_SOUND_THRESHOLD
    }

    /// Begin opening. Returns `true` if the door was not already on its way open.
    fn start_opening(&mut self) -> bool {
        if self.open || self.opening {
            self.close_timer = DOOR_CLOSE_DELAY;
            return false;
        }
        self.opening = true;
        self.closing = false;
        true
    }

    /// Advance the animation by `dt`. Returns a cue when the door starts closing.
    fn update(&mut self, dt: f32, occupied: bool) -> Option<SoundCue> {
        if self.opening {
            self.open_amount = (self.open_amount + DOOR_SPEED * dt).min(1.0);
            if self.open_amount >= 1.0 {
                self.opening = false;
                self.open = true;
                self.close_timer = DOOR_CLOSE_DELAY;
            }
            return None;
        }

        if self.open {
            self.close_timer -= dt;
            if self.close_timer > 0.0 {
                return None;
            }
            if occupied {
                self.close_timer = DOOR_CLOSE_DELAY;
                return None;
            }
            self.open = false;
            self.closing = true;
            return Some(SoundCue::DoorClose);
        }

        if self.closing {
            if occupied {
                self.closing = false;
                self.opening = true;
                return None;
            }
            self.open_amount = (self.open_amount - DOOR_SPEED * dt).max(0.0);
            if self.open_amount <= 0.0 {
                self.closing = false;
            }
        }

        None
    }
}

/// All doors of a level, indexed by cell
#[derive(Debug, Clone, Default)]
pub struct DoorSet {
    doors: Vec<Door>,
    index: FxHashMap<IVec2, usize>,
}

impl DoorSet {
    /// Create an empty door set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a door, replacing any door already in that cell
    pub fn insert(&mut self, door: Door) {
        if let Some(&i) = self.index.get(&door.cell) {
            self.doors[i] = door;
        } else {
            self.index.insert(door.cell, self.doors.len());
            self.doors.push(door);
        }
    }

    /// Door in a cell
    #[must_use]
    pub fn get(&self, cell: IVec2) -> Option<&Door> {
        self.index.get(&cell).map(|&i| &self.doors[i])
    }

    /// Door in a cell (mutable)
    pub fn get_mut(&mut self, cell: IVec2) -> Option<&mut Door> {
        self.index.get(&cell).map(|&i| &mut self.doors[i])
    }

    /// Iterate over all doors
    pub fn iter(&self) -> impl Iterator<Item = &Door> {
        self.doors.iter()
    }

    /// Number of doors
    #[must_use]
    pub fn len(&self) -> usize {
        self.doors.len()
    }

    /// Check if there are no doors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    /// Player-initiated open, gated by key possession
    pub fn try_open(&mut self, cell: IVec2, keys: &KeyRing, events: &mut EventQueue) -> DoorOpenOutcome {
        let Some(door) = self.get_mut(cell) else {
            return DoorOpenOutcome::NoDoor;
        };

        if let Some(key) = door.kind.required_key().filter(|&key| !keys.has(key)) {
            log::debug!("door at {cell} needs the {key:?} key");
            events.push(SimEvent::DoorLocked { cell, requires: key });
            events.push(SimEvent::PlaySound {
                cue: SoundCue::DoorLocked,
                position: cell_center(cell),
            });
            return DoorOpenOutcome::Locked(key);
        }

        Self::open_door(door, events)
    }

    /// Enemy-initiated open; `authorized` is the enemy kind's door capability
    pub fn enemy_try_open(&mut self, cell: IVec2, authorized: bool, events: &mut EventQueue) -> DoorOpenOutcome {
        if !authorized {
            return DoorOpenOutcome::Refused;
        }
        match self.get_mut(cell) {
            Some(door) => Self::open_door(door, events),
            None => DoorOpenOutcome::NoDoor,
        }
    }

    fn open_door(door: &mut Door, events: &mut EventQueue) -> DoorOpenOutcome {
        if door.start_opening() {
            log::debug!("door at {} opening", door.cell);
            events.push(SimEvent::PlaySound {
                cue: SoundCue::DoorOpen,
                position: cell_center(door.cell),
            });
            DoorOpenOutcome::Opening
        } else {
            DoorOpenOutcome::AlreadyOpen
        }
    }

    /// Advance every door's animation.
    ///
    /// `occupied` reports whether something stands in a door cell; occupied doors
    /// never close on their occupant.
    pub fn update(&mut self, dt: f32, occupied: impl Fn(IVec2) -> bool, events: &mut EventQueue) {
        for door in &mut self.doors {
            if let Some(cue) = door.update(dt, occupied(door.cell)) {
                log::debug!("door at {} closing", door.cell);
                events.push(SimEvent::PlaySound {
                    cue,
                    position: cell_center(door.cell),
                });
            }
        }
    }
}
