//! Doors and room-to-room navigation
//!
//! Rooms sit on a 16x8 grid: row = id >> 4, col = id & 0xF. A door joins
//! two rooms, so opening one side also records the opposite side of the
//! neighbor room.

use serde::{Deserialize, Serialize};

use super::level::Level;
use crate::Direction;
use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorType {
    Open,
    /// Solid wall
    None,
    /// Walk-through wall, after pushing on it
    FalseWall,
    FalseWall2,
    Bombable,
    Key,
    Key2,
    Shutter,
}

impl DoorType {
    pub fn from_selector(selector: u8) -> Self {
        match selector & 7 {
            0 => DoorType::Open,
            1 => DoorType::None,
            2 => DoorType::FalseWall,
            3 => DoorType::FalseWall2,
            4 => DoorType::Bombable,
            5 => DoorType::Key,
            6 => DoorType::Key2,
            _ => DoorType::Shutter,
        }
    }

    /// Does this trigger open a door of this type?
    pub fn opened_by(self, trigger: DoorTrigger) -> bool {
        matches!(
            (self, trigger),
            (DoorType::Bombable, DoorTrigger::Explosion)
                | (DoorType::Key | DoorType::Key2, DoorTrigger::Key)
                | (DoorType::Shutter, DoorTrigger::RoomCleared)
        )
    }

    /// Can the door change between closed and open?
    pub fn has_state(self) -> bool {
        matches!(
            self,
            DoorType::Bombable | DoorType::Key | DoorType::Key2 | DoorType::Shutter
        )
    }
}

/// What caused a door to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorTrigger {
    Explosion,
    Key,
    RoomCleared,
}

/// Persistent per-room flags in the underworld
///
/// Bits 0-3: door opened (by direction bit), 0x10: item taken,
/// 0x20: visited, bits 6-7: remembered object count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UwRoomFlags(pub u8);

impl UwRoomFlags {
    const ITEM: u8 = 0x10;
    const VISITED: u8 = 0x20;

    pub fn door_state(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn set_door_state(&mut self, dir: Direction) {
        self.0 |= dir.bit();
    }

    pub fn item_taken(self) -> bool {
        self.0 & Self::ITEM != 0
    }

    pub fn set_item_taken(&mut self) {
        self.0 |= Self::ITEM;
    }

    pub fn visited(self) -> bool {
        self.0 & Self::VISITED != 0
    }

    pub fn set_visited(&mut self) {
        self.0 |= Self::VISITED;
    }

    pub fn object_count(self) -> u8 {
        self.0 >> 6
    }

    pub fn set_object_count(&mut self, count: u8) {
        self.0 = (self.0 & 0x3F) | ((count & 3) << 6);
    }
}

/// Room on the other side of `dir`; `None` past the edge of the world
pub fn next_room_id(room_id: u8, dir: Direction) -> Option<u8> {
    let row = room_id >> 4;
    let col = room_id & 0xF;
    let (row, col) = match dir {
        Direction::Right if col + 1 < WORLD_WIDTH => (row, col + 1),
        Direction::Left if col > 0 => (row, col - 1),
        Direction::Down if row + 1 < WORLD_HEIGHT => (row + 1, col),
        Direction::Up if row > 0 => (row - 1, col),
        _ => return None,
    };
    Some((row << 4) | col)
}

/// Door on a side of an underworld room
pub fn door_type(level: &Level, room_id: u8, dir: Direction) -> DoorType {
    DoorType::from_selector(level.room_attrs(room_id).underworld().door_selector(dir))
}

/// Is the door on a side of a room open right now?
pub fn door_is_open(level: &Level, flags: &[UwRoomFlags], room_id: u8, dir: Direction) -> bool {
    match door_type(level, room_id, dir) {
        DoorType::Open => true,
        t if t.has_state() => flags[room_id as usize].door_state(dir),
        _ => false,
    }
}

/// Open a closed door with a trigger
///
/// Returns false when the trigger doesn't fit the door type or the door is
/// already open. Only the open bits change; the door's type never does.
pub fn open_door(
    flags: &mut [UwRoomFlags],
    room_id: u8,
    dir: Direction,
    door: DoorType,
    trigger: DoorTrigger,
) -> bool {
    if !door.opened_by(trigger) || flags[room_id as usize].door_state(dir) {
        return false;
    }
    flags[room_id as usize].set_door_state(dir);
    if let Some(next) = next_room_id(room_id, dir) {
        flags[next as usize].set_door_state(dir.opposite());
    }
    log::debug!("door {dir:?} of room {room_id:#04x} opened by {trigger:?}");
    true
}

/// Cellar reached by stairs in a main room, and whether the room is
/// the cellar's left exit
pub fn find_cellar_room(level: &Level, main_room_id: u8) -> Option<(u8, bool)> {
    for &cellar in level.info.cellar_room_ids.iter() {
        if cellar >= 0x80 {
            break;
        }
        let uw = level.room_attrs(cellar).underworld();
        if uw.left_cellar_exit() == main_room_id {
            return Some((cellar, true));
        }
        if uw.right_cellar_exit() == main_room_id {
            return Some((cellar, false));
        }
    }
    None
}
