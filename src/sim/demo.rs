//! Built-in demo world
//!
//! A small overworld and one dungeon, enough to walk through every mode:
//! a cave leading into level 1, an item cave, a shortcut cave, a dungeon
//! with key, bombable and shutter doors, push blocks, a cellar and a
//! triforce room.

use super::collision::RoomLayout;
use super::level::{Level, LevelInfo, World};
use super::room::{RoomAttrs, WorldKind};
use super::tile::{TileBehavior, TileBehaviorTable};
use crate::consts::{COLUMNS, ROOM_COUNT, ROWS};
use crate::error::LevelError;
use crate::profile::item_id;

/// Tile codes used by the demo tile set
pub mod tiles {
    pub const FLOOR: u8 = 0x00;
    pub const ROCK: u8 = 0x01;
    pub const WATER: u8 = 0x02;
    pub const STAIRS: u8 = 0x03;
    pub const CAVE: u8 = 0x04;
    pub const WALL: u8 = 0x05;
    pub const SAND: u8 = 0x06;
    pub const BLOCK: u8 = 0x07;
    /// First of 16 armos statues
    pub const ARMOS: u8 = 0x10;
}

pub const OW_START_ROOM: u8 = 0x77;
/// Overworld room with the level 1 entrance
pub const DUNGEON_ENTRANCE_ROOM: u8 = 0x77;
pub const ITEM_CAVE_ROOM: u8 = 0x76;
pub const SHORTCUT_ROOMS: [u8; 3] = [0x75, 0x07, 0x3A];
/// Overworld room holding more monsters than the arena has slots
pub const CROWDED_ROOM: u8 = 0x67;
pub const WATER_ROOM: u8 = 0x78;

pub const UW_START_ROOM: u8 = 0x73;
pub const SHUTTER_ROOM: u8 = 0x63;
pub const TRIFORCE_ROOM: u8 = 0x53;
pub const STAIRS_ROOM: u8 = 0x74;
pub const KEY_ROOM: u8 = 0x72;
pub const CELLAR_ROOM: u8 = 0x0F;
/// Pushing the block opens the shutter
pub const BLOCK_DOOR_ROOM: u8 = 0x44;
/// Pushing the block uncovers stairs
pub const BLOCK_STAIRS_ROOM: u8 = 0x45;

const CELLAR_LAYOUT: u8 = 0x3E;

fn behaviors() -> TileBehaviorTable {
    let mut table = TileBehaviorTable::default();
    table.set(tiles::ROCK, TileBehavior::GenericSolid);
    table.set(tiles::WATER, TileBehavior::Water);
    table.set(tiles::STAIRS, TileBehavior::Stairs);
    table.set(tiles::CAVE, TileBehavior::Cave);
    table.set(tiles::WALL, TileBehavior::Wall);
    table.set(tiles::SAND, TileBehavior::Sand);
    table.set(tiles::BLOCK, TileBehavior::GenericSolid);
    for i in 0..16 {
        table.set(tiles::ARMOS + i, TileBehavior::Armos(i));
    }
    table
}

fn put(table: &mut [u8], room: u8, raw: [u8; RoomAttrs::LEN]) {
    let at = room as usize * RoomAttrs::LEN;
    table[at..at + RoomAttrs::LEN].copy_from_slice(&raw);
}

fn field() -> RoomLayout {
    let mut layout = [[tiles::FLOOR; COLUMNS]; ROWS];
    for (row, col) in [(3, 3), (3, 12), (7, 3), (7, 12)] {
        layout[row][col] = tiles::ROCK;
    }
    layout
}

fn field_with_cave() -> RoomLayout {
    let mut layout = [[tiles::FLOOR; COLUMNS]; ROWS];
    layout[3][6] = tiles::ROCK;
    layout[3][7] = tiles::CAVE;
    layout[3][8] = tiles::ROCK;
    layout
}

fn field_with_pond() -> RoomLayout {
    let mut layout = [[tiles::FLOOR; COLUMNS]; ROWS];
    for row in layout.iter_mut().take(7).skip(4) {
        for tile in row.iter_mut().take(11).skip(5) {
            *tile = tiles::WATER;
        }
    }
    layout
}

fn cave() -> RoomLayout {
    let mut layout = [[tiles::WALL; COLUMNS]; ROWS];
    for row in layout.iter_mut().take(10).skip(2) {
        for tile in row.iter_mut().take(14).skip(2) {
            *tile = tiles::FLOOR;
        }
    }
    layout[10][7] = tiles::FLOOR;
    layout[10][8] = tiles::FLOOR;
    layout
}

fn shortcut_cave() -> RoomLayout {
    let mut layout = cave();
    for col in [4, 7, 10] {
        layout[4][col] = tiles::STAIRS;
    }
    layout
}

/// Walled dungeon room; the door gaps are handled by door logic
fn dungeon_room() -> RoomLayout {
    let mut layout = [[tiles::WALL; COLUMNS]; ROWS];
    for row in layout.iter_mut().take(9).skip(2) {
        for tile in row.iter_mut().take(14).skip(2) {
            *tile = tiles::FLOOR;
        }
    }
    layout
}

fn dungeon_room_with_block() -> RoomLayout {
    let mut layout = dungeon_room();
    layout[5][7] = tiles::BLOCK;
    layout
}

fn dungeon_room_with_stairs() -> RoomLayout {
    let mut layout = dungeon_room();
    layout[3][12] = tiles::STAIRS;
    layout
}

fn overworld() -> Result<Level, LevelError> {
    let mut table = vec![0u8; ROOM_COUNT * RoomAttrs::LEN];
    for room in 0..ROOM_COUNT as u8 {
        put(&mut table, room, [0, 0x00, 0, 0, 0, 0, 0]);
    }
    // Exit spot 0x97: x 0x70, y 0x9D
    put(&mut table, DUNGEON_ENTRANCE_ROOM, [1, 0x00, 0, 0x97, 0x01, 0, 0]);
    put(&mut table, ITEM_CAVE_ROOM, [3, 0x00, 0, 0x97, 0x10, 0, 0]);
    put(&mut table, SHORTCUT_ROOMS[0], [3, 0x00, 0, 0x97, 0x13, 0x01, 0]);
    put(&mut table, SHORTCUT_ROOMS[1], [3, 0x00, 0, 0x97, 0x13, 0x02, 0]);
    put(&mut table, SHORTCUT_ROOMS[2], [3, 0x00, 0, 0x97, 0x13, 0x03, 0]);
    put(&mut table, CROWDED_ROOM, [0, 0xF5, 1, 0, 0, 0x08, 0]);
    put(&mut table, WATER_ROOM, [2, 0x00, 0, 0, 0, 0x04, 0]);
    put(&mut table, 0x66, [0, 0x20, 1, 0, 0, 0, 0]);

    let mut info = LevelInfo::new(0, OW_START_ROOM, 0x8D);
    info.shortcut_room_ids = SHORTCUT_ROOMS.to_vec();
    let layouts = vec![field(), field_with_cave(), field_with_pond(), field_with_cave()];
    Ok(Level::from_parts(WorldKind::Overworld, info, &table, layouts, behaviors())?
        .with_cave_layouts(cave(), shortcut_cave()))
}

/// Door selector byte for two sides
fn doors(low: u8, high: u8) -> u8 {
    low | (high << 3)
}

const OPEN: u8 = 0;
const NONE: u8 = 1;
const BOMBABLE: u8 = 4;
const KEY: u8 = 5;
const SHUTTER: u8 = 7;
const NO_ITEM: u8 = 3;

fn level_one() -> Result<Level, LevelError> {
    let mut table = vec![0u8; ROOM_COUNT * RoomAttrs::LEN];
    let walled = [0, 0x00, 0, doors(NONE, NONE), doors(NONE, NONE), NO_ITEM, 0];
    for room in 0..ROOM_COUNT as u8 {
        put(&mut table, room, walled);
    }
    // specific[0] = Down | Up << 3, specific[1] = Right | Left << 3
    put(&mut table, UW_START_ROOM, [0, 0x00, 0, doors(OPEN, OPEN), doors(BOMBABLE, KEY), NO_ITEM, 0]);
    put(
        &mut table,
        SHUTTER_ROOM,
        [0, 0x30, 2, doors(OPEN, SHUTTER), doors(NONE, NONE), NO_ITEM, 0x01],
    );
    put(
        &mut table,
        TRIFORCE_ROOM,
        [0, 0x00, 0, doors(SHUTTER, NONE), doors(NONE, NONE), item_id::TRIFORCE_PIECE, 0],
    );
    put(&mut table, STAIRS_ROOM, [1, 0x00, 0, doors(NONE, NONE), doors(NONE, BOMBABLE), NO_ITEM, 0x10]);
    put(&mut table, KEY_ROOM, [0, 0x00, 0, doors(NONE, NONE), doors(KEY, NONE), item_id::KEY, 0]);
    put(&mut table, CELLAR_ROOM, [CELLAR_LAYOUT, 0x00, 0, STAIRS_ROOM, KEY_ROOM, NO_ITEM, 0]);
    // Secret in the low bits, 0x08 marks the push block
    put(
        &mut table,
        BLOCK_DOOR_ROOM,
        [2, 0x00, 0, doors(NONE, SHUTTER), doors(NONE, NONE), NO_ITEM, 0x0C],
    );
    put(
        &mut table,
        BLOCK_STAIRS_ROOM,
        [2, 0x00, 0, doors(NONE, NONE), doors(NONE, NONE), NO_ITEM, 0x0D],
    );

    let mut info = LevelInfo::new(1, UW_START_ROOM, 0xDD);
    info.cellar_room_ids = vec![CELLAR_ROOM, 0xFF];
    info.block_tile = Some(tiles::BLOCK);
    let mut layouts = vec![dungeon_room(); CELLAR_LAYOUT as usize + 1];
    layouts[1] = dungeon_room_with_stairs();
    layouts[2] = dungeon_room_with_block();
    Level::from_parts(WorldKind::Underworld, info, &table, layouts, behaviors())
}

/// The overworld plus level 1
pub fn demo_world() -> Result<World, LevelError> {
    World::new(vec![overworld()?, level_one()?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;
    use crate::sim::doors::{DoorType, door_type, find_cellar_room};
    use crate::sim::room::Secret;

    #[test]
    fn test_demo_world_builds() {
        let world = demo_world().unwrap();
        assert_eq!(world.level_count(), 2);
        let ow = world.overworld();
        assert_eq!(ow.room_attrs(DUNGEON_ENTRANCE_ROOM).overworld().cave_id(), 1);
        assert_eq!(ow.room_attrs(CROWDED_ROOM).monster_count(), 15);
    }

    #[test]
    fn test_demo_doors() {
        let world = demo_world().unwrap();
        let uw = world.level(1).unwrap();
        assert_eq!(door_type(uw, UW_START_ROOM, Direction::Right), DoorType::Bombable);
        assert_eq!(door_type(uw, UW_START_ROOM, Direction::Left), DoorType::Key);
        assert_eq!(door_type(uw, UW_START_ROOM, Direction::Up), DoorType::Open);
        assert_eq!(door_type(uw, SHUTTER_ROOM, Direction::Up), DoorType::Shutter);
        assert_eq!(door_type(uw, TRIFORCE_ROOM, Direction::Down), DoorType::Shutter);
        assert_eq!(
            uw.room_attrs(SHUTTER_ROOM).underworld().secret(),
            Secret::FoesDoor
        );
        assert!(uw.room_attrs(STAIRS_ROOM).underworld().is_dark());
        let block_room = uw.room_attrs(BLOCK_DOOR_ROOM).underworld();
        assert!(block_room.has_block());
        assert_eq!(block_room.secret(), Secret::BlockDoor);
        assert_eq!(
            uw.room_attrs(BLOCK_STAIRS_ROOM).underworld().secret(),
            Secret::BlockStairs
        );
    }

    #[test]
    fn test_demo_cellar_links() {
        let world = demo_world().unwrap();
        let uw = world.level(1).unwrap();
        assert!(uw.is_cellar(CELLAR_ROOM));
        assert_eq!(find_cellar_room(uw, STAIRS_ROOM), Some((CELLAR_ROOM, true)));
        assert_eq!(find_cellar_room(uw, KEY_ROOM), Some((CELLAR_ROOM, false)));
        assert_eq!(find_cellar_room(uw, UW_START_ROOM), None);
    }
}
