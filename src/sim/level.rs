//! Level data
//!
//! A world is the overworld (level 0) plus up to nine dungeons. Each level
//! carries its room records, the layouts they point at, and the tile
//! behavior table for its tile set. Everything is validated on construction
//! so the simulation can index freely afterwards.

use serde::{Deserialize, Serialize};

use super::collision::{RoomLayout, TileMap};
use super::room::{RoomAttrs, WorldKind};
use super::tile::TileBehaviorTable;
use crate::consts::{COLUMNS, ROOM_COUNT, ROWS};
use crate::error::LevelError;

/// Per-level information block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level_number: u8,
    pub start_room_id: u8,
    /// Player y when the level starts
    pub start_y: i32,
    /// Cellar rooms; ids at or above 0x80 end the list
    pub cellar_room_ids: Vec<u8>,
    /// Overworld rooms joined by shortcut caves
    pub shortcut_room_ids: Vec<u8>,
    /// Tile code of the push block in rooms flagged with one
    #[serde(default)]
    pub block_tile: Option<u8>,
}

impl LevelInfo {
    pub fn new(level_number: u8, start_room_id: u8, start_y: i32) -> Self {
        Self {
            level_number,
            start_room_id,
            start_y,
            cellar_room_ids: Vec::new(),
            shortcut_room_ids: Vec::new(),
            block_tile: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub kind: WorldKind,
    pub info: LevelInfo,
    rooms: Vec<RoomAttrs>,
    layouts: Vec<RoomLayout>,
    pub behaviors: TileBehaviorTable,
    /// Layout used for overworld caves
    pub cave_layout: RoomLayout,
    /// Cave layout with one stairs tile per shortcut
    pub shortcut_cave_layout: RoomLayout,
}

impl Level {
    /// Build a level from a packed room table (128 records of 7 bytes)
    pub fn from_parts(
        kind: WorldKind,
        info: LevelInfo,
        attr_table: &[u8],
        layouts: Vec<RoomLayout>,
        behaviors: TileBehaviorTable,
    ) -> Result<Self, LevelError> {
        let expected = ROOM_COUNT * RoomAttrs::LEN;
        if attr_table.len() != expected {
            return Err(LevelError::BadAttrTableLength {
                expected,
                actual: attr_table.len(),
            });
        }
        if info.start_room_id as usize >= ROOM_COUNT {
            return Err(LevelError::BadStartRoom(info.start_room_id));
        }
        let listed_cellars = info.cellar_room_ids.iter().take_while(|&&id| id < 0x80).count();
        for &room in &info.shortcut_room_ids {
            check_room_id("shortcut list", room)?;
        }

        let mut rooms = Vec::with_capacity(ROOM_COUNT);
        for (room, chunk) in attr_table.chunks_exact(RoomAttrs::LEN).enumerate() {
            let mut raw = [0u8; RoomAttrs::LEN];
            raw.copy_from_slice(chunk);
            let attrs = RoomAttrs::from_bytes(raw, kind);
            let unique_id = attrs.unique_room_id();
            if unique_id as usize >= layouts.len() {
                return Err(LevelError::MissingLayout {
                    room: room as u8,
                    unique_id,
                });
            }
            if kind == WorldKind::Underworld && attrs.underworld().is_cellar() {
                let uw = attrs.underworld();
                check_room_id("cellar left exit", uw.left_cellar_exit())?;
                check_room_id("cellar right exit", uw.right_cellar_exit())?;
            }
            rooms.push(attrs);
        }

        log::debug!(
            "level {} built: {:?}, {} layouts, {} cellars",
            info.level_number,
            kind,
            layouts.len(),
            listed_cellars
        );
        Ok(Self {
            kind,
            info,
            rooms,
            layouts,
            behaviors,
            cave_layout: [[0; COLUMNS]; ROWS],
            shortcut_cave_layout: [[0; COLUMNS]; ROWS],
        })
    }

    pub fn with_cave_layouts(mut self, cave: RoomLayout, shortcut: RoomLayout) -> Self {
        self.cave_layout = cave;
        self.shortcut_cave_layout = shortcut;
        self
    }

    pub fn number(&self) -> u8 {
        self.info.level_number
    }

    pub fn is_overworld(&self) -> bool {
        self.kind == WorldKind::Overworld
    }

    pub fn room_attrs(&self, room_id: u8) -> &RoomAttrs {
        &self.rooms[room_id as usize & 0x7F]
    }

    pub fn layout(&self, room_id: u8) -> &RoomLayout {
        &self.layouts[self.room_attrs(room_id).unique_room_id() as usize]
    }

    /// Fresh tile map for a room
    pub fn tile_map(&self, room_id: u8) -> TileMap {
        TileMap::new(*self.layout(room_id), self.kind)
    }

    pub fn cave_tile_map(&self) -> TileMap {
        TileMap::new(self.cave_layout, WorldKind::Overworld)
    }

    pub fn shortcut_cave_tile_map(&self) -> TileMap {
        TileMap::new(self.shortcut_cave_layout, WorldKind::Overworld)
    }

    /// Is the room an underworld cellar?
    pub fn is_cellar(&self, room_id: u8) -> bool {
        self.kind == WorldKind::Underworld && self.room_attrs(room_id).underworld().is_cellar()
    }
}

fn check_room_id(what: &'static str, room: u8) -> Result<(), LevelError> {
    if room as usize >= ROOM_COUNT {
        return Err(LevelError::RoomOutOfRange { what, room });
    }
    Ok(())
}

/// All levels of a quest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    levels: Vec<Level>,
}

impl World {
    /// Level 0 must be the overworld; every other level is a dungeon
    pub fn new(levels: Vec<Level>) -> Result<Self, LevelError> {
        let Some(first) = levels.first() else {
            return Err(LevelError::NoOverworld);
        };
        if first.kind != WorldKind::Overworld {
            return Err(LevelError::NoOverworld);
        }
        for (index, level) in levels.iter().enumerate().skip(1) {
            if level.kind != WorldKind::Underworld {
                return Err(LevelError::WrongWorldKind {
                    index,
                    expected: WorldKind::Underworld,
                });
            }
        }
        Ok(Self { levels })
    }

    pub fn level(&self, index: u8) -> Option<&Level> {
        self.levels.get(index as usize)
    }

    pub fn overworld(&self) -> &Level {
        &self.levels[0]
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_table() -> Vec<u8> {
        vec![0u8; ROOM_COUNT * RoomAttrs::LEN]
    }

    fn blank_layouts(n: usize) -> Vec<RoomLayout> {
        vec![[[0u8; COLUMNS]; ROWS]; n]
    }

    #[test]
    fn test_rejects_short_table() {
        let err = Level::from_parts(
            WorldKind::Overworld,
            LevelInfo::new(0, 0x77, 0x8D),
            &[0u8; 10],
            blank_layouts(1),
            TileBehaviorTable::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            LevelError::BadAttrTableLength {
                expected: 896,
                actual: 10
            }
        );
    }

    #[test]
    fn test_rejects_missing_layout() {
        let mut table = blank_table();
        table[5 * RoomAttrs::LEN] = 2;
        let err = Level::from_parts(
            WorldKind::Underworld,
            LevelInfo::new(1, 0x73, 0x8D),
            &table,
            blank_layouts(2),
            TileBehaviorTable::default(),
        )
        .unwrap_err();
        assert_eq!(err, LevelError::MissingLayout { room: 5, unique_id: 2 });
    }

    #[test]
    fn test_rejects_bad_start_room() {
        let err = Level::from_parts(
            WorldKind::Underworld,
            LevelInfo::new(1, 0x80, 0x8D),
            &blank_table(),
            blank_layouts(1),
            TileBehaviorTable::default(),
        )
        .unwrap_err();
        assert_eq!(err, LevelError::BadStartRoom(0x80));
    }

    #[test]
    fn test_rejects_cellar_exit_outside_world() {
        let mut table = blank_table();
        let cellar = 0x0F * RoomAttrs::LEN;
        table[cellar..cellar + RoomAttrs::LEN].copy_from_slice(&[0x3E, 0, 0, 0x22, 0xF2, 3, 0]);
        let mut info = LevelInfo::new(1, 0x73, 0x8D);
        info.cellar_room_ids = vec![0x0F, 0xFF];
        let err = Level::from_parts(
            WorldKind::Underworld,
            info,
            &table,
            blank_layouts(0x3F),
            TileBehaviorTable::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            LevelError::RoomOutOfRange {
                what: "cellar right exit",
                room: 0xF2
            }
        );
    }

    #[test]
    fn test_rejects_shortcut_outside_world() {
        let mut info = LevelInfo::new(0, 0x77, 0x8D);
        info.shortcut_room_ids = vec![0x0E, 0x90];
        let err = Level::from_parts(
            WorldKind::Overworld,
            info,
            &blank_table(),
            blank_layouts(1),
            TileBehaviorTable::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            LevelError::RoomOutOfRange {
                what: "shortcut list",
                room: 0x90
            }
        );
    }

    #[test]
    fn test_world_needs_overworld_first() {
        let uw = Level::from_parts(
            WorldKind::Underworld,
            LevelInfo::new(1, 0x73, 0x8D),
            &blank_table(),
            blank_layouts(1),
            TileBehaviorTable::default(),
        )
        .unwrap();
        assert_eq!(World::new(vec![uw]).unwrap_err(), LevelError::NoOverworld);
        assert_eq!(World::new(Vec::new()).unwrap_err(), LevelError::NoOverworld);
    }
}
