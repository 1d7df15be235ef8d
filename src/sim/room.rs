//! Packed room attribute records
//!
//! A record is 7 bytes: unique room id, palettes and monster count,
//! monster list id, and 4 world-specific bytes. The world-specific bytes
//! mean different things in the overworld and the underworld, so the record
//! is only read through the view matching its level's world kind.

use serde::{Deserialize, Serialize};

use crate::Direction;

/// Which kind of world a level belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldKind {
    Overworld,
    Underworld,
}

/// Item id meaning "no item"
pub const NO_ITEM: u8 = 0x3F;
/// First unique room id used by underworld cellars
pub const FIRST_CELLAR_UNIQUE_ID: u8 = 0x3E;

/// Underworld room secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Secret {
    None,
    /// Shutters open once every foe is dead
    FoesDoor,
    /// Killing the leader kills the rest
    Ringleader,
    /// Shutters open when the power triforce is held
    LastBoss,
    BlockDoor,
    BlockStairs,
    MoneyOrLife,
    /// The room item appears once every foe is dead
    FoesItem,
}

impl Secret {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Secret::None,
            1 => Secret::FoesDoor,
            2 => Secret::Ringleader,
            3 => Secret::LastBoss,
            4 => Secret::BlockDoor,
            5 => Secret::BlockStairs,
            6 => Secret::MoneyOrLife,
            _ => Secret::FoesItem,
        }
    }
}

/// One room's packed attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAttrs {
    raw: [u8; RoomAttrs::LEN],
    kind: WorldKind,
}

impl RoomAttrs {
    pub const LEN: usize = 7;

    pub fn from_bytes(raw: [u8; Self::LEN], kind: WorldKind) -> Self {
        Self { raw, kind }
    }

    pub fn raw(&self) -> &[u8; Self::LEN] {
        &self.raw
    }

    pub fn world_kind(&self) -> WorldKind {
        self.kind
    }

    /// Layout id shared by rooms that look alike
    pub fn unique_room_id(&self) -> u8 {
        self.raw[0] & 0x7F
    }

    pub fn outer_palette(&self) -> u8 {
        self.raw[1] & 0x03
    }

    pub fn inner_palette(&self) -> u8 {
        (self.raw[1] >> 2) & 0x03
    }

    pub fn monster_count(&self) -> u8 {
        (self.raw[1] >> 4) & 0x0F
    }

    pub fn monster_list_id(&self) -> u8 {
        self.raw[2]
    }

    fn specific(&self) -> &[u8] {
        &self.raw[3..]
    }

    /// Overworld view; panics on an underworld record
    pub fn overworld(&self) -> OwRoomAttrs<'_> {
        assert_eq!(self.kind, WorldKind::Overworld, "underworld record read as overworld");
        OwRoomAttrs { attrs: self }
    }

    /// Underworld view; panics on an overworld record
    pub fn underworld(&self) -> UwRoomAttrs<'_> {
        assert_eq!(self.kind, WorldKind::Underworld, "overworld record read as underworld");
        UwRoomAttrs { attrs: self }
    }
}

/// Overworld reading of a room record
#[derive(Debug, Clone, Copy)]
pub struct OwRoomAttrs<'a> {
    attrs: &'a RoomAttrs,
}

impl OwRoomAttrs<'_> {
    /// Where the player appears when coming out of this room's cave
    pub fn exit_position(&self) -> u8 {
        self.attrs.specific()[0]
    }

    /// Cave id (0 for none); 1..=9 are dungeon entrances
    pub fn cave_id(&self) -> u8 {
        self.attrs.specific()[1] & 0x3F
    }

    pub fn shortcut_stairs_index(&self) -> u8 {
        self.attrs.specific()[2] & 0x03
    }

    pub fn has_zora(&self) -> bool {
        self.attrs.specific()[2] & 0x04 != 0
    }

    pub fn monsters_enter(&self) -> bool {
        self.attrs.specific()[2] & 0x08 != 0
    }

    pub fn has_ambient_sound(&self) -> bool {
        self.attrs.specific()[2] & 0x10 != 0
    }
}

/// Underworld reading of a room record
#[derive(Debug, Clone, Copy)]
pub struct UwRoomAttrs<'a> {
    attrs: &'a RoomAttrs,
}

impl UwRoomAttrs<'_> {
    /// 3-bit door selector for a side of the room
    pub fn door_selector(&self, dir: Direction) -> u8 {
        let s = self.attrs.specific();
        match dir {
            Direction::Right => s[1] & 7,
            Direction::Left => (s[1] >> 3) & 7,
            Direction::Down => s[0] & 7,
            Direction::Up => (s[0] >> 3) & 7,
            Direction::None => 1,
        }
    }

    /// Room entered when leaving a cellar on the left
    pub fn left_cellar_exit(&self) -> u8 {
        self.attrs.specific()[0]
    }

    pub fn right_cellar_exit(&self) -> u8 {
        self.attrs.specific()[1]
    }

    /// Room item id; `NO_ITEM` when the room has none
    pub fn item_id(&self) -> u8 {
        let id = self.attrs.specific()[2] & 0x1F;
        if id == 3 { NO_ITEM } else { id }
    }

    pub fn item_position_index(&self) -> u8 {
        (self.attrs.specific()[2] >> 5) & 3
    }

    pub fn secret(&self) -> Secret {
        Secret::from_bits(self.attrs.specific()[3])
    }

    pub fn has_block(&self) -> bool {
        self.attrs.specific()[3] & 0x08 != 0
    }

    pub fn is_dark(&self) -> bool {
        self.attrs.specific()[3] & 0x10 != 0
    }

    pub fn ambient_sound(&self) -> u8 {
        (self.attrs.specific()[3] >> 5) & 3
    }

    pub fn is_cellar(&self) -> bool {
        self.attrs.unique_room_id() >= FIRST_CELLAR_UNIQUE_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_common_fields() {
        let attrs = RoomAttrs::from_bytes([0x85, 0b0101_1110, 0x22, 0, 0, 0, 0], WorldKind::Overworld);
        assert_eq!(attrs.unique_room_id(), 0x05);
        assert_eq!(attrs.outer_palette(), 2);
        assert_eq!(attrs.inner_palette(), 3);
        assert_eq!(attrs.monster_count(), 5);
        assert_eq!(attrs.monster_list_id(), 0x22);
    }

    #[test]
    fn test_underworld_doors() {
        // Down=2, Up=5, Right=4, Left=7
        let attrs = RoomAttrs::from_bytes([0, 0, 0, 0b101_010, 0b111_100, 0, 0], WorldKind::Underworld);
        let uw = attrs.underworld();
        assert_eq!(uw.door_selector(Direction::Down), 2);
        assert_eq!(uw.door_selector(Direction::Up), 5);
        assert_eq!(uw.door_selector(Direction::Right), 4);
        assert_eq!(uw.door_selector(Direction::Left), 7);
        assert_eq!(uw.left_cellar_exit(), 0b101_010);
        assert_eq!(uw.right_cellar_exit(), 0b111_100);
    }

    #[test]
    fn test_underworld_flags() {
        let attrs = RoomAttrs::from_bytes([0x40, 0, 0, 0, 0, 0x4A, 0b0111_1001], WorldKind::Underworld);
        let uw = attrs.underworld();
        assert_eq!(uw.item_id(), 0x0A);
        assert_eq!(uw.item_position_index(), 2);
        assert_eq!(uw.secret(), Secret::FoesDoor);
        assert!(uw.has_block());
        assert!(uw.is_dark());
        assert_eq!(uw.ambient_sound(), 3);
        assert!(uw.is_cellar());
    }

    #[test]
    #[should_panic]
    fn test_wrong_view_panics() {
        let attrs = RoomAttrs::from_bytes([0; 7], WorldKind::Overworld);
        let _ = attrs.underworld();
    }

    proptest! {
        #[test]
        fn cave_id_ignores_top_bits(raw in any::<[u8; 7]>(), top in 0u8..4) {
            let mut other = raw;
            other[4] = (raw[4] & 0x3F) | (top << 6);
            let a = RoomAttrs::from_bytes(raw, WorldKind::Overworld);
            let b = RoomAttrs::from_bytes(other, WorldKind::Overworld);
            prop_assert_eq!(a.overworld().cave_id(), b.overworld().cave_id());
            prop_assert!(a.overworld().cave_id() < 0x40);
        }

        #[test]
        fn item_id_three_means_none(raw in any::<[u8; 7]>(), high in 0u8..8) {
            let mut raw = raw;
            raw[5] = 3 | (high << 5);
            let attrs = RoomAttrs::from_bytes(raw, WorldKind::Underworld);
            prop_assert_eq!(attrs.underworld().item_id(), NO_ITEM);
        }

        #[test]
        fn other_item_ids_are_items(raw in any::<[u8; 7]>(), item in 0u8..0x20, high in 0u8..8) {
            prop_assume!(item != 3);
            let mut raw = raw;
            raw[5] = item | (high << 5);
            let attrs = RoomAttrs::from_bytes(raw, WorldKind::Underworld);
            prop_assert_eq!(attrs.underworld().item_id(), item);
            prop_assert_ne!(attrs.underworld().item_id(), NO_ITEM);
        }

        #[test]
        fn unique_id_fits_seven_bits(raw in any::<[u8; 7]>()) {
            let attrs = RoomAttrs::from_bytes(raw, WorldKind::Underworld);
            prop_assert!(attrs.unique_room_id() < 0x80);
            prop_assert!(attrs.monster_count() < 16);
        }
    }
}
