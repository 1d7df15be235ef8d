//! Player save profiles
//!
//! A profile holds the inventory, hearts and the per-room flags that make
//! the world remember what the player already did. Stores persist profiles
//! by slot; the simulation only talks to the `ProfileStore` trait.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{HEART_UNITS, ROOM_COUNT};
use crate::error::StorageError;
use crate::sim::UwRoomFlags;

/// Number of profile slots on the game menu
pub const PROFILE_SLOTS: usize = 3;
/// Heart containers of a fresh profile
pub const DEFAULT_HEARTS: u8 = 3;

/// Item ids as stored in room records
pub mod item_id {
    pub const BOMB: u8 = 0x00;
    pub const WOOD_SWORD: u8 = 0x01;
    pub const WHITE_SWORD: u8 = 0x02;
    pub const MAGIC_SWORD: u8 = 0x03;
    pub const RECORDER: u8 = 0x05;
    pub const BLUE_CANDLE: u8 = 0x06;
    pub const RED_CANDLE: u8 = 0x07;
    pub const MAGIC_KEY: u8 = 0x0B;
    pub const LADDER: u8 = 0x0D;
    pub const POWER_TRIFORCE: u8 = 0x0E;
    pub const FIVE_RUPEES: u8 = 0x0F;
    pub const COMPASS: u8 = 0x16;
    pub const MAP: u8 = 0x17;
    pub const RUPEE: u8 = 0x18;
    pub const KEY: u8 = 0x19;
    pub const HEART_CONTAINER: u8 = 0x1A;
    pub const TRIFORCE_PIECE: u8 = 0x1B;
    pub const HEART: u8 = 0x22;
}

/// Item used with the B button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectedItem {
    #[default]
    Bombs,
    Candle,
    Recorder,
}

/// What picking up an item means for the game flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pickup {
    Plain,
    TriforcePiece,
    PowerTriforce,
}

/// Persistent per-room flags in the overworld
///
/// Bits 0-2: object count, 0x10: item taken, 0x20: shortcut taken,
/// 0x80: secret found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwRoomFlags(pub u8);

impl OwRoomFlags {
    pub fn item_taken(self) -> bool {
        self.0 & 0x10 != 0
    }

    pub fn set_item_taken(&mut self) {
        self.0 |= 0x10;
    }

    pub fn shortcut_taken(self) -> bool {
        self.0 & 0x20 != 0
    }

    pub fn set_shortcut_taken(&mut self) {
        self.0 |= 0x20;
    }

    pub fn secret_found(self) -> bool {
        self.0 & 0x80 != 0
    }

    pub fn set_secret_found(&mut self) {
        self.0 |= 0x80;
    }

    pub fn object_count(self) -> u8 {
        self.0 & 7
    }

    pub fn set_object_count(&mut self, count: u8) {
        self.0 = (self.0 & !7) | (count & 7);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub sword: u8,
    pub bombs: u8,
    pub max_bombs: u8,
    pub candle: u8,
    pub recorder: bool,
    pub ladder: bool,
    pub magic_key: bool,
    pub keys: u8,
    pub rupees: u8,
    pub heart_containers: u8,
    /// One bit per dungeon level
    pub triforce_pieces: u8,
    pub power_triforce: bool,
    /// One bit per dungeon level
    pub compasses: u16,
    pub maps: u16,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            sword: 0,
            bombs: 0,
            max_bombs: 8,
            candle: 0,
            recorder: false,
            ladder: false,
            magic_key: false,
            keys: 0,
            rupees: 0,
            heart_containers: DEFAULT_HEARTS,
            triforce_pieces: 0,
            power_triforce: false,
            compasses: 0,
            maps: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub quest: u8,
    pub deaths: u8,
    /// Health in 1/256 heart units
    pub hearts: u16,
    pub items: Inventory,
    pub selected_item: SelectedItem,
    pub ow_flags: Vec<OwRoomFlags>,
    /// Room flags for levels 1-6 and 7-9
    pub uw_flags: [Vec<UwRoomFlags>; 2],
}

impl Default for Profile {
    fn default() -> Self {
        Self::new("LINK")
    }
}

impl Profile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quest: 0,
            deaths: 0,
            hearts: Self::max_hearts_value_for(DEFAULT_HEARTS),
            items: Inventory::default(),
            selected_item: SelectedItem::default(),
            ow_flags: vec![OwRoomFlags::default(); ROOM_COUNT],
            uw_flags: [
                vec![UwRoomFlags::default(); ROOM_COUNT],
                vec![UwRoomFlags::default(); ROOM_COUNT],
            ],
        }
    }

    /// Full health for a number of heart containers
    pub fn max_hearts_value_for(containers: u8) -> u16 {
        (u16::from(containers.max(1)) - 1) * HEART_UNITS | 0xFF
    }

    pub fn max_hearts_value(&self) -> u16 {
        Self::max_hearts_value_for(self.items.heart_containers)
    }

    pub fn refill_hearts(&mut self) {
        self.hearts = self.max_hearts_value();
    }

    pub fn is_dead(&self) -> bool {
        self.hearts == 0
    }

    /// Take damage; health never wraps below zero
    pub fn take_damage(&mut self, amount: u16) {
        self.hearts = self.hearts.saturating_sub(amount);
    }

    /// Room flag block for a dungeon level
    pub fn uw_flags(&self, level: u8) -> &[UwRoomFlags] {
        &self.uw_flags[Self::uw_block(level)]
    }

    pub fn uw_flags_mut(&mut self, level: u8) -> &mut [UwRoomFlags] {
        &mut self.uw_flags[Self::uw_block(level)]
    }

    fn uw_block(level: u8) -> usize {
        if level >= 7 { 1 } else { 0 }
    }

    /// Spend a key on a locked door
    pub fn use_key(&mut self) -> bool {
        if self.items.magic_key {
            true
        } else if self.items.keys > 0 {
            self.items.keys -= 1;
            true
        } else {
            false
        }
    }

    /// Add a picked-up item to the inventory
    pub fn take_item(&mut self, item: u8, level: u8) -> Pickup {
        let level_bit = 1u16 << level.min(15);
        match item {
            item_id::BOMB => {
                self.items.bombs = self.items.bombs.saturating_add(4).min(self.items.max_bombs);
            }
            item_id::WOOD_SWORD..=item_id::MAGIC_SWORD => {
                self.items.sword = self.items.sword.max(item);
            }
            item_id::RECORDER => self.items.recorder = true,
            item_id::BLUE_CANDLE | item_id::RED_CANDLE => {
                self.items.candle = self.items.candle.max(item - item_id::BLUE_CANDLE + 1);
            }
            item_id::MAGIC_KEY => self.items.magic_key = true,
            item_id::LADDER => self.items.ladder = true,
            item_id::POWER_TRIFORCE => {
                self.items.power_triforce = true;
                return Pickup::PowerTriforce;
            }
            item_id::FIVE_RUPEES => self.items.rupees = self.items.rupees.saturating_add(5),
            item_id::RUPEE => self.items.rupees = self.items.rupees.saturating_add(1),
            item_id::COMPASS => self.items.compasses |= level_bit,
            item_id::MAP => self.items.maps |= level_bit,
            item_id::KEY => self.items.keys = self.items.keys.saturating_add(1),
            item_id::HEART_CONTAINER => {
                self.items.heart_containers = (self.items.heart_containers + 1).min(16);
                self.hearts = self.hearts.saturating_add(HEART_UNITS).min(self.max_hearts_value());
            }
            item_id::TRIFORCE_PIECE => {
                self.items.triforce_pieces |= 1 << (level.saturating_sub(1) & 7);
                return Pickup::TriforcePiece;
            }
            item_id::HEART => {
                self.hearts = self.hearts.saturating_add(HEART_UNITS).min(self.max_hearts_value());
            }
            other => log::debug!("item {other:#04x} has no inventory effect"),
        }
        Pickup::Plain
    }
}

/// Where profiles live between sessions
pub trait ProfileStore {
    fn read_profile(&mut self, slot: usize) -> Result<Option<Profile>, StorageError>;
    fn write_profile(&mut self, slot: usize, profile: &Profile) -> Result<(), StorageError>;
    fn delete_profile(&mut self, slot: usize) -> Result<(), StorageError>;
}

/// Profiles kept in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    slots: [Option<Profile>; PROFILE_SLOTS],
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_slot(slot: usize) -> Result<(), StorageError> {
    if slot < PROFILE_SLOTS {
        Ok(())
    } else {
        Err(StorageError::BadSlot(slot))
    }
}

impl ProfileStore for MemoryProfileStore {
    fn read_profile(&mut self, slot: usize) -> Result<Option<Profile>, StorageError> {
        check_slot(slot)?;
        Ok(self.slots[slot].clone())
    }

    fn write_profile(&mut self, slot: usize, profile: &Profile) -> Result<(), StorageError> {
        check_slot(slot)?;
        self.slots[slot] = Some(profile.clone());
        Ok(())
    }

    fn delete_profile(&mut self, slot: usize) -> Result<(), StorageError> {
        check_slot(slot)?;
        self.slots[slot] = None;
        Ok(())
    }
}

/// Profiles stored as JSON files in a directory
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    dir: PathBuf,
}

impl JsonProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, slot: usize) -> PathBuf {
        self.dir.join(format!("profile{slot}.json"))
    }
}

impl ProfileStore for JsonProfileStore {
    fn read_profile(&mut self, slot: usize) -> Result<Option<Profile>, StorageError> {
        check_slot(slot)?;
        let path = self.path(slot);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        let profile = serde_json::from_str(&json)?;
        log::info!("Loaded profile from {}", path.display());
        Ok(Some(profile))
    }

    fn write_profile(&mut self, slot: usize, profile: &Profile) -> Result<(), StorageError> {
        check_slot(slot)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(profile)?;
        fs::write(self.path(slot), json)?;
        log::info!("Profile {slot} saved");
        Ok(())
    }

    fn delete_profile(&mut self, slot: usize) -> Result<(), StorageError> {
        check_slot(slot)?;
        let path = self.path(slot);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    #[test]
    fn test_max_hearts_value() {
        assert_eq!(Profile::max_hearts_value_for(3), 0x2FF);
        assert_eq!(Profile::max_hearts_value_for(1), 0x0FF);
        let profile = Profile::default();
        assert_eq!(profile.hearts, 0x2FF);
    }

    #[test]
    fn test_damage_saturates() {
        let mut profile = Profile::default();
        profile.hearts = 0x40;
        profile.take_damage(0x80);
        assert!(profile.is_dead());
    }

    #[test]
    fn test_uw_flag_blocks() {
        let mut profile = Profile::default();
        profile.uw_flags_mut(2)[0x10].set_door_state(Direction::Up);
        assert!(profile.uw_flags(6)[0x10].door_state(Direction::Up));
        assert!(!profile.uw_flags(7)[0x10].door_state(Direction::Up));
    }

    #[test]
    fn test_keys() {
        let mut profile = Profile::default();
        assert!(!profile.use_key());
        profile.take_item(item_id::KEY, 1);
        assert!(profile.use_key());
        assert_eq!(profile.items.keys, 0);
        profile.items.magic_key = true;
        assert!(profile.use_key());
    }

    #[test]
    fn test_triforce_pickups() {
        let mut profile = Profile::default();
        assert_eq!(profile.take_item(item_id::TRIFORCE_PIECE, 3), Pickup::TriforcePiece);
        assert_eq!(profile.items.triforce_pieces, 0b100);
        assert_eq!(profile.take_item(item_id::POWER_TRIFORCE, 9), Pickup::PowerTriforce);
        assert_eq!(profile.take_item(item_id::RUPEE, 1), Pickup::Plain);
    }

    #[test]
    fn test_ow_flags() {
        let mut flags = OwRoomFlags::default();
        flags.set_object_count(5);
        flags.set_secret_found();
        assert_eq!(flags.0, 0x85);
        assert!(!flags.item_taken());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryProfileStore::new();
        assert_eq!(store.read_profile(0).unwrap(), None);
        let profile = Profile::new("ZELDA");
        store.write_profile(1, &profile).unwrap();
        assert_eq!(store.read_profile(1).unwrap(), Some(profile));
        store.delete_profile(1).unwrap();
        assert_eq!(store.read_profile(1).unwrap(), None);
        assert!(matches!(store.read_profile(3), Err(StorageError::BadSlot(3))));
    }

    #[test]
    fn test_profile_json_round_trip() {
        let mut profile = Profile::new("ZELDA");
        profile.uw_flags_mut(8)[0x44].set_visited();
        let json = serde_json::to_string(&profile).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
