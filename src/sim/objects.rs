//! Fixed-capacity object arena
//!
//! 26 slots: a pool of 11 monster slots followed by one slot per reserved
//! role. Timers live alongside the slots and keep counting whether or not
//! an object occupies the slot.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::Direction;
use crate::consts::STUN_PERIOD;

pub const MONSTER_SLOTS: usize = 11;
pub const SLOT_COUNT: usize = 26;

/// Reserved slot roles, in slot order after the monster pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Buffer,
    PlayerSword,
    PlayerSwordShot,
    Boomerang,
    Bomb,
    Bomb2,
    Fire,
    Fire2,
    Ladder,
    Food,
    Arrow,
    Item,
    FluteMusic,
    Player,
    Door,
}

impl Role {
    const ALL: [Role; SLOT_COUNT - MONSTER_SLOTS] = [
        Role::Buffer,
        Role::PlayerSword,
        Role::PlayerSwordShot,
        Role::Boomerang,
        Role::Bomb,
        Role::Bomb2,
        Role::Fire,
        Role::Fire2,
        Role::Ladder,
        Role::Food,
        Role::Arrow,
        Role::Item,
        Role::FluteMusic,
        Role::Player,
        Role::Door,
    ];
}

/// A slot in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Monster(usize),
    Role(Role),
}

impl Slot {
    pub const PLAYER: Slot = Slot::Role(Role::Player);
    pub const DOOR: Slot = Slot::Role(Role::Door);

    /// Map a legacy integer slot id; panics when out of range
    pub fn from_index(index: usize) -> Self {
        assert!(index < SLOT_COUNT, "slot index {index} out of range");
        if index < MONSTER_SLOTS {
            Slot::Monster(index)
        } else {
            Slot::Role(Role::ALL[index - MONSTER_SLOTS])
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::Monster(i) => {
                assert!(i < MONSTER_SLOTS, "monster slot {i} out of range");
                i
            }
            Slot::Role(role) => MONSTER_SLOTS + role as usize,
        }
    }

    pub fn is_monster(self) -> bool {
        matches!(self, Slot::Monster(_))
    }
}

/// Bomb lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BombState {
    Ticking,
    Blasting,
    Fading,
}

/// Push block lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    /// Frames the player has been pressing against it
    Idle { pressed: u8 },
    /// Sliding toward `to`, one tile from where it started
    Moving { to: IVec2 },
}

/// What an object is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Player,
    Monster { list_id: u8 },
    Sword,
    Bomb(BombState),
    Fire,
    /// Bridges water along its direction's axis
    Ladder,
    Item { item_id: u8 },
    FluteMusic,
    Block(BlockState),
}

/// An object occupying a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub kind: ObjectKind,
    pub pos: IVec2,
    pub facing: Direction,
    pub hp: u8,
    pub invincible_timer: u8,
    /// Swept out of the arena after the frame's behaviors run
    pub deleted: bool,
}

impl Object {
    pub fn new(kind: ObjectKind, pos: IVec2) -> Self {
        Self {
            kind,
            pos,
            facing: Direction::None,
            hp: 1,
            invincible_timer: 0,
            deleted: false,
        }
    }

    pub fn facing(mut self, dir: Direction) -> Self {
        self.facing = dir;
        self
    }

    pub fn with_hp(mut self, hp: u8) -> Self {
        self.hp = hp;
        self
    }

    /// Do two 16x16 sprites overlap (with `slack` pixels forgiven)?
    pub fn touches(&self, other: IVec2, slack: i32) -> bool {
        let d = (self.pos - other).abs();
        d.x < 16 - slack && d.y < 16 - slack
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectArena {
    objects: Vec<Option<Object>>,
    object_timers: Vec<u8>,
    stun_timers: Vec<u8>,
    long_timer: u8,
}

impl Default for ObjectArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectArena {
    pub fn new() -> Self {
        Self {
            objects: vec![None; SLOT_COUNT],
            object_timers: vec![0; SLOT_COUNT],
            stun_timers: vec![0; SLOT_COUNT],
            long_timer: 0,
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&Object> {
        self.objects[slot.index()].as_ref()
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut Object> {
        self.objects[slot.index()].as_mut()
    }

    pub fn is_empty(&self, slot: Slot) -> bool {
        self.objects[slot.index()].is_none()
    }

    /// Place an object, replacing whatever was there
    pub fn set(&mut self, slot: Slot, object: Object) {
        self.objects[slot.index()] = Some(object);
    }

    pub fn take(&mut self, slot: Slot) -> Option<Object> {
        self.objects[slot.index()].take()
    }

    pub fn player(&self) -> Option<&Object> {
        self.get(Slot::PLAYER)
    }

    pub fn player_mut(&mut self) -> Option<&mut Object> {
        self.get_mut(Slot::PLAYER)
    }

    /// Lowest free monster slot
    pub fn find_empty_monster_slot(&self) -> Option<Slot> {
        (0..MONSTER_SLOTS)
            .map(Slot::Monster)
            .find(|&slot| self.is_empty(slot))
    }

    /// Lowest free fire slot
    pub fn find_empty_fire_slot(&self) -> Option<Slot> {
        [Slot::Role(Role::Fire), Slot::Role(Role::Fire2)]
            .into_iter()
            .find(|&slot| self.is_empty(slot))
    }

    pub fn find_empty_bomb_slot(&self) -> Option<Slot> {
        [Slot::Role(Role::Bomb), Slot::Role(Role::Bomb2)]
            .into_iter()
            .find(|&slot| self.is_empty(slot))
    }

    pub fn object_timer(&self, slot: Slot) -> u8 {
        self.object_timers[slot.index()]
    }

    pub fn set_object_timer(&mut self, slot: Slot, value: u8) {
        self.object_timers[slot.index()] = value;
    }

    pub fn stun_timer(&self, slot: Slot) -> u8 {
        self.stun_timers[slot.index()]
    }

    pub fn set_stun_timer(&mut self, slot: Slot, value: u8) {
        self.stun_timers[slot.index()] = value;
    }

    /// Object timers tick every frame, stun timers every `STUN_PERIOD` frames
    pub fn decrement_timers(&mut self) {
        for t in self.object_timers.iter_mut() {
            *t = t.saturating_sub(1);
        }
        if self.long_timer == 0 {
            self.long_timer = (STUN_PERIOD - 1) as u8;
            for t in self.stun_timers.iter_mut() {
                *t = t.saturating_sub(1);
            }
        } else {
            self.long_timer -= 1;
        }
    }

    /// Occupied slots in slot order
    pub fn occupied_slots(&self) -> Vec<Slot> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_some())
            .map(|(i, _)| Slot::from_index(i))
            .collect()
    }

    /// Live monsters in the pool
    pub fn monster_count(&self) -> usize {
        (0..MONSTER_SLOTS)
            .filter(|&i| matches!(&self.objects[i], Some(o) if !o.deleted))
            .count()
    }

    /// Drop objects flagged deleted; returns how many monsters went
    pub fn remove_deleted(&mut self) -> usize {
        let mut monsters = 0;
        for (i, entry) in self.objects.iter_mut().enumerate() {
            if entry.is_some_and(|o| o.deleted) {
                *entry = None;
                if i < MONSTER_SLOTS {
                    monsters += 1;
                }
            }
        }
        monsters
    }

    /// Empty every slot except the player's, and reset their timers
    pub fn clear_room_objects(&mut self) {
        let player = Slot::PLAYER.index();
        for i in 0..SLOT_COUNT {
            if i != player {
                self.objects[i] = None;
                self.object_timers[i] = 0;
                self.stun_timers[i] = 0;
            }
        }
    }
}
