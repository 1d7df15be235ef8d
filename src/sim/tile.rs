//! Tile behavior classification
//!
//! Every tile code in a level maps to one behavior. Codes below `Water`
//! are walkable; the ghost and armos ranges are hazards that cycle between
//! walkable and solid as the frame counter advances.

use serde::{Deserialize, Serialize};

use crate::consts::HAZARD_PHASE_SHIFT;
use crate::error::LevelError;

/// What happens when an actor touches a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileBehavior {
    GenericWalkable,
    Sand,
    SlowStairs,
    Stairs,
    /// First solid behavior
    Water,
    GenericSolid,
    Cave,
    /// Ghost hazard with its sub-state (0..16)
    Ghost(u8),
    /// Armos hazard with its sub-state (0..16)
    Armos(u8),
    Wall,
}

pub const GHOST_BASE: u8 = 7;
pub const ARMOS_BASE: u8 = 23;
pub const WALL_CODE: u8 = 39;
/// Number of behavior codes
pub const BEHAVIOR_COUNT: u8 = 40;
pub const FIRST_SOLID: u8 = 4;

impl TileBehavior {
    pub fn code(self) -> u8 {
        match self {
            TileBehavior::GenericWalkable => 0,
            TileBehavior::Sand => 1,
            TileBehavior::SlowStairs => 2,
            TileBehavior::Stairs => 3,
            TileBehavior::Water => 4,
            TileBehavior::GenericSolid => 5,
            TileBehavior::Cave => 6,
            TileBehavior::Ghost(i) => GHOST_BASE + (i & 0xF),
            TileBehavior::Armos(i) => ARMOS_BASE + (i & 0xF),
            TileBehavior::Wall => WALL_CODE,
        }
    }

    /// Decode a behavior code; anything past the last code is a wall
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => TileBehavior::GenericWalkable,
            1 => TileBehavior::Sand,
            2 => TileBehavior::SlowStairs,
            3 => TileBehavior::Stairs,
            4 => TileBehavior::Water,
            5 => TileBehavior::GenericSolid,
            6 => TileBehavior::Cave,
            c if (GHOST_BASE..ARMOS_BASE).contains(&c) => TileBehavior::Ghost(c - GHOST_BASE),
            c if (ARMOS_BASE..WALL_CODE).contains(&c) => TileBehavior::Armos(c - ARMOS_BASE),
            _ => TileBehavior::Wall,
        }
    }

    /// Walkable, or a hazard (walkable but dangerous)
    pub fn is_walkable(self) -> bool {
        self.code() < FIRST_SOLID || self.is_hazard_cycle()
    }

    pub fn is_hazard_cycle(self) -> bool {
        matches!(self, TileBehavior::Ghost(_) | TileBehavior::Armos(_))
    }

    /// Sub-state of a hazard tile
    pub fn hazard_index(self) -> Option<u8> {
        match self {
            TileBehavior::Ghost(i) | TileBehavior::Armos(i) => Some(i),
            _ => None,
        }
    }

    /// Solid ignoring hazard phase and movement rules
    pub fn is_solid(self) -> bool {
        self.code() >= FIRST_SOLID
    }
}

/// Hazard phase (0..16) for a frame
#[inline]
pub fn hazard_phase(frame: u32) -> u8 {
    ((frame >> HAZARD_PHASE_SHIFT) & 0xF) as u8
}

/// Is a hazard tile with this sub-state solid at this phase?
///
/// Each sub-state is solid for half of the 16-step cycle, offset by its index.
#[inline]
pub fn hazard_is_solid(index: u8, phase: u8) -> bool {
    (phase.wrapping_sub(index) & 0xF) < 8
}

/// Tile code to behavior lookup for a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileBehaviorTable {
    entries: Vec<TileBehavior>,
}

impl TileBehaviorTable {
    /// Build from one behavior code per tile code
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LevelError> {
        if bytes.len() != 256 {
            return Err(LevelError::BadBehaviorTableLength { actual: bytes.len() });
        }
        let entries = bytes
            .iter()
            .enumerate()
            .map(|(tile, &code)| {
                if code >= BEHAVIOR_COUNT {
                    Err(LevelError::UnknownBehavior { tile: tile as u8, code })
                } else {
                    Ok(TileBehavior::from_code(code))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Table where every tile has the same behavior
    pub fn uniform(behavior: TileBehavior) -> Self {
        Self {
            entries: vec![behavior; 256],
        }
    }

    pub fn set(&mut self, tile: u8, behavior: TileBehavior) {
        self.entries[tile as usize] = behavior;
    }

    #[inline]
    pub fn classify(&self, tile: u8) -> TileBehavior {
        self.entries[tile as usize]
    }

    /// Lowest tile code with a behavior
    pub fn first_tile(&self, behavior: TileBehavior) -> Option<u8> {
        self.entries
            .iter()
            .position(|&b| b == behavior)
            .map(|tile| tile as u8)
    }
}

impl Default for TileBehaviorTable {
    fn default() -> Self {
        Self::uniform(TileBehavior::GenericWalkable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_table() -> TileBehaviorTable {
        let bytes: Vec<u8> = (0..=255u16).map(|t| (t % 40) as u8).collect();
        TileBehaviorTable::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_code_round_trip() {
        for code in 0..BEHAVIOR_COUNT {
            assert_eq!(TileBehavior::from_code(code).code(), code);
        }
        assert_eq!(TileBehavior::from_code(40), TileBehavior::Wall);
        assert_eq!(TileBehavior::from_code(255), TileBehavior::Wall);
    }

    #[test]
    fn test_walkable_ranges() {
        assert!(TileBehavior::GenericWalkable.is_walkable());
        assert!(TileBehavior::Stairs.is_walkable());
        assert!(!TileBehavior::Water.is_walkable());
        assert!(!TileBehavior::Wall.is_walkable());
        assert!(TileBehavior::Ghost(3).is_walkable());
        assert!(TileBehavior::Armos(15).is_walkable());
        assert!(TileBehavior::Armos(0).is_hazard_cycle());
        assert!(!TileBehavior::Cave.is_hazard_cycle());
    }

    #[test]
    fn test_only_hazards_walk_past_first_solid() {
        for code in 0..BEHAVIOR_COUNT {
            let behavior = TileBehavior::from_code(code);
            let hazard = (GHOST_BASE..WALL_CODE).contains(&code);
            assert_eq!(behavior.is_walkable(), code < FIRST_SOLID || hazard, "code {code}");
            assert_eq!(behavior.is_hazard_cycle(), hazard, "code {code}");
        }
    }

    #[test]
    fn test_first_tile_lookup() {
        let mut table = TileBehaviorTable::default();
        table.set(9, TileBehavior::Stairs);
        table.set(4, TileBehavior::Stairs);
        assert_eq!(table.first_tile(TileBehavior::Stairs), Some(4));
        assert_eq!(table.first_tile(TileBehavior::Water), None);
    }

    #[test]
    fn test_from_bytes_rejects_unknown_codes() {
        let mut bytes = vec![0u8; 256];
        bytes[17] = 40;
        assert_eq!(
            TileBehaviorTable::from_bytes(&bytes),
            Err(LevelError::UnknownBehavior { tile: 17, code: 40 })
        );
        assert!(TileBehaviorTable::from_bytes(&bytes[..10]).is_err());
    }

    #[test]
    fn test_hazard_half_cycle() {
        for index in 0..16u8 {
            let solid = (0..16u8).filter(|&p| hazard_is_solid(index, p)).count();
            assert_eq!(solid, 8);
        }
        assert_eq!(hazard_phase(0), 0);
        assert_eq!(hazard_phase(8), 1);
        assert_eq!(hazard_phase(8 * 16), 0);
    }

    proptest! {
        #[test]
        fn classify_is_pure(tile in any::<u8>()) {
            let table = sample_table();
            prop_assert_eq!(table.classify(tile), table.classify(tile));
        }

        #[test]
        fn classify_stays_in_range(tile in any::<u8>()) {
            let table = sample_table();
            prop_assert!(table.classify(tile).code() < BEHAVIOR_COUNT);
        }

        #[test]
        fn hazard_codes_are_walkable(index in 0u8..16) {
            prop_assert!(TileBehavior::from_code(GHOST_BASE + index).is_walkable());
            prop_assert!(TileBehavior::from_code(ARMOS_BASE + index).is_walkable());
        }
    }
}
