//! Dungeon Sim - simulation core for a tile-based action adventure
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rooms, doors, objects, collision, game modes)
//! - `platform`: Rendering and input services the simulation calls into
//! - `audio`: Sound cue categories and the audio service
//! - `profile`: Player save profiles and their stores
//! - `settings`: Simulation configuration

pub mod audio;
pub mod error;
pub mod platform;
pub mod profile;
pub mod settings;
pub mod sim;

pub use error::{LevelError, StorageError};
pub use profile::Profile;
pub use settings::Settings;

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Tile rows in a room
    pub const ROWS: usize = 11;
    /// Tile columns in a room
    pub const COLUMNS: usize = 16;
    pub const TILE_WIDTH: i32 = 16;
    pub const TILE_HEIGHT: i32 = 16;
    /// Screen y where the room's tile map starts (status bar sits above)
    pub const TILE_MAP_BASE_Y: i32 = 64;
    pub const TILE_MAP_WIDTH: i32 = COLUMNS as i32 * TILE_WIDTH;
    pub const TILE_MAP_HEIGHT: i32 = ROWS as i32 * TILE_HEIGHT;

    /// Rooms per world row
    pub const WORLD_WIDTH: u8 = 16;
    /// Rows of rooms in a world
    pub const WORLD_HEIGHT: u8 = 8;
    pub const ROOM_COUNT: usize = 128;

    /// Pixels per frame while scrolling between rooms
    pub const SCROLL_SPEED: i32 = 4;

    /// Player world limits by direction ordinal (Right, Left, Down, Up)
    pub const PLAYER_LIMITS: [i32; 4] = [0xF0, 0x00, 0xDD, 0x3D];
    /// Player x when a level starts
    pub const START_X: i32 = 0x78;
    /// Doorway alignment for doors in the top and bottom walls
    pub const DOORWAY_X: i32 = 0x78;
    /// Doorway alignment for doors in the left and right walls
    pub const DOORWAY_Y: i32 = 0x8D;
    /// Max distance between a fading bomb and a bombable door's middle
    pub const UW_BOMB_RADIUS: i32 = 32;

    /// Number of rooms remembered in the room history
    pub const ROOM_HISTORY_LENGTH: usize = 6;
    /// Upper bound on same-frame mode transitions
    pub const MAX_MODE_CHAIN: u32 = 8;
    /// Frames per hazard phase step
    pub const HAZARD_PHASE_SHIFT: u32 = 3;
    /// Frames between stun timer decrements
    pub const STUN_PERIOD: u32 = 10;

    /// Hearts are stored with 256 units per heart
    pub const HEART_UNITS: u16 = 0x100;
    /// Damage dealt by a monster touch (half a heart)
    pub const CONTACT_DAMAGE: u16 = 0x80;
}

/// One of the four cardinal directions, or none
///
/// Bit values match the door bits stored in room flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None,
    Right,
    Left,
    Down,
    Up,
}

impl Direction {
    /// The four real directions in ordinal order
    pub const ALL: [Direction; 4] = [Direction::Right, Direction::Left, Direction::Down, Direction::Up];

    /// Flag bit (Right=1, Left=2, Down=4, Up=8)
    pub fn bit(self) -> u8 {
        match self {
            Direction::None => 0,
            Direction::Right => 1,
            Direction::Left => 2,
            Direction::Down => 4,
            Direction::Up => 8,
        }
    }

    /// Ordinal index (Right=0, Left=1, Down=2, Up=3)
    ///
    /// Panics for `Direction::None`.
    pub fn ord(self) -> usize {
        match self {
            Direction::Right => 0,
            Direction::Left => 1,
            Direction::Down => 2,
            Direction::Up => 3,
            Direction::None => panic!("Direction::None has no ordinal"),
        }
    }

    pub fn from_ord(ord: usize) -> Self {
        Self::ALL[ord]
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::None => Direction::None,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Is this direction toward the high end of its axis (right/down)?
    pub fn is_growing(self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }

    /// Unit step in screen space (y grows downward)
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::None => IVec2::ZERO,
            Direction::Right => IVec2::new(1, 0),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Down => IVec2::new(0, 1),
            Direction::Up => IVec2::new(0, -1),
        }
    }
}

/// Move `pos` by `dist` pixels in `dir`
#[inline]
pub fn step(pos: IVec2, dir: Direction, dist: i32) -> IVec2 {
    pos + dir.delta() * dist
}

/// Does a player moving toward `dir` stand at or past the world limit?
#[inline]
pub fn at_player_limit(pos: IVec2, dir: Direction) -> bool {
    let limit = |dir: Direction| consts::PLAYER_LIMITS[dir.ord()];
    match dir {
        Direction::Right => pos.x >= limit(dir),
        Direction::Left => pos.x <= limit(dir),
        Direction::Down => pos.y >= limit(dir),
        Direction::Up => pos.y <= limit(dir),
        Direction::None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_bits_and_ords() {
        for (i, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.ord(), i);
            assert_eq!(Direction::from_ord(i), *dir);
            assert_eq!(dir.bit(), 1 << i);
            assert_eq!(dir.opposite().opposite(), *dir);
        }
    }

    #[test]
    fn test_player_limits() {
        assert!(at_player_limit(IVec2::new(0xF0, 0x8D), Direction::Right));
        assert!(!at_player_limit(IVec2::new(0xEF, 0x8D), Direction::Right));
        assert!(at_player_limit(IVec2::new(0x78, 0x3D), Direction::Up));
        assert!(!at_player_limit(IVec2::new(0x78, 0x3D), Direction::Down));
        assert!(!at_player_limit(IVec2::new(0x00, 0x3D), Direction::None));
    }
}
