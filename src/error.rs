//! Error types for level data and storage

use thiserror::Error;

/// Problems found while building level data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("room attribute table is {actual} bytes, expected {expected}")]
    BadAttrTableLength { expected: usize, actual: usize },
    #[error("tile behavior table is {actual} bytes, expected 256")]
    BadBehaviorTableLength { actual: usize },
    #[error("tile code {tile:#04x} has unknown behavior code {code}")]
    UnknownBehavior { tile: u8, code: u8 },
    #[error("room {room:#04x} uses layout {unique_id:#04x} which does not exist")]
    MissingLayout { room: u8, unique_id: u8 },
    #[error("start room {0:#04x} is outside the world")]
    BadStartRoom(u8),
    #[error("{what} names room {room:#04x} which is outside the world")]
    RoomOutOfRange { what: &'static str, room: u8 },
    #[error("level {index} should be {expected:?}")]
    WrongWorldKind {
        index: usize,
        expected: crate::sim::WorldKind,
    },
    #[error("a world needs an overworld level")]
    NoOverworld,
}

/// Failures while reading or writing profiles and settings
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("profile slot {0} out of range")]
    BadSlot(usize),
}
