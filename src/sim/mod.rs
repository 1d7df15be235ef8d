//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by slot)
//! - Rendering, input, audio and storage only through `platform::Services`

pub mod actors;
pub mod collision;
pub mod demo;
pub mod doors;
pub mod level;
pub mod mode;
pub mod objects;
pub mod render;
pub mod room;
pub mod state;
pub mod tick;
pub mod tile;

#[cfg(test)]
pub(crate) mod harness;

pub use collision::{CollisionMode, TileCollision, TileMap, standing_pos};
pub use demo::demo_world;
pub use doors::{DoorTrigger, DoorType, UwRoomFlags, next_room_id};
pub use level::{Level, LevelInfo, World};
pub use mode::{GameMode, ModeState, RoomKind};
pub use objects::{Object, ObjectArena, ObjectKind, Role, Slot};
pub use room::{RoomAttrs, Secret, WorldKind};
pub use state::Simulation;
pub use tile::{TileBehavior, TileBehaviorTable};
