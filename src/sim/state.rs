//! Simulation context
//!
//! Everything that changes while the game runs lives in `Simulation`:
//! the current mode, room, objects, profile and RNG. Nothing is global, so
//! two simulations built from the same world and settings run identically.

use glam::IVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{CollisionEnv, CollisionMode, LadderSpan, TileCollision, TileMap, tile_at};
use super::doors::UwRoomFlags;
use super::level::{Level, World};
use super::mode::{GameMode, ModeState, RoomKind};
use super::objects::{Object, ObjectArena, ObjectKind, Role, Slot};
use super::tile::{TileBehavior, hazard_phase};
use crate::consts::*;
use crate::Direction;
use crate::platform::{Button, Services};
use crate::profile::Profile;
use crate::settings::{Settings, StartMode};

/// Door command waiting for the door slot timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorCommand {
    /// Direction bits of the doors to open
    pub dirs: u8,
    pub trigger: super::doors::DoorTrigger,
    pub armed: bool,
}

/// Bookkeeping for the room on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomState {
    pub kind: RoomKind,
    pub kill_count: u8,
    pub monsters_spawned: bool,
    pub all_dead: bool,
    pub made_item: bool,
    pub shutters_triggered: bool,
    /// The room's push block reached its new spot
    pub block_pushed: bool,
    pub walk_on_water: bool,
    /// Player stood on stairs at the end of the last move
    pub on_stairs: bool,
    /// Overworld room a cave was entered from
    pub cave_origin: u8,
}

pub struct Simulation {
    pub settings: Settings,
    world: World,
    pub(crate) level: u8,
    pub(crate) state: ModeState,
    pub(crate) transitioned: bool,
    pub(crate) cur_room_id: u8,
    pub(crate) tile_map: TileMap,
    /// Map scrolling off screen
    pub(crate) old_tile_map: Option<TileMap>,
    pub(crate) room: RoomState,
    pub arena: ObjectArena,
    pub profile: Profile,
    pub(crate) profile_slot: usize,
    pub(crate) frame_counter: u32,
    pub(crate) rng: Pcg32,
    room_history: [u8; ROOM_HISTORY_LENGTH],
    next_room_history_slot: usize,
    pub(crate) saved_ow_room: Option<u8>,
    pub(crate) dark_fade_step: u8,
    pub(crate) paused: bool,
    pub(crate) doorway_dir: Direction,
    pub(crate) door_command: Option<DoorCommand>,
    /// A button press already acted on this frame
    pub(crate) press_taken: bool,
}

impl Simulation {
    pub fn new(world: World, settings: Settings) -> Self {
        let state = match settings.start_mode {
            StartMode::Demo => ModeState::Demo { timer: 0 },
            StartMode::GameMenu => ModeState::GameMenu { cursor: 0 },
        };
        let tile_map = world.overworld().tile_map(world.overworld().info.start_room_id);
        let rng = Pcg32::seed_from_u64(settings.rng_seed);
        log::info!(
            "Simulation created: {} levels, starting in {:?}",
            world.level_count(),
            settings.start_mode
        );
        Self {
            settings,
            world,
            level: 0,
            state,
            transitioned: false,
            cur_room_id: 0,
            tile_map,
            old_tile_map: None,
            room: RoomState::default(),
            arena: ObjectArena::new(),
            profile: Profile::default(),
            profile_slot: 0,
            frame_counter: 0,
            rng,
            room_history: [0; ROOM_HISTORY_LENGTH],
            next_room_history_slot: 0,
            saved_ow_room: None,
            dark_fade_step: 0,
            paused: false,
            doorway_dir: Direction::None,
            door_command: None,
            press_taken: false,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.state.mode(self.room.kind)
    }

    pub fn mode_state(&self) -> &ModeState {
        &self.state
    }

    pub fn room_id(&self) -> u8 {
        self.cur_room_id
    }

    pub fn level_number(&self) -> u8 {
        self.level
    }

    pub fn room_kind(&self) -> RoomKind {
        self.room.kind
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn tile_map(&self) -> &TileMap {
        &self.tile_map
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Rooms visited most recently, oldest slot first
    pub fn room_history(&self) -> &[u8] {
        &self.room_history
    }

    pub fn player_pos(&self) -> Option<IVec2> {
        self.arena.player().map(|p| p.pos)
    }

    pub(crate) fn level_data(&self) -> &Level {
        // `level` is only ever set to an index that exists in the world
        self.world.level(self.level).unwrap_or_else(|| self.world.overworld())
    }

    pub(crate) fn is_overworld(&self) -> bool {
        self.level_data().is_overworld()
    }

    pub(crate) fn uw_flags(&self) -> &[UwRoomFlags] {
        self.profile.uw_flags(self.level)
    }

    pub(crate) fn uw_flags_mut(&mut self) -> &mut [UwRoomFlags] {
        self.profile.uw_flags_mut(self.level)
    }

    /// Edge-triggered press, honored once per frame across chained modes
    pub(crate) fn take_press(&mut self, services: &Services, button: Button) -> bool {
        if self.press_taken || !services.input.is_button_pressing(button) {
            return false;
        }
        self.press_taken = true;
        true
    }

    pub(crate) fn room_is_dark(&self, room_id: u8) -> bool {
        let level = self.level_data();
        !level.is_overworld() && level.room_attrs(room_id).underworld().is_dark()
    }

    /// Where the player stands after coming out of an overworld room's cave
    pub(crate) fn cave_exit_pos(&self, room_id: u8) -> IVec2 {
        let spot = i32::from(
            self.level_data()
                .room_attrs(room_id)
                .overworld()
                .exit_position(),
        );
        IVec2::new((spot & 0x0F) << 4, (spot & 0xF0) | 0x0D)
    }

    /// Switch modes
    ///
    /// Leaving play for anything but the win screen clears the room's
    /// objects and stops the player.
    pub(crate) fn goto(&mut self, next: ModeState) {
        let old = self.mode();
        let new = next.mode(self.room.kind);
        if old.is_playing() && !new.is_playing() && new != GameMode::WinGame {
            self.on_leave_play();
            self.arena.clear_room_objects();
            if new != GameMode::Unfurl {
                self.doorway_dir = Direction::None;
                self.paused = false;
            }
        }
        if old != new {
            log::info!("Mode {old:?} -> {new:?}");
        }
        self.state = next;
        self.transitioned = true;
    }

    /// Remember how many monsters are left in an underworld room
    fn on_leave_play(&mut self) {
        if self.is_overworld() || self.room.kind != RoomKind::Regular {
            return;
        }
        let remaining = if self.room.all_dead {
            0
        } else {
            self.arena.monster_count().min(3) as u8
        };
        let room = self.cur_room_id as usize;
        self.uw_flags_mut()[room].set_object_count(remaining);
    }

    /// Make `room_id` the room on screen
    pub(crate) fn load_room(&mut self, room_id: u8) {
        let level = self.level_data();
        let kind = if level.is_cellar(room_id) {
            RoomKind::Cellar
        } else {
            RoomKind::Regular
        };
        self.tile_map = level.tile_map(room_id);
        self.cur_room_id = room_id;
        self.reset_room(kind);
        if kind == RoomKind::Regular {
            self.room_history[self.next_room_history_slot] = room_id;
            self.next_room_history_slot = (self.next_room_history_slot + 1) % ROOM_HISTORY_LENGTH;
        }
        log::debug!("Loaded room {room_id:#04x} of level {}", self.level);
    }

    /// Put an overworld cave on screen
    pub(crate) fn load_cave(&mut self, shortcuts: bool) {
        let origin = self.cur_room_id;
        let level = self.level_data();
        self.tile_map = if shortcuts {
            level.shortcut_cave_tile_map()
        } else {
            level.cave_tile_map()
        };
        self.reset_room(if shortcuts {
            RoomKind::Shortcuts
        } else {
            RoomKind::Cave
        });
        self.room.cave_origin = origin;
        log::debug!("Loaded cave under room {origin:#04x}");
    }

    fn reset_room(&mut self, kind: RoomKind) {
        self.room = RoomState {
            kind,
            ..RoomState::default()
        };
        self.door_command = None;
        self.doorway_dir = Direction::None;
        self.arena.clear_room_objects();
    }

    /// Create or move the player
    pub(crate) fn place_player(&mut self, pos: IVec2, facing: Direction) {
        match self.arena.player_mut() {
            Some(player) => {
                player.pos = pos;
                player.facing = facing;
            }
            None => self
                .arena
                .set(Slot::PLAYER, Object::new(ObjectKind::Player, pos).facing(facing)),
        }
    }

    pub(crate) fn move_player(&mut self, dir: Direction, dist: i32) {
        if let Some(player) = self.arena.player_mut() {
            player.pos = crate::step(player.pos, dir, dist);
            if dir != Direction::None {
                player.facing = dir;
            }
        }
    }

    pub(crate) fn collision_env(&self) -> CollisionEnv {
        let ladder = self
            .arena
            .get(Slot::Role(Role::Ladder))
            .map(|ladder| {
                let (row, col) = tile_at(ladder.pos);
                LadderSpan {
                    dir: ladder.facing,
                    row,
                    col,
                }
            });
        CollisionEnv {
            hazard_phase: hazard_phase(self.frame_counter),
            walk_on_water: self.room.walk_on_water,
            ladder,
        }
    }

    pub(crate) fn collide(&self, pos: IVec2, mode: CollisionMode) -> TileCollision {
        let env = self.collision_env();
        self.tile_map
            .collide(&self.level_data().behaviors, &env, pos, mode)
    }

    /// Behavior of the tile under the player's feet
    pub(crate) fn behavior_under_player(&self) -> Option<TileBehavior> {
        self.player_pos()
            .map(|pos| self.collide(pos, CollisionMode::Still).behavior)
    }

    /// First tile in the room map with a behavior
    pub(crate) fn find_tile(&self, behavior: TileBehavior) -> Option<(usize, usize)> {
        let table = &self.level_data().behaviors;
        (0..ROWS)
            .flat_map(|row| (0..COLUMNS).map(move |col| (row, col)))
            .find(|&(row, col)| table.classify(self.tile_map.tile(row, col)) == behavior)
    }
}
