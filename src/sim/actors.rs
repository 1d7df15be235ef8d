//! Play-mode behaviors
//!
//! One play frame runs, in order: pause toggle, timers, the flute gate,
//! bomb checks against bombable doors, the player, every other object from
//! the highest slot down, the dead-object sweep, room secrets, pending door
//! commands, item pickup, and finally the death check.

use glam::IVec2;
use rand::Rng;

use super::collision::{CollisionMode, TileCollision, standing_pos, tile_at, tile_origin};
use super::doors::{DoorTrigger, DoorType, door_is_open, door_type, next_room_id, open_door};
use super::mode::{LeaveStage, ModeState, RoomKind};
use super::objects::{BlockState, BombState, MONSTER_SLOTS, Object, ObjectKind, Role, Slot};
use super::room::{NO_ITEM, Secret};
use super::state::{DoorCommand, Simulation};
use super::tile::TileBehavior;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::platform::{Button, InputSource, Services};
use crate::profile::{Pickup, SelectedItem, item_id};
use crate::{Direction, at_player_limit, step};

const SWORD_FRAMES: u8 = 12;
const SWORD_REACH: i32 = 12;
const BOMB_TICKING_FRAMES: u8 = 0x30;
const BOMB_BLAST_FRAMES: u8 = 0x10;
const BOMB_FADE_FRAMES: u8 = 0x20;
const BOMB_BLAST_RADIUS: i32 = 24;
const FIRE_FRAMES: u8 = 0x40;
/// Fire stops moving once its timer drops to this
const FIRE_STOP: u8 = 0x30;
const FLUTE_FRAMES: u8 = 0x98;
const PLAYER_HIT_INVINCIBILITY: u8 = 0x30;
const MONSTER_HIT_INVINCIBILITY: u8 = 0x10;
const MONSTER_HP: u8 = 2;
const FALSE_WALL_PUSH_FRAMES: u8 = 0x18;
const KEY_DOOR_PAUSE_FRAMES: u8 = 0x20;
const DOOR_DELAY_FRAMES: u8 = 8;
const SPAWN_TRIES: usize = 16;
/// Monsters are never placed this close to the player
const SPAWN_CLEARANCE: i32 = 32;
/// Dungeon push blocks only ever sit on this row
const BLOCK_ROW: usize = 5;
const BLOCK_PUSH_FRAMES: u8 = 17;
/// Where stairs appear once a stairs block is pushed
const BLOCK_STAIRS_TILE: (usize, usize) = (2, 13);

/// Middle of each door, by direction ordinal
const DOOR_MIDDLES: [IVec2; 4] = [
    IVec2::new(0xE0, 0x98),
    IVec2::new(0x20, 0x98),
    IVec2::new(0x80, 0xD0),
    IVec2::new(0x80, 0x60),
];

/// Room item spots, by the record's position index
const ITEM_POSITIONS: [IVec2; 4] = [
    IVec2::new(0x78, 0x8D),
    IVec2::new(0x58, 0x7D),
    IVec2::new(0x98, 0x7D),
    IVec2::new(0x78, 0x6D),
];
const CAVE_ITEM_POS: IVec2 = IVec2::new(0x78, 0x98);

/// Item handed out in an overworld cave, by cave id
fn cave_item(cave_id: u8) -> Option<u8> {
    match cave_id {
        0x10 => Some(item_id::WOOD_SWORD),
        0x11 => Some(item_id::WHITE_SWORD),
        0x12 => Some(item_id::MAGIC_SWORD),
        _ => None,
    }
}

/// Held direction, checked Up, Down, Left, Right
fn held_direction(input: &dyn InputSource) -> Direction {
    [
        (Button::Up, Direction::Up),
        (Button::Down, Direction::Down),
        (Button::Left, Direction::Left),
        (Button::Right, Direction::Right),
    ]
    .into_iter()
    .find(|&(button, _)| input.is_button_down(button))
    .map_or(Direction::None, |(_, dir)| dir)
}

impl Simulation {
    pub(crate) fn update_play(&mut self, services: &mut Services) {
        if self.take_press(services, Button::Select) {
            self.paused = !self.paused;
            log::debug!("Paused: {}", self.paused);
        }
        if self.paused {
            return;
        }

        self.arena.decrement_timers();
        if self.flute_playing() {
            return;
        }

        let dungeon_room = !self.is_overworld() && self.room.kind == RoomKind::Regular;
        if dungeon_room {
            self.check_bombables();
        }

        self.update_player(services);
        if self.transitioned {
            return;
        }
        self.update_objects(services);

        let killed = self.arena.remove_deleted();
        self.room.kill_count = self.room.kill_count.saturating_add(killed as u8);

        if dungeon_room {
            self.check_secrets(services);
            self.update_doors(services);
        }
        self.check_item_pickup(services);
        if self.transitioned {
            return;
        }
        if self.profile.is_dead() {
            self.goto_death(services);
        }
    }

    /// Everything but the flute waits while its tune plays
    fn flute_playing(&mut self) -> bool {
        let slot = Slot::Role(Role::FluteMusic);
        if self.arena.is_empty(slot) {
            return false;
        }
        if self.arena.object_timer(slot) > 0 {
            return true;
        }
        self.arena.take(slot);
        false
    }

    fn live_object(&self, slot: Slot) -> Option<&Object> {
        self.arena.get(slot).filter(|o| !o.deleted)
    }

    // Room population

    /// Fill a freshly entered room with its monsters and item
    pub(crate) fn populate_room(&mut self) {
        if self.room.monsters_spawned {
            return;
        }
        self.room.monsters_spawned = true;
        self.room.on_stairs = self.behavior_under_player() == Some(TileBehavior::Stairs);
        match self.room.kind {
            RoomKind::Regular => {
                self.spawn_monsters();
                self.room.all_dead = self.arena.monster_count() == 0;
                if !self.is_overworld() {
                    let room = self.cur_room_id as usize;
                    self.uw_flags_mut()[room].set_visited();
                    self.spawn_room_item();
                    self.spawn_push_block();
                }
            }
            RoomKind::Cave => self.spawn_cave_item(),
            RoomKind::Cellar | RoomKind::Shortcuts => {}
        }
    }

    fn spawn_monsters(&mut self) {
        let attrs = *self.level_data().room_attrs(self.cur_room_id);
        let mut count = attrs.monster_count();
        if !self.is_overworld() {
            let flags = self.uw_flags()[self.cur_room_id as usize];
            if flags.visited() {
                count = count.min(flags.object_count());
            }
        }
        let list_id = attrs.monster_list_id();
        for _ in 0..count {
            let Some(slot) = self.arena.find_empty_monster_slot() else {
                log::debug!("Monster slots full, room {:#04x} wanted {count}", self.cur_room_id);
                break;
            };
            let Some(pos) = self.spawn_pos() else {
                break;
            };
            let facing = Direction::from_ord(self.rng.random_range(0..4));
            let monster = Object::new(ObjectKind::Monster { list_id }, pos)
                .facing(facing)
                .with_hp(MONSTER_HP);
            self.arena.set(slot, monster);
        }
    }

    /// Random open tile away from the player, then the first open one
    fn spawn_pos(&mut self) -> Option<IVec2> {
        let rows = self.tile_map.playfield_rows();
        let cols = self.tile_map.playfield_cols();
        let player = self.player_pos();
        let free = |sim: &Simulation, row: usize, col: usize| {
            let pos = standing_pos(row, col);
            !sim.collide(pos, CollisionMode::Still).collides
                && player.is_none_or(|p| (p - pos).abs().max_element() >= SPAWN_CLEARANCE)
        };

        for _ in 0..SPAWN_TRIES {
            let row = self.rng.random_range(rows.clone());
            let col = self.rng.random_range(cols.clone());
            if free(&*self, row, col) {
                return Some(standing_pos(row, col));
            }
        }
        rows.flat_map(|row| cols.clone().map(move |col| (row, col)))
            .find(|&(row, col)| free(&*self, row, col))
            .map(|(row, col)| standing_pos(row, col))
    }

    fn spawn_room_item(&mut self) {
        let room = self.cur_room_id;
        let attrs = *self.level_data().room_attrs(room);
        let uw = attrs.underworld();
        let item_id = uw.item_id();
        if item_id == NO_ITEM || self.uw_flags()[room as usize].item_taken() {
            return;
        }
        if matches!(uw.secret(), Secret::FoesItem | Secret::LastBoss) && !self.room.all_dead {
            return;
        }
        let pos = ITEM_POSITIONS[uw.item_position_index() as usize];
        self.arena
            .set(Slot::Role(Role::Item), Object::new(ObjectKind::Item { item_id }, pos));
        self.room.made_item = true;
    }

    /// The first block tile on the block row becomes a pushable block
    fn spawn_push_block(&mut self) {
        let level = self.level_data();
        let Some(block_tile) = level.info.block_tile else {
            return;
        };
        if !level.room_attrs(self.cur_room_id).underworld().has_block() {
            return;
        }
        let Some(col) = self
            .tile_map
            .playfield_cols()
            .find(|&col| self.tile_map.tile(BLOCK_ROW, col) == block_tile)
        else {
            log::warn!("Room {:#04x} has no block tile", self.cur_room_id);
            return;
        };
        let block = Object::new(
            ObjectKind::Block(BlockState::Idle { pressed: 0 }),
            tile_origin(BLOCK_ROW, col),
        );
        self.arena.set(Slot::Role(Role::Buffer), block);
    }

    fn spawn_cave_item(&mut self) {
        let origin = self.room.cave_origin;
        let cave_id = self.level_data().room_attrs(origin).overworld().cave_id();
        let Some(item_id) = cave_item(cave_id) else {
            return;
        };
        if self.profile.ow_flags[origin as usize].item_taken() {
            return;
        }
        self.arena.set(
            Slot::Role(Role::Item),
            Object::new(ObjectKind::Item { item_id }, CAVE_ITEM_POS),
        );
        self.room.made_item = true;
    }

    // Player

    fn update_player(&mut self, services: &mut Services) {
        let Some(player) = self.arena.player().copied() else {
            return;
        };
        if let Some(p) = self.arena.player_mut() {
            p.invincible_timer = p.invincible_timer.saturating_sub(1);
        }

        // Frozen while a key turns in its lock
        let unlocking = self.door_command.is_some_and(|c| c.trigger == DoorTrigger::Key);
        if unlocking && self.arena.object_timer(Slot::PLAYER) > 0 {
            return;
        }

        if services.input.is_button_pressing(Button::A) {
            self.swing_sword(&player, services);
        }
        if services.input.is_button_pressing(Button::B) {
            self.use_item(&player, services);
        }
        self.update_ladder();

        let dir = held_direction(services.input);
        if dir == Direction::None {
            return;
        }
        if self.doorway_dir != Direction::None {
            self.walk_doorway(dir);
            return;
        }
        if at_player_limit(player.pos, dir) {
            self.on_world_limit(dir);
            return;
        }

        if self.sliding_block_in_way(player.pos, dir) {
            return;
        }
        let hit = self.collide(player.pos, CollisionMode::player(dir));
        if hit.collides {
            if let Some(p) = self.arena.player_mut() {
                p.facing = dir;
            }
            self.on_blocked(dir, hit, services);
            return;
        }
        self.move_player(dir, 1);
        self.after_step(services);
    }

    fn swing_sword(&mut self, player: &Object, services: &mut Services) {
        let slot = Slot::Role(Role::PlayerSword);
        if self.profile.items.sword == 0 || !self.arena.is_empty(slot) {
            return;
        }
        let facing = facing_or_up(player.facing);
        let sword = Object::new(ObjectKind::Sword, step(player.pos, facing, SWORD_REACH)).facing(facing);
        self.arena.set(slot, sword);
        self.arena.set_object_timer(slot, SWORD_FRAMES);
        services.audio.play_effect(SoundEffect::Sword);
    }

    fn use_item(&mut self, player: &Object, services: &mut Services) {
        let facing = facing_or_up(player.facing);
        let ahead = step(player.pos, facing, TILE_WIDTH);
        match self.profile.selected_item {
            SelectedItem::Bombs => {
                if self.profile.items.bombs == 0 {
                    return;
                }
                let Some(slot) = self.arena.find_empty_bomb_slot() else {
                    return;
                };
                self.profile.items.bombs -= 1;
                self.arena
                    .set(slot, Object::new(ObjectKind::Bomb(BombState::Ticking), ahead));
                self.arena.set_object_timer(slot, BOMB_TICKING_FRAMES);
            }
            SelectedItem::Candle => {
                if self.profile.items.candle == 0 {
                    return;
                }
                let Some(slot) = self.arena.find_empty_fire_slot() else {
                    return;
                };
                self.arena
                    .set(slot, Object::new(ObjectKind::Fire, ahead).facing(facing));
                self.arena.set_object_timer(slot, FIRE_FRAMES);
                services.audio.play_effect(SoundEffect::Fire);
            }
            SelectedItem::Recorder => {
                let slot = Slot::Role(Role::FluteMusic);
                if !self.profile.items.recorder || !self.arena.is_empty(slot) {
                    return;
                }
                self.arena
                    .set(slot, Object::new(ObjectKind::FluteMusic, player.pos));
                self.arena.set_object_timer(slot, FLUTE_FRAMES);
            }
        }
    }

    /// Walk through a door frame; collision is off along the door's axis
    fn walk_doorway(&mut self, dir: Direction) {
        let door = self.doorway_dir;
        if dir.is_vertical() != door.is_vertical() {
            return;
        }
        let Some(pos) = self.player_pos() else {
            return;
        };
        if dir == door && at_player_limit(pos, dir) {
            self.on_world_limit(dir);
            return;
        }
        self.move_player(dir, 1);
        if dir == door.opposite() {
            let inside = self
                .player_pos()
                .is_some_and(|pos| !self.collide(pos, CollisionMode::Still).collides);
            if inside {
                self.doorway_dir = Direction::None;
            }
        }
    }

    fn on_world_limit(&mut self, dir: Direction) {
        match self.room.kind {
            RoomKind::Regular => {
                self.leave_room(dir);
            }
            RoomKind::Cave | RoomKind::Shortcuts if dir == Direction::Down => {
                self.goto_leave_cellar(None);
            }
            _ => {}
        }
    }

    fn on_blocked(&mut self, dir: Direction, hit: TileCollision, services: &mut Services) {
        let overworld = self.is_overworld();
        match (hit.behavior, self.room.kind) {
            (TileBehavior::Cave, RoomKind::Regular) if overworld => {
                self.goto_stairs(TileBehavior::Cave, services);
            }
            (TileBehavior::Water, _) => self.deploy_ladder(dir, hit),
            (TileBehavior::Wall, RoomKind::Regular)
                if !overworld && hit.border && self.aligned_with_doorway(dir) =>
            {
                self.check_door(dir, services);
            }
            (TileBehavior::Wall, RoomKind::Cellar) if dir == Direction::Up => {
                self.goto_leave_cellar(None);
            }
            _ => {}
        }
    }

    fn aligned_with_doorway(&self, dir: Direction) -> bool {
        self.player_pos().is_some_and(|pos| {
            if dir.is_vertical() {
                pos.x == DOORWAY_X
            } else {
                pos.y == DOORWAY_Y
            }
        })
    }

    /// Stepping onto stairs: cellar stairs in a dungeon, or a shortcut
    fn after_step(&mut self, services: &mut Services) {
        let on_stairs = self.behavior_under_player() == Some(TileBehavior::Stairs);
        let stepped_on = on_stairs && !self.room.on_stairs;
        self.room.on_stairs = on_stairs;
        if !stepped_on {
            return;
        }
        match self.room.kind {
            RoomKind::Regular if !self.is_overworld() => {
                self.goto_stairs(TileBehavior::Stairs, services);
            }
            RoomKind::Shortcuts => self.take_shortcut(),
            _ => {}
        }
    }

    /// Shortcut stairs sit three columns apart starting at column 4
    fn take_shortcut(&mut self) {
        let Some(pos) = self.player_pos() else {
            return;
        };
        let col = ((pos.x + 8) / TILE_WIDTH) as usize;
        let index = col.saturating_sub(4) / 3;
        let origin = self.room.cave_origin;
        let Some(&target) = self.level_data().info.shortcut_room_ids.get(index) else {
            log::warn!("No shortcut room for stairs {index}");
            return;
        };
        if target == origin {
            self.goto_leave_cellar(None);
            return;
        }
        self.profile.ow_flags[origin as usize].set_shortcut_taken();
        log::debug!("Shortcut {index} from {origin:#04x} to {target:#04x}");
        self.goto_leave_cellar(Some(target));
    }

    fn deploy_ladder(&mut self, dir: Direction, hit: TileCollision) {
        let slot = Slot::Role(Role::Ladder);
        if !self.profile.items.ladder || !self.arena.is_empty(slot) {
            return;
        }
        let (row, col) = hit.row_col();
        self.arena
            .set(slot, Object::new(ObjectKind::Ladder, tile_origin(row, col)).facing(dir));
    }

    /// Pick the ladder up once the player is off the water and clear of it
    fn update_ladder(&mut self) {
        let slot = Slot::Role(Role::Ladder);
        let (Some(ladder), Some(pos)) = (self.arena.get(slot).copied(), self.player_pos()) else {
            return;
        };
        let on_water = self.behavior_under_player() == Some(TileBehavior::Water);
        if !on_water && !ladder.touches(pos, -8) {
            self.arena.take(slot);
        }
    }

    /// Start leaving the room toward `dir`
    ///
    /// Refused at the edge of the world, except through the entrance of a
    /// dungeon's first room, which leads back to the overworld.
    pub fn leave_room(&mut self, dir: Direction) -> bool {
        if !self.mode().is_playing() || dir == Direction::None {
            return false;
        }
        let level = self.level_data();
        let exiting_dungeon = !level.is_overworld()
            && self.cur_room_id == level.info.start_room_id
            && dir == Direction::Down;
        if !exiting_dungeon && next_room_id(self.cur_room_id, dir).is_none() {
            log::warn!("No room past the {dir:?} edge of room {:#04x}", self.cur_room_id);
            return false;
        }
        if self.escapes_with_power_triforce(dir) {
            self.goto_win_game();
            return true;
        }
        self.goto(ModeState::Leave {
            stage: LeaveStage::Walk,
            dir,
            timer: 0,
        });
        true
    }

    /// Out through the last boss room's shutter with the power triforce
    fn escapes_with_power_triforce(&self, dir: Direction) -> bool {
        let level = self.level_data();
        !level.is_overworld()
            && self.profile.items.power_triforce
            && level.room_attrs(self.cur_room_id).underworld().secret() == Secret::LastBoss
            && door_type(level, self.cur_room_id, dir) == DoorType::Shutter
    }

    // Doors

    fn check_door(&mut self, dir: Direction, services: &mut Services) {
        let level = self.level_data();
        let room = self.cur_room_id;
        let door = door_type(level, room, dir);
        let open = door_is_open(level, self.uw_flags(), room, dir);
        match door {
            DoorType::Open => self.doorway_dir = dir,
            DoorType::None => {}
            DoorType::FalseWall | DoorType::FalseWall2 => {
                match self.arena.object_timer(Slot::PLAYER) {
                    0 => self.arena.set_object_timer(Slot::PLAYER, FALSE_WALL_PUSH_FRAMES),
                    1 => {
                        self.leave_room(dir);
                    }
                    _ => {}
                }
            }
            DoorType::Bombable => {
                if open {
                    self.leave_room(dir);
                }
            }
            DoorType::Key | DoorType::Key2 => {
                if open {
                    self.doorway_dir = dir;
                } else if self.door_command.is_none() && self.profile.use_key() {
                    self.queue_door_command(dir.bit(), DoorTrigger::Key);
                    self.arena.set_object_timer(Slot::PLAYER, KEY_DOOR_PAUSE_FRAMES);
                    services.audio.play_effect(SoundEffect::ItemPickup);
                    log::debug!("Key used on {dir:?} door of room {room:#04x}");
                }
            }
            DoorType::Shutter => {
                if open && self.door_command.is_none() {
                    self.doorway_dir = dir;
                }
            }
        }
    }

    /// Queue doors to open once the door timer runs out
    fn queue_door_command(&mut self, dirs: u8, trigger: DoorTrigger) -> bool {
        if let Some(cmd) = self.door_command.as_mut() {
            if cmd.trigger != trigger || cmd.armed {
                return false;
            }
            cmd.dirs |= dirs;
            return true;
        }
        self.door_command = Some(DoorCommand {
            dirs,
            trigger,
            armed: false,
        });
        true
    }

    /// A fading bomb near a closed bombable door blows it open
    fn check_bombables(&mut self) {
        let level = self.level_data();
        let room = self.cur_room_id;
        let flags = self.uw_flags()[room as usize];
        let mut dirs = 0;
        for role in [Role::Bomb, Role::Bomb2] {
            let Some(bomb) = self.live_object(Slot::Role(role)) else {
                continue;
            };
            if bomb.kind != ObjectKind::Bomb(BombState::Fading) {
                continue;
            }
            for dir in Direction::ALL {
                let near = (bomb.pos - DOOR_MIDDLES[dir.ord()]).abs().max_element() < UW_BOMB_RADIUS;
                if near && door_type(level, room, dir) == DoorType::Bombable && !flags.door_state(dir) {
                    dirs |= dir.bit();
                }
            }
        }
        if dirs != 0 {
            self.queue_door_command(dirs, DoorTrigger::Explosion);
        }
    }

    fn update_doors(&mut self, services: &mut Services) {
        let Some(cmd) = self.door_command else {
            return;
        };
        if !cmd.armed {
            self.door_command = Some(DoorCommand { armed: true, ..cmd });
            self.arena.set_object_timer(Slot::DOOR, DOOR_DELAY_FRAMES);
            return;
        }
        if self.arena.object_timer(Slot::DOOR) > 0 {
            return;
        }

        self.door_command = None;
        let room = self.cur_room_id;
        let mut opened = false;
        for dir in Direction::ALL {
            if cmd.dirs & dir.bit() == 0 {
                continue;
            }
            let door = door_type(self.level_data(), room, dir);
            opened |= open_door(self.uw_flags_mut(), room, dir, door, cmd.trigger);
        }
        if opened {
            services.audio.play_effect(SoundEffect::Door);
        }
    }

    // Secrets and items

    fn check_secrets(&mut self, services: &mut Services) {
        if !self.room.all_dead && self.arena.monster_count() == 0 {
            self.room.all_dead = true;
            log::debug!("Room {:#04x} cleared", self.cur_room_id);
        }
        let secret = self
            .level_data()
            .room_attrs(self.cur_room_id)
            .underworld()
            .secret();
        match secret {
            Secret::FoesDoor if self.room.all_dead => self.trigger_shutters(),
            Secret::BlockDoor if self.room.block_pushed => self.trigger_shutters(),
            Secret::FoesItem | Secret::LastBoss if self.room.all_dead && !self.room.made_item => {
                self.spawn_room_item();
                if self.room.made_item {
                    services.audio.play_effect(SoundEffect::Secret);
                }
            }
            Secret::Ringleader if !self.room.all_dead && self.arena.is_empty(Slot::Monster(0)) => {
                for i in 1..MONSTER_SLOTS {
                    if let Some(monster) = self.arena.get_mut(Slot::Monster(i)) {
                        monster.deleted = true;
                    }
                }
            }
            _ => {}
        }
        if secret == Secret::LastBoss && self.profile.items.power_triforce {
            self.trigger_shutters();
        }
    }

    fn trigger_shutters(&mut self) {
        if self.room.shutters_triggered {
            return;
        }
        let level = self.level_data();
        let room = self.cur_room_id;
        let flags = self.uw_flags()[room as usize];
        let dirs = Direction::ALL
            .into_iter()
            .filter(|&dir| door_type(level, room, dir) == DoorType::Shutter && !flags.door_state(dir))
            .fold(0, |mask, dir| mask | dir.bit());
        if dirs == 0 || self.queue_door_command(dirs, DoorTrigger::RoomCleared) {
            self.room.shutters_triggered = true;
        }
    }

    fn check_item_pickup(&mut self, services: &mut Services) {
        let slot = Slot::Role(Role::Item);
        let (Some(item), Some(pos)) = (self.arena.get(slot).copied(), self.player_pos()) else {
            return;
        };
        let ObjectKind::Item { item_id } = item.kind else {
            return;
        };
        if !item.touches(pos, 0) {
            return;
        }
        self.arena.take(slot);
        self.mark_item_taken();
        services.audio.play_effect(SoundEffect::ItemPickup);
        log::info!("Picked up item {item_id:#04x}");
        match self.profile.take_item(item_id, self.level) {
            Pickup::TriforcePiece => self.goto_end_level(),
            Pickup::PowerTriforce => services.audio.play_effect(SoundEffect::Secret),
            Pickup::Plain => {}
        }
    }

    fn mark_item_taken(&mut self) {
        match self.room.kind {
            RoomKind::Cave => {
                let origin = self.room.cave_origin as usize;
                self.profile.ow_flags[origin].set_item_taken();
            }
            RoomKind::Regular if self.is_overworld() => {
                self.profile.ow_flags[self.cur_room_id as usize].set_item_taken();
            }
            RoomKind::Regular => {
                let room = self.cur_room_id as usize;
                self.uw_flags_mut()[room].set_item_taken();
            }
            RoomKind::Cellar | RoomKind::Shortcuts => {}
        }
    }

    // Other objects

    fn update_objects(&mut self, services: &mut Services) {
        for slot in self.arena.occupied_slots().into_iter().rev() {
            let Some(object) = self.live_object(slot).copied() else {
                continue;
            };
            match object.kind {
                ObjectKind::Monster { .. } => self.update_monster(slot, object, services),
                ObjectKind::Sword => {
                    if self.arena.object_timer(slot) == 0 {
                        self.delete(slot);
                    }
                }
                ObjectKind::Bomb(state) => self.update_bomb(slot, state, services),
                ObjectKind::Fire => self.update_fire(slot, object),
                ObjectKind::Block(state) => self.update_block(slot, object, state, services),
                ObjectKind::Player | ObjectKind::Ladder | ObjectKind::Item { .. } | ObjectKind::FluteMusic => {}
            }
        }
    }

    fn delete(&mut self, slot: Slot) {
        if let Some(object) = self.arena.get_mut(slot) {
            object.deleted = true;
        }
    }

    fn update_bomb(&mut self, slot: Slot, state: BombState, services: &mut Services) {
        if self.arena.object_timer(slot) > 0 {
            return;
        }
        let (next, frames) = match state {
            BombState::Ticking => {
                services.audio.play_effect(SoundEffect::BombBlast);
                (BombState::Blasting, BOMB_BLAST_FRAMES)
            }
            BombState::Blasting => (BombState::Fading, BOMB_FADE_FRAMES),
            BombState::Fading => {
                self.delete(slot);
                return;
            }
        };
        if let Some(bomb) = self.arena.get_mut(slot) {
            bomb.kind = ObjectKind::Bomb(next);
        }
        self.arena.set_object_timer(slot, frames);
    }

    fn update_fire(&mut self, slot: Slot, fire: Object) {
        let timer = self.arena.object_timer(slot);
        if timer == 0 {
            self.delete(slot);
        } else if timer > FIRE_STOP && self.monster_can_step(fire.pos, fire.facing) {
            if let Some(fire) = self.arena.get_mut(slot) {
                fire.pos = step(fire.pos, fire.facing, 1);
            }
        }
    }

    fn update_block(&mut self, slot: Slot, block: Object, state: BlockState, services: &mut Services) {
        match state {
            BlockState::Idle { pressed } => {
                let dir = self.pushing_against(block.pos, services.input);
                let pressed = if dir == Direction::None {
                    0
                } else {
                    pressed.saturating_add(1)
                };
                let next = if pressed >= BLOCK_PUSH_FRAMES {
                    self.start_block_slide(block.pos, dir)
                } else {
                    None
                };
                if let Some(block) = self.arena.get_mut(slot) {
                    match next {
                        Some(to) => {
                            block.kind = ObjectKind::Block(BlockState::Moving { to });
                            block.facing = dir;
                        }
                        None => block.kind = ObjectKind::Block(BlockState::Idle { pressed }),
                    }
                }
            }
            BlockState::Moving { to } => {
                if self.frame_counter % 2 != 0 {
                    return;
                }
                let pos = step(block.pos, block.facing, 1);
                if let Some(block) = self.arena.get_mut(slot) {
                    block.pos = pos;
                }
                if pos == to {
                    self.finish_block_slide(slot, to, services);
                }
            }
        }
    }

    /// Direction the player is pressing into the block, once the room is clear
    fn pushing_against(&self, block_pos: IVec2, input: &dyn InputSource) -> Direction {
        let dir = held_direction(input);
        let Some(pos) = self.player_pos() else {
            return Direction::None;
        };
        if dir == Direction::None || self.arena.monster_count() > 0 {
            return Direction::None;
        }
        let hit = self.collide(pos, CollisionMode::player(dir));
        if hit.collides && !hit.border && hit.row_col() == tile_at(block_pos) {
            dir
        } else {
            Direction::None
        }
    }

    /// Lift the block off the map; its old tile takes the floor it slides onto
    fn start_block_slide(&mut self, from: IVec2, dir: Direction) -> Option<IVec2> {
        let to = step(from, dir, TILE_WIDTH);
        let (row, col) = tile_at(from);
        let (to_row, to_col) = tile_at(to);
        if !self.tile_map.in_playfield_tile(to_row, to_col) {
            return None;
        }
        let floor = self.tile_map.tile(to_row, to_col);
        if self.level_data().behaviors.classify(floor).is_solid() {
            return None;
        }
        self.tile_map.set_tile(row, col, floor);
        log::debug!("Block at ({row}, {col}) pushed {dir:?}");
        Some(to)
    }

    fn finish_block_slide(&mut self, slot: Slot, to: IVec2, services: &mut Services) {
        let (row, col) = tile_at(to);
        if let Some(block_tile) = self.level_data().info.block_tile {
            self.tile_map.set_tile(row, col, block_tile);
        }
        self.delete(slot);
        self.room.block_pushed = true;

        let secret = self
            .level_data()
            .room_attrs(self.cur_room_id)
            .underworld()
            .secret();
        match secret {
            Secret::BlockStairs => {
                let Some(stairs) = self.level_data().behaviors.first_tile(TileBehavior::Stairs) else {
                    log::warn!("Tile set has no stairs tile");
                    return;
                };
                let (row, col) = BLOCK_STAIRS_TILE;
                self.tile_map.set_tile(row, col, stairs);
                services.audio.play_effect(SoundEffect::Secret);
            }
            Secret::BlockDoor => services.audio.play_effect(SoundEffect::Secret),
            _ => {}
        }
    }

    fn sliding_block_in_way(&self, pos: IVec2, dir: Direction) -> bool {
        let next = step(pos, dir, 1) + IVec2::new(0, 3);
        self.live_object(Slot::Role(Role::Buffer)).is_some_and(|block| {
            matches!(block.kind, ObjectKind::Block(BlockState::Moving { .. })) && block.touches(next, 0)
        })
    }

    fn monster_can_step(&self, pos: IVec2, dir: Direction) -> bool {
        dir != Direction::None
            && !at_player_limit(pos, dir)
            && !self.collide(pos, CollisionMode::other(dir)).collides
    }

    fn weapon_hits(&self, pos: IVec2) -> bool {
        let sword = self
            .live_object(Slot::Role(Role::PlayerSword))
            .is_some_and(|s| s.touches(pos, 0));
        let fire = [Role::Fire, Role::Fire2]
            .into_iter()
            .filter_map(|role| self.live_object(Slot::Role(role)))
            .any(|f| f.touches(pos, 2));
        let blast = [Role::Bomb, Role::Bomb2]
            .into_iter()
            .filter_map(|role| self.live_object(Slot::Role(role)))
            .any(|b| {
                b.kind == ObjectKind::Bomb(BombState::Blasting)
                    && (b.pos - pos).abs().max_element() < BOMB_BLAST_RADIUS
            });
        sword || fire || blast
    }

    fn update_monster(&mut self, slot: Slot, mut monster: Object, services: &mut Services) {
        monster.invincible_timer = monster.invincible_timer.saturating_sub(1);
        if monster.invincible_timer == 0 && self.weapon_hits(monster.pos) {
            monster.hp = monster.hp.saturating_sub(1);
            monster.invincible_timer = MONSTER_HIT_INVINCIBILITY;
            services.audio.play_effect(SoundEffect::MonsterHit);
            if monster.hp == 0 {
                monster.deleted = true;
                self.arena.set(slot, monster);
                return;
            }
        }

        // Wander on even frames unless stunned
        if self.arena.stun_timer(slot) == 0 && self.frame_counter % 2 == 0 {
            if self.arena.object_timer(slot) == 0 {
                monster.facing = Direction::from_ord(self.rng.random_range(0..4));
                let frames = self.rng.random_range(16..48);
                self.arena.set_object_timer(slot, frames);
            }
            if self.monster_can_step(monster.pos, monster.facing) {
                monster.pos = step(monster.pos, monster.facing, 1);
            } else {
                self.arena.set_object_timer(slot, 0);
            }
        }

        self.touch_player(&monster, services);
        self.arena.set(slot, monster);
    }

    fn touch_player(&mut self, monster: &Object, services: &mut Services) {
        let Some(player) = self.arena.player_mut() else {
            return;
        };
        if player.invincible_timer > 0 || !monster.touches(player.pos, 4) {
            return;
        }
        player.invincible_timer = PLAYER_HIT_INVINCIBILITY;
        self.profile.take_damage(CONTACT_DAMAGE);
        services.audio.play_effect(SoundEffect::PlayerHit);
    }
}

fn facing_or_up(facing: Direction) -> Direction {
    if facing == Direction::None {
        Direction::Up
    } else {
        facing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::demo::*;
    use crate::sim::harness::Harness;
    use crate::sim::mode::GameMode;

    fn monster_at(pos: IVec2) -> Object {
        Object::new(ObjectKind::Monster { list_id: 0 }, pos)
    }

    #[test]
    fn test_bombable_door_opens_both_sides() {
        let mut h = Harness::play_level(1);
        let slot = Slot::Role(Role::Bomb);
        h.sim
            .arena
            .set(slot, Object::new(ObjectKind::Bomb(BombState::Fading), IVec2::new(0xD0, 0x98)));
        h.sim.arena.set_object_timer(slot, 0x20);
        for _ in 0..12 {
            h.frame(&[]);
        }
        assert!(h.sim.uw_flags()[UW_START_ROOM as usize].door_state(Direction::Right));
        assert!(h.sim.uw_flags()[STAIRS_ROOM as usize].door_state(Direction::Left));
        assert!(h.audio.played.contains(&SoundEffect::Door));
        // Open or not, the door keeps its type
        let level = h.sim.level_data();
        assert_eq!(door_type(level, UW_START_ROOM, Direction::Right), DoorType::Bombable);
        assert_eq!(door_type(level, STAIRS_ROOM, Direction::Left), DoorType::Bombable);
    }

    #[test]
    fn test_bomb_lifecycle() {
        let mut h = Harness::play_in_room(0, 0x65, IVec2::new(0x78, 0x8D));
        h.sim.profile.items.bombs = 1;
        h.press(Button::B);
        let slot = Slot::Role(Role::Bomb);
        assert_eq!(h.sim.profile.items.bombs, 0);
        assert_eq!(h.sim.arena.get(slot).map(|b| b.kind), Some(ObjectKind::Bomb(BombState::Ticking)));
        for _ in 0..BOMB_TICKING_FRAMES {
            h.frame(&[]);
        }
        assert_eq!(h.sim.arena.get(slot).map(|b| b.kind), Some(ObjectKind::Bomb(BombState::Blasting)));
        for _ in 0..(BOMB_BLAST_FRAMES as usize + BOMB_FADE_FRAMES as usize + 4) {
            h.frame(&[]);
        }
        assert!(h.sim.arena.is_empty(slot));
    }

    #[test]
    fn test_key_door_spends_key_and_opens() {
        let mut h = Harness::play_in_room(1, UW_START_ROOM, IVec2::new(0x24, DOORWAY_Y));
        h.sim.profile.items.keys = 1;
        h.frame(&[Button::Left]);
        assert_eq!(h.sim.profile.items.keys, 0);
        for _ in 0..12 {
            h.frame(&[Button::Left]);
        }
        assert!(h.sim.uw_flags()[UW_START_ROOM as usize].door_state(Direction::Left));
        assert!(h.sim.uw_flags()[KEY_ROOM as usize].door_state(Direction::Right));

        h.run_until(GameMode::Scroll, &[Button::Left], 80);
        h.run_until(GameMode::Play, &[], 200);
        assert_eq!(h.sim.room_id(), KEY_ROOM);
    }

    #[test]
    fn test_locked_door_without_key_blocks() {
        let start = IVec2::new(0x24, DOORWAY_Y);
        let mut h = Harness::play_in_room(1, UW_START_ROOM, start);
        for _ in 0..20 {
            h.frame(&[Button::Left]);
        }
        assert_eq!(h.sim.player_pos(), Some(start));
        assert!(!h.sim.uw_flags()[UW_START_ROOM as usize].door_state(Direction::Left));
        assert_eq!(h.sim.mode(), GameMode::Play);
    }

    #[test]
    fn test_shutters_open_when_room_cleared() {
        let mut h = Harness::play_in_room(1, SHUTTER_ROOM, IVec2::new(0x78, 0xAD));
        assert_eq!(h.sim.arena.monster_count(), 3);
        for i in 0..MONSTER_SLOTS {
            if let Some(monster) = h.sim.arena.get_mut(Slot::Monster(i)) {
                monster.deleted = true;
            }
        }
        for _ in 0..12 {
            h.frame(&[]);
        }
        assert_eq!(h.sim.room.kill_count, 3);
        assert!(h.sim.uw_flags()[SHUTTER_ROOM as usize].door_state(Direction::Up));
        assert!(h.sim.uw_flags()[TRIFORCE_ROOM as usize].door_state(Direction::Down));
    }

    #[test]
    fn test_cleared_room_stays_empty() {
        let mut h = Harness::play_in_room(1, SHUTTER_ROOM, IVec2::new(0x78, 0xAD));
        for i in 0..MONSTER_SLOTS {
            h.sim.arena.take(Slot::Monster(i));
        }
        h.frame(&[]);
        // Leave through the open bottom door and come back
        h.run_until(GameMode::Scroll, &[Button::Down], 80);
        h.run_until(GameMode::Play, &[], 200);
        assert_eq!(h.sim.room_id(), UW_START_ROOM);
        h.run_until(GameMode::Scroll, &[Button::Up], 200);
        h.run_until(GameMode::Play, &[], 200);
        assert_eq!(h.sim.room_id(), SHUTTER_ROOM);
        assert_eq!(h.sim.arena.monster_count(), 0);
    }

    #[test]
    fn test_monster_capacity() {
        let h = Harness::play_in_room(0, CROWDED_ROOM, IVec2::new(0x78, 0x8D));
        assert_eq!(h.sim.arena.monster_count(), MONSTER_SLOTS);
        assert!(h.sim.arena.is_empty(Slot::Role(Role::Buffer)));
    }

    #[test]
    fn test_sword_kills_monster() {
        let mut h = Harness::play_in_room(0, 0x65, IVec2::new(0x78, 0x80));
        h.sim.profile.items.sword = 1;
        h.sim
            .arena
            .set(Slot::Monster(0), monster_at(IVec2::new(0x78, 0x70)).with_hp(1));
        h.press(Button::A);
        assert!(h.sim.arena.is_empty(Slot::Monster(0)));
        assert_eq!(h.sim.room.kill_count, 1);
        assert!(h.audio.played.contains(&SoundEffect::MonsterHit));
    }

    #[test]
    fn test_contact_damage_and_invincibility() {
        let mut h = Harness::play_in_room(0, 0x65, IVec2::new(0x78, 0x80));
        let full = h.sim.profile.hearts;
        h.sim.arena.set(Slot::Monster(0), monster_at(IVec2::new(0x78, 0x80)));
        h.sim.arena.set_stun_timer(Slot::Monster(0), 0xFF);
        h.frame(&[]);
        assert_eq!(h.sim.profile.hearts, full - CONTACT_DAMAGE);
        h.frame(&[]);
        assert_eq!(h.sim.profile.hearts, full - CONTACT_DAMAGE);
    }

    #[test]
    fn test_water_needs_ladder() {
        let start = standing_pos(7, 7);
        let mut h = Harness::play_in_room(0, WATER_ROOM, start);
        for _ in 0..10 {
            h.frame(&[Button::Up]);
        }
        assert_eq!(h.sim.player_pos(), Some(start));

        h.sim.profile.items.ladder = true;
        for _ in 0..40 {
            h.frame(&[Button::Up]);
        }
        let pos = h.sim.player_pos().unwrap();
        assert!(pos.y < start.y, "player never left the shore at {pos}");
        assert_eq!(h.sim.behavior_under_player(), Some(TileBehavior::Water));
        assert!(h.sim.arena.get(Slot::Role(Role::Ladder)).is_some());

        // One ladder spans one tile: the next water row holds the player
        for _ in 0..40 {
            h.frame(&[Button::Up]);
        }
        assert_eq!(h.sim.player_pos(), Some(pos));
        assert!(pos.y > standing_pos(5, 7).y);
        assert_eq!(h.sim.room_id(), WATER_ROOM);

        // Back to the shore picks the ladder up
        for _ in 0..40 {
            h.frame(&[Button::Down]);
        }
        assert!(h.sim.arena.is_empty(Slot::Role(Role::Ladder)));
    }

    /// Press into the block long enough to move it, then wait it out
    fn push_block_up(h: &mut Harness) {
        for _ in 0..20 {
            h.frame(&[Button::Up]);
        }
        for _ in 0..80 {
            h.frame(&[]);
        }
    }

    #[test]
    fn test_push_block_opens_shutter() {
        let mut h = Harness::play_in_room(1, BLOCK_DOOR_ROOM, standing_pos(6, 7));
        assert!(h.sim.arena.get(Slot::Role(Role::Buffer)).is_some());
        assert!(!h.sim.uw_flags()[BLOCK_DOOR_ROOM as usize].door_state(Direction::Up));

        push_block_up(&mut h);
        assert_eq!(h.sim.tile_map.tile(4, 7), tiles::BLOCK);
        assert_eq!(h.sim.tile_map.tile(5, 7), tiles::FLOOR);
        assert!(h.sim.arena.is_empty(Slot::Role(Role::Buffer)));
        assert!(h.sim.uw_flags()[BLOCK_DOOR_ROOM as usize].door_state(Direction::Up));
        assert!(h.audio.played.contains(&SoundEffect::Secret));
    }

    #[test]
    fn test_push_block_uncovers_stairs() {
        let mut h = Harness::play_in_room(1, BLOCK_STAIRS_ROOM, standing_pos(6, 7));
        let (row, col) = BLOCK_STAIRS_TILE;
        assert_eq!(h.sim.tile_map.tile(row, col), tiles::FLOOR);

        push_block_up(&mut h);
        assert_eq!(h.sim.tile_map.tile(4, 7), tiles::BLOCK);
        assert_eq!(h.sim.tile_map.tile(row, col), tiles::STAIRS);
    }

    #[test]
    fn test_push_block_stays_while_monsters_live() {
        let mut h = Harness::play_in_room(1, BLOCK_DOOR_ROOM, standing_pos(6, 7));
        h.sim.arena.set(Slot::Monster(0), monster_at(standing_pos(3, 3)));
        h.sim.arena.set_stun_timer(Slot::Monster(0), 0xFF);
        for _ in 0..40 {
            h.frame(&[Button::Up]);
        }
        assert_eq!(h.sim.tile_map.tile(5, 7), tiles::BLOCK);
        assert_eq!(
            h.sim.arena.get(Slot::Role(Role::Buffer)).map(|b| b.kind),
            Some(ObjectKind::Block(BlockState::Idle { pressed: 0 }))
        );
    }

    #[test]
    fn test_stairs_to_cellar_and_back() {
        let mut h = Harness::play_in_room(1, STAIRS_ROOM, standing_pos(3, 11));
        h.run_until(GameMode::Stairs, &[Button::Right], 40);
        h.run_until_play(&[], 300);
        assert_eq!(h.sim.mode(), GameMode::PlayCellar);
        assert_eq!(h.sim.room_id(), CELLAR_ROOM);
        assert_eq!(h.sim.player_pos().map(|p| p.x), Some(0x30));

        h.run_until(GameMode::LeaveCellar, &[Button::Up], 100);
        h.run_until(GameMode::Play, &[], 200);
        assert_eq!(h.sim.room_id(), STAIRS_ROOM);
        assert_eq!(h.sim.player_pos(), Some(standing_pos(3, 12)));
        h.frame(&[]);
        assert_eq!(h.sim.mode(), GameMode::Play);
    }

    #[test]
    fn test_item_cave() {
        let mut h = Harness::play_in_room(0, ITEM_CAVE_ROOM, IVec2::new(0x78, 0x8D));
        h.run_until(GameMode::Stairs, &[Button::Up], 40);
        h.run_until_play(&[], 200);
        assert_eq!(h.sim.mode(), GameMode::PlayCave);
        assert!(h.sim.arena.get(Slot::Role(Role::Item)).is_some());
        for _ in 0..30 {
            if h.sim.profile.items.sword > 0 {
                break;
            }
            h.frame(&[Button::Up]);
        }
        assert_eq!(h.sim.profile.items.sword, item_id::WOOD_SWORD);

        h.run_until(GameMode::LeaveCellar, &[Button::Down], 120);
        h.run_until(GameMode::Play, &[], 100);
        assert_eq!(h.sim.room_id(), ITEM_CAVE_ROOM);
        assert_eq!(h.sim.player_pos(), Some(IVec2::new(0x70, 0x9D)));
        assert!(h.sim.profile.ow_flags[ITEM_CAVE_ROOM as usize].item_taken());
    }

    #[test]
    fn test_shortcut_stairs() {
        let origin = SHORTCUT_ROOMS[0];
        let mut h = Harness::play_in_room(0, origin, IVec2::new(0x78, 0x8D));
        h.run_until(GameMode::Stairs, &[Button::Up], 40);
        h.run_until_play(&[], 200);
        assert_eq!(h.sim.mode(), GameMode::PlayShortcuts);
        h.run_until(GameMode::LeaveCellar, &[Button::Up], 100);
        h.run_until(GameMode::Play, &[], 100);
        assert_eq!(h.sim.room_id(), SHORTCUT_ROOMS[1]);
        assert!(h.sim.profile.ow_flags[origin as usize].shortcut_taken());
    }

    #[test]
    fn test_flute_freezes_room() {
        let mut h = Harness::play_in_room(0, CROWDED_ROOM, IVec2::new(0x78, 0x8D));
        h.sim.profile.items.recorder = true;
        h.sim.profile.selected_item = SelectedItem::Recorder;
        h.press(Button::B);
        let before = h.sim.arena.get(Slot::Monster(0)).copied();
        for _ in 0..20 {
            h.frame(&[]);
        }
        assert_eq!(h.sim.arena.get(Slot::Monster(0)).copied(), before);
        assert!(h.sim.arena.get(Slot::Role(Role::FluteMusic)).is_some());
    }

    #[test]
    fn test_held_direction_priority() {
        let mut input = crate::platform::ScriptedInput::new();
        input.next_frame(&[Button::Right, Button::Up]);
        assert_eq!(held_direction(&input), Direction::Up);
        input.next_frame(&[Button::Left, Button::Right]);
        assert_eq!(held_direction(&input), Direction::Left);
        input.next_frame(&[]);
        assert_eq!(held_direction(&input), Direction::None);
    }
}
