//! Fixed-step frame advance
//!
//! `advance_frame` runs the current mode's update. A mode that switches to
//! another hands the rest of the frame to the new mode, so one frame may run
//! through several modes; the chain length is bounded by the settings.

use glam::IVec2;

use super::collision::standing_pos;
use super::doors::{DoorType, door_type, find_cellar_room, next_room_id};
use super::mode::{
    ContinueChoice, DeathStage, EndLevelStage, EnterStage, LeaveStage, ModeState, PassageStage,
    ScrollStage, UnfurlStage, WinGameStage,
};
use super::objects::ObjectArena;
use super::state::Simulation;
use super::tile::TileBehavior;
use crate::audio::SoundEffect;
use crate::consts::*;
use crate::platform::{Button, Services};
use crate::profile::{DEFAULT_HEARTS, PROFILE_SLOTS, Profile};
use crate::{Direction, at_player_limit};

const LOAD_LEVEL_FRAMES: u8 = 18;
const UNFURL_HOLD_FRAMES: u8 = 11;
const UNFURL_STEP_FRAMES: u8 = 4;
const UNFURL_STEP: i32 = 8;
/// Half the map width; the curtain opens outward from here
const UNFURL_CENTER: i32 = 0x80;
const ENTER_WAIT_FRAMES: u8 = 2;
/// Pixels walked into a dungeon room, doubled through shutters and holes
const ENTER_WALK: i32 = 16;
const LEAVE_WAIT_FRAMES: u8 = 2;
const SCROLL_HOLD_FRAMES: u8 = 32;
const FADE_STEP_FRAMES: u8 = 9;
/// Palette steps between lit and dark
pub const FADE_LENGTH: u8 = 4;
const STAIRS_FRAMES: u8 = 0x20;
const CAVE_WAIT_FRAMES: u8 = 27;
const CAVE_EXIT_WAIT_FRAMES: u8 = 29;
const CAVE_WALK: u8 = 0x30;
const CAVE_ENTRY: IVec2 = IVec2::new(0x70, 0xDD);
const CELLAR_WALK: u8 = 0x1C;
const CELLAR_ENTRY_Y: i32 = 0x44;
const MENU_ENTRIES: usize = PROFILE_SLOTS + 2;
const HEART_FILL_STEP: u16 = 0x40;

impl Simulation {
    /// Run one frame: mode logic, then drawing
    ///
    /// Panics if modes keep switching past `settings.max_mode_chain`.
    pub fn advance_frame(&mut self, services: &mut Services) {
        self.frame_counter = self.frame_counter.wrapping_add(1);
        self.press_taken = false;

        let mut chain = 0;
        loop {
            self.transitioned = false;
            self.update_mode(services);
            if !self.transitioned {
                break;
            }
            chain += 1;
            if chain > self.settings.max_mode_chain {
                panic!(
                    "{} mode transitions in frame {}, stuck in {:?}",
                    chain,
                    self.frame_counter,
                    self.mode()
                );
            }
        }

        self.draw(services.renderer);
    }

    /// Start a level from its entrance, as a debug warp or host command
    pub fn start_level(&mut self, level: u8) -> bool {
        self.goto_load_level(level, true)
    }

    fn update_mode(&mut self, services: &mut Services) {
        match self.state {
            ModeState::Demo { timer } => self.update_demo(services, timer),
            ModeState::GameMenu { cursor } => self.update_game_menu(services, cursor),
            ModeState::Register => self.update_register(services),
            ModeState::Elimination { cursor } => self.update_elimination(services, cursor),
            ModeState::LoadLevel {
                level,
                restart_ow,
                timer,
            } => self.update_load_level(level, restart_ow, timer),
            ModeState::Unfurl {
                stage,
                restart_ow,
                timer,
                left,
                right,
            } => self.update_unfurl(stage, restart_ow, timer, left, right),
            ModeState::Enter {
                stage,
                dir,
                timer,
                remaining,
            } => self.update_enter(stage, dir, timer, remaining),
            ModeState::Play => self.update_play(services),
            ModeState::Leave { stage, dir, timer } => self.update_leave(stage, dir, timer),
            ModeState::Scroll {
                stage,
                dir,
                timer,
                next_room,
                offset,
            } => self.update_scroll(stage, dir, timer, next_room, offset),
            ModeState::ContinueQuestion { choice } => self.update_continue(services, choice),
            ModeState::InitPlayCellar => self.update_init_play_cellar(),
            ModeState::PlayCellar {
                stage,
                cellar,
                from_left,
                timer,
            } => self.update_play_cellar(stage, cellar, from_left, timer),
            ModeState::LeaveCellar {
                stage,
                target,
                timer,
            } => self.update_leave_cellar(stage, target, timer),
            ModeState::InitPlayCave => self.update_init_play_cave(),
            ModeState::PlayCave {
                stage,
                shortcuts,
                timer,
            } => self.update_play_cave(stage, shortcuts, timer),
            ModeState::Stairs { tile, timer } => self.update_stairs(tile, timer),
            ModeState::Death { stage, timer } => self.update_death(stage, timer),
            ModeState::EndLevel { stage, timer } => self.update_end_level(stage, timer),
            ModeState::WinGame { stage, timer } => self.update_win_game(services, stage, timer),
        }
    }

    // Menus

    fn update_demo(&mut self, services: &mut Services, timer: u32) {
        if self.take_press(services, Button::Start) || timer >= self.settings.demo_length_frames {
            self.goto(ModeState::GameMenu { cursor: 0 });
        } else {
            self.state = ModeState::Demo { timer: timer + 1 };
        }
    }

    fn update_game_menu(&mut self, services: &mut Services, cursor: usize) {
        if self.take_press(services, Button::Select) {
            services.audio.play_effect(SoundEffect::Cursor);
            self.state = ModeState::GameMenu {
                cursor: (cursor + 1) % MENU_ENTRIES,
            };
        } else if self.take_press(services, Button::Start) {
            match cursor {
                slot if slot < PROFILE_SLOTS => self.start_game(services, slot),
                PROFILE_SLOTS => self.goto(ModeState::Register),
                _ => self.goto(ModeState::Elimination { cursor: 0 }),
            }
        }
    }

    fn new_profile(&self) -> Profile {
        Profile {
            quest: self.settings.quest,
            ..Profile::default()
        }
    }

    fn start_game(&mut self, services: &mut Services, slot: usize) {
        let mut profile = match services.profiles.read_profile(slot) {
            Ok(Some(profile)) => profile,
            Ok(None) => self.new_profile(),
            Err(err) => {
                log::warn!("Could not read profile {slot}: {err}");
                self.new_profile()
            }
        };
        profile.hearts = Profile::max_hearts_value_for(DEFAULT_HEARTS).min(profile.max_hearts_value());
        log::info!("Starting game with profile {slot} ({})", profile.name);
        self.profile = profile;
        self.profile_slot = slot;
        self.saved_ow_room = None;
        self.goto_load_level(0, true);
    }

    pub(crate) fn save_profile(&mut self, services: &mut Services) {
        if let Err(err) = services.profiles.write_profile(self.profile_slot, &self.profile) {
            log::warn!("Could not save profile {}: {err}", self.profile_slot);
        }
    }

    fn update_register(&mut self, services: &mut Services) {
        if !self.take_press(services, Button::Start) {
            return;
        }
        let free = (0..PROFILE_SLOTS).find(|&slot| matches!(services.profiles.read_profile(slot), Ok(None)));
        match free {
            Some(slot) => match services.profiles.write_profile(slot, &self.new_profile()) {
                Ok(()) => log::info!("Registered profile {slot}"),
                Err(err) => log::warn!("Could not register profile {slot}: {err}"),
            },
            None => log::warn!("No free profile slot"),
        }
        self.goto(ModeState::GameMenu { cursor: 0 });
    }

    fn update_elimination(&mut self, services: &mut Services, cursor: usize) {
        if self.take_press(services, Button::Select) {
            services.audio.play_effect(SoundEffect::Cursor);
            self.state = ModeState::Elimination {
                cursor: (cursor + 1) % PROFILE_SLOTS,
            };
        } else if self.take_press(services, Button::Start) {
            match services.profiles.delete_profile(cursor) {
                Ok(()) => log::info!("Deleted profile {cursor}"),
                Err(err) => log::warn!("Could not delete profile {cursor}: {err}"),
            }
            self.goto(ModeState::GameMenu { cursor: 0 });
        }
    }

    fn update_continue(&mut self, services: &mut Services, choice: ContinueChoice) {
        if self.take_press(services, Button::Select) {
            services.audio.play_effect(SoundEffect::Cursor);
            self.state = ModeState::ContinueQuestion { choice: choice.next() };
            return;
        }
        if !self.take_press(services, Button::Start) {
            return;
        }
        self.profile.hearts =
            Profile::max_hearts_value_for(DEFAULT_HEARTS).min(self.profile.max_hearts_value());
        match choice {
            ContinueChoice::Continue => self.goto_unfurl(true),
            ContinueChoice::Save => {
                self.save_profile(services);
                self.goto(ModeState::GameMenu { cursor: 0 });
            }
            ContinueChoice::Retry => self.goto(ModeState::GameMenu { cursor: 0 }),
        }
    }

    // Level start

    /// Start loading a level; false when the world has no such level
    pub(crate) fn goto_load_level(&mut self, level: u8, restart_ow: bool) -> bool {
        if self.world().level(level).is_none() {
            log::warn!("Level {level} is not in this world");
            return false;
        }
        self.goto(ModeState::LoadLevel {
            level,
            restart_ow,
            timer: LOAD_LEVEL_FRAMES,
        });
        self.level = level;
        self.arena = ObjectArena::new();
        self.old_tile_map = None;
        self.dark_fade_step = 0;
        log::info!("Loading level {level}");
        true
    }

    fn update_load_level(&mut self, level: u8, restart_ow: bool, timer: u8) {
        if timer == 0 {
            self.goto_unfurl(restart_ow);
        } else {
            self.state = ModeState::LoadLevel {
                level,
                restart_ow,
                timer: timer - 1,
            };
        }
    }

    fn goto_unfurl(&mut self, restart_ow: bool) {
        self.goto(ModeState::Unfurl {
            stage: UnfurlStage::Start,
            restart_ow,
            timer: 0,
            left: UNFURL_CENTER,
            right: UNFURL_CENTER,
        });
    }

    fn update_unfurl(&mut self, stage: UnfurlStage, restart_ow: bool, timer: u8, left: i32, right: i32) {
        let (stage, timer, left, right) = match stage {
            UnfurlStage::Start => {
                self.unfurl_room(restart_ow);
                (UnfurlStage::Hold, UNFURL_HOLD_FRAMES, left, right)
            }
            UnfurlStage::Hold if timer > 0 => (stage, timer - 1, left, right),
            UnfurlStage::Hold => (UnfurlStage::Widen, UNFURL_STEP_FRAMES, left, right),
            UnfurlStage::Widen if timer > 0 => (stage, timer - 1, left, right),
            UnfurlStage::Widen => {
                let left = left - UNFURL_STEP;
                if left <= 0 {
                    let dir = if self.is_overworld() {
                        Direction::None
                    } else {
                        Direction::Up
                    };
                    self.goto_enter(dir);
                    return;
                }
                (stage, UNFURL_STEP_FRAMES, left, right + UNFURL_STEP)
            }
        };
        self.state = ModeState::Unfurl {
            stage,
            restart_ow,
            timer,
            left,
            right,
        };
    }

    /// Load the first room of a level, or the overworld room a dungeon
    /// was entered from
    fn unfurl_room(&mut self, restart_ow: bool) {
        self.dark_fade_step = 0;
        let resume = self.saved_ow_room.filter(|_| self.is_overworld() && !restart_ow);
        match resume {
            Some(room) => {
                self.load_room(room);
                let pos = self.cave_exit_pos(room);
                self.place_player(pos, Direction::Down);
            }
            None => {
                let info = &self.level_data().info;
                let (room, y) = (info.start_room_id, info.start_y);
                self.load_room(room);
                self.place_player(IVec2::new(START_X, y), Direction::Up);
            }
        }
    }

    // Room to room

    pub(crate) fn goto_enter(&mut self, dir: Direction) {
        self.goto(ModeState::Enter {
            stage: EnterStage::Start,
            dir,
            timer: 0,
            remaining: 0,
        });
    }

    fn update_enter(&mut self, stage: EnterStage, dir: Direction, timer: u8, remaining: i32) {
        match stage {
            EnterStage::Start => {
                self.old_tile_map = None;
                self.state = if dir == Direction::None || self.is_overworld() {
                    ModeState::Enter {
                        stage: EnterStage::Wait,
                        dir,
                        timer: ENTER_WAIT_FRAMES,
                        remaining: 0,
                    }
                } else {
                    let side = dir.opposite();
                    let door = door_type(self.level_data(), self.cur_room_id, side);
                    let remaining = match door {
                        DoorType::Shutter | DoorType::Bombable => ENTER_WALK * 2,
                        _ => ENTER_WALK,
                    };
                    self.doorway_dir = side;
                    ModeState::Enter {
                        stage: EnterStage::Walk,
                        dir,
                        timer: 0,
                        remaining,
                    }
                };
            }
            EnterStage::Wait if timer > 0 => {
                self.state = ModeState::Enter {
                    stage,
                    dir,
                    timer: timer - 1,
                    remaining,
                };
            }
            EnterStage::Wait => self.goto_play(),
            EnterStage::Walk => {
                self.move_player(dir, 1);
                if remaining <= 1 {
                    self.goto_play();
                } else {
                    self.state = ModeState::Enter {
                        stage,
                        dir,
                        timer,
                        remaining: remaining - 1,
                    };
                }
            }
        }
    }

    pub(crate) fn goto_play(&mut self) {
        self.goto(ModeState::Play);
        self.populate_room();
    }

    fn update_leave(&mut self, stage: LeaveStage, dir: Direction, timer: u8) {
        match stage {
            LeaveStage::Walk => {
                if self.player_pos().is_none_or(|pos| at_player_limit(pos, dir)) {
                    self.state = ModeState::Leave {
                        stage: LeaveStage::Wait,
                        dir,
                        timer: LEAVE_WAIT_FRAMES,
                    };
                } else {
                    self.move_player(dir, 1);
                }
            }
            LeaveStage::Wait if timer > 0 => {
                self.state = ModeState::Leave {
                    stage,
                    dir,
                    timer: timer - 1,
                };
            }
            LeaveStage::Wait => self.goto(ModeState::Scroll {
                stage: ScrollStage::Start,
                dir,
                timer: 0,
                next_room: self.cur_room_id,
                offset: 0,
            }),
        }
    }

    fn update_scroll(&mut self, stage: ScrollStage, dir: Direction, timer: u8, next_room: u8, offset: i32) {
        let scroll = |stage, timer, next_room, offset| ModeState::Scroll {
            stage,
            dir,
            timer,
            next_room,
            offset,
        };
        match stage {
            ScrollStage::Start => {
                let level = self.level_data();
                if !level.is_overworld()
                    && self.cur_room_id == level.info.start_room_id
                    && dir == Direction::Down
                {
                    self.goto_load_level(0, false);
                    return;
                }
                let Some(next) = next_room_id(self.cur_room_id, dir) else {
                    log::warn!("Scroll {dir:?} out of room {:#04x} has no target", self.cur_room_id);
                    self.goto_enter(Direction::None);
                    return;
                };
                self.state = if self.room_is_dark(next) && self.dark_fade_step == 0 {
                    scroll(ScrollStage::FadeOut, FADE_STEP_FRAMES, next, 0)
                } else {
                    scroll(ScrollStage::Hold, SCROLL_HOLD_FRAMES, next, 0)
                };
            }
            ScrollStage::FadeOut if timer > 0 => self.state = scroll(stage, timer - 1, next_room, offset),
            ScrollStage::FadeOut => {
                self.dark_fade_step += 1;
                self.state = if self.dark_fade_step >= FADE_LENGTH {
                    scroll(ScrollStage::Hold, SCROLL_HOLD_FRAMES, next_room, offset)
                } else {
                    scroll(stage, FADE_STEP_FRAMES, next_room, offset)
                };
            }
            ScrollStage::Hold if timer > 0 => self.state = scroll(stage, timer - 1, next_room, offset),
            ScrollStage::Hold => self.state = scroll(ScrollStage::LoadRoom, 0, next_room, offset),
            ScrollStage::LoadRoom => {
                let old = self.tile_map.clone();
                let pos = self.player_pos();
                self.load_room(next_room);
                self.old_tile_map = Some(old);
                if !self.room_is_dark(next_room) {
                    self.dark_fade_step = 0;
                }
                if let Some(pos) = pos {
                    self.place_player(entry_pos(pos, dir), dir);
                }
                let offset = if dir.is_vertical() {
                    TILE_MAP_HEIGHT
                } else {
                    TILE_MAP_WIDTH
                };
                self.state = scroll(ScrollStage::Scroll, 0, next_room, offset);
            }
            ScrollStage::Scroll => {
                let offset = offset - SCROLL_SPEED;
                if offset <= 0 {
                    self.old_tile_map = None;
                    self.goto_enter(dir);
                } else {
                    self.state = scroll(stage, timer, next_room, offset);
                }
            }
        }
    }

    // Stairs, cellars and caves

    pub(crate) fn goto_stairs(&mut self, tile: TileBehavior, services: &mut Services) {
        services.audio.play_effect(SoundEffect::Stairs);
        self.goto(ModeState::Stairs {
            tile,
            timer: STAIRS_FRAMES,
        });
    }

    fn update_stairs(&mut self, tile: TileBehavior, timer: u8) {
        if timer > 0 {
            self.state = ModeState::Stairs {
                tile,
                timer: timer - 1,
            };
            return;
        }
        if !self.is_overworld() {
            self.goto(ModeState::InitPlayCellar);
            return;
        }
        let origin = self.cur_room_id;
        let cave_id = self.level_data().room_attrs(origin).overworld().cave_id();
        if (1..=9).contains(&cave_id) {
            if self.goto_load_level(cave_id, false) {
                self.saved_ow_room = Some(origin);
            } else {
                self.goto_play();
            }
        } else {
            self.goto(ModeState::InitPlayCave);
        }
    }

    fn update_init_play_cave(&mut self) {
        let shortcuts = self
            .level_data()
            .info
            .shortcut_room_ids
            .contains(&self.cur_room_id);
        self.goto(ModeState::PlayCave {
            stage: PassageStage::Wait,
            shortcuts,
            timer: CAVE_WAIT_FRAMES,
        });
    }

    fn update_play_cave(&mut self, stage: PassageStage, shortcuts: bool, timer: u8) {
        let cave = |stage, timer| ModeState::PlayCave {
            stage,
            shortcuts,
            timer,
        };
        match stage {
            PassageStage::Wait if timer > 0 => self.state = cave(stage, timer - 1),
            PassageStage::Wait | PassageStage::FadeOut | PassageStage::FadeIn => {
                self.state = cave(PassageStage::LoadRoom, 0);
            }
            PassageStage::LoadRoom => {
                self.load_cave(shortcuts);
                self.place_player(CAVE_ENTRY, Direction::Up);
                self.state = cave(PassageStage::Walk, CAVE_WALK);
            }
            PassageStage::Walk => {
                self.move_player(Direction::Up, 1);
                if timer <= 1 {
                    self.goto_play();
                } else {
                    self.state = cave(stage, timer - 1);
                }
            }
        }
    }

    fn update_init_play_cellar(&mut self) {
        match find_cellar_room(self.level_data(), self.cur_room_id) {
            Some((cellar, from_left)) => self.goto(ModeState::PlayCellar {
                stage: PassageStage::FadeOut,
                cellar,
                from_left,
                timer: FADE_STEP_FRAMES,
            }),
            None => {
                log::warn!("Room {:#04x} has stairs but no cellar", self.cur_room_id);
                self.goto_play();
            }
        }
    }

    fn update_play_cellar(&mut self, stage: PassageStage, cellar: u8, from_left: bool, timer: u8) {
        let passage = |stage, timer| ModeState::PlayCellar {
            stage,
            cellar,
            from_left,
            timer,
        };
        match stage {
            PassageStage::Wait => self.state = passage(PassageStage::FadeOut, FADE_STEP_FRAMES),
            PassageStage::FadeOut if timer > 0 => self.state = passage(stage, timer - 1),
            PassageStage::FadeOut => {
                self.dark_fade_step += 1;
                self.state = if self.dark_fade_step >= FADE_LENGTH {
                    passage(PassageStage::LoadRoom, 0)
                } else {
                    passage(stage, FADE_STEP_FRAMES)
                };
            }
            PassageStage::LoadRoom => {
                self.load_room(cellar);
                let x = if from_left { 0x30 } else { 0xC0 };
                self.place_player(IVec2::new(x, CELLAR_ENTRY_Y), Direction::Down);
                self.state = passage(PassageStage::FadeIn, FADE_STEP_FRAMES);
            }
            PassageStage::FadeIn if timer > 0 => self.state = passage(stage, timer - 1),
            PassageStage::FadeIn => {
                self.dark_fade_step = self.dark_fade_step.saturating_sub(1);
                self.state = if self.dark_fade_step == 0 {
                    passage(PassageStage::Walk, CELLAR_WALK)
                } else {
                    passage(stage, FADE_STEP_FRAMES)
                };
            }
            PassageStage::Walk => {
                self.move_player(Direction::Down, 1);
                if timer <= 1 {
                    self.goto_play();
                } else {
                    self.state = passage(stage, timer - 1);
                }
            }
        }
    }

    /// Climb out of a cellar or cave; `target` picks a shortcut exit
    pub(crate) fn goto_leave_cellar(&mut self, target: Option<u8>) {
        let next = if self.is_overworld() {
            ModeState::LeaveCellar {
                stage: PassageStage::Wait,
                target,
                timer: CAVE_EXIT_WAIT_FRAMES,
            }
        } else {
            ModeState::LeaveCellar {
                stage: PassageStage::FadeOut,
                target: None,
                timer: FADE_STEP_FRAMES,
            }
        };
        self.goto(next);
    }

    fn update_leave_cellar(&mut self, stage: PassageStage, target: Option<u8>, timer: u8) {
        let leave = |stage, timer| ModeState::LeaveCellar {
            stage,
            target,
            timer,
        };
        match stage {
            PassageStage::Wait if timer > 0 => self.state = leave(stage, timer - 1),
            PassageStage::Wait => self.state = leave(PassageStage::LoadRoom, 0),
            PassageStage::FadeOut if timer > 0 => self.state = leave(stage, timer - 1),
            PassageStage::FadeOut => {
                self.dark_fade_step += 1;
                self.state = if self.dark_fade_step >= FADE_LENGTH {
                    leave(PassageStage::LoadRoom, 0)
                } else {
                    leave(stage, FADE_STEP_FRAMES)
                };
            }
            PassageStage::LoadRoom => {
                if self.is_overworld() {
                    self.leave_cave(target);
                    self.goto_enter(Direction::None);
                } else {
                    self.leave_cellar_room();
                    self.state = leave(PassageStage::FadeIn, FADE_STEP_FRAMES);
                }
            }
            PassageStage::FadeIn if timer > 0 => self.state = leave(stage, timer - 1),
            PassageStage::FadeIn => {
                self.dark_fade_step = self.dark_fade_step.saturating_sub(1);
                if self.dark_fade_step == 0 {
                    self.goto_enter(Direction::None);
                } else {
                    self.state = leave(stage, FADE_STEP_FRAMES);
                }
            }
            PassageStage::Walk => self.goto_enter(Direction::None),
        }
    }

    fn leave_cave(&mut self, target: Option<u8>) {
        let room = target.unwrap_or(self.room.cave_origin);
        self.load_room(room);
        let pos = self.cave_exit_pos(room);
        self.place_player(pos, Direction::Down);
    }

    /// Load the cellar exit on the player's side and stand on its stairs
    fn leave_cellar_room(&mut self) {
        let x = self.player_pos().map_or(0, |pos| pos.x);
        let cellar = self.cur_room_id;
        let attrs = *self.level_data().room_attrs(cellar);
        let uw = attrs.underworld();
        let exit = if x < 0x80 {
            uw.left_cellar_exit()
        } else {
            uw.right_cellar_exit()
        };
        self.load_room(exit);
        let pos = self
            .find_tile(TileBehavior::Stairs)
            .map_or(IVec2::new(START_X, DOORWAY_Y), |(row, col)| standing_pos(row, col));
        self.place_player(pos, Direction::Down);
    }

    // End of a life, a level, or the game

    pub(crate) fn goto_death(&mut self, services: &mut Services) {
        self.profile.deaths = self.profile.deaths.saturating_add(1);
        services.audio.play_effect(SoundEffect::Death);
        log::info!("Player died ({} deaths)", self.profile.deaths);
        self.goto(ModeState::Death {
            stage: DeathStage::Flash,
            timer: 0x20,
        });
    }

    fn update_death(&mut self, stage: DeathStage, timer: u8) {
        if timer > 0 {
            self.state = ModeState::Death {
                stage,
                timer: timer - 1,
            };
            return;
        }
        let (stage, timer) = match stage {
            DeathStage::Flash => (DeathStage::Spin, 0x40),
            DeathStage::Spin => (DeathStage::Fade, 0x20),
            DeathStage::Fade => (DeathStage::GameOver, 0x60),
            DeathStage::GameOver => {
                self.goto(ModeState::ContinueQuestion {
                    choice: ContinueChoice::Continue,
                });
                return;
            }
        };
        self.state = ModeState::Death { stage, timer };
    }

    pub(crate) fn goto_end_level(&mut self) {
        log::info!("Level {} complete", self.level);
        self.goto(ModeState::EndLevel {
            stage: EndLevelStage::Wait1,
            timer: 0x30,
        });
    }

    fn update_end_level(&mut self, stage: EndLevelStage, timer: u8) {
        if timer > 0 {
            self.state = ModeState::EndLevel {
                stage,
                timer: timer - 1,
            };
            return;
        }
        let (stage, timer) = match stage {
            EndLevelStage::Wait1 => (EndLevelStage::Flash, 0x30),
            EndLevelStage::Flash => (EndLevelStage::FillHearts, 0),
            EndLevelStage::FillHearts => {
                let max = self.profile.max_hearts_value();
                self.profile.hearts = self.profile.hearts.saturating_add(HEART_FILL_STEP).min(max);
                if self.profile.hearts < max {
                    (EndLevelStage::FillHearts, 0)
                } else {
                    (EndLevelStage::Wait2, 0x80)
                }
            }
            EndLevelStage::Wait2 => (EndLevelStage::Furl, 0x80),
            EndLevelStage::Furl => {
                self.goto_load_level(0, false);
                return;
            }
        };
        self.state = ModeState::EndLevel { stage, timer };
    }

    pub(crate) fn goto_win_game(&mut self) {
        log::info!("Game won");
        self.goto(ModeState::WinGame {
            stage: WinGameStage::Text,
            timer: 0x80,
        });
    }

    fn update_win_game(&mut self, services: &mut Services, stage: WinGameStage, timer: u8) {
        let next = match stage {
            _ if timer > 0 => ModeState::WinGame {
                stage,
                timer: timer - 1,
            },
            WinGameStage::Text => ModeState::WinGame {
                stage: WinGameStage::Credits,
                timer: 0x80,
            },
            WinGameStage::Credits => ModeState::WinGame {
                stage: WinGameStage::Done,
                timer: 0,
            },
            WinGameStage::Done => {
                if self.take_press(services, Button::Start) {
                    self.profile.quest = self.profile.quest.saturating_add(1);
                    self.save_profile(services);
                    self.goto(ModeState::GameMenu { cursor: 0 });
                }
                return;
            }
        };
        self.state = next;
    }
}

/// Player spot on the far side of the room just scrolled in
fn entry_pos(pos: IVec2, dir: Direction) -> IVec2 {
    let limit = PLAYER_LIMITS[dir.opposite().ord()];
    if dir.is_vertical() {
        IVec2::new(pos.x, limit)
    } else {
        IVec2::new(limit, pos.y)
    }
}
