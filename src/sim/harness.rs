//! Test driver: a simulation over the demo world with recording services

use glam::IVec2;

use super::demo::demo_world;
use super::mode::{GameMode, ModeState};
use super::state::Simulation;
use crate::Direction;
use crate::audio::RecordingAudio;
use crate::platform::{Button, RecordingRenderer, ScriptedInput, Services};
use crate::profile::MemoryProfileStore;
use crate::settings::{Settings, StartMode};

pub(crate) struct Harness {
    pub sim: Simulation,
    pub input: ScriptedInput,
    pub audio: RecordingAudio,
    pub store: MemoryProfileStore,
    /// Draw calls of the last frame only
    pub renderer: RecordingRenderer,
}

impl Harness {
    /// Starts at the game menu
    pub fn new() -> Self {
        Self::with_settings(Settings {
            start_mode: StartMode::GameMenu,
            ..Settings::default()
        })
    }

    pub fn with_settings(settings: Settings) -> Self {
        let world = demo_world().expect("demo world builds");
        Self {
            sim: Simulation::new(world, settings),
            input: ScriptedInput::new(),
            audio: RecordingAudio::default(),
            store: MemoryProfileStore::new(),
            renderer: RecordingRenderer::default(),
        }
    }

    /// In control at the entrance of a level
    pub fn play_level(level: u8) -> Self {
        let mut h = Self::new();
        assert!(h.sim.start_level(level), "no level {level}");
        h.run_until(GameMode::Play, &[], 300);
        h
    }

    /// In control in any room of a level, skipping the scroll there
    pub fn play_in_room(level: u8, room: u8, pos: IVec2) -> Self {
        let mut h = Self::play_level(level);
        h.sim.load_room(room);
        h.sim.place_player(pos, Direction::Up);
        h.sim.goto_play();
        h
    }

    pub fn frame(&mut self, buttons: &[Button]) {
        self.input.next_frame(buttons);
        self.renderer.calls.clear();
        let mut services = Services {
            renderer: &mut self.renderer,
            input: &self.input,
            audio: &mut self.audio,
            profiles: &mut self.store,
        };
        self.sim.advance_frame(&mut services);
    }

    /// Press and release
    pub fn press(&mut self, button: Button) {
        self.frame(&[button]);
        self.frame(&[]);
    }

    /// Run frames until `mode` shows up; returns the frames taken
    pub fn run_until(&mut self, mode: GameMode, buttons: &[Button], max_frames: usize) -> usize {
        for n in 0..=max_frames {
            if self.sim.mode() == mode {
                return n;
            }
            self.frame(buttons);
        }
        panic!(
            "still in {:?} after {max_frames} frames waiting for {mode:?}",
            self.sim.mode()
        );
    }

    /// Run frames until the player is in control of a room
    pub fn run_until_play(&mut self, buttons: &[Button], max_frames: usize) -> usize {
        for n in 0..=max_frames {
            if *self.sim.mode_state() == ModeState::Play {
                return n;
            }
            self.frame(buttons);
        }
        panic!("still in {:?} after {max_frames} frames", self.sim.mode());
    }
}
