//! Platform abstraction layer
//!
//! Services the simulation calls into once per frame:
//! - Rendering (`Renderer`)
//! - Input polling (`InputSource`)
//! - Audio (`crate::audio::AudioSink`)
//! - Profile storage (`crate::profile::ProfileStore`)

pub mod headless;

pub use headless::{NullRenderer, RecordingRenderer, ScriptedInput};

use serde::{Deserialize, Serialize};

use crate::audio::AudioSink;
use crate::profile::ProfileStore;

/// Controller buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Right,
    Left,
    Down,
    Up,
    A,
    B,
    Select,
    Start,
}

impl Button {
    pub fn bit(self) -> u8 {
        1 << self as u8
    }
}

pub trait Renderer {
    /// Draw one 16x16 tile or sprite at screen position (`x`, `y`)
    fn draw_tile(&mut self, code: u8, x: i32, y: i32, palette: u8);
}

pub trait InputSource {
    /// Held this frame
    fn is_button_down(&self, button: Button) -> bool;
    /// Pressed this frame but not the frame before
    fn is_button_pressing(&self, button: Button) -> bool;
}

/// Everything a frame may call into
pub struct Services<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub input: &'a dyn InputSource,
    pub audio: &'a mut dyn AudioSink,
    pub profiles: &'a mut dyn ProfileStore,
}
