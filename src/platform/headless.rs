//! Headless service implementations for the native driver and tests

use super::{Button, InputSource, Renderer};

/// Renderer that draws nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_tile(&mut self, _code: u8, _x: i32, _y: i32, _palette: u8) {}
}

/// Counts draw calls per frame
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<(u8, i32, i32, u8)>,
}

impl Renderer for RecordingRenderer {
    fn draw_tile(&mut self, code: u8, x: i32, y: i32, palette: u8) {
        self.calls.push((code, x, y, palette));
    }
}

/// Input fed from a script, one button mask per frame
///
/// Call `next_frame` before each simulated frame.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    held: u8,
    previous: u8,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held buttons for the coming frame
    pub fn next_frame(&mut self, buttons: &[Button]) {
        self.previous = self.held;
        self.held = buttons.iter().fold(0, |mask, b| mask | b.bit());
    }
}

impl InputSource for ScriptedInput {
    fn is_button_down(&self, button: Button) -> bool {
        self.held & button.bit() != 0
    }

    fn is_button_pressing(&self, button: Button) -> bool {
        self.held & button.bit() != 0 && self.previous & button.bit() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressing_is_edge_triggered() {
        let mut input = ScriptedInput::new();
        input.next_frame(&[Button::Start]);
        assert!(input.is_button_pressing(Button::Start));
        input.next_frame(&[Button::Start]);
        assert!(input.is_button_down(Button::Start));
        assert!(!input.is_button_pressing(Button::Start));
        input.next_frame(&[]);
        assert!(!input.is_button_down(Button::Start));
    }
}
