//! Frame drawing
//!
//! Reads simulation state and issues tile and sprite draws to the renderer.
//! Nothing here changes the simulation.

use glam::IVec2;

use super::collision::TileMap;
use super::mode::{ModeState, RoomKind, ScrollStage};
use super::objects::{BlockState, BombState, Object, ObjectKind};
use super::state::Simulation;
use crate::consts::*;
use crate::platform::Renderer;

const SPRITE_PALETTE: u8 = 4;

/// Sprite code for an object; `None` for objects that aren't drawn
fn sprite_code(object: &Object) -> Option<u8> {
    let code = match object.kind {
        ObjectKind::Player => 0xF0,
        ObjectKind::Monster { list_id } => 0xE0 | (list_id & 0x0F),
        ObjectKind::Sword => 0xF1,
        ObjectKind::Bomb(BombState::Ticking) => 0xF2,
        ObjectKind::Bomb(BombState::Blasting) => 0xF3,
        ObjectKind::Bomb(BombState::Fading) => 0xF4,
        ObjectKind::Fire => 0xF5,
        ObjectKind::Ladder => 0xF6,
        ObjectKind::Item { item_id } => 0xC0 | (item_id & 0x3F),
        ObjectKind::Block(BlockState::Moving { .. }) => 0xF7,
        // Resting blocks are part of the tile map
        ObjectKind::FluteMusic | ObjectKind::Block(BlockState::Idle { .. }) => return None,
    };
    Some(code)
}

impl Simulation {
    /// Draw the current frame
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        match self.state {
            ModeState::Demo { .. }
            | ModeState::GameMenu { .. }
            | ModeState::Register
            | ModeState::Elimination { .. }
            | ModeState::ContinueQuestion { .. }
            | ModeState::LoadLevel { .. } => {}
            ModeState::Unfurl { left, right, .. } => {
                self.draw_map(renderer, &self.tile_map, IVec2::ZERO, |x| x >= left && x < right);
            }
            ModeState::Scroll {
                stage: ScrollStage::Scroll,
                dir,
                offset,
                ..
            } => {
                let size = if dir.is_vertical() {
                    TILE_MAP_HEIGHT
                } else {
                    TILE_MAP_WIDTH
                };
                let delta = dir.delta();
                self.draw_map(renderer, &self.tile_map, delta * offset, |_| true);
                if let Some(old) = &self.old_tile_map {
                    self.draw_map(renderer, old, delta * (offset - size), |_| true);
                }
            }
            ModeState::Scroll { .. } => self.draw_map(renderer, &self.tile_map, IVec2::ZERO, |_| true),
            _ => {
                self.draw_map(renderer, &self.tile_map, IVec2::ZERO, |_| true);
                self.draw_objects(renderer);
            }
        }
    }

    fn palettes(&self) -> (u8, u8) {
        if matches!(self.room.kind, RoomKind::Cave | RoomKind::Shortcuts) {
            return (0, 0);
        }
        let attrs = self.level_data().room_attrs(self.cur_room_id);
        (attrs.inner_palette(), attrs.outer_palette())
    }

    fn draw_map(
        &self,
        renderer: &mut dyn Renderer,
        map: &TileMap,
        shift: IVec2,
        visible: impl Fn(i32) -> bool,
    ) {
        let (inner, outer) = self.palettes();
        let fade = self.dark_fade_step << 2;
        for row in 0..ROWS {
            for col in 0..COLUMNS {
                let x = col as i32 * TILE_WIDTH;
                if !visible(x) {
                    continue;
                }
                let y = TILE_MAP_BASE_Y + row as i32 * TILE_HEIGHT;
                let palette = if map.in_playfield_tile(row, col) { inner } else { outer };
                renderer.draw_tile(map.tile(row, col), x + shift.x, y + shift.y, palette | fade);
            }
        }
    }

    fn draw_objects(&self, renderer: &mut dyn Renderer) {
        for slot in self.arena.occupied_slots() {
            let Some(object) = self.arena.get(slot) else {
                continue;
            };
            if let Some(code) = sprite_code(object) {
                renderer.draw_tile(code, object.pos.x, object.pos.y, SPRITE_PALETTE);
            }
        }
    }
}
