//! Game modes and their per-mode state
//!
//! `ModeState` carries the data a mode needs while it runs; `GameMode` is
//! the plain tag reported to the outside.

use serde::{Deserialize, Serialize};

use super::tile::TileBehavior;
use crate::Direction;

/// Top-level game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Demo,
    GameMenu,
    LoadLevel,
    Unfurl,
    Enter,
    Play,
    Leave,
    Scroll,
    ContinueQuestion,
    PlayCellar,
    LeaveCellar,
    PlayCave,
    PlayShortcuts,
    Register,
    Elimination,
    Stairs,
    Death,
    EndLevel,
    WinGame,
    InitPlayCellar,
    InitPlayCave,
}

impl GameMode {
    /// Modes where the player is in control of a room
    pub fn is_playing(self) -> bool {
        matches!(
            self,
            GameMode::Play | GameMode::PlayCave | GameMode::PlayCellar | GameMode::PlayShortcuts
        )
    }
}

/// Kind of room the player is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoomKind {
    #[default]
    Regular,
    Cellar,
    Cave,
    /// Cave whose stairs lead to other overworld rooms
    Shortcuts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnfurlStage {
    Start,
    Hold,
    Widen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnterStage {
    Start,
    Wait,
    Walk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStage {
    Walk,
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollStage {
    Start,
    FadeOut,
    Hold,
    LoadRoom,
    Scroll,
}

/// Stages shared by the cellar and cave transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassageStage {
    Wait,
    FadeOut,
    LoadRoom,
    FadeIn,
    Walk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathStage {
    Flash,
    Spin,
    Fade,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndLevelStage {
    Wait1,
    Flash,
    FillHearts,
    Wait2,
    Furl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinGameStage {
    Text,
    Credits,
    Done,
}

/// Entries of the continue screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContinueChoice {
    Continue,
    Save,
    Retry,
}

impl ContinueChoice {
    pub fn next(self) -> Self {
        match self {
            ContinueChoice::Continue => ContinueChoice::Save,
            ContinueChoice::Save => ContinueChoice::Retry,
            ContinueChoice::Retry => ContinueChoice::Continue,
        }
    }
}

/// Running mode with its ancillary state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeState {
    Demo {
        timer: u32,
    },
    GameMenu {
        cursor: usize,
    },
    Register,
    Elimination {
        cursor: usize,
    },
    LoadLevel {
        level: u8,
        restart_ow: bool,
        timer: u8,
    },
    Unfurl {
        stage: UnfurlStage,
        restart_ow: bool,
        timer: u8,
        left: i32,
        right: i32,
    },
    Enter {
        stage: EnterStage,
        dir: Direction,
        timer: u8,
        remaining: i32,
    },
    Play,
    Leave {
        stage: LeaveStage,
        dir: Direction,
        timer: u8,
    },
    Scroll {
        stage: ScrollStage,
        dir: Direction,
        timer: u8,
        next_room: u8,
        /// Pixels left to scroll
        offset: i32,
    },
    ContinueQuestion {
        choice: ContinueChoice,
    },
    InitPlayCellar,
    PlayCellar {
        stage: PassageStage,
        cellar: u8,
        /// Came down the stairs of the cellar's left exit room
        from_left: bool,
        timer: u8,
    },
    LeaveCellar {
        stage: PassageStage,
        /// Overworld room reached through a shortcut
        target: Option<u8>,
        timer: u8,
    },
    InitPlayCave,
    PlayCave {
        stage: PassageStage,
        shortcuts: bool,
        timer: u8,
    },
    Stairs {
        tile: TileBehavior,
        timer: u8,
    },
    Death {
        stage: DeathStage,
        timer: u8,
    },
    EndLevel {
        stage: EndLevelStage,
        timer: u8,
    },
    WinGame {
        stage: WinGameStage,
        timer: u8,
    },
}

impl ModeState {
    /// Tag for this state; plain play reports the kind of room it runs in
    pub fn mode(&self, room: RoomKind) -> GameMode {
        match self {
            ModeState::Demo { .. } => GameMode::Demo,
            ModeState::GameMenu { .. } => GameMode::GameMenu,
            ModeState::Register => GameMode::Register,
            ModeState::Elimination { .. } => GameMode::Elimination,
            ModeState::LoadLevel { .. } => GameMode::LoadLevel,
            ModeState::Unfurl { .. } => GameMode::Unfurl,
            ModeState::Enter { .. } => GameMode::Enter,
            ModeState::Play => match room {
                RoomKind::Regular => GameMode::Play,
                RoomKind::Cellar => GameMode::PlayCellar,
                RoomKind::Cave => GameMode::PlayCave,
                RoomKind::Shortcuts => GameMode::PlayShortcuts,
            },
            ModeState::Leave { .. } => GameMode::Leave,
            ModeState::Scroll { .. } => GameMode::Scroll,
            ModeState::ContinueQuestion { .. } => GameMode::ContinueQuestion,
            ModeState::InitPlayCellar => GameMode::InitPlayCellar,
            ModeState::PlayCellar { .. } => GameMode::PlayCellar,
            ModeState::LeaveCellar { .. } => GameMode::LeaveCellar,
            ModeState::InitPlayCave => GameMode::InitPlayCave,
            ModeState::PlayCave { shortcuts: true, .. } => GameMode::PlayShortcuts,
            ModeState::PlayCave { .. } => GameMode::PlayCave,
            ModeState::Stairs { .. } => GameMode::Stairs,
            ModeState::Death { .. } => GameMode::Death,
            ModeState::EndLevel { .. } => GameMode::EndLevel,
            ModeState::WinGame { .. } => GameMode::WinGame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playing_modes() {
        assert!(GameMode::Play.is_playing());
        assert!(GameMode::PlayShortcuts.is_playing());
        assert!(!GameMode::Scroll.is_playing());
        assert!(!GameMode::InitPlayCellar.is_playing());
    }

    #[test]
    fn test_play_reports_room_kind() {
        assert_eq!(ModeState::Play.mode(RoomKind::Cellar), GameMode::PlayCellar);
        assert_eq!(ModeState::Play.mode(RoomKind::Regular), GameMode::Play);
        let cave = ModeState::PlayCave {
            stage: PassageStage::Wait,
            shortcuts: true,
            timer: 0,
        };
        assert_eq!(cave.mode(RoomKind::Regular), GameMode::PlayShortcuts);
    }
}
