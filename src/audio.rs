//! Audio service
//!
//! The simulation only names cue categories; playback belongs to the host.

use serde::{Deserialize, Serialize};

/// Sound effect categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Door opens or shuts
    Door,
    /// Secret revealed
    Secret,
    /// Walking down or up stairs
    Stairs,
    PlayerHit,
    MonsterHit,
    BombBlast,
    Sword,
    Fire,
    /// Item or key picked up
    ItemPickup,
    /// Menu cursor
    Cursor,
    /// Player died
    Death,
}

pub trait AudioSink {
    fn play_effect(&mut self, effect: SoundEffect);
    fn stop_all(&mut self);
}

/// Drops every cue
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_effect(&mut self, _effect: SoundEffect) {}

    fn stop_all(&mut self) {}
}

/// Remembers the cues it was asked to play
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    pub played: Vec<SoundEffect>,
}

impl AudioSink for RecordingAudio {
    fn play_effect(&mut self, effect: SoundEffect) {
        self.played.push(effect);
    }

    fn stop_all(&mut self) {
        self.played.clear();
    }
}
