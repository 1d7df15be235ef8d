//! Simulation settings
//!
//! Loaded from a JSON file next to the profiles. Missing or unreadable
//! files fall back to defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_MODE_CHAIN;
use crate::error::StorageError;

/// Mode the simulation boots into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StartMode {
    #[default]
    Demo,
    GameMenu,
}

impl StartMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartMode::Demo => "Demo",
            StartMode::GameMenu => "GameMenu",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "demo" => Some(StartMode::Demo),
            "menu" | "gamemenu" => Some(StartMode::GameMenu),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub start_mode: StartMode,
    /// Seed for monster placement and wandering
    pub rng_seed: u64,
    /// Frames the demo runs before falling through to the menu
    pub demo_length_frames: u32,
    /// Same-frame mode transitions allowed before giving up
    pub max_mode_chain: u32,
    /// Quest number for new profiles
    pub quest: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_mode: StartMode::Demo,
            rng_seed: 0x5EED,
            demo_length_frames: 600,
            max_mode_chain: MAX_MODE_CHAIN,
            quest: 0,
        }
    }
}

impl Settings {
    /// Settings file name inside a data directory
    pub const FILE_NAME: &'static str = "settings.json";

    /// Load settings, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::info!("Using default settings ({err})");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, StorageError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_mode_from_str() {
        assert_eq!(StartMode::from_str("Demo"), Some(StartMode::Demo));
        assert_eq!(StartMode::from_str("menu"), Some(StartMode::GameMenu));
        assert_eq!(StartMode::from_str("nope"), None);
        assert_eq!(StartMode::GameMenu.as_str(), "GameMenu");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"rng_seed": 7}"#).unwrap();
        assert_eq!(settings.rng_seed, 7);
        assert_eq!(settings.max_mode_chain, MAX_MODE_CHAIN);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load(Path::new("/nonexistent/dungeon-sim/settings.json"));
        assert_eq!(settings, Settings::default());
    }
}
