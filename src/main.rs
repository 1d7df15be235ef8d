//! Dungeon Sim entry point
//!
//! Runs the demo world headless for a scripted stretch of frames and logs
//! every mode change. Set `RUST_LOG=debug` for room and object detail.

use std::path::Path;

use dungeon_sim::audio::NullAudio;
use dungeon_sim::platform::{Button, NullRenderer, ScriptedInput, Services};
use dungeon_sim::profile::MemoryProfileStore;
use dungeon_sim::sim::{Simulation, demo_world};
use dungeon_sim::Settings;

/// Frames to run: enough to start a game and walk into the dungeon
const FRAMES: u32 = 600;

/// Buttons held on a given frame
fn script(frame: u32) -> &'static [Button] {
    match frame {
        // Leave the demo, then start slot 0
        10 | 20 => &[Button::Start],
        // Walk up into the cave, then down out of the dungeon
        100..=300 => &[Button::Up],
        400..=500 => &[Button::Down],
        _ => &[],
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Dungeon Sim (native) starting...");

    let settings = Settings::load(Path::new(Settings::FILE_NAME));
    let world = match demo_world() {
        Ok(world) => world,
        Err(err) => {
            log::error!("Demo world is invalid: {err}");
            std::process::exit(1);
        }
    };
    let mut sim = Simulation::new(world, settings);

    let mut renderer = NullRenderer;
    let mut input = ScriptedInput::new();
    let mut audio = NullAudio;
    let mut profiles = MemoryProfileStore::new();

    let mut last_mode = sim.mode();
    for frame in 0..FRAMES {
        input.next_frame(script(frame));
        let mut services = Services {
            renderer: &mut renderer,
            input: &input,
            audio: &mut audio,
            profiles: &mut profiles,
        };
        sim.advance_frame(&mut services);
        if sim.mode() != last_mode {
            last_mode = sim.mode();
            log::info!(
                "frame {frame}: {last_mode:?} in level {} room {:#04x}",
                sim.level_number(),
                sim.room_id()
            );
        }
    }
    log::info!("Done after {FRAMES} frames in {:?}", sim.mode());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless driver on the web; hosts embed the library instead
}
