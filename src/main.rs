//! BoxPush headless driver
//!
//! Usage: `boxpush [config.json] [levels.json]`
//!
//! Checks every level in the pack, then plays the first level with scripted
//! input and reports the outcome. Set `RUST_LOG=debug` to see each event.

use std::path::Path;

use boxpush::GameConfig;
use boxpush::sim::{
    Command, EventSink, FrameInput, Game, GameEvent, GamePhase, LevelPack, LevelSource, validate,
};
use boxpush::view::Scene;
use glam::Vec2;

const FRAME_DT: f32 = 1.0 / 60.0;
const MAX_DEMO_FRAMES: usize = 600;

/// Logs events and counts them
#[derive(Default)]
struct LogSink {
    pushes: usize,
    steps: usize,
}

impl EventSink for LogSink {
    fn emit(&mut self, event: GameEvent) {
        match event {
            GameEvent::Push => self.pushes += 1,
            GameEvent::Step => self.steps += 1,
            _ => {}
        }
        log::debug!("event: {}", event.name());
    }
}

fn check_pack(pack: &LevelPack, config: &GameConfig) -> usize {
    let mut valid = 0;
    for index in 0..pack.count() {
        let Some(raw) = pack.get(index) else { continue };
        match validate(raw, &config.world) {
            Ok(level) => {
                valid += 1;
                log::info!(
                    "Level {}: {} ({} boxes, {} targets)",
                    index + 1,
                    level.name.as_deref().unwrap_or("unnamed"),
                    level.boxes.len(),
                    level.targets.len()
                );
            }
            Err(e) => log::error!("Level {} rejected: {e}", index + 1),
        }
    }
    valid
}

/// Turn toward the box, walk up to it and push until solved
fn play_first_level(game: &mut Game, sink: &mut LogSink) -> bool {
    game.handle(Command::Start, sink);
    if game.phase() != GamePhase::Playing {
        return false;
    }

    // Quarter turn right: face +X
    let turn = 90.0 / game.config().camera.mouse_sensitivity;
    let mut now = 0.0;
    game.update(
        &FrameInput {
            look: Vec2::new(turn, 0.0),
            ..Default::default()
        },
        FRAME_DT,
        now,
        sink,
    );

    let walk_and_push = FrameInput {
        forward: 1.0,
        push: true,
        ..Default::default()
    };
    for _ in 0..MAX_DEMO_FRAMES {
        now += FRAME_DT as f64;
        game.update(&walk_and_push, FRAME_DT, now, sink);
        if game.phase() != GamePhase::Playing {
            break;
        }
    }

    let scene = Scene::capture(game, now);
    log::info!(
        "'{}': {}/{} boxes on target after {} moves ({:.0}%)",
        scene.level_name,
        scene.progress.boxes_on_target,
        scene.progress.total_boxes,
        scene.progress.move_count,
        scene.progress.completion_percent
    );

    matches!(game.phase(), GamePhase::Victory | GamePhase::FinalVictory)
}

fn main() {
    env_logger::init();
    log::info!("BoxPush (headless) starting...");

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "config.json".to_string());
    let config = GameConfig::load(Path::new(&config_path));

    let pack = match args.next() {
        Some(path) => match LevelPack::read(Path::new(&path)) {
            Ok(pack) => pack,
            Err(e) => {
                log::error!("{e}; using built-in levels");
                LevelPack::builtin()
            }
        },
        None => LevelPack::builtin(),
    };

    let valid = check_pack(&pack, &config);
    println!("{valid}/{} levels valid", pack.count());
    if valid == 0 {
        std::process::exit(1);
    }

    let mut game = Game::new(pack, &config);
    let mut sink = LogSink::default();
    let solved = play_first_level(&mut game, &mut sink);
    println!(
        "Demo {}: {} pushes, {} footsteps",
        if solved { "solved level 1" } else { "did not solve level 1" },
        sink.pushes,
        sink.steps
    );
}
