//! Game-loop orchestration
//!
//! Owns the level and the player, translates per-frame input into core
//! calls and drives the phase machine:
//! `Menu -> Playing <-> Paused`, `Playing -> Victory -> Playing | Menu`,
//! `Playing -> FinalVictory -> Menu`, plus a `Settings` overlay that
//! returns to whichever phase opened it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{EventSink, GameEvent};
use super::level::{Level, LoadError};
use super::player::{MoveIntent, Player};
use super::source::LevelSource;
use crate::config::{CameraConfig, GameConfig};
use crate::persistence::SaveRecord;

/// Top-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen (initial)
    #[default]
    Menu,
    /// Active gameplay
    Playing,
    /// Gameplay suspended
    Paused,
    /// Level solved, more levels remain
    Victory,
    /// Last level solved
    FinalVictory,
    /// Settings overlay
    Settings,
}

/// Discrete requests from the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a new run from the first level
    Start,
    TogglePause,
    /// Restart the current level
    Reset,
    /// Put the player back on spawn without touching the puzzle
    Teleport,
    /// Leave a victory screen
    Advance,
    OpenSettings,
    CloseSettings,
    /// Escape key
    Back,
}

/// Whether the outer loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Continuous input sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub forward: f32,
    pub strafe: f32,
    pub running: bool,
    /// Push key held
    pub push: bool,
    /// Mouse delta in pixels
    pub look: Vec2,
}

pub struct Game {
    config: GameConfig,
    level: Level,
    player: Player,
    phase: GamePhase,
    previous_phase: GamePhase,
    last_push_time: f64,
    victory_time: Option<f64>,
}

impl Game {
    pub fn new(source: impl LevelSource + 'static, config: &GameConfig) -> Self {
        let config = config.sanitized();
        Self {
            config,
            level: Level::new(source, &config),
            player: Player::new(&config),
            phase: GamePhase::Menu,
            previous_phase: GamePhase::Menu,
            last_push_time: 0.0,
            victory_time: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// When the current victory was reached, if in `Victory`
    pub fn victory_time(&self) -> Option<f64> {
        self.victory_time
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::debug!("Phase {:?} -> {:?}", self.phase, phase);
        }
        if phase != GamePhase::Victory {
            self.victory_time = None;
        }
        self.phase = phase;
    }

    /// Load `index`, place the player on spawn and enter `Playing`
    fn enter_level(&mut self, index: usize, sink: &mut dyn EventSink) -> Result<(), LoadError> {
        self.level.load(index)?;
        self.player.place_at_spawn(self.level.spawn());
        self.player.reset_camera();
        self.last_push_time = 0.0;
        self.set_phase(GamePhase::Playing);
        sink.emit(GameEvent::LevelStart);
        Ok(())
    }

    /// Change mouse settings from the settings screen
    ///
    /// Returns false (and changes nothing) outside `Settings`.
    pub fn apply_camera_settings(&mut self, camera: CameraConfig) -> bool {
        if self.phase != GamePhase::Settings {
            log::debug!("Camera settings ignored in {:?}", self.phase);
            return false;
        }
        self.player.set_camera(camera);
        self.config.camera = *self.player.camera();
        log::info!(
            "Camera settings: sensitivity {:.2}, invert Y {}",
            self.config.camera.mouse_sensitivity,
            self.config.camera.invert_y
        );
        true
    }

    /// Apply a discrete command
    pub fn handle(&mut self, command: Command, sink: &mut dyn EventSink) -> Flow {
        match (command, self.phase) {
            (Command::Start, GamePhase::Menu) => {
                sink.emit(GameEvent::MenuSelect);
                if let Err(e) = self.enter_level(0, sink) {
                    log::error!("Could not start game: {e}");
                }
            }
            (Command::TogglePause, GamePhase::Playing) => self.set_phase(GamePhase::Paused),
            (Command::TogglePause, GamePhase::Paused) => self.set_phase(GamePhase::Playing),
            (Command::Reset, GamePhase::Playing) => {
                let index = self.level.current_index();
                if let Err(e) = self.enter_level(index, sink) {
                    log::error!("Could not reset level: {e}");
                }
            }
            (Command::Teleport, GamePhase::Playing) => {
                self.player.place_at_spawn(self.level.spawn());
                self.player.reset_camera();
                log::info!("Teleported to spawn");
            }
            (Command::Advance, GamePhase::Victory) => {
                sink.emit(GameEvent::MenuSelect);
                match self.level.next_index() {
                    Some(next) => {
                        if let Err(e) = self.enter_level(next, sink) {
                            log::error!("Could not load next level: {e}");
                            self.set_phase(GamePhase::Menu);
                        }
                    }
                    None => self.set_phase(GamePhase::Menu),
                }
            }
            (Command::Advance, GamePhase::FinalVictory) => {
                sink.emit(GameEvent::MenuSelect);
                self.set_phase(GamePhase::Menu);
            }
            (Command::OpenSettings, GamePhase::Menu | GamePhase::Paused) => {
                sink.emit(GameEvent::MenuSelect);
                self.previous_phase = self.phase;
                self.set_phase(GamePhase::Settings);
            }
            (Command::CloseSettings | Command::Back, GamePhase::Settings) => {
                sink.emit(GameEvent::MenuSelect);
                self.set_phase(self.previous_phase);
            }
            (Command::Back, GamePhase::Menu) => return Flow::Quit,
            (Command::Back, _) => self.set_phase(GamePhase::Menu),
            (command, phase) => log::debug!("Ignoring {command:?} in {phase:?}"),
        }
        Flow::Continue
    }

    /// Advance one frame of gameplay; does nothing outside `Playing`
    pub fn update(&mut self, input: &FrameInput, dt: f32, now: f64, sink: &mut dyn EventSink) {
        if self.phase != GamePhase::Playing {
            return;
        }
        let dt = dt.clamp(0.0, self.config.timing.max_frame_time);

        self.player.update_camera(input.look.x, input.look.y);

        let intent = MoveIntent {
            forward: input.forward,
            strafe: input.strafe,
            running: input.running,
        };
        self.player.move_by(
            intent,
            dt,
            self.level.walls(),
            self.level.boxes(),
            now,
            sink,
        );

        let cooled_down = now - self.last_push_time >= self.config.timing.push_cooldown as f64;
        if input.push && cooled_down {
            let dir = self.player.facing_direction();
            if self.level.push(self.player.planar(), dir, now, sink) {
                self.last_push_time = now;
                if self.level.check_victory() {
                    sink.emit(GameEvent::Victory);
                    if self.level.is_last() {
                        log::info!("All levels complete");
                        self.set_phase(GamePhase::FinalVictory);
                    } else {
                        log::info!(
                            "Level {} solved in {} moves",
                            self.level.current_index() + 1,
                            self.level.move_count()
                        );
                        self.set_phase(GamePhase::Victory);
                        self.victory_time = Some(now);
                    }
                }
            }
        }

        self.level.update_particles(now, dt);
    }

    /// Snapshot of progress for saving
    pub fn save_record(&self) -> SaveRecord {
        SaveRecord {
            level_index: self.level.current_index(),
            stats: self.level.progress(),
        }
    }

    /// Continue from a saved record: load its level and start playing
    pub fn resume(
        &mut self,
        record: &SaveRecord,
        sink: &mut dyn EventSink,
    ) -> Result<(), LoadError> {
        self.enter_level(record.level_index, sink)?;
        log::info!("Resumed at level {}", record.level_index + 1);
        Ok(())
    }
}
