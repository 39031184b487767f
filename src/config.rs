//! Gameplay configuration
//!
//! Built once at startup and passed by reference into `Level`, `Player` and
//! `Game`. Every section falls back to the defaults in [`crate::consts`] for
//! any key missing from the JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Configuration loading failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// World geometry limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub boundary_limit: i32,
    pub spawn_adjustment_offset: f32,
    pub eye_height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            boundary_limit: WORLD_BOUNDARY_LIMIT,
            spawn_adjustment_offset: SPAWN_ADJUSTMENT_OFFSET,
            eye_height: PLAYER_EYE_HEIGHT,
        }
    }
}

impl WorldConfig {
    /// True if the cell lies strictly inside the world boundary
    #[inline]
    pub fn contains(&self, x: i32, z: i32) -> bool {
        x.abs() < self.boundary_limit && z.abs() < self.boundary_limit
    }

    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.boundary_limit <= 0 {
            log::warn!(
                "config world.boundary_limit = {} must be positive; using {}",
                self.boundary_limit,
                d.boundary_limit
            );
            self.boundary_limit = d.boundary_limit;
        }
        let section = "world";
        keep_or_default(
            section,
            "spawn_adjustment_offset",
            &mut self.spawn_adjustment_offset,
            d.spawn_adjustment_offset,
            |_| true,
        );
        keep_or_default(section, "eye_height", &mut self.eye_height, d.eye_height, |v| v >= 0.0);
        self
    }
}

/// Player movement tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub player_radius: f32,
    pub move_speed: f32,
    pub run_multiplier: f32,
    pub sliding_friction_factor: f32,
    pub step_interval: f32,
    pub run_step_multiplier: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            player_radius: PLAYER_RADIUS,
            move_speed: MOVE_SPEED,
            run_multiplier: RUN_MULTIPLIER,
            sliding_friction_factor: SLIDING_FRICTION_FACTOR,
            step_interval: STEP_INTERVAL,
            run_step_multiplier: RUN_STEP_MULTIPLIER,
        }
    }
}

impl MovementConfig {
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        let section = "movement";
        keep_or_default(
            section,
            "player_radius",
            &mut self.player_radius,
            d.player_radius,
            |v| v > 0.0,
        );
        keep_or_default(section, "move_speed", &mut self.move_speed, d.move_speed, |v| v >= 0.0);
        keep_or_default(
            section,
            "run_multiplier",
            &mut self.run_multiplier,
            d.run_multiplier,
            |v| v >= 0.0,
        );
        keep_or_default(
            section,
            "sliding_friction_factor",
            &mut self.sliding_friction_factor,
            d.sliding_friction_factor,
            |v| (0.0..=1.0).contains(&v),
        );
        keep_or_default(
            section,
            "step_interval",
            &mut self.step_interval,
            d.step_interval,
            |v| v >= 0.0,
        );
        keep_or_default(
            section,
            "run_step_multiplier",
            &mut self.run_step_multiplier,
            d.run_step_multiplier,
            |v| v >= 0.0,
        );
        self
    }
}

/// Mouse look
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub mouse_sensitivity: f32,
    pub invert_y: bool,
    pub pitch_limit: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: MOUSE_SENSITIVITY,
            invert_y: false,
            pitch_limit: PITCH_LIMIT,
        }
    }
}

impl CameraConfig {
    /// Pitch limit must lie in [0, 90] degrees
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        let section = "camera";
        keep_or_default(
            section,
            "mouse_sensitivity",
            &mut self.mouse_sensitivity,
            d.mouse_sensitivity,
            |_| true,
        );
        keep_or_default(
            section,
            "pitch_limit",
            &mut self.pitch_limit,
            d.pitch_limit,
            |v| (0.0..=90.0).contains(&v),
        );
        self
    }
}

/// Box-on-target particle bursts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub lifetime: f32,
    pub count: usize,
    pub gravity: f32,
    pub floor_y: f32,
    pub bounce_damping: f32,
    pub friction: f32,
    pub max_particles: usize,
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            lifetime: PARTICLE_LIFETIME,
            count: PARTICLE_COUNT,
            gravity: PARTICLE_GRAVITY,
            floor_y: PARTICLE_FLOOR_Y,
            bounce_damping: PARTICLE_BOUNCE_DAMPING,
            friction: PARTICLE_FRICTION,
            max_particles: MAX_PARTICLES,
            seed: PARTICLE_SEED,
        }
    }
}

impl ParticleConfig {
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        let section = "particles";
        keep_or_default(section, "lifetime", &mut self.lifetime, d.lifetime, |v| v > 0.0);
        keep_or_default(section, "gravity", &mut self.gravity, d.gravity, |_| true);
        keep_or_default(section, "floor_y", &mut self.floor_y, d.floor_y, |_| true);
        keep_or_default(
            section,
            "bounce_damping",
            &mut self.bounce_damping,
            d.bounce_damping,
            |v| (0.0..=1.0).contains(&v),
        );
        keep_or_default(
            section,
            "friction",
            &mut self.friction,
            d.friction,
            |v| (0.0..=1.0).contains(&v),
        );
        self
    }
}

/// Game loop timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub push_cooldown: f32,
    pub max_frame_time: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            push_cooldown: PUSH_COOLDOWN,
            max_frame_time: MAX_FRAME_TIME,
        }
    }
}

impl TimingConfig {
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        let section = "timing";
        keep_or_default(
            section,
            "push_cooldown",
            &mut self.push_cooldown,
            d.push_cooldown,
            |v| v >= 0.0,
        );
        keep_or_default(
            section,
            "max_frame_time",
            &mut self.max_frame_time,
            d.max_frame_time,
            |v| v > 0.0,
        );
        self
    }
}

/// Reset `value` to `default` unless it is finite and accepted by `valid`
fn keep_or_default(
    section: &str,
    field: &str,
    value: &mut f32,
    default: f32,
    valid: impl Fn(f32) -> bool,
) {
    if !(value.is_finite() && valid(*value)) {
        log::warn!("config {section}.{field} = {value} is out of range; using {default}");
        *value = default;
    }
}

/// Complete gameplay configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub movement: MovementConfig,
    pub camera: CameraConfig,
    pub particles: ParticleConfig,
    pub timing: TimingConfig,
}

impl GameConfig {
    /// Parse a config from JSON; missing keys take their defaults and
    /// out-of-range values are replaced by theirs (with a warning)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Copy with every out-of-range value replaced by its default
    pub fn sanitized(self) -> Self {
        Self {
            world: self.world.sanitized(),
            movement: self.movement.sanitized(),
            camera: self.camera.sanitized(),
            particles: self.particles.sanitized(),
            timing: self.timing.sanitized(),
        }
    }

    /// Read and parse a config file
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Load a config file, falling back to defaults if it is missing or broken
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::read(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{e}; using default config");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
