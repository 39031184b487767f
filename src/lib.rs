//! BoxPush - a first-person 3D Sokoban
//!
//! Core modules:
//! - `sim`: Puzzle and movement core (grid, physics, level, player, game loop)
//! - `config`: Immutable gameplay configuration
//! - `view`: Read-only render snapshot
//! - `persistence`: Save record for session progress

pub mod config;
pub mod persistence;
pub mod sim;
pub mod view;

pub use config::GameConfig;
pub use persistence::SaveRecord;

/// Default tuning constants
pub mod consts {
    /// Cells must satisfy |x| < limit and |z| < limit
    pub const WORLD_BOUNDARY_LIMIT: i32 = 50;
    /// Forward (+Z) nudge applied when a spawn point lands on a wall
    pub const SPAWN_ADJUSTMENT_OFFSET: f32 = 2.0;
    pub const PLAYER_EYE_HEIGHT: f32 = 0.8;

    /// Collision radius of the player in the XZ plane
    pub const PLAYER_RADIUS: f32 = 0.35;
    /// Half the side of a grid cell obstacle
    pub const CELL_HALF_EXTENT: f32 = 0.5;
    /// Walking speed (units/s)
    pub const MOVE_SPEED: f32 = 3.0;
    pub const RUN_MULTIPLIER: f32 = 1.65;
    /// Fraction of the blocked displacement retried per axis when sliding
    pub const SLIDING_FRICTION_FACTOR: f32 = 0.6;
    /// Seconds between footsteps while walking
    pub const STEP_INTERVAL: f32 = 0.35;
    /// Footsteps come faster when running
    pub const RUN_STEP_MULTIPLIER: f32 = 0.7;

    /// Mouse sensitivity (degrees per pixel)
    pub const MOUSE_SENSITIVITY: f32 = 0.12;
    /// Pitch clamp (degrees) to avoid gimbal lock
    pub const PITCH_LIMIT: f32 = 89.0;

    /// Seconds between pushes
    pub const PUSH_COOLDOWN: f32 = 0.18;
    /// Frame time cap (seconds)
    pub const MAX_FRAME_TIME: f32 = 0.033;

    pub const PARTICLE_LIFETIME: f32 = 2.0;
    /// Particles per box-on-target burst
    pub const PARTICLE_COUNT: usize = 8;
    pub const PARTICLE_GRAVITY: f32 = -9.8;
    /// Height of the bounce floor
    pub const PARTICLE_FLOOR_Y: f32 = 0.05;
    /// Vertical velocity kept after a bounce
    pub const PARTICLE_BOUNCE_DAMPING: f32 = 0.5;
    /// Horizontal velocity kept after a bounce
    pub const PARTICLE_FRICTION: f32 = 0.8;
    pub const MAX_PARTICLES: usize = 256;
    pub const PARTICLE_SEED: u64 = 0x0B0C_5EED;
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
