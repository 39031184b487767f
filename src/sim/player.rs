//! First-person player: position, camera angles, movement and footsteps

use glam::{Vec2, Vec3};

use super::events::{EventSink, GameEvent};
use super::grid::{Direction, GridPos, snap};
use super::physics::{cardinal_from_yaw, forward_from_yaw, resolve_move};
use crate::config::{CameraConfig, GameConfig, MovementConfig};
use crate::wrap_degrees;

/// Movement request for one frame, in camera-relative axes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveIntent {
    /// +1 forward, -1 back
    pub forward: f32,
    /// +1 right, -1 left
    pub strafe: f32,
    pub running: bool,
}

#[derive(Debug, Clone)]
pub struct Player {
    /// World position; y is the eye height
    pub position: Vec3,
    /// Degrees, 0 faces -Z, wrapped to [0, 360)
    pub yaw: f32,
    /// Degrees, positive looks up
    pub pitch: f32,
    last_step_time: f64,
    movement: MovementConfig,
    camera: CameraConfig,
    eye_height: f32,
}

impl Player {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            position: Vec3::new(0.0, config.world.eye_height, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            last_step_time: 0.0,
            movement: config.movement.sanitized(),
            camera: config.camera.sanitized(),
            eye_height: config.world.eye_height,
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Stand on a spawn point: x and z are taken from `spawn`, y becomes
    /// the configured eye height
    pub fn place_at_spawn(&mut self, spawn: Vec3) {
        self.position = Vec3::new(spawn.x, self.eye_height, spawn.z);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Planar (x, z) position
    pub fn planar(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }

    pub fn grid_position(&self) -> GridPos {
        snap(self.planar())
    }

    pub fn camera(&self) -> &CameraConfig {
        &self.camera
    }

    /// Replace sensitivity, invert-Y and pitch limit; the current pitch is
    /// clamped to the new limit
    pub fn set_camera(&mut self, camera: CameraConfig) {
        self.camera = camera.sanitized();
        let limit = self.camera.pitch_limit;
        self.pitch = self.pitch.clamp(-limit, limit);
    }

    /// Apply a mouse delta using the current camera settings
    pub fn update_camera(&mut self, dx: f32, dy: f32) {
        let sens = self.camera.mouse_sensitivity;
        self.yaw = wrap_degrees(self.yaw + dx * sens);

        let sign = if self.camera.invert_y { 1.0 } else { -1.0 };
        let limit = self.camera.pitch_limit;
        self.pitch = (self.pitch + sign * dy * sens).clamp(-limit, limit);
    }

    pub fn reset_camera(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    /// Planar forward and right unit vectors
    pub fn camera_vectors(&self) -> (Vec2, Vec2) {
        let forward = forward_from_yaw(self.yaw);
        let right = Vec2::new(-forward.y, forward.x);
        (forward, right)
    }

    /// Full 3D view direction including pitch
    pub fn look_direction(&self) -> Vec3 {
        let (forward, _) = self.camera_vectors();
        let (sin_p, cos_p) = self.pitch.to_radians().sin_cos();
        Vec3::new(forward.x * cos_p, sin_p, forward.y * cos_p)
    }

    /// Cardinal direction the camera faces, used for pushing
    pub fn facing_direction(&self) -> Direction {
        cardinal_from_yaw(self.yaw)
    }

    /// Walk according to `intent`, colliding with walls and boxes
    ///
    /// Returns whether the player moved. Emits `Step` when moving and the
    /// footstep interval (shorter when running) has elapsed.
    pub fn move_by(
        &mut self,
        intent: MoveIntent,
        dt: f32,
        walls: &[GridPos],
        boxes: &[GridPos],
        now: f64,
        sink: &mut dyn EventSink,
    ) -> bool {
        let (forward, right) = self.camera_vectors();
        let wish = forward * intent.forward + right * intent.strafe;
        if wish == Vec2::ZERO {
            return false;
        }

        let mut speed = self.movement.move_speed;
        if intent.running {
            speed *= self.movement.run_multiplier;
        }

        let current = self.planar();
        let target = current + wish.normalize_or_zero() * speed * dt;
        let result = resolve_move(
            current,
            target,
            walls,
            boxes,
            dt,
            speed,
            self.movement.player_radius,
            self.movement.sliding_friction_factor,
        );
        self.position.x = result.pos.x;
        self.position.z = result.pos.y;

        if result.moved {
            let mut interval = self.movement.step_interval;
            if intent.running {
                interval *= self.movement.run_step_multiplier;
            }
            if now - self.last_step_time >= interval as f64 {
                sink.emit(GameEvent::Step);
                self.last_step_time = now;
            }
        }

        result.moved
    }
}
