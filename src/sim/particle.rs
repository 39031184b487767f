//! Celebration particles for boxes landing on targets
//!
//! Purely visual: the level owns and ages them, the renderer draws them.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::GridPos;
use crate::config::ParticleConfig;

/// Burst colors (gold, lime, cyan, white)
pub const PALETTE: [[f32; 3]; 4] = [
    [1.0, 0.84, 0.0],
    [0.55, 1.0, 0.3],
    [0.3, 0.9, 1.0],
    [1.0, 1.0, 1.0],
];

/// Height above the cell where bursts start (top of a box)
const BURST_HEIGHT: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec3,
    pub vel: Vec3,
    pub color: [f32; 3],
    pub size: f32,
    /// Timestamp (seconds) the particle was created
    pub spawned_at: f64,
}

impl Particle {
    /// Seconds since spawn
    #[inline]
    pub fn age(&self, now: f64) -> f32 {
        (now - self.spawned_at) as f32
    }

    /// Advance one step of ballistic motion with a damped floor bounce
    pub fn integrate(&mut self, dt: f32, config: &ParticleConfig) {
        self.pos += self.vel * dt;
        self.vel.y += config.gravity * dt;

        if self.pos.y < config.floor_y {
            self.pos.y = config.floor_y;
            self.vel.y = -self.vel.y * config.bounce_damping;
            self.vel.x *= config.friction;
            self.vel.z *= config.friction;
        }
    }
}

/// Create a burst of particles above `cell`, flying into the upper hemisphere
pub fn burst<R: Rng>(
    rng: &mut R,
    cell: GridPos,
    now: f64,
    config: &ParticleConfig,
) -> Vec<Particle> {
    let origin = Vec3::new(cell.x as f32, BURST_HEIGHT, cell.z as f32);

    (0..config.count)
        .map(|_| {
            let angle: f32 = rng.random_range(0.0..std::f32::consts::TAU);
            let spread: f32 = rng.random_range(0.5..2.0);
            let horizontal = Vec2::from_angle(angle) * spread;
            let up: f32 = rng.random_range(2.0..4.5);

            Particle {
                pos: origin,
                vel: Vec3::new(horizontal.x, up, horizontal.y),
                color: PALETTE[rng.random_range(0..PALETTE.len())],
                size: rng.random_range(0.05..0.12),
                spawned_at: now,
            }
        })
        .collect()
}

/// Integrate every particle and drop those older than the lifetime
pub fn step(particles: &mut Vec<Particle>, now: f64, dt: f32, config: &ParticleConfig) {
    for particle in particles.iter_mut() {
        particle.integrate(dt, config);
    }
    particles.retain(|p| p.age(now) < config.lifetime);
}

/// Keep at most `max` particles, dropping the oldest first
pub fn cap(particles: &mut Vec<Particle>, max: usize) {
    if particles.len() > max {
        let excess = particles.len() - max;
        particles.drain(..excess);
    }
}
