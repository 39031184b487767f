//! Read-only render snapshot
//!
//! The renderer never touches the core directly: each frame it takes a
//! [`Scene`] whose instance arrays can be uploaded to the GPU as-is.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::sim::{BoxStatus, Game, GamePhase, GridPos, ProgressStats};

/// What a cell instance draws
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Wall = 0,
    Box = 1,
    BoxOnTarget = 2,
    Target = 3,
}

/// One unit cube or floor marker
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CellInstance {
    /// Cell center on the floor plane
    pub position: [f32; 3],
    /// `CellKind` discriminant
    pub kind: u32,
}

impl CellInstance {
    pub fn new(cell: GridPos, kind: CellKind) -> Self {
        Self {
            position: [cell.x as f32, 0.0, cell.z as f32],
            kind: kind as u32,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    /// 0 at spawn, 1 at expiry
    pub age: f32,
}

/// Colors for scene elements
pub mod colors {
    pub const WALL: [f32; 4] = [0.45, 0.42, 0.4, 1.0];
    pub const BOX: [f32; 4] = [0.7, 0.45, 0.2, 1.0];
    pub const BOX_ON_TARGET: [f32; 4] = [0.3, 0.85, 0.35, 1.0];
    pub const TARGET: [f32; 4] = [0.95, 0.8, 0.2, 1.0];
    pub const FLOOR: [f32; 4] = [0.25, 0.25, 0.28, 1.0];

    pub fn for_kind(kind: super::CellKind) -> [f32; 4] {
        match kind {
            super::CellKind::Wall => WALL,
            super::CellKind::Box => BOX,
            super::CellKind::BoxOnTarget => BOX_ON_TARGET,
            super::CellKind::Target => TARGET,
        }
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone)]
pub struct Scene {
    pub phase: GamePhase,
    pub level_name: String,
    pub difficulty: String,
    /// Walls, then targets, then boxes
    pub cells: Vec<CellInstance>,
    pub particles: Vec<ParticleInstance>,
    pub progress: ProgressStats,
    pub eye: Vec3,
    pub look: Vec3,
    pub forward: Vec2,
    pub right: Vec2,
}

impl Scene {
    pub fn capture(game: &Game, now: f64) -> Self {
        let level = game.level();
        let player = game.player();
        let lifetime = game.config().particles.lifetime;

        let capacity = level.walls().len() + level.objectives().len() + level.boxes().len();
        let mut cells = Vec::with_capacity(capacity);
        cells.extend(level.walls().iter().map(|&c| CellInstance::new(c, CellKind::Wall)));
        cells.extend(level.objectives().iter().map(|&c| CellInstance::new(c, CellKind::Target)));
        cells.extend(level.boxes().iter().map(|&c| {
            let kind = match level.box_status(c) {
                BoxStatus::OnTarget => CellKind::BoxOnTarget,
                BoxStatus::Normal => CellKind::Box,
            };
            CellInstance::new(c, kind)
        }));

        let particles = level
            .particles()
            .iter()
            .map(|p| ParticleInstance {
                position: p.pos.to_array(),
                size: p.size,
                color: p.color,
                age: if lifetime > 0.0 {
                    (p.age(now) / lifetime).clamp(0.0, 1.0)
                } else {
                    1.0
                },
            })
            .collect();

        let (forward, right) = player.camera_vectors();
        Self {
            phase: game.phase(),
            level_name: level.name().to_string(),
            difficulty: level.difficulty().to_string(),
            cells,
            particles,
            progress: level.progress(),
            eye: player.position(),
            look: player.look_direction(),
            forward,
            right,
        }
    }

    /// Raw bytes of the cell instances for a vertex buffer
    pub fn cell_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    pub fn particle_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|c| c.kind == kind as u32).count()
    }
}
