//! Authoritative puzzle state
//!
//! A `Level` owns walls, boxes, targets, the spawn point, the move counter
//! and the particle list. It enforces push legality and evaluates victory.
//! Loading validates first and only then replaces state, so a rejected
//! definition leaves the previous level untouched.

use std::collections::HashSet;

use glam::{IVec3, Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::events::{EventSink, GameEvent};
use super::grid::{Direction, GridPos, grid_round, snap};
use super::particle::{self, Particle};
use super::source::LevelSource;
use super::validate::{ValidationError, validate};
use crate::config::{GameConfig, ParticleConfig, WorldConfig};

/// Why a level could not be loaded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("level index {index} out of range (have {count} levels)")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("level {index} is invalid: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ValidationError,
    },
}

/// Why a push was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReason {
    Wall,
    Box,
    OutOfBounds,
}

/// Outcome of a push legality check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushCheck {
    /// No box in the cell in front of the player
    NoBox,
    /// A box is there but its destination is not free
    Blocked {
        box_pos: GridPos,
        dest: GridPos,
        reason: BlockReason,
    },
    /// The box at `box_pos` can move to `dest`
    Allowed { box_pos: GridPos, dest: GridPos },
}

impl PushCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PushCheck::Allowed { .. })
    }

    /// The box cell and its destination, when a box was found
    pub fn cells(&self) -> Option<(GridPos, GridPos)> {
        match *self {
            PushCheck::NoBox => None,
            PushCheck::Blocked { box_pos, dest, .. } | PushCheck::Allowed { box_pos, dest } => {
                Some((box_pos, dest))
            }
        }
    }
}

/// Render hint for a box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxStatus {
    OnTarget,
    Normal,
}

/// Level progress, recomputed on every call
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressStats {
    pub boxes_on_target: usize,
    /// Number of targets to fill
    pub total_boxes: usize,
    pub move_count: u32,
    /// 0-100
    pub completion_percent: f32,
}

pub struct Level {
    source: Box<dyn LevelSource>,
    world: WorldConfig,
    particle_config: ParticleConfig,
    rng: Pcg32,

    current_index: usize,
    loaded: bool,
    name: String,
    difficulty: String,

    walls: Vec<GridPos>,
    wall_set: HashSet<GridPos>,
    boxes: Vec<GridPos>,
    objectives: Vec<GridPos>,
    objective_set: HashSet<GridPos>,
    spawn: Vec3,

    move_count: u32,
    particles: Vec<Particle>,
}

impl Level {
    /// Create an empty level backed by `source`
    pub fn new(source: impl LevelSource + 'static, config: &GameConfig) -> Self {
        Self {
            source: Box::new(source),
            world: config.world,
            particle_config: config.particles,
            rng: Pcg32::seed_from_u64(config.particles.seed),
            current_index: 0,
            loaded: false,
            name: String::new(),
            difficulty: String::new(),
            walls: Vec::new(),
            wall_set: HashSet::new(),
            boxes: Vec::new(),
            objectives: Vec::new(),
            objective_set: HashSet::new(),
            spawn: Vec3::ZERO,
            move_count: 0,
            particles: Vec::new(),
        }
    }

    /// Validate and activate level `index`
    ///
    /// On failure nothing changes and the reason is logged and returned.
    pub fn load(&mut self, index: usize) -> Result<(), LoadError> {
        let count = self.source.count();
        let Some(raw) = self.source.get(index) else {
            let err = LoadError::IndexOutOfRange { index, count };
            log::error!("{err}");
            return Err(err);
        };

        let def = validate(raw, &self.world).map_err(|source| {
            let err = LoadError::Invalid { index, source };
            log::error!("{err}");
            err
        })?;

        let mut spawn = def.spawn;
        let spawn_cell = IVec3::new(grid_round(spawn.x), grid_round(spawn.y), grid_round(spawn.z));
        let wall_set: HashSet<GridPos> = def.walls.iter().copied().collect();
        if wall_set.contains(&spawn_cell) {
            spawn.z += self.world.spawn_adjustment_offset;
            log::warn!(
                "Spawn of level {index} is inside a wall, moved to ({:.2}, {:.2})",
                spawn.x,
                spawn.z
            );
        }

        self.current_index = index;
        self.loaded = true;
        self.name = def.name.unwrap_or_else(|| format!("Level {}", index + 1));
        self.difficulty = def.difficulty.unwrap_or_else(|| "Normal".to_string());
        self.objective_set = def.targets.iter().copied().collect();
        self.objectives = def.targets;
        self.wall_set = wall_set;
        self.walls = def.walls;
        self.boxes = def.boxes;
        self.spawn = spawn;
        self.move_count = 0;
        self.particles.clear();

        log::info!(
            "Loaded level {} '{}' ({}): {} walls, {} boxes, {} targets",
            index,
            self.name,
            self.difficulty,
            self.walls.len(),
            self.boxes.len(),
            self.objectives.len()
        );
        Ok(())
    }

    /// Restart the active level from its definition
    pub fn reload(&mut self) -> Result<(), LoadError> {
        self.load(self.current_index)
    }

    pub fn level_count(&self) -> usize {
        self.source.count()
    }

    pub fn next_index(&self) -> Option<usize> {
        let next = self.current_index + 1;
        (next < self.source.count()).then_some(next)
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.source.count()
    }

    /// Every box sits on a target and the counts match
    pub fn check_victory(&self) -> bool {
        self.boxes.len() == self.objectives.len()
            && self.boxes.iter().all(|b| self.objective_set.contains(b))
    }

    /// Check whether the player at `player` (planar x, z) can push in `dir`
    pub fn can_push(&self, player: Vec2, dir: Direction) -> PushCheck {
        let box_pos = snap(player) + dir.offset();
        if !self.boxes.contains(&box_pos) {
            return PushCheck::NoBox;
        }

        let dest = box_pos + dir.offset();
        let reason = if self.wall_set.contains(&dest) {
            Some(BlockReason::Wall)
        } else if self.boxes.contains(&dest) {
            Some(BlockReason::Box)
        } else if !self.world.contains(dest.x, dest.z) {
            Some(BlockReason::OutOfBounds)
        } else {
            None
        };

        match reason {
            Some(reason) => PushCheck::Blocked {
                box_pos,
                dest,
                reason,
            },
            None => PushCheck::Allowed { box_pos, dest },
        }
    }

    /// Push the box in front of the player, if legal
    pub fn push(
        &mut self,
        player: Vec2,
        dir: Direction,
        now: f64,
        sink: &mut dyn EventSink,
    ) -> bool {
        let PushCheck::Allowed { box_pos, dest } = self.can_push(player, dir) else {
            sink.emit(GameEvent::Blocked);
            return false;
        };

        let Some(slot) = self.boxes.iter_mut().find(|b| **b == box_pos) else {
            sink.emit(GameEvent::Blocked);
            return false;
        };
        *slot = dest;
        self.move_count += 1;
        sink.emit(GameEvent::Push);
        log::debug!(
            "Pushed box ({}, {}) -> ({}, {}), moves: {}",
            box_pos.x,
            box_pos.z,
            dest.x,
            dest.z,
            self.move_count
        );

        if self.objective_set.contains(&dest) {
            let burst = particle::burst(&mut self.rng, dest, now, &self.particle_config);
            self.particles.extend(burst);
            particle::cap(&mut self.particles, self.particle_config.max_particles);
            sink.emit(GameEvent::BoxOnTarget);
        }

        true
    }

    /// Age particles: ballistic motion, floor bounce, expiry
    pub fn update_particles(&mut self, now: f64, dt: f32) {
        particle::step(&mut self.particles, now, dt, &self.particle_config);
    }

    pub fn progress(&self) -> ProgressStats {
        let boxes_on_target = self
            .boxes
            .iter()
            .filter(|b| self.objective_set.contains(b))
            .count();
        let total_boxes = self.objectives.len();
        let completion_percent = if total_boxes == 0 {
            0.0
        } else {
            boxes_on_target as f32 / total_boxes as f32 * 100.0
        };

        ProgressStats {
            boxes_on_target,
            total_boxes,
            move_count: self.move_count,
            completion_percent,
        }
    }

    pub fn box_status(&self, box_pos: GridPos) -> BoxStatus {
        if self.objective_set.contains(&box_pos) {
            BoxStatus::OnTarget
        } else {
            BoxStatus::Normal
        }
    }

    pub fn walls(&self) -> &[GridPos] {
        &self.walls
    }

    pub fn boxes(&self) -> &[GridPos] {
        &self.boxes
    }

    pub fn objectives(&self) -> &[GridPos] {
        &self.objectives
    }

    pub fn spawn(&self) -> Vec3 {
        self.spawn
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    pub fn world(&self) -> &WorldConfig {
        &self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::NullSink;
    use crate::sim::grid::cell;
    use crate::sim::source::LevelPack;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn simple_push() -> Value {
        json!({
            "walls": [],
            "boxes": [[1, 0, 0]],
            "targets": [[2, 0, 0]],
            "spawn": [0.0, 0.0, 0.0]
        })
    }

    fn level_with(defs: Vec<Value>) -> Level {
        Level::new(LevelPack::new(defs), &GameConfig::default())
    }

    fn loaded(def: Value) -> Level {
        let mut level = level_with(vec![def]);
        level.load(0).unwrap();
        level
    }

    fn as_set(cells: &[GridPos]) -> HashSet<GridPos> {
        cells.iter().copied().collect()
    }

    #[test]
    fn test_new_level_is_empty() {
        let level = level_with(vec![simple_push()]);
        assert!(!level.is_loaded());
        assert!(level.boxes().is_empty());
        assert_eq!(level.progress(), ProgressStats::default());
    }

    #[test]
    fn test_simple_push_scenario() {
        let mut level = loaded(simple_push());
        let player = Vec2::ZERO;

        assert_eq!(
            level.can_push(player, Direction::East),
            PushCheck::Allowed {
                box_pos: cell(1, 0),
                dest: cell(2, 0)
            }
        );
        assert!(!level.check_victory());

        let mut events: Vec<GameEvent> = Vec::new();
        assert!(level.push(player, Direction::East, 1.0, &mut events));
        assert_eq!(level.boxes(), &[cell(2, 0)]);
        assert_eq!(level.move_count(), 1);
        assert!(level.check_victory());
        assert_eq!(events, vec![GameEvent::Push, GameEvent::BoxOnTarget]);
        assert_eq!(level.particles().len(), GameConfig::default().particles.count);
    }

    #[test]
    fn test_blocked_push_scenario() {
        let mut def = simple_push();
        def["walls"] = json!([[2, 0, 0]]);
        def["targets"] = json!([[1, 0, 1]]);
        let mut level = loaded(def);

        let check = level.can_push(Vec2::ZERO, Direction::East);
        assert_eq!(check.cells(), Some((cell(1, 0), cell(2, 0))));
        assert!(!check.is_allowed());
        assert!(matches!(
            check,
            PushCheck::Blocked {
                reason: BlockReason::Wall,
                ..
            }
        ));

        let mut events: Vec<GameEvent> = Vec::new();
        assert!(!level.push(Vec2::ZERO, Direction::East, 1.0, &mut events));
        assert_eq!(level.boxes(), &[cell(1, 0)]);
        assert_eq!(level.move_count(), 0);
        assert_eq!(events, vec![GameEvent::Blocked]);
    }

    #[test]
    fn test_box_blocks_box() {
        let level = loaded(json!({
            "walls": [],
            "boxes": [[1, 0, 0], [2, 0, 0]],
            "targets": [[3, 0, 0], [4, 0, 0]],
            "spawn": [0.0, 0.0, 0.0]
        }));
        assert!(matches!(
            level.can_push(Vec2::ZERO, Direction::East),
            PushCheck::Blocked {
                reason: BlockReason::Box,
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_bounds_push_scenario() {
        let limit = GameConfig::default().world.boundary_limit;
        let mut level = loaded(json!({
            "walls": [],
            "boxes": [[limit - 1, 0, 0]],
            "targets": [[0, 0, 0]],
            "spawn": [(limit - 2) as f32, 0.0, 0.0]
        }));
        let player = Vec2::new((limit - 2) as f32, 0.0);

        let check = level.can_push(player, Direction::East);
        assert_eq!(
            check,
            PushCheck::Blocked {
                box_pos: cell(limit - 1, 0),
                dest: cell(limit, 0),
                reason: BlockReason::OutOfBounds
            }
        );
        assert!(!level.push(player, Direction::East, 0.0, &mut NullSink));
        assert_eq!(level.boxes(), &[cell(limit - 1, 0)]);
    }

    #[test]
    fn test_no_box_in_front() {
        let mut level = loaded(simple_push());
        assert_eq!(level.can_push(Vec2::ZERO, Direction::North), PushCheck::NoBox);
        assert_eq!(PushCheck::NoBox.cells(), None);

        let mut events: Vec<GameEvent> = Vec::new();
        assert!(!level.push(Vec2::ZERO, Direction::West, 0.0, &mut events));
        assert_eq!(events, vec![GameEvent::Blocked]);
    }

    #[test]
    fn test_player_position_is_snapped() {
        let level = loaded(simple_push());
        // 0.4 rounds to 0, so the box at x=1 is still directly ahead
        assert!(level.can_push(Vec2::new(0.4, -0.3), Direction::East).is_allowed());
        // 0.6 rounds to 1: the player cell is the box cell itself
        assert_eq!(level.can_push(Vec2::new(0.6, 0.0), Direction::East), PushCheck::NoBox);
    }

    #[test]
    fn test_can_push_is_pure() {
        let level = loaded(simple_push());
        let a = level.can_push(Vec2::ZERO, Direction::East);
        let b = level.can_push(Vec2::ZERO, Direction::East);
        assert_eq!(a, b);
        assert_eq!(level.move_count(), 0);
    }

    #[test]
    fn test_push_without_target_has_no_particles() {
        let mut level = loaded(json!({
            "walls": [],
            "boxes": [[1, 0, 0]],
            "targets": [[5, 0, 5]],
            "spawn": [0.0, 0.0, 0.0]
        }));
        let mut events: Vec<GameEvent> = Vec::new();
        assert!(level.push(Vec2::ZERO, Direction::East, 0.0, &mut events));
        assert_eq!(events, vec![GameEvent::Push]);
        assert!(level.particles().is_empty());
        assert_eq!(level.box_status(cell(2, 0)), BoxStatus::Normal);
    }

    #[test]
    fn test_victory_requires_every_box() {
        let level = loaded(json!({
            "walls": [],
            "boxes": [[1, 0, 0], [2, 0, 2]],
            "targets": [[1, 0, 0], [2, 0, 2]],
            "spawn": [0.0, 0.0, 0.0]
        }));
        assert!(level.check_victory());

        let partial = loaded(json!({
            "walls": [],
            "boxes": [[1, 0, 0], [2, 0, 3]],
            "targets": [[1, 0, 0], [2, 0, 2]],
            "spawn": [0.0, 0.0, 0.0]
        }));
        assert!(!partial.check_victory());
        let stats = partial.progress();
        assert_eq!(stats.boxes_on_target, 1);
        assert_eq!(stats.total_boxes, 2);
        assert!((stats.completion_percent - 50.0).abs() < 1e-4);
        assert_eq!(partial.box_status(cell(1, 0)), BoxStatus::OnTarget);
    }

    #[test]
    fn test_victory_requires_matching_counts() {
        let level = loaded(json!({
            "walls": [],
            "boxes": [[1, 0, 0]],
            "targets": [[1, 0, 0], [3, 0, 3]],
            "spawn": [0.0, 0.0, 0.0]
        }));
        assert!(!level.check_victory());
    }

    #[test]
    fn test_load_copies_definition() {
        let def = json!({
            "name": "Copy",
            "difficulty": "Hard",
            "walls": [[-1, 0, 0], [0, 0, -1], [4, 0, 4]],
            "boxes": [[1, 0, 1], [2, 0, 2]],
            "targets": [[3, 0, 3], [1, 0, 2]],
            "spawn": [0.0, 0.0, 0.0]
        });
        let level = loaded(def);
        assert_eq!(as_set(level.walls()), as_set(&[cell(-1, 0), cell(0, -1), cell(4, 4)]));
        assert_eq!(as_set(level.boxes()), as_set(&[cell(1, 1), cell(2, 2)]));
        assert_eq!(as_set(level.objectives()), as_set(&[cell(3, 3), cell(1, 2)]));
        assert_eq!(level.spawn(), Vec3::ZERO);
        assert_eq!(level.name(), "Copy");
        assert_eq!(level.difficulty(), "Hard");
    }

    #[test]
    fn test_default_metadata() {
        let mut level = level_with(vec![simple_push(), simple_push()]);
        level.load(1).unwrap();
        assert_eq!(level.name(), "Level 2");
        assert_eq!(level.difficulty(), "Normal");
    }

    #[test]
    fn test_spawn_inside_wall_is_nudged() {
        let level = loaded(json!({
            "walls": [[0, 0, 0]],
            "boxes": [[3, 0, 0]],
            "targets": [[4, 0, 0]],
            "spawn": [0.2, 0.0, -0.3]
        }));
        let offset = GameConfig::default().world.spawn_adjustment_offset;
        assert_eq!(level.spawn(), Vec3::new(0.2, 0.0, -0.3 + offset));
    }

    #[test]
    fn test_bad_index_keeps_state() {
        let mut level = loaded(simple_push());
        assert!(level.push(Vec2::ZERO, Direction::East, 0.0, &mut NullSink));

        assert_eq!(
            level.load(3),
            Err(LoadError::IndexOutOfRange { index: 3, count: 1 })
        );
        assert_eq!(level.boxes(), &[cell(2, 0)]);
        assert_eq!(level.move_count(), 1);
        assert_eq!(level.current_index(), 0);
    }

    #[test]
    fn test_invalid_definition_keeps_state() {
        let mut level = level_with(vec![simple_push(), json!({ "walls": [] })]);
        level.load(0).unwrap();

        let err = level.load(1).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                index: 1,
                source: ValidationError::MissingField { field: "boxes" }
            }
        ));
        assert_eq!(level.current_index(), 0);
        assert_eq!(level.boxes(), &[cell(1, 0)]);
    }

    #[test]
    fn test_reload_resets_everything() {
        let mut level = loaded(simple_push());
        level.push(Vec2::ZERO, Direction::East, 0.0, &mut NullSink);
        assert!(!level.particles().is_empty());

        level.reload().unwrap();
        assert_eq!(level.boxes(), &[cell(1, 0)]);
        assert_eq!(level.move_count(), 0);
        assert!(level.particles().is_empty());
    }

    #[test]
    fn test_next_index_and_last() {
        let mut level = level_with(vec![simple_push(), simple_push()]);
        level.load(0).unwrap();
        assert_eq!(level.next_index(), Some(1));
        assert!(!level.is_last());

        level.load(1).unwrap();
        assert_eq!(level.next_index(), None);
        assert!(level.is_last());
        assert_eq!(level.level_count(), 2);
    }

    #[test]
    fn test_particles_expire() {
        let mut level = loaded(simple_push());
        level.push(Vec2::ZERO, Direction::East, 10.0, &mut NullSink);
        assert!(!level.particles().is_empty());

        level.update_particles(11.0, 0.016);
        assert!(!level.particles().is_empty());

        let lifetime = GameConfig::default().particles.lifetime as f64;
        level.update_particles(10.0 + lifetime + 0.01, 0.016);
        assert!(level.particles().is_empty());
    }

    proptest! {
        #[test]
        fn prop_illegal_push_never_mutates(
            px in -4.0f32..4.0,
            pz in -4.0f32..4.0,
            dir_index in 0usize..4,
        ) {
            let mut level = loaded(json!({
                "walls": [[3, 0, 0], [0, 0, 3], [-2, 0, -2]],
                "boxes": [[1, 0, 0], [2, 0, 0], [0, 0, 1], [-1, 0, -1]],
                "targets": [[1, 0, 1], [2, 0, 2], [3, 0, 3], [-3, 0, -3]],
                "spawn": [0.0, 0.0, 0.0]
            }));
            let dir = Direction::ALL[dir_index];
            let player = Vec2::new(px, pz);
            let before = level.boxes().to_vec();

            let check = level.can_push(player, dir);
            prop_assert_eq!(check, level.can_push(player, dir));

            let pushed = level.push(player, dir, 0.0, &mut NullSink);
            prop_assert_eq!(pushed, check.is_allowed());
            if !pushed {
                prop_assert_eq!(level.boxes(), before.as_slice());
                prop_assert_eq!(level.move_count(), 0);
            } else {
                // Boxes never overlap walls or each other
                let boxes = as_set(level.boxes());
                prop_assert_eq!(boxes.len(), level.boxes().len());
                for b in level.boxes() {
                    prop_assert!(!level.walls().contains(b));
                }
            }
        }
    }
}
