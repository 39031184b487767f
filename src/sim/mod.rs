//! Puzzle and movement core
//!
//! Everything here is free of rendering, audio and windowing:
//! - Grid snapping and circle-vs-cell collision
//! - Level validation, push rules and victory
//! - First-person movement with sliding
//! - Phase machine driven by commands and per-frame input
//!
//! Side effects leave through [`EventSink`]; randomness comes from a seeded RNG.

pub mod events;
pub mod game;
pub mod grid;
pub mod level;
pub mod particle;
pub mod physics;
pub mod player;
pub mod source;
pub mod validate;

pub use events::{EventSink, GameEvent, NullSink};
pub use game::{Command, Flow, FrameInput, Game, GamePhase};
pub use grid::{Direction, GridPos, cell, grid_round, snap};
pub use level::{BlockReason, BoxStatus, Level, LoadError, ProgressStats, PushCheck};
pub use particle::Particle;
pub use physics::{
    MoveResult, can_occupy, cardinal_from_forward, cardinal_from_yaw, circle_intersects_cell,
    forward_from_yaw, resolve_move,
};
pub use player::{MoveIntent, Player};
pub use source::{LevelPack, LevelSource, PackError};
pub use validate::{ValidatedLevel, ValidationError, validate};
