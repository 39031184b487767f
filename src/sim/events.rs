//! Side-effect signals emitted by the core
//!
//! The audio/feedback layer consumes these; the core only names them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEvent {
    /// A box moved one cell
    Push,
    /// A push was attempted but was illegal
    Blocked,
    /// A pushed box landed on a target
    BoxOnTarget,
    /// Footstep while moving
    Step,
    /// Every box is on a target
    Victory,
    /// A level was (re)started
    LevelStart,
    /// A menu action was confirmed
    MenuSelect,
}

impl GameEvent {
    /// Stable name for the feedback collaborator
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Push => "push",
            GameEvent::Blocked => "blocked",
            GameEvent::BoxOnTarget => "box_on_target",
            GameEvent::Step => "step",
            GameEvent::Victory => "victory",
            GameEvent::LevelStart => "level_start",
            GameEvent::MenuSelect => "menu_select",
        }
    }
}

/// Narrow capability for emitting side effects
pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

/// Collects events in order (used by the game loop and tests)
impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: GameEvent) {}
}
