//! Script stepper — cursor over a loaded script
//!
//! Pure state, no I/O: the owning adapter serializes access and does the
//! dispatch. The cursor only moves forward, except on restart or reload.

use super::events::FlowEvent;
use crate::script::Script;

/// Where the stepper is in its script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperState {
    /// No events loaded
    Empty,
    /// At least one event left to emit
    Playing,
    /// Every event has been emitted
    Exhausted,
}

/// A script and a cursor into it. Invariant: `cursor <= script.len()`.
#[derive(Debug, Clone, Default)]
pub struct ScriptStepper {
    script: Script,
    cursor: usize,
}

impl ScriptStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the script wholesale and rewind
    pub fn load(&mut self, script: Script) {
        self.script = script;
        self.cursor = 0;
    }

    /// Take the event under the cursor and move past it.
    ///
    /// Returns `None` without moving once the script is exhausted.
    pub fn advance(&mut self) -> Option<FlowEvent> {
        let event = self.script.events().get(self.cursor)?.clone();
        self.cursor += 1;
        Some(event)
    }

    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    /// Drop the script and rewind
    pub fn clear(&mut self) {
        self.load(Script::default());
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.script.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    pub fn state(&self) -> StepperState {
        if self.script.is_empty() {
            StepperState::Empty
        } else if self.has_more() {
            StepperState::Playing
        } else {
            StepperState::Exhausted
        }
    }
}
