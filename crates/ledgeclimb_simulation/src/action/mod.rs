//! Matched actions — анимационные клипы, встроенные в continuous control
//!
//! - `params`: MatchTargetParams, ActionRequest
//! - `executor`: ActionRunner (resumable state machine, один action на персонажа)
//! - `animator`: контракт host animator'а + headless реализация

pub mod animator;
pub mod executor;
pub mod params;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod executor_tests;

pub use animator::*;
pub use executor::*;
pub use params::*;

use bevy::prelude::*;

use crate::CharacterSet;

/// Plugin: события animator'а + executor matched actions
pub struct ActionPlugin;

impl Plugin for ActionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AnimationCommand>()
            .add_event::<ActionCompleted>()
            .add_systems(FixedUpdate, tick_matched_actions.in_set(CharacterSet::Actions));
    }
}
