//! Climb domain — hang/shimmy/hop/mount поверх locomotion
//!
//! - `hand`: hand target относительно climb point'а
//! - `moves`: таблица climb переходов (клип, окно matching, рука, offset)
//! - `controller`: ClimbController + система переходов

pub mod controller;
pub mod hand;
pub mod moves;


pub use controller::*;
pub use hand::*;
pub use moves::*;

use bevy::prelude::*;

use crate::CharacterSet;

pub struct ClimbPlugin;

impl Plugin for ClimbPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ClimbEvent>()
            .add_systems(FixedUpdate, climb_transitions.in_set(CharacterSet::Climb));
    }
}
