//! Physics module
//!
//! Query contract (host физика), headless уровень, locomotion controller.

pub mod level;
pub mod movement;
pub mod queries;


// Re-export основных типов
pub use level::{LevelBlock, StaticLevel};
pub use movement::{
    climbing_character_bundle, facing_rotation, ground_check, ledge_deflection, rotate_towards, signed_angle_y,
    spawn_climbing_character, spawn_physics_character, try_jump, LedgeDeflection, LocomotionPlugin,
};
pub use queries::{layers, PhysicsQueries, PhysicsWorld, RayHit};
