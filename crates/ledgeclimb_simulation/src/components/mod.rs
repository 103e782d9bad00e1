//! ECS Components персонажа
//!
//! Организация по доменам:
//! - motion: Character Motion State (флаги control/hanging/in_action, скорость)
//! - input: PlayerInput (оси + кнопки jump/drop/run)
//! - config: LocomotionConfig (скорости, гравитация, ground check)

pub mod config;
pub mod input;
pub mod motion;

// Re-exports для удобного импорта
pub use config::*;
pub use input::*;
pub use motion::*;
