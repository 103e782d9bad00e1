//! Параметры locomotion controller'а

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::physics::layers;

/// Настраиваемые параметры движения (per-character)
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct LocomotionConfig {
    /// Базовая скорость (m/s)
    pub movement_speed: f32,
    /// Скорость поворота (градусы/сек)
    pub rotation_speed: f32,
    /// Доля скорости в воздухе (< 1)
    pub air_factor: f32,
    pub sprint_multiplier: f32,
    /// Вертикальная скорость прыжка (m/s)
    pub jump_power: f32,
    /// Пауза между прыжками (секунды)
    pub jump_cooldown: f32,
    /// Подъём позиции при прыжке (чтобы ground check не поймал землю)
    pub jump_lift: f32,
    /// m/s² (отрицательная)
    pub gravity: f32,
    pub ground_check_radius: f32,
    /// Центр сферы ground check относительно pivot (в local space)
    pub ground_check_offset: Vec3,
    /// Биты rapier Group, считающиеся землёй
    pub ground_layers: u32,
    /// CrossFade для matched action (секунды)
    pub action_blend_time: f32,
    /// Если animator в transition дольше этого — action считается отданным
    pub action_handoff_time: f32,
    /// Damp time для animator параметра move_amount
    pub move_amount_damp: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            movement_speed: 5.0,
            rotation_speed: 500.0,
            air_factor: 0.7,
            sprint_multiplier: 1.5,
            jump_power: 5.0,
            jump_cooldown: 0.1,
            jump_lift: 0.1,
            gravity: -9.81, // Earth gravity
            ground_check_radius: 0.2,
            ground_check_offset: Vec3::new(0.0, -0.1, 0.0),
            ground_layers: layers::GROUND.bits(),
            action_blend_time: 0.2,
            action_handoff_time: 0.5,
            move_amount_damp: 0.2,
        }
    }
}

impl LocomotionConfig {
    pub fn rotation_speed_rad(&self) -> f32 {
        self.rotation_speed.to_radians()
    }

    pub fn speed(&self, run: bool) -> f32 {
        if run {
            self.movement_speed * self.sprint_multiplier
        } else {
            self.movement_speed
        }
    }
}
