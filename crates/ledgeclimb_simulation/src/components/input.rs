//! Player input (заполняется host'ом каждый frame)
//!
//! Для headless тестов — mock input через этот компонент напрямую.

use bevy::prelude::*;

/// Цифровая кнопка: удержание + фронт нажатия в этом тике
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub struct ButtonState {
    pub held: bool,
    /// Нажата в этом тике (сбрасывается в CharacterSet::Cleanup)
    pub pressed: bool,
}

impl ButtonState {
    pub fn press(&mut self) {
        self.held = true;
        self.pressed = true;
    }

    pub fn release(&mut self) {
        self.held = false;
        self.pressed = false;
    }
}

#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PlayerInput {
    /// Сглаженные оси (horizontal, vertical), -1..1
    pub axis: Vec2,
    /// Raw оси (без сглаживания) — climb читает их
    pub raw_axis: Vec2,
    /// Run override: полный forward + sprint multiplier
    pub run: bool,
    pub jump: ButtonState,
    pub drop: ButtonState,
    /// Планарный поворот камеры (yaw), input интерпретируется относительно него
    pub camera_rotation: Quat,
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self {
            axis: Vec2::ZERO,
            raw_axis: Vec2::ZERO,
            run: false,
            jump: ButtonState::default(),
            drop: ButtonState::default(),
            camera_rotation: Quat::IDENTITY,
        }
    }
}

impl PlayerInput {
    /// Выставить обе оси сразу (клавиатура: raw == smoothed)
    pub fn set_axis(&mut self, axis: Vec2) {
        self.axis = axis;
        self.raw_axis = axis;
    }

    /// Направление для climb: округлённые raw оси (-1/0/1 по каждой).
    /// Ровно ±0.5 округляется к чётному, т.е. в 0
    pub fn climb_direction(&self) -> IVec2 {
        IVec2::new(
            self.raw_axis.x.round_ties_even().clamp(-1.0, 1.0) as i32,
            self.raw_axis.y.round_ties_even().clamp(-1.0, 1.0) as i32,
        )
    }

    pub fn clear_edges(&mut self) {
        self.jump.pressed = false;
        self.drop.pressed = false;
    }
}

/// Система: сброс one-shot фронтов кнопок в конце тика
pub fn clear_input_edges(mut query: Query<&mut PlayerInput>) {
    for mut input in query.iter_mut() {
        if input.jump.pressed || input.drop.pressed {
            input.clear_edges();
        }
    }
}
