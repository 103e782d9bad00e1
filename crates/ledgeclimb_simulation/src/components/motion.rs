//! Character Motion State — единое состояние движения персонажа
//!
//! Владелец: locomotion controller. Флаги `is_hanging` и `has_control`
//! дополнительно пишет climb state machine, `in_action` — только ActionRunner.
//! Инвариант: за один тик пишет ровно один логический владелец (см. `authority()`).

use bevy::prelude::*;

use crate::ledge::LedgeData;

/// Кто сейчас имеет право двигать Transform персонажа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum MotionAuthority {
    /// Ground/air locomotion (control enabled, не висим, нет action)
    Locomotion,
    /// Matched action в полёте (executor + animator root motion/target matching)
    Action,
    /// Никто не пишет: висим на уступе, settle после mount, либо control снят извне
    Suspended,
}

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct CharacterMotion {
    pub(crate) grounded: bool,
    /// Вертикальная скорость (m/s), интегрируется отдельно от горизонтали
    pub(crate) y_speed: f32,
    /// Camera-relative направление из input (до ledge deflection)
    pub(crate) desired_move_dir: Vec3,
    /// Направление для поворота (может быть обнулено/спроецировано deflection'ом)
    pub(crate) move_dir: Vec3,
    pub(crate) velocity: Vec3,
    /// 0..1, модуль input'а (или 1 при run override)
    pub(crate) move_amount: f32,
    pub(crate) target_rotation: Quat,
    pub(crate) has_control: bool,
    pub(crate) in_action: bool,
    pub(crate) is_hanging: bool,
    pub(crate) is_on_ledge: bool,
    pub(crate) ledge: Option<LedgeData>,
    /// Сколько секунд ещё нельзя прыгать (0 = можно)
    pub(crate) jump_cooldown: f32,
    pub(crate) collider_enabled: bool,
}

impl Default for CharacterMotion {
    fn default() -> Self {
        Self {
            grounded: false,
            y_speed: 0.0,
            desired_move_dir: Vec3::ZERO,
            move_dir: Vec3::ZERO,
            velocity: Vec3::ZERO,
            move_amount: 0.0,
            target_rotation: Quat::IDENTITY,
            has_control: true,
            in_action: false,
            is_hanging: false,
            is_on_ledge: false,
            ledge: None,
            jump_cooldown: 0.0,
            collider_enabled: true,
        }
    }
}

impl CharacterMotion {
    pub fn with_rotation(rotation: Quat) -> Self {
        Self {
            target_rotation: rotation,
            ..default()
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn has_control(&self) -> bool {
        self.has_control
    }

    pub fn in_action(&self) -> bool {
        self.in_action
    }

    pub fn is_hanging(&self) -> bool {
        self.is_hanging
    }

    pub fn is_on_ledge(&self) -> bool {
        self.is_on_ledge
    }

    pub fn collider_enabled(&self) -> bool {
        self.collider_enabled
    }

    pub fn can_jump(&self) -> bool {
        self.jump_cooldown <= 0.0
    }

    pub fn y_speed(&self) -> f32 {
        self.y_speed
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn move_dir(&self) -> Vec3 {
        self.move_dir
    }

    pub fn target_rotation(&self) -> Quat {
        self.target_rotation
    }

    pub fn ledge(&self) -> Option<&LedgeData> {
        self.ledge.as_ref()
    }

    pub fn authority(&self) -> MotionAuthority {
        if self.in_action {
            MotionAuthority::Action
        } else if self.has_control && !self.is_hanging {
            MotionAuthority::Locomotion
        } else {
            MotionAuthority::Suspended
        }
    }

    /// Включить/выключить player control (respawn, cutscene, climb)
    ///
    /// Выключение гасит collider, сбрасывает move_amount и фиксирует
    /// target rotation на текущем повороте (чтобы не докручивало после возврата).
    pub fn set_control(&mut self, has_control: bool, current_rotation: Quat) {
        self.has_control = has_control;
        self.collider_enabled = has_control;

        if !has_control {
            self.move_amount = 0.0;
            self.velocity = Vec3::ZERO;
            self.target_rotation = current_rotation;
        }
    }

    pub fn enable_collider(&mut self, enabled: bool) {
        self.collider_enabled = enabled;
    }

    pub fn reset_target_rotation(&mut self, current_rotation: Quat) {
        self.target_rotation = current_rotation;
    }

    pub(crate) fn set_hanging(&mut self, hanging: bool) {
        self.is_hanging = hanging;
    }

    pub(crate) fn set_in_action(&mut self, in_action: bool) {
        self.in_action = in_action;
    }
}
