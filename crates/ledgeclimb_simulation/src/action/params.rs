//! Match-target параметры и запрос на matched action

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Часть тела, которую animator подгоняет к world target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum BodyPart {
    Root,
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
}

/// Запрос синхронизации анимации с миром (живёт одну транзицию)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct MatchTargetParams {
    /// World позиция, куда должна прийти `body_part`
    pub position: Vec3,
    pub body_part: BodyPart,
    /// Вес совпадения по осям (0 = ось не трогаем)
    pub position_weight: Vec3,
    /// Normalized time клипа, с которого начинается matching (и поворот)
    pub start_time: f32,
    /// Normalized time, к которому body_part должна быть в target
    pub target_time: f32,
}

impl MatchTargetParams {
    pub fn new(position: Vec3, body_part: BodyPart, start_time: f32, target_time: f32) -> Self {
        Self {
            position,
            body_part,
            position_weight: Vec3::ONE,
            start_time,
            target_time,
        }
    }
}

/// Единица работы для matched-action executor
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub clip: String,
    pub match_params: Option<MatchTargetParams>,
    pub target_rotation: Quat,
    /// Поворачивать к `target_rotation` во время клипа
    pub rotate: bool,
    /// Пауза после клипа до снятия in_action (секунды)
    pub post_delay: f32,
    pub mirror: bool,
}

impl ActionRequest {
    pub fn new(clip: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            match_params: None,
            target_rotation: Quat::IDENTITY,
            rotate: false,
            post_delay: 0.0,
            mirror: false,
        }
    }

    pub fn with_match(mut self, params: MatchTargetParams) -> Self {
        self.match_params = Some(params);
        self
    }

    pub fn rotate_to(mut self, rotation: Quat) -> Self {
        self.target_rotation = rotation;
        self.rotate = true;
        self
    }

    pub fn with_post_delay(mut self, delay: f32) -> Self {
        self.post_delay = delay.max(0.0);
        self
    }

    pub fn mirrored(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// С какого normalized time разрешён поворот
    pub fn rotate_start_time(&self) -> f32 {
        self.match_params.map_or(0.0, |params| params.start_time)
    }
}
